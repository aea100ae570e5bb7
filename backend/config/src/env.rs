//! Environment variable loading.
//!
//! Unset or empty variables fall back to the section defaults. A variable that
//! is set but cannot be parsed into its target type is an error.

use std::collections::HashMap;
use std::str::FromStr;

use crate::schema::Config;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value \"{value}\" for env var {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<Config, ConfigError> {
    Config::from_vars(&std::env::vars().collect())
}

struct Vars<'a> {
    vars: &'a HashMap<String, String>,
}

impl<'a> Vars<'a> {
    fn string(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn string_or(&self, name: &str, default: String) -> String {
        self.string(name).unwrap_or(default)
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(name) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                var: name.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn list(&self, name: &str) -> Vec<String> {
        self.string(name)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Config {
    /// Build a config from an explicit variable map (useful for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let env = Vars { vars };
        let mut config = Config::default();

        let server = &mut config.server;
        server.bind_address = env.string_or("FOLIO_BIND", server.bind_address.clone());
        server.port = env.parsed("FOLIO_PORT", server.port)?;
        server.cors_origins = env.list("CORS_ORIGINS");

        let logging = &mut config.logging;
        logging.level = env
            .string("FOLIO_LOG_LEVEL")
            .or_else(|| env.string("RUST_LOG"))
            .unwrap_or_else(|| logging.level.clone());
        logging.dir = env.string("FOLIO_LOG_DIR");

        config.database_path = env.string_or("FOLIO_DB", "folio.db".to_string());

        let site = &mut config.site;
        site.owner_name = env.string_or("SITE_OWNER_NAME", site.owner_name.clone());
        site.owner_email = env.string("SITE_OWNER_EMAIL");
        site.from_email = env.string_or("EMAIL_FROM", site.from_email.clone());

        let admin = &mut config.admin;
        admin.email = env.string("ADMIN_EMAIL").map(|e| e.to_lowercase());
        admin.password_hash = env.string("ADMIN_PASSWORD_HASH");
        admin.session_ttl_secs = env.parsed("ADMIN_SESSION_TTL_SECS", admin.session_ttl_secs)?;

        let rl = &mut config.rate_limit;
        rl.redis_url = env.string("RATE_LIMIT_REDIS_URL");
        rl.redis_token = env.string("RATE_LIMIT_REDIS_TOKEN");
        rl.redis_timeout_ms = env.parsed("RATE_LIMIT_REDIS_TIMEOUT_MS", rl.redis_timeout_ms)?;
        rl.memory_max_keys = env.parsed("RATE_LIMIT_MEMORY_MAX_KEYS", rl.memory_max_keys)?;
        rl.fallback_cooldown_ms =
            env.parsed("RATE_LIMIT_FALLBACK_COOLDOWN_MS", rl.fallback_cooldown_ms)?;

        let llm = &mut config.llm;
        llm.api_key = env.string("LLM_API_KEY");
        llm.base_url = env.string_or("LLM_BASE_URL", llm.base_url.clone());
        llm.model = env.string_or("LLM_MODEL", llm.model.clone());
        llm.max_tokens = env.parsed("LLM_MAX_TOKENS", llm.max_tokens)?;
        llm.temperature = env.parsed("LLM_TEMPERATURE", llm.temperature)?;
        llm.timeout_secs = env.parsed("LLM_TIMEOUT_SECS", llm.timeout_secs)?;

        let mail = &mut config.mail;
        mail.resend_api_key = env.string("RESEND_API_KEY");
        mail.api_url = env.string_or("RESEND_API_URL", mail.api_url.clone());

        let github = &mut config.github;
        github.username = env.string("GITHUB_USERNAME");
        github.token = env.string("GITHUB_TOKEN");
        github.api_url = env.string_or("GITHUB_API_URL", github.api_url.clone());
        github.cache_ttl_secs = env.parsed("GITHUB_CACHE_TTL_SECS", github.cache_ttl_secs)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database_path, "folio.db");
        assert!(config.rate_limit.redis_url.is_none());
        assert_eq!(config.rate_limit.memory_max_keys, 10_000);
    }

    #[test]
    fn reads_sections_from_vars() {
        let config = Config::from_vars(&vars(&[
            ("FOLIO_PORT", "8080"),
            ("CORS_ORIGINS", "https://a.dev, https://b.dev,"),
            ("ADMIN_EMAIL", "Me@Example.com"),
            ("RATE_LIMIT_REDIS_URL", "rediss://cache.example.com:6379"),
            ("LLM_TEMPERATURE", "0.2"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["https://a.dev", "https://b.dev"]);
        assert_eq!(config.admin.email.as_deref(), Some("me@example.com"));
        assert_eq!(
            config.rate_limit.redis_url.as_deref(),
            Some("rediss://cache.example.com:6379")
        );
        assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = Config::from_vars(&vars(&[("LLM_API_KEY", "   ")])).unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn unparsable_number_is_an_error() {
        let err = Config::from_vars(&vars(&[("FOLIO_PORT", "eighty")])).unwrap_err();
        let ConfigError::InvalidValue { var, value, .. } = err;
        assert_eq!(var, "FOLIO_PORT");
        assert_eq!(value, "eighty");
    }
}
