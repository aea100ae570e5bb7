//! Config validation: deep checks with user-friendly error messages.

use argon2::PasswordHash;
use thiserror::Error;

use crate::schema::Config;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &Config) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_admin(config, &mut report);
    validate_rate_limit(config, &mut report);
    validate_llm(config, &mut report);
    validate_mail(config, &mut report);
    validate_github(config, &mut report);
    report
}

fn validate_server(config: &Config, report: &mut ValidationReport) {
    let port = config.server.port;
    if port == 0 {
        report.error("server.port", "Port must be > 0");
    } else if port < 1024 && port != 80 && port != 443 {
        report.warn(
            "server.port",
            format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
        );
    }
    for (i, origin) in config.server.cors_origins.iter().enumerate() {
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            report.error(
                format!("server.corsOrigins[{i}]"),
                format!("Origin '{origin}' must start with http:// or https://"),
            );
        }
    }
}

fn validate_admin(config: &Config, report: &mut ValidationReport) {
    let admin = &config.admin;
    match (&admin.email, &admin.password_hash) {
        (None, None) => {
            report.warn("admin", "No admin credentials configured; dashboard login is disabled");
        }
        (Some(_), None) => report.error("admin.passwordHash", "ADMIN_PASSWORD_HASH is required"),
        (None, Some(_)) => report.error("admin.email", "ADMIN_EMAIL is required"),
        (Some(_), Some(hash)) => match PasswordHash::new(hash) {
            Ok(parsed) if parsed.algorithm.as_str().starts_with("argon2") => {}
            Ok(parsed) => report.error(
                "admin.passwordHash",
                format!("Unsupported hash algorithm '{}'; use argon2id", parsed.algorithm),
            ),
            Err(e) => report.error(
                "admin.passwordHash",
                format!("Must be an Argon2 PHC string ($argon2id$v=19$...): {e}"),
            ),
        },
    }
    if admin.session_ttl_secs == 0 {
        report.error("admin.sessionTtlSecs", "Session TTL must be > 0");
    }
}

fn validate_rate_limit(config: &Config, report: &mut ValidationReport) {
    let rl = &config.rate_limit;
    match &rl.redis_url {
        Some(url) => {
            if !(url.starts_with("redis://") || url.starts_with("rediss://")) {
                report.error(
                    "rateLimit.redisUrl",
                    "Distributed store URL must use the redis:// or rediss:// scheme",
                );
            }
        }
        None => {
            if rl.redis_token.is_some() {
                report.warn(
                    "rateLimit.redisToken",
                    "Token is set but no store URL; rate limiting stays in-process",
                );
            }
        }
    }
    if rl.redis_timeout_ms == 0 {
        report.error("rateLimit.redisTimeoutMs", "Timeout must be > 0");
    }
    if rl.memory_max_keys == 0 {
        report.error("rateLimit.memoryMaxKeys", "memoryMaxKeys must be >= 1");
    }
}

fn validate_llm(config: &Config, report: &mut ValidationReport) {
    let llm = &config.llm;
    if llm.api_key.is_none() {
        report.warn("llm.apiKey", "No LLM API key; the chatbot will answer with canned replies");
    }
    if llm.max_tokens == 0 {
        report.error("llm.maxTokens", "maxTokens must be > 0");
    }
    if !(0.0..=2.0).contains(&llm.temperature) {
        report.error("llm.temperature", "temperature must be between 0 and 2");
    }
}

fn validate_mail(config: &Config, report: &mut ValidationReport) {
    if config.mail.resend_api_key.is_none() {
        report.warn("mail.resendApiKey", "No email API key; outgoing email is only logged");
    } else if config.site.owner_email.is_none() {
        report.warn(
            "site.ownerEmail",
            "SITE_OWNER_EMAIL is unset; contact notifications have no recipient",
        );
    }
}

fn validate_github(config: &Config, report: &mut ValidationReport) {
    let github = &config.github;
    if github.username.is_none() {
        report.warn("github.username", "GITHUB_USERNAME is unset; activity endpoint is disabled");
    }
    if github.cache_ttl_secs == 0 {
        report.warn("github.cacheTtlSecs", "Activity responses will not be cached");
    }
}
