//! Folio runtime configuration schema.
//!
//! Every section has a `Default` that yields a runnable local setup: in-memory
//! rate limiting, log-only email, canned chatbot replies.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    /// SQLite database path for the content store.
    pub database_path: String,
    pub site: SiteConfig,
    pub admin: AdminConfig,
    pub rate_limit: RateLimitConfig,
    pub llm: LlmConfig,
    pub mail: MailConfig,
    pub github: GithubConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Allowed CORS origins. Empty means same-origin only.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling JSON log files. Console only when unset.
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

/// Details about the site owner used in emails and the chatbot prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub owner_name: String,
    /// Recipient of contact-form notifications.
    pub owner_email: Option<String>,
    /// Sender address for outgoing email.
    pub from_email: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            owner_name: "Portfolio Owner".to_string(),
            owner_email: None,
            from_email: "Portfolio <noreply@example.com>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    pub email: Option<String>,
    /// Argon2 PHC string of the admin password (`$argon2id$v=19$...`).
    pub password_hash: Option<String>,
    pub session_ttl_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: None,
            password_hash: None,
            session_ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    /// Distributed store URL (`redis://` or `rediss://`). In-memory only when unset.
    pub redis_url: Option<String>,
    /// Access token for the distributed store, sent as the connection password.
    pub redis_token: Option<String>,
    pub redis_timeout_ms: u64,
    /// Upper bound on identifiers tracked by the in-memory store.
    pub memory_max_keys: usize,
    /// How long checks stay on the in-memory store after a distributed failure.
    pub fallback_cooldown_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            redis_token: None,
            redis_timeout_ms: 500,
            memory_max_keys: 10_000,
            fallback_cooldown_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL (chat completions live at `{base_url}/chat/completions`).
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MailConfig {
    pub resend_api_key: Option<String>,
    pub api_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            api_url: "https://api.resend.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GithubConfig {
    pub username: Option<String>,
    pub token: Option<String>,
    pub api_url: String,
    pub cache_ttl_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            username: None,
            token: None,
            api_url: "https://api.github.com".to_string(),
            cache_ttl_secs: 600,
        }
    }
}
