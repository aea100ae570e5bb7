//! `folio-config`: runtime configuration for the folio backend.
//!
//! Provides:
//! - Typed config schema with defaults for every section
//! - Loading from process environment variables (or an explicit map in tests)
//! - One-pass validation producing errors and warnings with field paths
//! - Redaction for safe logging/display

pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{load_from_env, ConfigError};
pub use redact::{collect_redacted_paths, redact, redact_config};
pub use schema::{
    AdminConfig, Config, GithubConfig, LlmConfig, LoggingConfig, MailConfig, RateLimitConfig,
    ServerConfig, SiteConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};

/// Load config from the environment, validate it, and log every finding.
///
/// This is the main entry point for loading a config at runtime. Validation
/// errors are returned as an error only when `strict` is set.
pub fn load_and_validate(strict: bool) -> Result<(Config, ValidationReport)> {
    let config = load_from_env().context("Failed to read configuration from environment")?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    if strict && !report.is_valid() {
        anyhow::bail!("configuration has {} error(s)", report.errors.len());
    }

    Ok((config, report))
}
