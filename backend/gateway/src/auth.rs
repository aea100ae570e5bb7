//! Admin authentication.
//!
//! Credentials come from configuration (email + Argon2 PHC password hash). A
//! successful login issues a bearer token tracked by [`SessionRegistry`];
//! admin routes take [`RequireAdmin`] to demand one.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use chrono::Duration;
use subtle::ConstantTimeEq;
use tracing::{error, warn};

use folio_config::AdminConfig;

use crate::error::ApiError;
use crate::session_registry::AdminSession;
use crate::state::GatewayState;

const MAX_SESSION_TTL_SECS: u64 = 365 * 86_400;

/// The single admin account.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    email: String,
    password_hash: String,
    session_ttl: Duration,
}

impl AdminCredentials {
    /// `password_hash` is a PHC string such as `$argon2id$v=19$...`.
    pub fn new(email: &str, password_hash: &str, session_ttl_secs: u64) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            password_hash: password_hash.trim().to_string(),
            session_ttl: Duration::seconds(session_ttl_secs.min(MAX_SESSION_TTL_SECS) as i64),
        }
    }

    /// `None` unless both email and password hash are configured.
    pub fn from_config(config: &AdminConfig) -> Option<Self> {
        match (&config.email, &config.password_hash) {
            (Some(email), Some(hash)) => Some(Self::new(email, hash, config.session_ttl_secs)),
            _ => None,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// `email` is expected already normalized to lowercase.
    ///
    /// CPU-bound; call from a blocking context.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        let email_ok: bool = email.as_bytes().ct_eq(self.email.as_bytes()).into();
        let password_ok = verify_password(password, &self.password_hash);
        email_ok & password_ok
    }
}

/// Hash `password` with Argon2id and a random salt, as a PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!(error = %e, "Configured admin password hash is not a valid PHC string");
            return false;
        }
    };
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => true,
        Err(argon2::password_hash::Error::Password) => false,
        Err(e) => {
            error!(error = %e, "Admin password verification failed");
            false
        }
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extractor that admits only requests carrying a live admin session.
pub struct RequireAdmin(pub AdminSession);

#[async_trait]
impl FromRequestParts<GatewayState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &GatewayState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers).map(str::to_string) else {
            warn!("Missing or invalid Authorization header");
            return Err(ApiError::Unauthorized);
        };

        match state.sessions.validate(&token).await {
            Some(session) => Ok(RequireAdmin(session)),
            None => {
                warn!("Unknown or expired admin token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_hash::cheap_hash;
    use super::*;

    #[test]
    fn hashes_are_salted_argon2id_phc_strings() {
        let first = hash_password("password").unwrap();
        let second = hash_password("password").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(verify_password("password", &first));
        assert!(!verify_password("passw0rd", &first));
    }

    #[test]
    fn verify_checks_email_and_password() {
        let creds = AdminCredentials::new("Admin@Example.com", &cheap_hash("hunter22"), 60);
        assert!(creds.verify("admin@example.com", "hunter22"));
        assert!(!creds.verify("admin@example.com", "hunter2"));
        assert!(!creds.verify("other@example.com", "hunter22"));
        assert!(!creds.verify("admin@example.co", "hunter22"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let sha256_hex = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";
        let creds = AdminCredentials::new("admin@example.com", sha256_hex, 60);
        assert!(!creds.verify("admin@example.com", "password"));
    }

    #[test]
    fn from_config_requires_both_parts() {
        let mut config = AdminConfig {
            email: Some("admin@example.com".into()),
            ..AdminConfig::default()
        };
        assert!(AdminCredentials::from_config(&config).is_none());
        config.password_hash = Some(cheap_hash("pw"));
        let creds = AdminCredentials::from_config(&config).unwrap();
        assert_eq!(creds.session_ttl(), Duration::seconds(86_400));
        assert!(creds.verify("admin@example.com", "pw"));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(AUTHORIZATION, "Bearer tok123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("tok123"));
    }
}
