//! Admin session registry.
//!
//! Tracks issued bearer tokens and their expiry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub token: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Manages active admin sessions.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, AdminSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new session for `email` that lasts `ttl`. Expired sessions
    /// are swept first.
    pub async fn create(&self, email: &str, ttl: Duration) -> AdminSession {
        let now = Utc::now();
        let session = AdminSession {
            token: Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            expires_at: now + ttl,
        };
        let mut w = self.sessions.write().await;
        purge_expired(&mut w, now);
        w.insert(session.token.clone(), session.clone());
        session
    }

    /// Look up a live session. Expired sessions are dropped on sight.
    pub async fn validate(&self, token: &str) -> Option<AdminSession> {
        let now = Utc::now();
        {
            let r = self.sessions.read().await;
            match r.get(token) {
                Some(session) if session.expires_at > now => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut w = self.sessions.write().await;
        w.remove(token);
        None
    }

    /// End a session. Returns whether it existed.
    pub async fn revoke(&self, token: &str) -> bool {
        let mut w = self.sessions.write().await;
        w.remove(token).is_some()
    }
}

fn purge_expired(sessions: &mut HashMap<String, AdminSession>, now: DateTime<Utc>) {
    sessions.retain(|_, session| session.expires_at > now);
}
