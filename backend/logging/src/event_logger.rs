//! Request Event Logger
//!
//! Structured events for the request pipeline (rate-limit denials, validation
//! rejections, limiter fallbacks, collaborator failures) emitted on the
//! `request_events` tracing target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestEvent {
    RateLimited {
        identifier: String,
        limit: u32,
        retry_after_secs: u64,
    },
    ValidationRejected {
        fields: Vec<String>,
    },
    LimiterFallback {
        store: String,
        error: String,
    },
    CollaboratorFailed {
        service: String,
        error: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
    pub event: RequestEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Build the entry that [`EventLogger::log`] emits, with free text redacted.
    pub fn entry(endpoint: &str, mut event: RequestEvent) -> EventLogEntry {
        match &mut event {
            RequestEvent::LimiterFallback { error, .. }
            | RequestEvent::CollaboratorFailed { error, .. } => {
                *error = redact_sensitive_data(error);
            }
            RequestEvent::RateLimited { .. } | RequestEvent::ValidationRejected { .. } => {}
        }

        EventLogEntry {
            endpoint: endpoint.into(),
            timestamp: Utc::now(),
            event,
        }
    }

    /// Log a request pipeline event.
    pub fn log(endpoint: &str, event: RequestEvent) {
        let entry = Self::entry(endpoint, event);
        let payload = serde_json::to_string(&entry).unwrap_or_default();
        warn!(target: "request_events", endpoint = %entry.endpoint, event = %payload, "Request event");
    }
}
