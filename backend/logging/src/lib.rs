//! Structured logging components for folio.
//!
//! Handles subscriber setup, log redaction, and structured request events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogEntry, EventLogger, RequestEvent};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
