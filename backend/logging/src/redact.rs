//! Log Redaction Layer
//!
//! Scrubs email addresses, API keys, and bearer tokens from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap());
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9]{20,})|(gsk_[a-zA-Z0-9]{20,})|(re_[a-zA-Z0-9_]{16,})|(ghp_[a-zA-Z0-9]{20,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    EMAIL_RE
        .replace_all(&redacted, "[REDACTED_EMAIL]")
        .into_owned()
}
