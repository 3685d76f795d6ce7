//! Redaction of credentials from messages before they are logged or shown.
//!
//! Backend errors frequently echo the request URL or an access token. Every
//! message that leaves the LLM layer passes through [`redact_error_message`].

use once_cell::sync::Lazy;
use regex::Regex;

/// URLs with embedded `user:password@` credentials.
static URL_WITH_CREDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(https?://)[^:@\s]+:[^@\s]+@").unwrap());

/// `Bearer <token>` fragments copied from request headers.
static BEARER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=-]+").unwrap());

/// Long alphanumeric runs that look like API keys or JWT segments.
static POTENTIAL_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_-])[A-Za-z0-9_-]{32,}(?:[^A-Za-z0-9_-]|$)").unwrap()
});

/// Remove credentials from a message while keeping enough context to debug.
#[must_use]
pub fn redact_error_message(message: &str) -> String {
    let redacted = URL_WITH_CREDS.replace_all(message, "$1[REDACTED]@");
    let redacted = BEARER_TOKEN.replace_all(&redacted, "$1[REDACTED]");
    let redacted = POTENTIAL_KEY.replace_all(&redacted, |caps: &regex::Captures<'_>| {
        // Keep the delimiter characters the pattern consumed on either side.
        let m = &caps[0];
        let lead = m
            .chars()
            .next()
            .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'));
        let trail = m
            .chars()
            .last()
            .filter(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'));
        let mut out = String::new();
        if let Some(c) = lead {
            out.push(c);
        }
        out.push_str("[REDACTED_KEY]");
        if let Some(c) = trail {
            out.push(c);
        }
        out
    });
    redacted.into_owned()
}
