use std::sync::OnceLock;

use faultwire_core::headers::parse_http_date;
use jiff::{SignedDuration, Timestamp};
use regex::Regex;

fn delta_seconds() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:\.\d+)?$").expect("must be valid regex"))
}

/// Interpret a `Retry-After` value as an absolute instant
///
/// Accepts delta-seconds (a fractional part is truncated) or an HTTP
/// date. Anything else is treated as absent.
pub fn interpret(value: &str, now: Timestamp) -> Option<Timestamp> {
    let value = value.trim();

    if let Some(captures) = delta_seconds().captures(value) {
        let instant = captures[1]
            .parse::<i64>()
            .ok()
            .and_then(|secs| now.checked_add(SignedDuration::from_secs(secs)).ok());
        if instant.is_none() {
            tracing::debug!(retry_after = value, "retry-after delay out of range");
        }
        return instant;
    }

    let instant = parse_http_date(value);
    if instant.is_none() {
        tracing::debug!(retry_after = value, "ignoring unparseable retry-after");
    }
    instant
}
