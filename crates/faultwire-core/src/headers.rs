use http::header::{HeaderMap, HeaderName, HeaderValue};
use jiff::Timestamp;
use jiff::fmt::rfc2822;

use crate::representation::ErrorRepresentation;

/// Correlation id of the failure event
pub const ERROR_ID: HeaderName = HeaderName::from_static("x-error-id");
/// IMF-fixdate of the failure event, always GMT
pub const ERROR_TIMESTAMP: HeaderName = HeaderName::from_static("x-error-timestamp");
/// Service-specific error code
pub const ERROR_CODE: HeaderName = HeaderName::from_static("x-error-code");
/// `"true"` when the error code was inherited from a cause
pub const ERROR_CODE_INHERITED: HeaderName = HeaderName::from_static("x-error-code-inherited");
/// Human-readable message
pub const ERROR_MESSAGE: HeaderName = HeaderName::from_static("x-error-message");
/// Originating error type name
pub const ERROR_CLASS_NAME: HeaderName = HeaderName::from_static("x-error-class-name");
/// Name of the reporting service
pub const ERROR_APPLICATION: HeaderName = HeaderName::from_static("x-error-application");
/// Request path that triggered the failure
pub const ERROR_PATH: HeaderName = HeaderName::from_static("x-error-path");

/// Format a timestamp as an HTTP date, e.g. `Mon, 24 Dec 2007 18:21:00 GMT`
pub fn format_http_date(timestamp: Timestamp) -> Option<String> {
    rfc2822::DateTimePrinter::new()
        .timestamp_to_rfc9110_string(&timestamp)
        .ok()
}

/// Parse an HTTP date (RFC 9110 IMF-fixdate or RFC 2822)
pub fn parse_http_date(raw: &str) -> Option<Timestamp> {
    rfc2822::DateTimeParser::new().parse_timestamp(raw.trim()).ok()
}

/// Write the scalar fields of a representation as response headers
///
/// Absent fields produce no header. The timestamp header is always
/// written, stamped with `now` when the representation has none.
pub fn write_headers(rep: &ErrorRepresentation, now: Timestamp, headers: &mut HeaderMap) {
    if let Some(id) = &rep.id {
        insert_text(headers, ERROR_ID, id);
    }

    if let Some(date) = format_http_date(rep.timestamp.unwrap_or(now)) {
        insert_text(headers, ERROR_TIMESTAMP, &date);
    }

    if let Some(code) = &rep.error_code
        && insert_text(headers, ERROR_CODE, code)
    {
        let inherited = if rep.error_code_inherited { "true" } else { "false" };
        headers.insert(ERROR_CODE_INHERITED, HeaderValue::from_static(inherited));
    }

    let text_fields = [
        (ERROR_MESSAGE, &rep.message),
        (ERROR_CLASS_NAME, &rep.exception_type),
        (ERROR_APPLICATION, &rep.application),
        (ERROR_PATH, &rep.path),
    ];
    for (name, value) in text_fields {
        if let Some(value) = value {
            insert_text(headers, name, value);
        }
    }
}

/// Read the fixed headers back into a representation
///
/// `status` is left untouched; the caller owns the transport status.
pub fn read_headers(headers: &HeaderMap, rep: &mut ErrorRepresentation) {
    rep.id = header_text(headers, &ERROR_ID);
    rep.timestamp = header_text(headers, &ERROR_TIMESTAMP).and_then(|raw| parse_http_date(&raw));
    rep.error_code = header_text(headers, &ERROR_CODE).filter(|code| !code.is_empty());
    rep.error_code_inherited = rep.error_code.is_some()
        && header_text(headers, &ERROR_CODE_INHERITED).is_some_and(|v| v.eq_ignore_ascii_case("true"));
    rep.message = header_text(headers, &ERROR_MESSAGE);
    rep.exception_type = header_text(headers, &ERROR_CLASS_NAME);
    rep.application = header_text(headers, &ERROR_APPLICATION);
    rep.path = header_text(headers, &ERROR_PATH);
}

/// Whether any of the fixed error headers is present
pub fn has_error_headers(headers: &HeaderMap) -> bool {
    [
        &ERROR_ID,
        &ERROR_CODE,
        &ERROR_MESSAGE,
        &ERROR_CLASS_NAME,
        &ERROR_APPLICATION,
        &ERROR_PATH,
    ]
    .into_iter()
    .any(|name| headers.contains_key(name))
}

fn insert_text(headers: &mut HeaderMap, name: HeaderName, value: &str) -> bool {
    // Header values cannot carry control characters; UTF-8 travels as obs-text
    let sanitized: String = value
        .chars()
        .map(|c| if c.is_control() && c != '\t' { ' ' } else { c })
        .collect();
    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        return false;
    }

    match HeaderValue::from_bytes(sanitized.as_bytes()) {
        Ok(value) => {
            headers.insert(name, value);
            true
        }
        Err(e) => {
            tracing::debug!(header = %name, error = %e, "dropping unrepresentable error header");
            false
        }
    }
}

fn header_text(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}
