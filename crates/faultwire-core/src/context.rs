use http::HeaderMap;
use http::request::Parts;

use crate::media::{MediaType, accepted_types};
use crate::representation::HandlerInfo;

/// Request facts needed to describe a failure
///
/// Built by the host before dispatch so that error rendering does not
/// need access to the original request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Request path (no query string)
    pub path: String,
    /// Media types the caller accepts, in header order
    pub accepted: Vec<MediaType>,
    /// Correlation id supplied by the caller, if any
    pub correlation_id: Option<String>,
    /// Handler that was serving the request
    pub handler: Option<HandlerInfo>,
}

impl RequestContext {
    /// Context for a request path that accepts anything
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            accepted: vec![MediaType::any()],
            correlation_id: None,
            handler: None,
        }
    }

    /// Build from HTTP request parts
    ///
    /// `correlation_header` names the header carrying the caller's
    /// correlation id.
    pub fn from_parts(parts: &Parts, correlation_header: Option<&str>) -> Self {
        Self {
            path: parts.uri.path().to_owned(),
            accepted: accepted_types(&parts.headers),
            correlation_id: correlation_header.and_then(|name| header_value(&parts.headers, name)),
            handler: None,
        }
    }

    #[must_use]
    pub fn with_accepted(mut self, accepted: Vec<MediaType>) -> Self {
        self.accepted = accepted;
        self
    }

    #[must_use]
    pub fn with_handler(mut self, handler: HandlerInfo) -> Self {
        self.handler = Some(handler);
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use crate::media::{DocumentFormat, negotiate};

    use super::*;

    #[test]
    fn from_parts_reads_path_accept_and_correlation() {
        let (parts, ()) = http::Request::builder()
            .uri("/api/pets/7?verbose=true")
            .header("accept", "application/xml")
            .header("x-request-id", " req-42 ")
            .body(())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_parts(&parts, Some("x-request-id"));

        assert_eq!(ctx.path, "/api/pets/7");
        assert_eq!(negotiate(&ctx.accepted), Some(DocumentFormat::Xml));
        assert_eq!(ctx.correlation_id.as_deref(), Some("req-42"));
        assert!(ctx.handler.is_none());
    }

    #[test]
    fn correlation_header_is_optional() {
        let (parts, ()) = http::Request::builder()
            .uri("/")
            .header("x-request-id", "req-42")
            .body(())
            .unwrap()
            .into_parts();

        assert!(RequestContext::from_parts(&parts, None).correlation_id.is_none());
    }
}
