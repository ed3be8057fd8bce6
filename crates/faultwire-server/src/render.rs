use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use faultwire_core::{DocumentFormat, ErrorRepresentation, MediaType, codec, headers, media};
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::StatusCode;
use jiff::Timestamp;

/// A fully rendered error response, independent of any server framework
#[derive(Debug, Clone)]
pub struct RenderedError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RenderedError {
    /// Document format of the body, if one was rendered
    pub fn format(&self) -> Option<DocumentFormat> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(MediaType::parse)
            .and_then(|media| media.document_format())
    }
}

/// Render a representation for a caller accepting `accepted`
///
/// JSON wins over XML; when the caller accepts neither, the scalar fields
/// travel as headers and the body is empty.
pub fn render(rep: &ErrorRepresentation, accepted: &[MediaType]) -> RenderedError {
    let status = rep.status_code();

    if let Some(format) = media::negotiate(accepted) {
        match codec::encode(rep, format) {
            Ok(body) => {
                let mut headers = HeaderMap::new();
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(format.content_type()));
                return RenderedError {
                    status,
                    headers,
                    body: Bytes::from(body),
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, ?format, "failed to encode error body, falling back to headers");
            }
        }
    }

    let mut headers = HeaderMap::new();
    headers::write_headers(rep, Timestamp::now(), &mut headers);
    RenderedError {
        status,
        headers,
        body: Bytes::new(),
    }
}

impl IntoResponse for RenderedError {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use faultwire_core::headers::{ERROR_CODE, ERROR_CODE_INHERITED, ERROR_MESSAGE, ERROR_TIMESTAMP};

    use super::*;

    fn conflict() -> ErrorRepresentation {
        let mut rep = ErrorRepresentation::new(StatusCode::CONFLICT);
        rep.status_text = Some("Conflict".to_owned());
        rep.error_code = Some("PET_STORE:1234".to_owned());
        rep.message = Some("Pet already exists.".to_owned());
        rep
    }

    #[test]
    fn json_body_when_json_accepted() {
        let rendered = render(&conflict(), &MediaType::parse_list("application/json"));

        assert_eq!(rendered.status, StatusCode::CONFLICT);
        assert_eq!(rendered.headers[CONTENT_TYPE], "application/json");
        assert_eq!(rendered.format(), Some(DocumentFormat::Json));
        let body: serde_json::Value = serde_json::from_slice(&rendered.body).unwrap();
        assert_eq!(body["errorCode"], "PET_STORE:1234");
        assert_eq!(body["message"], "Pet already exists.");
        assert!(!rendered.headers.contains_key(&ERROR_CODE));
    }

    #[test]
    fn xml_body_when_only_xml_accepted() {
        let rendered = render(&conflict(), &MediaType::parse_list("text/xml;q=0.9, image/png"));

        assert_eq!(rendered.headers[CONTENT_TYPE], "application/xml");
        let body = std::str::from_utf8(&rendered.body).unwrap();
        assert!(body.contains("<errorCode>PET_STORE:1234</errorCode>"));
    }

    #[test]
    fn headers_only_for_other_media_types() {
        let rendered = render(&conflict(), &MediaType::parse_list("image/jpeg"));

        assert_eq!(rendered.status, StatusCode::CONFLICT);
        assert!(rendered.body.is_empty());
        assert!(!rendered.headers.contains_key(CONTENT_TYPE));
        assert_eq!(rendered.format(), None);
        assert_eq!(rendered.headers[&ERROR_CODE], "PET_STORE:1234");
        assert_eq!(rendered.headers[&ERROR_CODE_INHERITED], "false");
        assert_eq!(rendered.headers[&ERROR_MESSAGE], "Pet already exists.");
        assert!(rendered.headers.contains_key(&ERROR_TIMESTAMP));
    }

    #[test]
    fn empty_accept_list_is_header_only() {
        let rendered = render(&conflict(), &[]);
        assert!(rendered.body.is_empty());
    }

    #[test]
    fn out_of_range_status_renders_as_server_error() {
        let mut rep = conflict();
        rep.status = 42;
        let rendered = render(&rep, &[MediaType::any()]);
        assert_eq!(rendered.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
