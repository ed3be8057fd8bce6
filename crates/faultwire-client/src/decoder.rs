use faultwire_config::ClientConfig;
use http::header::RETRY_AFTER;
use http::{HeaderMap, Method, StatusCode};
use jiff::Timestamp;

use crate::error::{ClientError, DecodedError, RetryableError};
use crate::parser::WireParser;
use crate::retry_after;

/// Turns error responses into decoded failures
#[derive(Debug, Clone, Default)]
pub struct ErrorDecoder {
    parser: WireParser,
}

impl ErrorDecoder {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            parser: WireParser::new(&config.default_charset),
        }
    }

    /// Decode a `reqwest` response for a request made with `method`
    ///
    /// A body that cannot be read is treated as empty.
    pub async fn decode(&self, method: Method, response: reqwest::Response) -> ClientError {
        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, %status, "failed to read error response body");
                bytes::Bytes::new()
            }
        };
        self.decode_parts(method, status, &headers, &body)
    }

    /// Decode an already-read response
    pub fn decode_parts(&self, method: Method, status: StatusCode, headers: &HeaderMap, body: &[u8]) -> ClientError {
        let representation = self.parser.parse(status, headers, body);
        let decoded = DecodedError::new(status, method, representation);

        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| retry_after::interpret(value, Timestamp::now()));

        match retry_after {
            Some(instant) => {
                tracing::debug!(%status, retry_after = %instant, "remote failure may be retried");
                ClientError::Retryable(RetryableError::new(instant, decoded))
            }
            None => ClientError::Decoded(decoded),
        }
    }
}

#[cfg(test)]
mod tests {
    use faultwire_core::Failure;
    use http::HeaderValue;
    use http::header::CONTENT_TYPE;

    use super::*;

    #[test]
    fn decodes_without_retry_hint() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = br#"{"status":404,"errorCode":"PET:404","message":"no pet 7"}"#;

        let error = ErrorDecoder::default().decode_parts(Method::GET, StatusCode::NOT_FOUND, &headers, body);

        let ClientError::Decoded(decoded) = &error else {
            panic!("expected decoded error, got {error:?}");
        };
        assert_eq!(decoded.status(), StatusCode::NOT_FOUND);
        assert_eq!(decoded.method(), Method::GET);
        assert_eq!(decoded.representation().error_code.as_deref(), Some("PET:404"));
        assert_eq!(error.to_string(), "GET request failed with 404 Not Found: no pet 7");
        assert_eq!(error.message().as_deref(), Some("no pet 7"));
        assert_eq!(error.retry_after(), None);
    }

    #[test]
    fn retry_hint_wraps_decoded_error() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Mon, 24 Dec 2007 18:21:00 GMT"));

        let error = ErrorDecoder::default().decode_parts(Method::POST, StatusCode::SERVICE_UNAVAILABLE, &headers, b"");

        let ClientError::Retryable(retryable) = &error else {
            panic!("expected retryable error, got {error:?}");
        };
        assert_eq!(retryable.retry_after(), "2007-12-24T18:21:00Z".parse::<Timestamp>().unwrap());
        assert_eq!(retryable.method(), Method::POST);
        assert_eq!(retryable.decoded().status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(error.cause().is_some());
        assert_eq!(error.representation().status, 503);
    }

    #[test]
    fn malformed_retry_hint_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("not-a-date"));

        let error = ErrorDecoder::default().decode_parts(Method::GET, StatusCode::TOO_MANY_REQUESTS, &headers, b"slow down");

        assert!(matches!(error, ClientError::Decoded(_)));
        assert_eq!(error.representation().message.as_deref(), Some("slow down"));
    }

    #[test]
    fn decoded_error_reports_remote_status() {
        let error = ErrorDecoder::default().decode_parts(Method::DELETE, StatusCode::GONE, &HeaderMap::new(), b"");

        let (status, _) = error.response_status().unwrap();
        assert_eq!(status, StatusCode::GONE);
        assert!(error.as_carries_representation().is_some());
    }
}
