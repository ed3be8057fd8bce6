use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use faultwire_core::{Failure, Fault, HandlerInfo, MediaType, RequestContext, ResponseStatusError, headers};
use http::StatusCode;
use http::header::CONTENT_TYPE;

use crate::ErrorResponder;

/// Largest framework error body read back as a reason phrase
const FRAMEWORK_BODY_LIMIT: usize = 64 * 1024;

/// Error type for axum handlers
///
/// Wraps any [`Failure`]. Rendering needs the request context, so the
/// response produced here only parks the failure; [`error_middleware`]
/// turns it into the negotiated error response.
#[derive(Debug)]
pub struct ApiError {
    failure: Box<dyn Failure>,
    handler: Option<HandlerInfo>,
}

impl ApiError {
    pub fn new(failure: impl Failure + 'static) -> Self {
        Self {
            failure: Box::new(failure),
            handler: None,
        }
    }

    /// Wrap an `anyhow` error, keeping its context chain as causes
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        Self::new(Fault::from_anyhow(error))
    }

    /// Record the handler that raised the failure
    #[must_use]
    pub fn handled_by(mut self, handler: HandlerInfo) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn failure(&self) -> &dyn Failure {
        self.failure.as_ref()
    }

    pub const fn handler(&self) -> Option<&HandlerInfo> {
        self.handler.as_ref()
    }
}

impl<F: Failure + 'static> From<F> for ApiError {
    fn from(failure: F) -> Self {
        Self::new(failure)
    }
}

/// A failure waiting in response extensions for [`error_middleware`]
#[derive(Debug, Clone)]
pub struct PendingFailure(pub Arc<ApiError>);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(PendingFailure(Arc::new(self)));
        response
    }
}

/// Middleware rendering handler failures as error representations
///
/// Captures the request context before dispatch. Afterwards, a parked
/// [`ApiError`] is rendered, and so is a bare error status produced by
/// the framework itself (unmatched route, extractor rejection).
pub async fn error_middleware(State(responder): State<ErrorResponder>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let ctx = RequestContext::from_parts(&parts, responder.correlation_header());

    let response = next.run(Request::from_parts(parts, body)).await;

    if let Some(PendingFailure(pending)) = response.extensions().get::<PendingFailure>().cloned() {
        let ctx = match pending.handler() {
            Some(handler) => ctx.with_handler(handler.clone()),
            None => ctx,
        };
        return responder.respond(pending.failure(), &ctx);
    }

    if is_framework_error(&response) {
        let status = response.status();
        let reason = match axum::body::to_bytes(response.into_body(), FRAMEWORK_BODY_LIMIT).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_owned(),
            Err(e) => {
                tracing::debug!(error = %e, "could not read framework error body");
                String::new()
            }
        };

        let mut failure = ResponseStatusError::new(status);
        if !reason.is_empty() {
            failure = failure.with_reason(reason);
        }
        return responder.respond(&failure, &ctx);
    }

    response
}

/// Error status with a plain or empty body that no failure describes yet
fn is_framework_error(response: &Response<Body>) -> bool {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || headers::has_error_headers(response.headers()) {
        return false;
    }

    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(MediaType::parse)
        .is_none_or(|media| media.kind() == "text" && media.subtype() == "plain")
}
