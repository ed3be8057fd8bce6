#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Server side of the error protocol
//!
//! Resolves status, code, and message for a failure, builds the
//! representation of its cause chain, and renders it for the caller.

mod builder;
mod metadata;
mod render;
mod resolver;
mod response;

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use faultwire_config::{Config, FieldPolicy};
use faultwire_core::{ErrorRepresentation, Failure, RequestContext};

pub use builder::{RepresentationBuilder, reconfigure};
pub use metadata::{DeclaredMetadata, DeclaredStatus, MetadataTarget, NoMetadata, StaticMetadata};
pub use render::{RenderedError, render};
pub use resolver::{ResolvedMeta, Resolver};
pub use response::{ApiError, PendingFailure, error_middleware};

/// Turns failures into rendered error responses
///
/// Cheap to clone; all state is shared and read-only.
#[derive(Debug, Clone)]
pub struct ErrorResponder {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: Arc<Config>,
    builder: RepresentationBuilder,
}

impl ErrorResponder {
    /// Create a responder using the declared metadata tables from `config`
    pub fn new(config: Config) -> Self {
        let metadata = StaticMetadata::from(&config.metadata);
        Self::with_metadata(config, metadata)
    }

    /// Create a responder with a custom declared-metadata lookup
    pub fn with_metadata(config: Config, metadata: impl DeclaredMetadata + 'static) -> Self {
        let config = Arc::new(config);
        let resolver = Resolver::new(config.clone(), Arc::new(metadata));
        Self {
            inner: Arc::new(Inner {
                builder: RepresentationBuilder::new(config.clone(), resolver),
                config,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Header carrying the caller's correlation id
    pub fn correlation_header(&self) -> Option<&str> {
        self.inner.config.correlation_header.as_deref()
    }

    /// Build the representation of a failure
    pub fn build(&self, failure: &dyn Failure, ctx: &RequestContext) -> ErrorRepresentation {
        self.inner.builder.build(failure, ctx)
    }

    /// Copy a representation under a field policy
    pub fn reconfigure(&self, rep: &ErrorRepresentation, policy: &FieldPolicy) -> ErrorRepresentation {
        reconfigure(rep, policy, self.inner.config.max_cause_depth)
    }

    /// Build and render a failure for the caller described by `ctx`
    pub fn render(&self, failure: &dyn Failure, ctx: &RequestContext) -> RenderedError {
        let rep = self.build(failure, ctx);
        if rep.status_code().is_server_error() {
            tracing::warn!(
                status = rep.status,
                error_code = rep.error_code.as_deref(),
                failure = %failure.type_name(),
                path = %ctx.path,
                "request failed: {failure}"
            );
        } else {
            tracing::debug!(
                status = rep.status,
                error_code = rep.error_code.as_deref(),
                failure = %failure.type_name(),
                path = %ctx.path,
                "request rejected: {failure}"
            );
        }
        render(&rep, &ctx.accepted)
    }

    /// Build and render a failure as an axum response
    pub fn respond(&self, failure: &dyn Failure, ctx: &RequestContext) -> Response {
        self.render(failure, ctx).into_response()
    }
}

#[cfg(test)]
mod tests {
    use faultwire_config::DeclaredEntry;
    use faultwire_core::{DocumentFormat, Fault, HandlerInfo, MediaType};
    use http::StatusCode;

    use super::*;

    #[test]
    fn declared_metadata_comes_from_config() {
        let mut config = Config::default();
        config.metadata.types.insert(
            "pets::PetNotFound".to_owned(),
            DeclaredEntry {
                status: Some(404),
                reason: Some("No such pet".to_owned()),
                error_code: Some("PET:404".to_owned()),
            },
        );
        let responder = ErrorResponder::new(config);

        let rep = responder.build(&Fault::new("pets::PetNotFound"), &RequestContext::new("/pets/7"));

        assert_eq!(rep.status, 404);
        assert_eq!(rep.error_code.as_deref(), Some("PET:404"));
    }

    #[test]
    fn render_negotiates_format() {
        let responder = ErrorResponder::new(Config::default());
        let ctx = RequestContext::new("/pets")
            .with_accepted(MediaType::parse_list("application/xml"))
            .with_handler(HandlerInfo::new("pets::PetHandler", "list"));

        let rendered = responder.render(&Fault::new("pets::Broken").with_status(StatusCode::BAD_GATEWAY), &ctx);

        assert_eq!(rendered.status, StatusCode::BAD_GATEWAY);
        assert_eq!(rendered.format(), Some(DocumentFormat::Xml));
    }

    #[test]
    fn reconfigure_uses_configured_depth() {
        let config = Config {
            max_cause_depth: 1,
            ..Config::default()
        };
        let responder = ErrorResponder::new(config);
        let mut rep = ErrorRepresentation::new(StatusCode::BAD_GATEWAY);
        rep.cause = Some(Box::new(ErrorRepresentation::new(StatusCode::NOT_FOUND)));

        let copy = responder.reconfigure(&rep, &FieldPolicy::all());
        assert_eq!(copy.cause_depth(), 0);
    }
}
