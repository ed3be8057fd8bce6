use std::borrow::Cow;
use std::fmt;

use http::StatusCode;

use crate::representation::{ErrorRepresentation, StackFrame};

/// Type name used for sources whose concrete type cannot be observed
pub const OPAQUE_SOURCE_TYPE: &str = "std::error::Error";

/// A failure that can be turned into an [`ErrorRepresentation`]
///
/// Everything beyond `Display` is optional: the resolver falls back to
/// configured mappings for whatever a failure does not describe itself.
/// Capability views (`as_has_status`, ...) are how a failure advertises
/// that it is self-describing.
pub trait Failure: fmt::Debug + fmt::Display + Send + Sync {
    /// Fully qualified type name used for mapping and policy lookups
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(std::any::type_name::<Self>())
    }

    /// Ancestor type names, nearest first
    ///
    /// Rust has no inheritance, so hierarchies are declared: an enum
    /// variant can report its enum, a module-level error family, etc.
    fn supertypes(&self) -> Vec<Cow<'_, str>> {
        Vec::new()
    }

    /// Human-readable message; blank messages are treated as absent
    fn message(&self) -> Option<String> {
        Some(self.to_string())
    }

    /// Captured stack frames, innermost first
    fn stack_frames(&self) -> Option<Vec<StackFrame>> {
        None
    }

    /// Underlying failure, if any
    fn cause(&self) -> Option<&dyn Failure> {
        None
    }

    /// Status and reason of a framework response-status wrapper
    fn response_status(&self) -> Option<(StatusCode, Option<&str>)> {
        None
    }

    fn as_has_status(&self) -> Option<&dyn HasStatus> {
        None
    }

    fn as_has_error_code(&self) -> Option<&dyn HasErrorCode> {
        None
    }

    fn as_carries_representation(&self) -> Option<&dyn CarriesRepresentation> {
        None
    }
}

/// Failure that knows its own HTTP status
pub trait HasStatus {
    fn status(&self) -> StatusCode;
}

/// Failure that knows its own service-specific error code
pub trait HasErrorCode {
    fn error_code(&self) -> Option<&str>;
}

/// Failure that wraps a representation received from another service
pub trait CarriesRepresentation {
    fn representation(&self) -> &ErrorRepresentation;
}

impl<F: Failure + ?Sized> Failure for Box<F> {
    fn type_name(&self) -> Cow<'_, str> {
        (**self).type_name()
    }

    fn supertypes(&self) -> Vec<Cow<'_, str>> {
        (**self).supertypes()
    }

    fn message(&self) -> Option<String> {
        (**self).message()
    }

    fn stack_frames(&self) -> Option<Vec<StackFrame>> {
        (**self).stack_frames()
    }

    fn cause(&self) -> Option<&dyn Failure> {
        (**self).cause()
    }

    fn response_status(&self) -> Option<(StatusCode, Option<&str>)> {
        (**self).response_status()
    }

    fn as_has_status(&self) -> Option<&dyn HasStatus> {
        (**self).as_has_status()
    }

    fn as_has_error_code(&self) -> Option<&dyn HasErrorCode> {
        (**self).as_has_error_code()
    }

    fn as_carries_representation(&self) -> Option<&dyn CarriesRepresentation> {
        (**self).as_carries_representation()
    }
}

/// Framework wrapper that pins an explicit status onto a failure
#[derive(Debug)]
pub struct ResponseStatusError {
    status: StatusCode,
    reason: Option<String>,
    source: Option<Box<dyn Failure>>,
}

impl ResponseStatusError {
    pub const fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            source: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Failure + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for ResponseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} \"{reason}\"", self.status),
            None => write!(f, "{}", self.status),
        }
    }
}

impl std::error::Error for ResponseStatusError {}

impl Failure for ResponseStatusError {
    fn message(&self) -> Option<String> {
        self.reason.clone()
    }

    fn cause(&self) -> Option<&dyn Failure> {
        self.source.as_deref()
    }

    fn response_status(&self) -> Option<(StatusCode, Option<&str>)> {
        Some((self.status, self.reason.as_deref()))
    }
}
