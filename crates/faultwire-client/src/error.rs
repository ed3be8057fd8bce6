use std::borrow::Cow;
use std::fmt;

use faultwire_core::{CarriesRepresentation, ErrorRepresentation, Failure, StackFrame};
use http::{Method, StatusCode};
use jiff::Timestamp;

/// A remote failure decoded from an error response
///
/// Re-raising it locally keeps the remote representation intact: the
/// server side embeds it as the cause of whatever it builds next.
#[derive(Debug, Clone)]
pub struct DecodedError {
    status: StatusCode,
    method: Method,
    representation: ErrorRepresentation,
}

impl DecodedError {
    pub const fn new(status: StatusCode, method: Method, representation: ErrorRepresentation) -> Self {
        Self {
            status,
            method,
            representation,
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub const fn representation(&self) -> &ErrorRepresentation {
        &self.representation
    }

    pub fn into_representation(self) -> ErrorRepresentation {
        self.representation
    }
}

impl fmt::Display for DecodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} request failed with {}", self.method, self.status)?;
        if let Some(message) = &self.representation.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodedError {}

impl CarriesRepresentation for DecodedError {
    fn representation(&self) -> &ErrorRepresentation {
        &self.representation
    }
}

impl Failure for DecodedError {
    fn message(&self) -> Option<String> {
        self.representation.message.clone()
    }

    fn response_status(&self) -> Option<(StatusCode, Option<&str>)> {
        Some((self.status, self.representation.message.as_deref()))
    }

    fn as_carries_representation(&self) -> Option<&dyn CarriesRepresentation> {
        Some(self)
    }
}

/// A decoded failure the server asked the caller to retry later
#[derive(Debug, Clone)]
pub struct RetryableError {
    retry_after: Timestamp,
    source: DecodedError,
}

impl RetryableError {
    pub const fn new(retry_after: Timestamp, source: DecodedError) -> Self {
        Self { retry_after, source }
    }

    /// Earliest instant a retry should be attempted
    pub const fn retry_after(&self) -> Timestamp {
        self.retry_after
    }

    pub const fn method(&self) -> &Method {
        self.source.method()
    }

    pub const fn decoded(&self) -> &DecodedError {
        &self.source
    }
}

impl fmt::Display for RetryableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} request may be retried after {}", self.source.method, self.retry_after)
    }
}

impl std::error::Error for RetryableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl Failure for RetryableError {
    fn message(&self) -> Option<String> {
        self.source.message()
    }

    fn cause(&self) -> Option<&dyn Failure> {
        Some(&self.source)
    }

    fn response_status(&self) -> Option<(StatusCode, Option<&str>)> {
        self.source.response_status()
    }
}

/// Outcome of decoding an error response
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Decoded(DecodedError),

    #[error(transparent)]
    Retryable(RetryableError),
}

impl ClientError {
    /// The decoded failure, whether or not a retry was offered
    pub const fn decoded(&self) -> &DecodedError {
        match self {
            Self::Decoded(decoded) => decoded,
            Self::Retryable(retryable) => retryable.decoded(),
        }
    }

    pub const fn representation(&self) -> &ErrorRepresentation {
        self.decoded().representation()
    }

    pub const fn retry_after(&self) -> Option<Timestamp> {
        match self {
            Self::Decoded(_) => None,
            Self::Retryable(retryable) => Some(retryable.retry_after()),
        }
    }

    fn inner(&self) -> &dyn Failure {
        match self {
            Self::Decoded(decoded) => decoded,
            Self::Retryable(retryable) => retryable,
        }
    }
}

impl Failure for ClientError {
    fn type_name(&self) -> Cow<'_, str> {
        self.inner().type_name()
    }

    fn message(&self) -> Option<String> {
        self.inner().message()
    }

    fn stack_frames(&self) -> Option<Vec<StackFrame>> {
        self.inner().stack_frames()
    }

    fn cause(&self) -> Option<&dyn Failure> {
        self.inner().cause()
    }

    fn response_status(&self) -> Option<(StatusCode, Option<&str>)> {
        self.inner().response_status()
    }

    fn as_carries_representation(&self) -> Option<&dyn CarriesRepresentation> {
        self.inner().as_carries_representation()
    }
}
