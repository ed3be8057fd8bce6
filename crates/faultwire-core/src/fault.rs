use std::borrow::Cow;
use std::fmt;

use http::StatusCode;

use crate::backtrace::frames_from_backtrace;
use crate::failure::{Failure, HasErrorCode, HasStatus, OPAQUE_SOURCE_TYPE};
use crate::representation::StackFrame;

/// Owned failure snapshot
///
/// Useful for describing failures that do not implement [`Failure`]
/// themselves, such as plain `std::error::Error` chains or `anyhow`
/// errors, and for building failures by hand.
#[derive(Debug, Clone)]
pub struct Fault {
    type_name: String,
    supertypes: Vec<String>,
    message: Option<String>,
    status: Option<StatusCode>,
    error_code: Option<String>,
    stack_frames: Option<Vec<StackFrame>>,
    cause: Option<Box<Fault>>,
}

impl Fault {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            supertypes: Vec::new(),
            message: None,
            status: None,
            error_code: None,
            stack_frames: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_supertype(mut self, type_name: impl Into<String>) -> Self {
        self.supertypes.push(type_name.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_stack_frames(mut self, frames: Vec<StackFrame>) -> Self {
        self.stack_frames = Some(frames);
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Snapshot a typed error and its `source()` chain
    ///
    /// The outermost fault gets the concrete type name of `E`; sources are
    /// only visible as trait objects and get [`OPAQUE_SOURCE_TYPE`].
    pub fn capture<E: std::error::Error + 'static>(error: &E) -> Self {
        let mut fault = Self::from_dyn(error, MAX_CAPTURE_DEPTH);
        fault.type_name = std::any::type_name::<E>().to_owned();
        fault
    }

    /// Snapshot an `anyhow` error chain including its backtrace, if captured
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let root: &(dyn std::error::Error + 'static) = error.as_ref();
        let mut fault = Self::from_dyn(root, MAX_CAPTURE_DEPTH);
        let frames = frames_from_backtrace(error.backtrace());
        if !frames.is_empty() {
            fault.stack_frames = Some(frames);
        }
        fault
    }

    fn from_dyn(error: &(dyn std::error::Error + 'static), max_depth: usize) -> Self {
        let mut links = Vec::new();
        let mut current = Some(error);
        while let Some(err) = current {
            if links.len() == max_depth {
                tracing::warn!(max_depth, "error source chain truncated");
                break;
            }
            links.push(Self::new(OPAQUE_SOURCE_TYPE).with_message(err.to_string()));
            current = err.source();
        }

        // Rebuild from the innermost link outwards
        let mut chain: Option<Self> = None;
        while let Some(mut link) = links.pop() {
            link.cause = chain.map(Box::new);
            chain = Some(link);
        }
        chain.unwrap_or_else(|| Self::new(OPAQUE_SOURCE_TYPE))
    }
}

/// Upper bound on `source()` links captured into a [`Fault`]
const MAX_CAPTURE_DEPTH: usize = 64;

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str(&self.type_name),
        }
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl Failure for Fault {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.type_name)
    }

    fn supertypes(&self) -> Vec<Cow<'_, str>> {
        self.supertypes.iter().map(|s| Cow::Borrowed(s.as_str())).collect()
    }

    fn message(&self) -> Option<String> {
        self.message.clone()
    }

    fn stack_frames(&self) -> Option<Vec<StackFrame>> {
        self.stack_frames.clone()
    }

    fn cause(&self) -> Option<&dyn Failure> {
        self.cause.as_deref().map(|c| c as &dyn Failure)
    }

    fn as_has_status(&self) -> Option<&dyn HasStatus> {
        self.status.is_some().then_some(self as &dyn HasStatus)
    }

    fn as_has_error_code(&self) -> Option<&dyn HasErrorCode> {
        self.error_code.is_some().then_some(self as &dyn HasErrorCode)
    }
}

impl HasStatus for Fault {
    fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl HasErrorCode for Fault {
    fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }
}
