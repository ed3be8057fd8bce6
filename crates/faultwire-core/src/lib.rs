#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Cross-service error representation
//!
//! Defines the wire model exchanged between services, the capability
//! traits a failure uses to describe itself, and the JSON/XML/header
//! encodings shared by the server and client sides.

mod backtrace;
pub mod codec;
mod context;
mod failure;
mod fault;
pub mod headers;
pub mod media;
mod representation;

pub use backtrace::{frames_from_backtrace, parse_backtrace};
pub use codec::CodecError;
pub use context::RequestContext;
pub use failure::{CarriesRepresentation, Failure, HasErrorCode, HasStatus, OPAQUE_SOURCE_TYPE, ResponseStatusError};
pub use fault::Fault;
pub use media::{DocumentFormat, MediaType};
pub use representation::{DEFAULT_STATUS, ErrorRepresentation, HandlerInfo, StackFrame, status_text};
