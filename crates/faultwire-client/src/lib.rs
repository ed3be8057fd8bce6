#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Client side of the error protocol
//!
//! Parses error responses back into representations and decides whether
//! a failure carries a retry hint.

mod decoder;
pub mod error;
mod parser;
pub mod retry_after;

pub use decoder::ErrorDecoder;
pub use error::{ClientError, DecodedError, RetryableError};
pub use parser::WireParser;
