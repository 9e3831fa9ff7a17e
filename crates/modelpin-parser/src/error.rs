//! Error and diagnostic system for modelpin.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - A failure category ([`ErrorKind`]) for every code
//! - The directive parameter and offending value
//! - Labeled spans into the raw directive text
//!
//! Every phase aborts on its first failure, so operations return a single
//! [`Diagnostic`] rather than a collection.
//!
//! # Example
//!
//! ```
//! # use modelpin_parser::error::{Diagnostic, ErrorCode};
//! # use modelpin_parser::Span;
//!
//! let diag = Diagnostic::error("`UINT16` is not a supported datatype")
//!     .with_code(ErrorCode::E009)
//!     .with_parameter("output_type")
//!     .with_value("UINT16")
//!     .with_label(Span::new(0..6), "unsupported datatype")
//!     .with_help("use one of FP32, FP16, UINT8");
//! ```

mod diagnostic;
mod error_code;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::{ErrorCode, ErrorKind};

/// A type alias for `Result<T, Diagnostic>`
pub type Result<T> = std::result::Result<T, Diagnostic>;
