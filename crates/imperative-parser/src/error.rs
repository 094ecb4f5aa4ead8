//! Diagnostics for the lexing and parsing pipeline.
//!
//! The error system is built around [`Diagnostic`]: a single error message
//! with an optional [`ErrorCode`], labelled source spans and optional
//! help text. One or more diagnostics are wrapped in [`ParseError`], which is
//! what the public entry points return.
//!
//! # Example
//!
//! ```
//! # use imperative_parser::error::{Diagnostic, ErrorCode};
//! # use imperative_parser::Span;
//!
//! let found = Span::new(4, 1, 1, 40..40);
//! let opened = Span::new(1, 1, 7, 0..7);
//!
//! let diag = Diagnostic::error("expected `end`, found end of input")
//!     .with_code(ErrorCode::E102)
//!     .with_label(found, "block is not closed")
//!     .with_secondary_label(opened, "`routine` block opened here")
//!     .with_help("add `end` to close the block");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
