//! Error type for CLI runs.
//!
//! [`CompileError`] wraps everything that can stop a run. The `Lexical` and
//! `Parse` variants keep the source text so diagnostics can be rendered
//! with snippets by [`error_adapter`](crate::error_adapter).

use std::io;

use thiserror::Error;

use imperative_parser::ParseError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid tokens found by the batch lexical check
    #[error("{err}")]
    Lexical { err: ParseError, src: String },

    /// First syntax error
    #[error("{err}")]
    Parse { err: ParseError, src: String },

    /// Lexer-only mode saw invalid tokens; they were already listed.
    #[error("{count} invalid token(s) found")]
    InvalidTokens { count: usize },
}

impl CompileError {
    /// Create a new `Lexical` error with the associated source code.
    pub fn new_lexical_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Lexical {
            err,
            src: src.into(),
        }
    }

    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
