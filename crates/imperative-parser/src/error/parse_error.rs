//! The error type returned by the lexing and parsing entry points.

use std::fmt;

use crate::{error::Diagnostic, span::Span};

/// One or more diagnostics produced while checking or parsing a source.
///
/// Syntax errors carry exactly one diagnostic (parsing stops at the first
/// one); the batch lexical check may carry many.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Get all diagnostics in this error.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Message of the first diagnostic.
    pub fn message(&self) -> &str {
        self.diagnostics.first().map_or("", Diagnostic::message)
    }

    /// 1-based line of the first diagnostic's primary label, or 0 if unknown.
    pub fn line(&self) -> usize {
        self.first_span().map_or(0, |span| span.line())
    }

    /// 1-based column of the first diagnostic's primary label, or 0 if unknown.
    pub fn column(&self) -> usize {
        self.first_span().map_or(0, |span| span.start())
    }

    fn first_span(&self) -> Option<Span> {
        self.diagnostics.first().and_then(Diagnostic::primary_span)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{first}")?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostics: vec![diagnostic],
        }
    }
}

impl From<Vec<Diagnostic>> for ParseError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }
}
