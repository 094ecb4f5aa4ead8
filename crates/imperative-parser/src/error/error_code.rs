//! Error codes for lexical and syntax diagnostics.
//!
//! - `E0xx` - Lexer errors
//! - `E1xx` - Parser errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// Malformed number literal.
    ///
    /// A digit run contained a second decimal point, ran straight into
    /// letters, or does not fit the literal's type.
    E001,

    /// Unexpected character.
    ///
    /// One or more characters that cannot start any token.
    E002,

    // =========================================================================
    // Parser Errors (E1xx)
    // =========================================================================
    /// Unexpected token.
    E100,

    /// Unexpected end of input.
    ///
    /// The input ended in the middle of a declaration, statement or expression.
    E101,

    /// Unclosed block.
    ///
    /// A `routine`, `record`, `if`, `while` or `for` block is missing its `end`.
    E102,

    /// Nesting too deep.
    ///
    /// Statements, types or expressions are nested more deeply than the
    /// parser's limit.
    E103,
}

impl ErrorCode {
    /// Returns the code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "malformed number literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "unexpected end of input",
            ErrorCode::E102 => "unclosed block",
            ErrorCode::E103 => "nesting too deep",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
