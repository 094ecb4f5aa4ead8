//! Source location tracking shared by the lexer, parser and AST.
//!
//! A [`Span`] records where a single token came from: the 1-based line and
//! the inclusive 1-based column range on that line, counted in characters.
//! It also remembers the byte range of the lexeme so diagnostics can point
//! into the original source text.

use std::ops::Range;

/// The source extent of exactly one token.
///
/// Spans are immutable once created by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    line: usize,
    start: usize,
    end: usize,
    offset: usize,
    len: usize,
}

impl Span {
    /// Create a span for a lexeme on `line` covering columns `start..=end`
    /// and the bytes `bytes` of the source.
    pub fn new(line: usize, start: usize, end: usize, bytes: Range<usize>) -> Self {
        Self {
            line,
            start,
            end,
            offset: bytes.start,
            len: bytes.end.saturating_sub(bytes.start),
        }
    }

    /// The 1-based line the token starts on.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The 1-based column of the first character.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The 1-based column of the last character (inclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Byte offset of the lexeme in the source text.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the lexeme in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the lexeme is empty (only `EndOfFile`).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The byte range of the lexeme in the source text.
    pub fn byte_range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }

}
