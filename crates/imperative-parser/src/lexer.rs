//! Lexical analyzer for imperative-language source text.
//!
//! [`Lexer`] is a hand-written scanner that produces one [`PositionedToken`]
//! per call to [`Lexer::next_token`]. It never fails: malformed input comes
//! back as [`Token::Invalid`] carrying the offending text, so callers can
//! collect every lexical problem in one pass (see [`check_lexical`]) before
//! deciding whether to parse.

use std::num::{ParseFloatError, ParseIntError};

use log::{debug, trace};
use thiserror::Error;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Starts a line comment that runs up to (not including) the newline.
const COMMENT_MARKER: char = '#';

/// Why a digit-initial lexeme could not become a number literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("more than one decimal point")]
    MultipleDecimalPoints,

    #[error("non-digit characters directly after a number")]
    InvalidSuffix,

    #[error("integer literal out of range: {0}")]
    IntegerOutOfRange(#[from] ParseIntError),

    #[error("real literal is not representable: {0}")]
    InvalidReal(#[from] ParseFloatError),

    #[error("real literal out of range")]
    RealOutOfRange,
}

/// Convert the text of a scanned number run into a literal token.
///
/// The text may contain a trailing identifier-like suffix or several dots;
/// both are reported as [`NumberError`]s rather than split into tokens.
pub fn parse_number(lexeme: &str) -> Result<Token<'_>, NumberError> {
    if lexeme.chars().any(|c| !c.is_ascii_digit() && c != '.') {
        return Err(NumberError::InvalidSuffix);
    }

    match lexeme.matches('.').count() {
        0 => Ok(Token::IntegerLiteral(lexeme.parse::<i64>()?)),
        1 => {
            let value = lexeme.parse::<f64>()?;
            if !value.is_finite() {
                return Err(NumberError::RealOutOfRange);
            }
            Ok(Token::RealLiteral(value))
        }
        _ => Err(NumberError::MultipleDecimalPoints),
    }
}

fn is_operator_start(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | ':' | '=' | '<' | '>' | '.' | ',' | '(' | ')' | '[' | ']'
    )
}

fn is_valid_start(c: char) -> bool {
    c.is_ascii_digit() || c.is_alphabetic() || c.is_whitespace() || is_operator_start(c)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Scanner over a source string.
///
/// A single `Lexer` owns its cursor; drive it from one call site only.
#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source: &'src str,
    /// Byte offset of the next unread character.
    pos: usize,
    /// 1-based line of the next unread character.
    line: usize,
    /// 1-based column (in characters) of the next unread character.
    column: usize,
    /// Set once the iterator has handed out `EndOfFile`.
    exhausted: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            exhausted: false,
        }
    }

    /// Scan and return the next token.
    ///
    /// Once the input is exhausted every call returns `EndOfFile` positioned
    /// at the end of the input.
    pub fn next_token(&mut self) -> PositionedToken<'src> {
        self.skip_trivia();

        let start_pos = self.pos;
        let start_line = self.line;
        let start_column = self.column;

        let token = match self.peek() {
            None => Token::EndOfFile,
            Some('\n') => {
                self.bump();
                let span = Span::new(start_line, start_column, start_column, start_pos..self.pos);
                self.line += 1;
                self.column = 1;
                return self.finish_token(Token::EndOfLine, start_pos, span);
            }
            Some(c) if c.is_ascii_digit() => self.scan_number(),
            Some(c) if c.is_alphabetic() => self.scan_word(),
            Some(c) if is_operator_start(c) => self.scan_operator(c),
            Some(_) => self.scan_invalid(),
        };

        let width = self.column - start_column;
        let end_column = start_column + width.saturating_sub(1);
        let span = Span::new(start_line, start_column, end_column, start_pos..self.pos);
        self.finish_token(token, start_pos, span)
    }

    fn finish_token(
        &self,
        token: Token<'src>,
        start_pos: usize,
        span: Span,
    ) -> PositionedToken<'src> {
        let lexeme = &self.source[start_pos..self.pos];
        trace!(
            kind = token.name(),
            line = span.line(),
            column = span.start();
            "Scanned token"
        );
        PositionedToken::new(token, lexeme, span)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Consume one character on the current line.
    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.column += 1;
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    /// Skip whitespace (except newlines) and comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some('\n') | None => return,
                Some(COMMENT_MARKER) => self.bump_while(|c| c != '\n'),
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some(_) => return,
            }
        }
    }

    /// Digits with at most one interior decimal point.
    ///
    /// Stops before `..` so that `1..10` lexes as a range. A second dot or a
    /// letter suffix keeps the whole run together as one invalid token.
    fn scan_number(&mut self) -> Token<'src> {
        let start = self.pos;

        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    self.bump();
                }
                Some('.') if self.peek_second() != Some('.') => {
                    self.bump();
                }
                _ => break,
            }
        }
        self.bump_while(is_word_char);

        let lexeme = &self.source[start..self.pos];
        parse_number(lexeme).unwrap_or(Token::Invalid(lexeme))
    }

    /// Identifier, keyword, boolean literal or dotted record path.
    fn scan_word(&mut self) -> Token<'src> {
        let start = self.pos;
        self.bump_while(is_word_char);

        let mut dotted = false;
        while self.peek() == Some('.') && self.peek_second().is_some_and(is_word_char) {
            self.bump();
            self.bump_while(is_word_char);
            dotted = true;
        }

        let lexeme = &self.source[start..self.pos];
        if dotted {
            Token::RecordAccess(lexeme)
        } else {
            Token::keyword(lexeme).unwrap_or(Token::Identifier(lexeme))
        }
    }

    /// Greedy two-character match first, then the single character.
    fn scan_operator(&mut self, first: char) -> Token<'src> {
        self.bump();

        let pair = match (first, self.peek()) {
            (':', Some('=')) => Some(Token::Assign),
            ('<', Some('=')) => Some(Token::LessEqual),
            ('>', Some('=')) => Some(Token::GreaterEqual),
            ('/', Some('=')) => Some(Token::NotEqual),
            ('.', Some('.')) => Some(Token::Range),
            _ => None,
        };
        if let Some(token) = pair {
            self.bump();
            return token;
        }

        match first {
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Multiply,
            '/' => Token::Divide,
            '%' => Token::Mod,
            ':' => Token::Colon,
            '=' => Token::Equal,
            '<' => Token::Less,
            '>' => Token::Greater,
            '.' => Token::Dot,
            ',' => Token::Comma,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            _ => Token::RightBracket,
        }
    }

    /// Coalesce a run of characters that cannot start any token.
    fn scan_invalid(&mut self) -> Token<'src> {
        let start = self.pos;
        self.bump();
        self.bump_while(|c| !is_valid_start(c));
        Token::Invalid(&self.source[start..self.pos])
    }
}

/// Yields every token up to and including the first `EndOfFile`.
impl<'src> Iterator for Lexer<'src> {
    type Item = PositionedToken<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let token = self.next_token();
        if token.token == Token::EndOfFile {
            self.exhausted = true;
        }
        Some(token)
    }
}

/// Scan the whole input, including `EndOfLine` tokens and the final `EndOfFile`.
pub fn tokenize(source: &str) -> Vec<PositionedToken<'_>> {
    let tokens: Vec<_> = Lexer::new(source).collect();
    debug!(tokens = tokens.len(), bytes = source.len(); "Tokenized source");
    tokens
}

/// Build the diagnostic for one invalid token.
pub fn invalid_token_diagnostic(token: &PositionedToken<'_>) -> Diagnostic {
    let starts_with_digit = token.lexeme.starts_with(|c: char| c.is_ascii_digit());

    match parse_number(token.lexeme) {
        Err(reason) if starts_with_digit => {
            Diagnostic::error(format!("malformed number literal `{}`", token.lexeme))
                .with_code(ErrorCode::E001)
                .with_label(token.span, reason.to_string())
                .with_help("number literals are digits with at most one decimal point")
        }
        _ => Diagnostic::error(format!("unexpected characters `{}`", token.lexeme))
            .with_code(ErrorCode::E002)
            .with_label(token.span, ErrorCode::E002.description())
            .with_help("remove these characters or separate them with whitespace"),
    }
}

/// Run the lexer once and report every invalid token.
///
/// # Errors
///
/// Returns a [`ParseError`] with one diagnostic per [`Token::Invalid`].
pub fn check_lexical(source: &str) -> Result<(), ParseError> {
    let mut diagnostics = DiagnosticCollector::new();

    for token in Lexer::new(source) {
        if matches!(token.token, Token::Invalid(_)) {
            diagnostics.emit(invalid_token_diagnostic(&token));
        }
    }

    diagnostics.finish()
}
