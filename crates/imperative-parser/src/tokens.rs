//! Token model produced by the lexer.

use std::{fmt, ops::Deref};

use winnow::stream::Location;

use crate::span::Span;

/// Token kinds for the imperative language
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'src> {
    // Literals and names
    Identifier(&'src str),
    IntegerLiteral(i64),
    RealLiteral(f64),
    BoolLiteral(bool),
    /// Dotted path such as `person.addr.street`, expanded by the parser
    RecordAccess(&'src str),

    // Keywords
    Var,
    Type,
    Is,
    Integer,
    Real,
    Boolean,
    Record,
    Array,
    Routine,
    Return,
    If,
    Then,
    Else,
    While,
    Loop,
    For,
    In,
    Reverse,
    End,
    Print,
    And,
    Or,
    Xor,
    Not,

    // Operators
    Plus,         // +
    Minus,        // -
    Multiply,     // *
    Divide,       // /
    Mod,          // %
    Assign,       // :=
    Equal,        // =
    NotEqual,     // /=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=
    Range,        // ..

    // Punctuation
    Dot,          // .
    Colon,        // :
    Comma,        // ,
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Layout and sentinels
    EndOfLine,
    EndOfFile,
    Invalid(&'src str),
}

impl<'src> Token<'src> {
    /// Look up the keyword token for `word`, including the boolean literals.
    pub fn keyword(word: &str) -> Option<Token<'src>> {
        let token = match word {
            "var" => Token::Var,
            "type" => Token::Type,
            "is" => Token::Is,
            "integer" => Token::Integer,
            "real" => Token::Real,
            "boolean" => Token::Boolean,
            "record" => Token::Record,
            "array" => Token::Array,
            "routine" => Token::Routine,
            "return" => Token::Return,
            "if" => Token::If,
            "then" => Token::Then,
            "else" => Token::Else,
            "while" => Token::While,
            "loop" => Token::Loop,
            "for" => Token::For,
            "in" => Token::In,
            "reverse" => Token::Reverse,
            "end" => Token::End,
            "print" => Token::Print,
            "and" => Token::And,
            "or" => Token::Or,
            "xor" => Token::Xor,
            "not" => Token::Not,
            "true" => Token::BoolLiteral(true),
            "false" => Token::BoolLiteral(false),
            _ => return None,
        };
        Some(token)
    }

    /// The name of this token's kind, as printed in token listings.
    pub fn name(&self) -> &'static str {
        match self {
            Token::Identifier(_) => "Identifier",
            Token::IntegerLiteral(_) => "IntegerLiteral",
            Token::RealLiteral(_) => "RealLiteral",
            Token::BoolLiteral(_) => "BoolLiteral",
            Token::RecordAccess(_) => "RecordAccess",
            Token::Var => "Var",
            Token::Type => "Type",
            Token::Is => "Is",
            Token::Integer => "Integer",
            Token::Real => "Real",
            Token::Boolean => "Boolean",
            Token::Record => "Record",
            Token::Array => "Array",
            Token::Routine => "Routine",
            Token::Return => "Return",
            Token::If => "If",
            Token::Then => "Then",
            Token::Else => "Else",
            Token::While => "While",
            Token::Loop => "Loop",
            Token::For => "For",
            Token::In => "In",
            Token::Reverse => "Reverse",
            Token::End => "End",
            Token::Print => "Print",
            Token::And => "And",
            Token::Or => "Or",
            Token::Xor => "Xor",
            Token::Not => "Not",
            Token::Plus => "Plus",
            Token::Minus => "Minus",
            Token::Multiply => "Multiply",
            Token::Divide => "Divide",
            Token::Mod => "Mod",
            Token::Assign => "Assign",
            Token::Equal => "Equal",
            Token::NotEqual => "NotEqual",
            Token::Less => "Less",
            Token::LessEqual => "LessEqual",
            Token::Greater => "Greater",
            Token::GreaterEqual => "GreaterEqual",
            Token::Range => "Range",
            Token::Dot => "Dot",
            Token::Colon => "Colon",
            Token::Comma => "Comma",
            Token::LeftParen => "LeftParen",
            Token::RightParen => "RightParen",
            Token::LeftBracket => "LeftBracket",
            Token::RightBracket => "RightBracket",
            Token::EndOfLine => "EndOfLine",
            Token::EndOfFile => "EndOfFile",
            Token::Invalid(_) => "Invalid",
        }
    }

    /// Returns `true` for reserved words (the boolean literals are not keywords).
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Var
                | Token::Type
                | Token::Is
                | Token::Integer
                | Token::Real
                | Token::Boolean
                | Token::Record
                | Token::Array
                | Token::Routine
                | Token::Return
                | Token::If
                | Token::Then
                | Token::Else
                | Token::While
                | Token::Loop
                | Token::For
                | Token::In
                | Token::Reverse
                | Token::End
                | Token::Print
                | Token::And
                | Token::Or
                | Token::Xor
                | Token::Not
        )
    }
}

/// A token together with the text it was scanned from and its location.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub lexeme: &'src str,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, lexeme: &'src str, span: Span) -> Self {
        Self {
            token,
            lexeme,
            span,
        }
    }
}

impl<'src> Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl<'src> AsRef<Token<'src>> for PositionedToken<'src> {
    fn as_ref(&self) -> &Token<'src> {
        &self.token
    }
}

/// Token listing format: `Kind: lexeme`, with control characters escaped.
impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.token.name(), self.lexeme.escape_debug())
    }
}

impl Location for PositionedToken<'_> {
    fn previous_token_end(&self) -> usize {
        self.span.offset() + self.span.len()
    }

    fn current_token_start(&self) -> usize {
        self.span.offset()
    }
}

/// Human readable description used in parser diagnostics.
impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier `{name}`"),
            Token::IntegerLiteral(value) => write!(f, "integer literal `{value}`"),
            Token::RealLiteral(value) => write!(f, "real literal `{value}`"),
            Token::BoolLiteral(value) => write!(f, "`{value}`"),
            Token::RecordAccess(path) => write!(f, "field access `{path}`"),
            Token::Var => write!(f, "`var`"),
            Token::Type => write!(f, "`type`"),
            Token::Is => write!(f, "`is`"),
            Token::Integer => write!(f, "`integer`"),
            Token::Real => write!(f, "`real`"),
            Token::Boolean => write!(f, "`boolean`"),
            Token::Record => write!(f, "`record`"),
            Token::Array => write!(f, "`array`"),
            Token::Routine => write!(f, "`routine`"),
            Token::Return => write!(f, "`return`"),
            Token::If => write!(f, "`if`"),
            Token::Then => write!(f, "`then`"),
            Token::Else => write!(f, "`else`"),
            Token::While => write!(f, "`while`"),
            Token::Loop => write!(f, "`loop`"),
            Token::For => write!(f, "`for`"),
            Token::In => write!(f, "`in`"),
            Token::Reverse => write!(f, "`reverse`"),
            Token::End => write!(f, "`end`"),
            Token::Print => write!(f, "`print`"),
            Token::And => write!(f, "`and`"),
            Token::Or => write!(f, "`or`"),
            Token::Xor => write!(f, "`xor`"),
            Token::Not => write!(f, "`not`"),
            Token::Plus => write!(f, "`+`"),
            Token::Minus => write!(f, "`-`"),
            Token::Multiply => write!(f, "`*`"),
            Token::Divide => write!(f, "`/`"),
            Token::Mod => write!(f, "`%`"),
            Token::Assign => write!(f, "`:=`"),
            Token::Equal => write!(f, "`=`"),
            Token::NotEqual => write!(f, "`/=`"),
            Token::Less => write!(f, "`<`"),
            Token::LessEqual => write!(f, "`<=`"),
            Token::Greater => write!(f, "`>`"),
            Token::GreaterEqual => write!(f, "`>=`"),
            Token::Range => write!(f, "`..`"),
            Token::Dot => write!(f, "`.`"),
            Token::Colon => write!(f, "`:`"),
            Token::Comma => write!(f, "`,`"),
            Token::LeftParen => write!(f, "`(`"),
            Token::RightParen => write!(f, "`)`"),
            Token::LeftBracket => write!(f, "`[`"),
            Token::RightBracket => write!(f, "`]`"),
            Token::EndOfLine => write!(f, "end of line"),
            Token::EndOfFile => write!(f, "end of input"),
            Token::Invalid(text) => write!(f, "invalid input `{text}`"),
        }
    }
}
