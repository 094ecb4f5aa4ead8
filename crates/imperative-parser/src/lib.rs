//! # Imperative Parser
//!
//! Front end for a small statically typed imperative language: a lexer that
//! never fails, a fail-fast recursive-descent parser and the AST they build.
//!
//! ## Usage
//!
//! ```
//! # use imperative_parser::{check_lexical, parse, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         var limit : integer is 10
//!
//!         routine main() is
//!             for i in 1 .. limit loop
//!                 print i * i
//!             end
//!         end
//!     "#;
//!
//!     check_lexical(source)?;
//!     let program = parse(source)?;
//!     assert_eq!(program.declarations.len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! The lexer reports malformed input as [`tokens::Token::Invalid`] tokens
//! rather than errors, so [`check_lexical`] can report every lexical problem
//! at once. [`parse`] stops at the first syntax error.

pub mod ast;
pub mod error;
pub mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod span;
pub mod stream;
pub mod tokens;

pub use ast::Program;
pub use error::ParseError;
pub use lexer::{Lexer, check_lexical, tokenize};
pub use parser::{parse, parse_tokens};
pub use span::Span;
pub use stream::TokenStream;
