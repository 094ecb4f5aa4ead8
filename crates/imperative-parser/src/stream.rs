//! Adapter between the lexer and the grammar.
//!
//! The grammar is layout-insensitive, so [`TokenStream`] pulls tokens from a
//! [`Lexer`] on demand and drops every `EndOfLine`. It yields the terminal
//! `EndOfFile` exactly once and then ends.

use crate::{
    lexer::Lexer,
    tokens::{PositionedToken, Token},
};

/// Pull-based cursor over a lexer with one token of lookahead.
#[derive(Debug, Clone)]
pub struct TokenStream<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<PositionedToken<'src>>,
    finished: bool,
}

impl<'src> TokenStream<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::from_lexer(Lexer::new(source))
    }

    pub fn from_lexer(lexer: Lexer<'src>) -> Self {
        Self {
            lexer,
            lookahead: None,
            finished: false,
        }
    }

    /// The token the next call to `next` will return, without consuming it.
    pub fn peek(&mut self) -> Option<&PositionedToken<'src>> {
        if self.finished {
            return None;
        }
        if self.lookahead.is_none() {
            self.lookahead = Some(self.pull());
        }
        self.lookahead.as_ref()
    }

    fn pull(&mut self) -> PositionedToken<'src> {
        loop {
            let token = self.lexer.next_token();
            if token.token != Token::EndOfLine {
                return token;
            }
        }
    }
}

impl<'src> Iterator for TokenStream<'src> {
    type Item = PositionedToken<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        self.peek()?;
        let token = self.lookahead.take()?;
        if token.token == Token::EndOfFile {
            self.finished = true;
        }
        Some(token)
    }
}
