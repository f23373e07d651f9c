//! Tree-builder error types

use crate::lexer::{LexError, Location, Span, TokenKind};
use thiserror::Error;

/// A syntax error with location information
#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
    pub location: Location,
}

impl SyntaxError {
    #[must_use]
    pub fn new(kind: SyntaxErrorKind, span: Span, location: Location) -> Self {
        Self {
            kind,
            span,
            location,
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.kind)
    }
}

impl std::error::Error for SyntaxError {}

/// The kind of syntax error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("{0}")]
    Lex(LexError),

    #[error("unexpected {found} {context}")]
    Unexpected {
        found: TokenKind,
        context: &'static str,
    },

    #[error("unterminated block: missing ')'")]
    UnterminatedBlock,
}
