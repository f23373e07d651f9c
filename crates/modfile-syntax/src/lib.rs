//! Modfile Syntax - format-preserving syntax layer for module manifests
//!
//! This crate provides the generic, verb-agnostic layer:
//! - Lexer: tokenization of manifest text
//! - Tree: statements, blocks and comments with stable line handles
//! - Parser: tree construction from the token stream
//! - Formatter: canonical rendering back to text

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of manifest text
pub mod lexer;

/// Syntax tree - statements, blocks, comments
pub mod tree;

/// Parser module - builds the syntax tree from tokens
pub mod parser;

/// Canonical printer
pub mod formatter;

pub use formatter::{FormatConfig, Formatter};
pub use lexer::{Lexer, Location, Span};
pub use parser::{parse, SyntaxError, SyntaxErrorKind};
pub use tree::{
    Comment, CommentBlock, CommentKind, FileSyntax, Line, LineBlock, LineId, Stmt, Trivia,
};
