//! Lexer for module manifest files
//!
//! The lexer converts manifest text into a stream of tokens, handling:
//! - Bare and double-quoted words
//! - Block delimiters `(` and `)`
//! - Comments (line and block), which are kept as tokens so the tree
//!   builder can attach them to statements
//! - Newlines, which terminate statements
//! - Source location tracking

#![allow(clippy::cast_possible_truncation)] // We intentionally use u32 for spans; files > 4GB are unsupported

mod span;
mod token;

pub use span::{LineIndex, Location, Span};
pub use token::TokenKind;

use logos::Logos;
use thiserror::Error;

/// A token with its kind, span, and source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// The source text of the token, quotes and comment markers included
    pub lexeme: String,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, span: Span, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }
}

/// Lexer error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character")]
    UnexpectedChar,
    #[error("unterminated quoted string")]
    UnterminatedString,
    #[error("unterminated block comment")]
    UnterminatedBlockComment,
}

/// A lexer error with location information
#[derive(Debug, Clone)]
pub struct SpannedError {
    pub error: LexError,
    pub span: Span,
}

impl SpannedError {
    #[must_use]
    pub fn new(error: LexError, span: Span) -> Self {
        Self { error, span }
    }
}

impl std::fmt::Display for SpannedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.error, self.span)
    }
}

impl std::error::Error for SpannedError {}

/// The manifest lexer
pub struct Lexer<'source> {
    source: &'source str,
    /// Current position in the source (byte offset)
    position: usize,
    /// Collected errors during lexing
    errors: Vec<SpannedError>,
}

impl<'source> Lexer<'source> {
    #[must_use]
    pub fn new(source: &'source str) -> Self {
        Self {
            source,
            position: 0,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source, returning all tokens and any errors
    #[must_use]
    pub fn tokenize(source: &str) -> (Vec<Token>, Vec<SpannedError>) {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.collect_all();
        (tokens, lexer.errors)
    }

    /// Collect all tokens up to and including `Eof`
    pub fn collect_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    pub fn next_token(&mut self) -> Token {
        if self.position >= self.source.len() {
            return self.eof();
        }

        let remaining = &self.source[self.position..];
        let mut logos_lexer = TokenKind::lexer(remaining);

        match logos_lexer.next() {
            Some(Ok(kind)) => {
                // span is relative to `remaining`, after any skipped whitespace
                let range = logos_lexer.span();
                let lexeme = logos_lexer.slice();
                let start = self.position + range.start;
                let end = self.position + range.end;
                self.position = end;
                Token::new(kind, Span::new(start as u32, end as u32), lexeme)
            }
            Some(Err(())) => self.recover(logos_lexer.span().start),
            None => {
                // only skipped whitespace remained
                self.position = self.source.len();
                self.eof()
            }
        }
    }

    /// Skip past an invalid region and record the error.
    ///
    /// An unmatched quote swallows the rest of its line so that its
    /// contents are not lexed as stray words. An unclosed block comment
    /// swallows the rest of the input.
    fn recover(&mut self, skipped: usize) -> Token {
        let start = self.position + skipped;
        let rest = &self.source[start..];
        let (error, len) = if rest.starts_with("/*") {
            (LexError::UnterminatedBlockComment, rest.len())
        } else if rest.starts_with('"') {
            let len = rest.find('\n').unwrap_or(rest.len());
            (LexError::UnterminatedString, len)
        } else {
            let len = rest.chars().next().map_or(1, char::len_utf8);
            (LexError::UnexpectedChar, len)
        };
        self.position = start + len;
        let span = Span::new(start as u32, self.position as u32);
        self.errors.push(SpannedError::new(error, span));
        Token::new(TokenKind::Error, span, &self.source[start..self.position])
    }

    fn eof(&self) -> Token {
        let at = self.position as u32;
        Token::new(TokenKind::Eof, Span::new(at, at), "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let (tokens, _) = Lexer::tokenize(source);
        tokens
    }

    fn lex_kinds(source: &str) -> Vec<TokenKind> {
        lex(source).into_iter().map(|t| t.kind).collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        lex(source)
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn lex_simple_line() {
        assert_eq!(
            lex_kinds("require example.com/a v1.2.3\n"),
            vec![
                TokenKind::Bare,
                TokenKind::Bare,
                TokenKind::Bare,
                TokenKind::Newline,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            lexemes("require example.com/a v1.2.3"),
            vec!["require", "example.com/a", "v1.2.3"]
        );
    }

    #[test]
    fn lex_block_delimiters() {
        assert_eq!(
            lex_kinds("require (\n)"),
            vec![
                TokenKind::Bare,
                TokenKind::LParen,
                TokenKind::Newline,
                TokenKind::RParen,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn lex_replace_arrow_and_paths() {
        assert_eq!(
            lexemes(r"replace a v1.0.0 => ../local"),
            vec!["replace", "a", "v1.0.0", "=>", "../local"]
        );
        assert_eq!(lexemes("/abs/dir"), vec!["/abs/dir"]);
        assert_eq!(lexemes(r"C:\work\dir"), vec![r"C:\work\dir"]);
        assert_eq!(
            lex_kinds("require("),
            vec![TokenKind::Bare, TokenKind::LParen, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_comments() {
        assert_eq!(
            lex_kinds("a // note\n/* block */ b"),
            vec![
                TokenKind::Bare,
                TokenKind::LineComment,
                TokenKind::Newline,
                TokenKind::BlockComment,
                TokenKind::Bare,
                TokenKind::Eof
            ]
        );
        // a comment marker ends the preceding word even without a space
        assert_eq!(lexemes("v1.0.0//x"), vec!["v1.0.0", "//x"]);
    }

    #[test]
    fn lex_quoted_string() {
        let tokens = lex(r#"module "example.com/with space""#);
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].lexeme, r#""example.com/with space""#);
        assert_eq!(tokens[1].span, Span::new(7, 31));
    }

    #[test]
    fn lex_unterminated_string() {
        let (tokens, errors) = Lexer::tokenize("module \"oops\nrequire");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error, LexError::UnterminatedString);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[2].kind, TokenKind::Newline);
        assert_eq!(tokens[3].lexeme, "require");
    }

    #[test]
    fn lex_block_comment_spans_lines() {
        let tokens = lex("a /* one\ntwo */ b");
        assert_eq!(tokens[1].kind, TokenKind::BlockComment);
        assert_eq!(tokens[1].lexeme, "/* one\ntwo */");
        assert_eq!(tokens[2].lexeme, "b");
        assert_eq!(lexemes("/**/ x"), vec!["/**/", "x"]);
        assert_eq!(lexemes("/* a ** b */"), vec!["/* a ** b */"]);
    }

    #[test]
    fn lex_unterminated_block_comment() {
        let (tokens, errors) = Lexer::tokenize("module x /* never closed");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error, LexError::UnterminatedBlockComment);
        assert_eq!(errors[0].span, Span::new(9, 24));
        assert_eq!(tokens[2].kind, TokenKind::Error);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn lex_unicode_words() {
        assert_eq!(lexemes("módulo ✓"), vec!["módulo", "✓"]);
    }
}
