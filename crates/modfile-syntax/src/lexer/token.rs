//! Token types for the manifest lexer

use logos::Logos;

/// The kind of token produced by the lexer
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
pub enum TokenKind {
    #[token("\n")]
    Newline,

    /// Opens a statement block: `require (`
    #[token("(")]
    LParen,

    /// Closes a statement block
    #[token(")")]
    RParen,

    /// Double-quoted literal, kept with its quotes and escapes
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,

    /// Line comment: // ...
    #[regex(r"//[^\n]*")]
    LineComment,

    /// Block comment: /* ... */
    #[token("/*", block_comment)]
    BlockComment,

    /// Unquoted token: a module path, version, `=>`, directory path, ...
    #[regex(r#"[^\s"()/]"#, bare_token)]
    #[token("/", bare_token)]
    Bare,

    /// End of file (added by lexer, not matched by logos)
    Eof,

    /// Lexer error - invalid character or unterminated literal
    Error,
}

/// Consumes a block comment body through the closing `*/`.
///
/// An unclosed comment swallows the rest of the input and is reported as
/// an error.
fn block_comment(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(rest.len());
            false
        }
    }
}

/// Extends a bare token up to whitespace, a quote, a parenthesis, or a
/// comment marker, so `require(` lexes as a word followed by `(`.
fn bare_token(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut len = 0;
    while let Some(&b) = rest.get(len) {
        if b.is_ascii_whitespace() || matches!(b, b'"' | b'(' | b')') {
            break;
        }
        if b == b'/' && matches!(rest.get(len + 1), Some(b'/' | b'*')) {
            break;
        }
        len += 1;
    }
    lex.bump(len);
    true
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Newline => "newline",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::String => "quoted string",
            Self::LineComment | Self::BlockComment => "comment",
            Self::Bare => "token",
            Self::Eof => "end of file",
            Self::Error => "invalid input",
        };
        f.write_str(s)
    }
}
