//! Quoting and classification of manifest tokens

use std::fmt::Write as _;
use thiserror::Error;
use unicode_general_category::{get_general_category, GeneralCategory};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("invalid syntax")]
    InvalidSyntax,
    #[error("unquoted string cannot contain quote")]
    UnquotedQuote,
}

/// Whether `s` names a local directory rather than a module path.
///
/// Windows forms are recognized on every host, since a manifest written on
/// one system may be read on another.
#[must_use]
pub fn is_directory_path(s: &str) -> bool {
    if ["./", "../", "/", ".\\", "..\\", "\\"]
        .iter()
        .any(|prefix| s.starts_with(prefix))
    {
        return true;
    }
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Printable in the sense of a manifest token: letters, marks, numbers,
/// punctuation, symbols and the ASCII space
fn is_print(c: char) -> bool {
    c == ' '
        || !matches!(
            get_general_category(c),
            GeneralCategory::Control
                | GeneralCategory::Format
                | GeneralCategory::Surrogate
                | GeneralCategory::PrivateUse
                | GeneralCategory::Unassigned
                | GeneralCategory::SpaceSeparator
                | GeneralCategory::LineSeparator
                | GeneralCategory::ParagraphSeparator
        )
}

/// Whether `s` cannot be written as a bare token
#[must_use]
pub fn must_quote(s: &str) -> bool {
    s.is_empty()
        || s.contains("//")
        || s.contains("/*")
        || s
            .chars()
            .any(|c| matches!(c, ' ' | '"' | '\'' | '`') || !is_print(c))
}

/// `s` as-is when it is a valid bare token, quoted otherwise
#[must_use]
pub fn auto_quote(s: &str) -> String {
    if must_quote(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

/// Double-quote `s`, escaping quotes, backslashes and non-printable
/// characters.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{0B}' => out.push_str("\\v"),
            c if is_print(c) => out.push(c),
            c if (c as u32) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if (c as u32) <= 0xFFFF => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
    out.push('"');
    out
}

/// Decode a double-quoted literal produced by [`quote`] or written by hand
pub fn unquote(s: &str) -> Result<String, QuoteError> {
    let inner = s
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or(QuoteError::InvalidSyntax)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\n' => return Err(QuoteError::InvalidSyntax),
            '\\' => out.push(unescape(&mut chars)?),
            c => out.push(c),
        }
    }
    Ok(out)
}

fn unescape(chars: &mut std::str::Chars<'_>) -> Result<char, QuoteError> {
    let c = chars.next().ok_or(QuoteError::InvalidSyntax)?;
    let simple = match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        'a' => '\u{07}',
        'b' => '\u{08}',
        'f' => '\u{0C}',
        'v' => '\u{0B}',
        '\\' | '"' | '\'' => c,
        'x' => return hex_escape(chars, 2),
        'u' => return hex_escape(chars, 4),
        'U' => return hex_escape(chars, 8),
        '0'..='7' => {
            let mut value = c.to_digit(8).unwrap_or(0);
            for _ in 0..2 {
                let digit = chars
                    .next()
                    .and_then(|d| d.to_digit(8))
                    .ok_or(QuoteError::InvalidSyntax)?;
                value = value * 8 + digit;
            }
            if value > 0xFF {
                return Err(QuoteError::InvalidSyntax);
            }
            return char::from_u32(value).ok_or(QuoteError::InvalidSyntax);
        }
        _ => return Err(QuoteError::InvalidSyntax),
    };
    Ok(simple)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, QuoteError> {
    let mut value = 0u32;
    for _ in 0..digits {
        let digit = chars
            .next()
            .and_then(|d| d.to_digit(16))
            .ok_or(QuoteError::InvalidSyntax)?;
        value = value * 16 + digit;
    }
    char::from_u32(value).ok_or(QuoteError::InvalidSyntax)
}

/// Read a literal argument token.
///
/// A token starting with `"` is unquoted; a bare token may not contain
/// any quote character. On success the token is rewritten to its
/// [`auto_quote`] form.
pub fn parse_string(token: &mut String) -> Result<String, QuoteError> {
    let value = if token.starts_with('"') {
        unquote(token)?
    } else {
        if token.contains(['"', '\'', '`']) {
            return Err(QuoteError::UnquotedQuote);
        }
        token.clone()
    };
    *token = auto_quote(&value);
    Ok(value)
}
