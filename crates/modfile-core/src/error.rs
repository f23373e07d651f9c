//! Error types for manifest loading and editing

use std::fmt;
use thiserror::Error;

/// One problem found while decoding a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: String,
    /// 1-based line of the offending statement
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// Every diagnostic from one parse, in line order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub(crate) fn sort(&mut self) {
        self.0.sort_by_key(|d| d.line);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors from loading or editing a manifest
#[derive(Error, Debug)]
pub enum ModFileError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The file did not decode; holds every problem found
    #[error("{0}")]
    Parse(Diagnostics),

    /// An edit was asked to write a statement the decoder would reject
    #[error("invalid edit: {0}")]
    InvalidEdit(String),
}

impl ModFileError {
    /// The decode diagnostics, if this is a parse failure
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Parse(diagnostics) => Some(diagnostics),
            Self::Io(_) | Self::InvalidEdit(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_join_with_newlines() {
        let diagnostics: Diagnostics = vec![
            Diagnostic::new("go.mod", 3, "unknown directive: foo"),
            Diagnostic::new("go.mod", 7, "repeated module statement"),
        ]
        .into_iter()
        .collect();
        let err = ModFileError::Parse(diagnostics);
        assert_eq!(
            err.to_string(),
            "go.mod:3: unknown directive: foo\ngo.mod:7: repeated module statement"
        );
        assert_eq!(err.diagnostics().map(Diagnostics::len), Some(2));
    }

    #[test]
    fn diagnostics_sort_is_stable_by_line() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Diagnostic::new("f", 5, "b"));
        diagnostics.push(Diagnostic::new("f", 2, "a"));
        diagnostics.push(Diagnostic::new("f", 5, "c"));
        diagnostics.sort();
        let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }
}
