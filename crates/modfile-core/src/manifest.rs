//! The decoded manifest: typed records plus the syntax tree they came from
//!
//! Each record keeps the [`LineId`] of the line it was decoded from (or
//! created for). Edits go through [`ModFile`] methods, which change the
//! record and its line together.

use std::fmt;
use std::path::Path;

use modfile_syntax::{FileSyntax, Formatter, LineId};
use tracing::debug;

use crate::decode::{self, DecodeOptions};
use crate::error::ModFileError;

/// Default manifest file name
pub const MANIFEST_FILE: &str = "go.mod";

/// A module path with a version.
///
/// An empty path marks a record that was dropped but not yet purged by
/// [`ModFile::cleanup`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ModuleVersion {
    pub path: String,
    /// Empty for a directory replacement target
    pub version: String,
}

impl ModuleVersion {
    #[must_use]
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    /// Whether this entry has been dropped
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.path.is_empty()
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}@{}", self.path, self.version)
        }
    }
}

/// The `module` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub syntax: LineId,
}

/// A `require` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub module: ModuleVersion,
    pub syntax: LineId,
}

/// An `exclude` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclude {
    pub module: ModuleVersion,
    pub syntax: LineId,
}

/// A `replace` statement: `old => new`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old: ModuleVersion,
    pub new: ModuleVersion,
    pub syntax: LineId,
}

/// A parsed manifest file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModFile {
    pub module: Option<Module>,
    pub require: Vec<Require>,
    pub exclude: Vec<Exclude>,
    pub replace: Vec<Replace>,
    pub syntax: FileSyntax,
}

impl ModFile {
    /// An empty manifest, for building a file from scratch
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            syntax: FileSyntax::new(name),
            ..Self::default()
        }
    }

    /// Parse manifest bytes with default options
    pub fn parse(name: &str, data: &[u8]) -> Result<Self, ModFileError> {
        decode::parse(name, data, &DecodeOptions::default())
    }

    pub fn parse_with(
        name: &str,
        data: &[u8],
        options: &DecodeOptions<'_>,
    ) -> Result<Self, ModFileError> {
        decode::parse(name, data, options)
    }

    /// Read and parse the manifest at `path`; diagnostics name the file
    /// by its path.
    pub fn from_path(path: &Path, options: &DecodeOptions<'_>) -> Result<Self, ModFileError> {
        let data = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = data.len(), "read manifest");
        decode::parse(&path.display().to_string(), &data, options)
    }

    /// Render the manifest in canonical layout
    #[must_use]
    pub fn format(&self) -> String {
        Formatter::format_file(&self.syntax)
    }

    /// Append a standalone comment at the end of the file
    pub fn add_comment(&mut self, text: &str) {
        self.syntax.add_comment(text);
    }

    /// The module path, if a `module` statement is present
    #[must_use]
    pub fn module_path(&self) -> Option<&str> {
        self.module.as_ref().map(|m| m.path.as_str())
    }
}
