//! Module manifest decoding and editing.
//!
//! This crate provides:
//! - Decoding of `module`, `require`, `exclude` and `replace` directives
//!   into typed records, with every problem in a file reported at once
//! - Version validation and major-version checks against module paths
//! - Edit operations that keep records and the syntax tree in step, so
//!   untouched text (comments, grouping, blank lines) survives
//! - Deduplication, sorting and compaction
//!
//! ```
//! use modfile_core::ModFile;
//!
//! let mut file = ModFile::parse("go.mod", b"module example.com/m\n").unwrap();
//! file.add_require("example.com/dep", "v1.2.0").unwrap();
//! assert_eq!(
//!     file.format(),
//!     "module example.com/m\n\nrequire example.com/dep v1.2.0\n"
//! );
//! ```

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod decode;
mod edit;
mod error;
mod manifest;
mod normalize;
pub mod quote;
pub mod version;

pub use decode::{parse, DecodeOptions};
pub use error::{Diagnostic, Diagnostics, ModFileError};
pub use manifest::{Exclude, ModFile, Module, ModuleVersion, Replace, Require, MANIFEST_FILE};
pub use quote::{auto_quote, is_directory_path, must_quote};
pub use version::{FixError, VersionError};
