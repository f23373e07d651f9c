//! Directive decoding: syntax tree to typed records
//!
//! Every statement is checked on its own. A bad statement adds a
//! diagnostic and decoding moves on, so one parse reports every problem in
//! the file. Accepted statements have their tokens rewritten in the tree
//! to the canonical form that was validated (unquoted where possible,
//! canonical versions).

use std::fmt;

use modfile_syntax::{LineId, Stmt};
use tracing::{debug, trace};

use crate::error::{Diagnostic, Diagnostics, ModFileError};
use crate::manifest::{Exclude, ModFile, Module, ModuleVersion, Replace, Require};
use crate::quote::{is_directory_path, parse_string};
use crate::version::{self, FixError, VersionFixer};

const USAGE_REPLACE: &str =
    "usage: replace module/path v1.2.3 => other/module v1.4\n\t or replace module/path v1.2.3 => ../local/directory";

/// Options controlling how a manifest is decoded
#[derive(Default)]
pub struct DecodeOptions<'a> {
    fixer: Option<Box<VersionFixer<'a>>>,
    strict_directory_paths: bool,
}

impl<'a> DecodeOptions<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every version through `fixer` before it is validated.
    ///
    /// The hook receives the module path and the unquoted version and
    /// returns the version to use. An error becomes a diagnostic for the
    /// statement.
    #[must_use]
    pub fn with_fixer<F>(mut self, fixer: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, FixError> + 'a,
    {
        self.fixer = Some(Box::new(fixer));
        self
    }

    /// Reject backslash directory replacements on hosts whose path
    /// separator is `/`.
    #[must_use]
    pub fn strict_directory_paths(mut self, strict: bool) -> Self {
        self.strict_directory_paths = strict;
        self
    }

    fn fixer(&self) -> Option<&VersionFixer<'a>> {
        self.fixer.as_deref()
    }
}

impl fmt::Debug for DecodeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("fixer", &self.fixer.is_some())
            .field("strict_directory_paths", &self.strict_directory_paths)
            .finish()
    }
}

/// Parse and decode manifest bytes.
///
/// Fails with every diagnostic found when any statement is rejected.
pub fn parse(name: &str, data: &[u8], options: &DecodeOptions<'_>) -> Result<ModFile, ModFileError> {
    let source = std::str::from_utf8(data).map_err(|err| {
        let line = data[..err.valid_up_to()].iter().filter(|b| **b == b'\n').count() + 1;
        let line = u32::try_from(line).unwrap_or(u32::MAX);
        ModFileError::Parse(std::iter::once(Diagnostic::new(name, line, "invalid UTF-8")).collect())
    })?;

    let syntax = modfile_syntax::parse(name, source).map_err(|errors| {
        ModFileError::Parse(
            errors
                .into_iter()
                .map(|e| Diagnostic::new(name, e.location.line, e.kind.to_string()))
                .collect(),
        )
    })?;

    let mut decoder = Decoder {
        file: ModFile {
            syntax,
            ..ModFile::default()
        },
        options,
        diagnostics: Diagnostics::default(),
    };
    decoder.run();

    let Decoder {
        file,
        mut diagnostics,
        ..
    } = decoder;
    if !diagnostics.is_empty() {
        diagnostics.sort();
        debug!(file = name, errors = diagnostics.len(), "manifest rejected");
        return Err(ModFileError::Parse(diagnostics));
    }
    debug!(
        file = name,
        require = file.require.len(),
        exclude = file.exclude.len(),
        replace = file.replace.len(),
        "decoded manifest"
    );
    Ok(file)
}

struct Decoder<'o, 'a> {
    file: ModFile,
    options: &'o DecodeOptions<'a>,
    diagnostics: Diagnostics,
}

impl Decoder<'_, '_> {
    fn run(&mut self) {
        let mut work: Vec<(String, LineId)> = Vec::new();
        let mut bad_blocks = Vec::new();
        for stmt in &self.file.syntax.stmts {
            match stmt {
                Stmt::Line(id) => {
                    if let Some(verb) = self.file.syntax.line(*id).tokens.first() {
                        work.push((verb.clone(), *id));
                    }
                }
                Stmt::Block(block) => match block.verb() {
                    Some(verb @ ("module" | "require" | "exclude" | "replace")) => {
                        work.extend(block.lines.iter().map(|id| (verb.to_string(), *id)));
                    }
                    _ => bad_blocks.push((block.start.line, block.tokens.join(" "))),
                },
                Stmt::Comments(_) => {}
            }
        }

        for (line, header) in bad_blocks {
            self.error(line, format!("unknown block type: {header}"));
        }
        for (verb, id) in work {
            self.statement(&verb, id);
        }
    }

    fn error(&mut self, line: u32, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(self.file.syntax.name.as_str(), line, message);
        trace!(%diagnostic, "rejected statement");
        self.diagnostics.push(diagnostic);
    }

    /// Decode one line; `verb` is its first token or its block header
    fn statement(&mut self, verb: &str, id: LineId) {
        let line = self.file.syntax.line(id);
        let at = line.start.line;
        let mut args: Vec<String> = if line.in_block {
            line.tokens.clone()
        } else {
            line.tokens[1..].to_vec()
        };
        trace!(verb, line = at, args = args.len(), "decoding statement");

        let accepted = match verb {
            "module" => self.module(id, at, &mut args),
            "require" | "exclude" => self.require_or_exclude(verb, id, at, &mut args),
            "replace" => self.replace(id, at, &mut args),
            _ => {
                self.error(at, format!("unknown directive: {verb}"));
                false
            }
        };

        if accepted {
            let line = self.file.syntax.line_mut(id);
            if line.in_block {
                line.tokens = args;
            } else {
                line.tokens.truncate(1);
                line.tokens.extend(args);
            }
        }
    }

    /// The first `module` statement claims the slot even when malformed, so
    /// any later one is still reported as repeated.
    fn module(&mut self, id: LineId, at: u32, args: &mut [String]) -> bool {
        if self.file.module.is_some() {
            self.error(at, "repeated module statement");
            return false;
        }
        self.file.module = Some(Module {
            path: String::new(),
            syntax: id,
        });
        let [path] = args else {
            self.error(at, "usage: module module/path");
            return false;
        };
        match parse_string(path) {
            Ok(path) => {
                self.file.module = Some(Module { path, syntax: id });
                true
            }
            Err(err) => {
                self.error(at, format!("invalid quoted string: {err}"));
                false
            }
        }
    }

    fn require_or_exclude(&mut self, verb: &str, id: LineId, at: u32, args: &mut [String]) -> bool {
        let [path, version] = args else {
            self.error(at, format!("usage: {verb} module/path v1.2.3"));
            return false;
        };
        let Some(module) = self.module_version(at, path, version) else {
            return false;
        };
        if verb == "require" {
            self.file.require.push(Require { module, syntax: id });
        } else {
            self.file.exclude.push(Exclude { module, syntax: id });
        }
        true
    }

    fn replace(&mut self, id: LineId, at: u32, args: &mut [String]) -> bool {
        if !(4..=5).contains(&args.len()) || args[2] != "=>" {
            self.error(at, USAGE_REPLACE);
            return false;
        }
        let (old, new) = args.split_at_mut(3);
        let [old_path, old_version, _] = old else {
            return false;
        };
        let Some(old) = self.module_version(at, old_path, old_version) else {
            return false;
        };

        let new_path = match parse_string(&mut new[0]) {
            Ok(path) => path,
            Err(err) => {
                self.error(at, format!("invalid quoted string: {err}"));
                return false;
            }
        };

        let new = match new {
            [_] => {
                if !is_directory_path(&new_path) {
                    self.error(
                        at,
                        "replacement module without version must be directory path (rooted or starting with ./ or ../)",
                    );
                    return false;
                }
                if self.options.strict_directory_paths
                    && std::path::MAIN_SEPARATOR == '/'
                    && new_path.contains('\\')
                {
                    self.error(
                        at,
                        "replacement directory appears to be Windows path (on a non-windows system)",
                    );
                    return false;
                }
                ModuleVersion::new(new_path, "")
            }
            [_, new_version] => {
                let raw = new_version.clone();
                let version = match version::parse_version(&new_path, new_version, self.options.fixer()) {
                    Ok(version) => version,
                    Err(err) => {
                        self.error(at, format!("invalid module version {raw:?}: {err}"));
                        return false;
                    }
                };
                if is_directory_path(&new_path) {
                    self.error(
                        at,
                        format!("replacement module directory path {new_path:?} cannot have version"),
                    );
                    return false;
                }
                ModuleVersion::new(new_path, version)
            }
            _ => return false,
        };

        self.file.replace.push(Replace { old, new, syntax: id });
        true
    }

    /// Decode a `path version` pair and check that they agree on the major
    /// version
    fn module_version(&mut self, at: u32, path: &mut String, version: &mut String) -> Option<ModuleVersion> {
        let path = match parse_string(path) {
            Ok(path) => path,
            Err(err) => {
                self.error(at, format!("invalid quoted string: {err}"));
                return None;
            }
        };
        let raw = version.clone();
        let version = match version::parse_version(&path, version, self.options.fixer()) {
            Ok(version) => version,
            Err(err) => {
                self.error(at, format!("invalid module version {raw:?}: {err}"));
                return None;
            }
        };
        if let Err(err) = version::check_path_major(&path, &version) {
            self.error(at, err.to_string());
            return None;
        }
        Some(ModuleVersion::new(path, version))
    }
}
