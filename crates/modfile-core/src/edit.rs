//! Edit operations on a decoded manifest
//!
//! Every operation updates the typed records and their syntax lines
//! together, and repeating a call with the same arguments leaves the file
//! unchanged. Drops only tombstone: the record's path is cleared and its
//! line stops rendering. [`ModFile::cleanup`] purges both afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};

use modfile_syntax::LineId;
use tracing::debug;

use crate::error::ModFileError;
use crate::manifest::{Exclude, ModFile, Module, ModuleVersion, Replace, Require};
use crate::quote::{auto_quote, unquote};

fn require_tokens(path: &str, version: &str) -> Vec<String> {
    vec![String::from("require"), auto_quote(path), version.to_string()]
}

fn replace_tokens(old_path: &str, old_version: &str, new_path: &str, new_version: &str) -> Vec<String> {
    let mut tokens = vec![
        String::from("replace"),
        auto_quote(old_path),
        old_version.to_string(),
        String::from("=>"),
        auto_quote(new_path),
    ];
    if !new_version.is_empty() {
        tokens.push(new_version.to_string());
    }
    tokens
}

impl ModFile {
    /// Set the module path, adding a `module` statement if there is none
    pub fn set_module(&mut self, path: &str) -> Result<(), ModFileError> {
        let tokens = vec![String::from("module"), auto_quote(path)];
        match &mut self.module {
            Some(module) => {
                module.path = path.to_string();
                self.syntax.update_line(module.syntax, tokens);
            }
            None => {
                let syntax = self.syntax.add_line(None, tokens);
                self.module = Some(Module {
                    path: path.to_string(),
                    syntax,
                });
            }
        }
        debug!(path, "set module");
        Ok(())
    }

    /// Require `path` at `version`.
    ///
    /// The first existing requirement for `path` is updated in place and
    /// any others are dropped; with none, a new statement is added.
    pub fn add_require(&mut self, path: &str, version: &str) -> Result<(), ModFileError> {
        let mut found = false;
        for require in self.require.iter_mut().filter(|r| r.module.path == path) {
            if found {
                self.syntax.remove_line(require.syntax);
                require.module = ModuleVersion::default();
            } else {
                require.module.version = version.to_string();
                self.syntax.update_line(require.syntax, require_tokens(path, version));
                found = true;
            }
        }
        if found {
            debug!(path, version, "updated requirement");
            return Ok(());
        }
        self.add_new_require(path, version);
        Ok(())
    }

    /// Append a requirement without looking for an existing one
    pub fn add_new_require(&mut self, path: &str, version: &str) {
        let syntax = self.syntax.add_line(None, require_tokens(path, version));
        self.require.push(Require {
            module: ModuleVersion::new(path, version),
            syntax,
        });
        debug!(path, version, "added requirement");
    }

    /// Make the requirements exactly `desired`.
    ///
    /// Existing statements for a desired path keep their place and get the
    /// new version; every other `require` statement is removed. Paths not
    /// yet required are appended, then blocks are sorted. For a path listed
    /// more than once, the last entry wins.
    pub fn set_require(&mut self, desired: &[ModuleVersion]) -> Result<(), ModFileError> {
        let mut need: BTreeMap<&str, &str> = desired
            .iter()
            .map(|m| (m.path.as_str(), m.version.as_str()))
            .collect();

        let lines: Vec<LineId> = self
            .syntax
            .live_lines()
            .into_iter()
            .filter(|(verb, _)| *verb == "require")
            .map(|(_, id)| id)
            .collect();

        let mut kept: HashMap<LineId, String> = HashMap::new();
        let mut dropped: HashSet<LineId> = HashSet::new();
        for id in lines {
            let line = self.syntax.line(id);
            let token = if line.in_block {
                line.tokens.first()
            } else {
                line.tokens.get(1)
            };
            let path = token.map(|t| {
                if t.starts_with('"') {
                    unquote(t).unwrap_or_else(|_| t.clone())
                } else {
                    t.clone()
                }
            });
            if let Some((path, version)) = path.and_then(|p| need.remove_entry(p.as_str())) {
                self.syntax.update_line(id, require_tokens(path, version));
                kept.insert(id, version.to_string());
            } else {
                dropped.insert(id);
            }
        }

        let removed = self.require.len();
        self.syntax.retain_lines(|id, _| !dropped.contains(&id));
        self.require.retain_mut(|require| match kept.get(&require.syntax) {
            Some(version) => {
                require.module.version.clone_from(version);
                true
            }
            None => false,
        });
        debug!(
            kept = self.require.len(),
            removed = removed - self.require.len(),
            added = need.len(),
            "set requirements"
        );

        for (path, version) in need {
            self.add_new_require(path, version);
        }
        self.sort_blocks();
        Ok(())
    }

    /// Drop every requirement for `path`
    pub fn drop_require(&mut self, path: &str) -> Result<(), ModFileError> {
        for require in self.require.iter_mut().filter(|r| r.module.path == path) {
            self.syntax.remove_line(require.syntax);
            require.module = ModuleVersion::default();
        }
        debug!(path, "dropped requirement");
        Ok(())
    }

    /// Exclude `path@version`, next to other exclusions of `path` if any
    pub fn add_exclude(&mut self, path: &str, version: &str) -> Result<(), ModFileError> {
        let mut hint = None;
        for exclude in &self.exclude {
            if exclude.module.path == path {
                if exclude.module.version == version {
                    return Ok(());
                }
                hint = Some(exclude.syntax);
            }
        }
        let tokens = vec![String::from("exclude"), auto_quote(path), version.to_string()];
        let syntax = self.syntax.add_line(hint, tokens);
        self.exclude.push(Exclude {
            module: ModuleVersion::new(path, version),
            syntax,
        });
        debug!(path, version, "added exclusion");
        Ok(())
    }

    pub fn drop_exclude(&mut self, path: &str, version: &str) -> Result<(), ModFileError> {
        for exclude in self
            .exclude
            .iter_mut()
            .filter(|x| x.module.path == path && x.module.version == version)
        {
            self.syntax.remove_line(exclude.syntax);
            exclude.module = ModuleVersion::default();
        }
        debug!(path, version, "dropped exclusion");
        Ok(())
    }

    /// Replace `old_path@old_version` with `new_path@new_version`.
    ///
    /// An empty `new_version` makes `new_path` a directory replacement.
    /// `old_version` is required.
    pub fn add_replace(
        &mut self,
        old_path: &str,
        old_version: &str,
        new_path: &str,
        new_version: &str,
    ) -> Result<(), ModFileError> {
        if old_version.is_empty() {
            return Err(ModFileError::InvalidEdit(format!(
                "replace {old_path} needs a version to replace"
            )));
        }
        let tokens = replace_tokens(old_path, old_version, new_path, new_version);
        let mut hint = None;
        let mut found = false;
        for replace in self.replace.iter_mut().filter(|r| r.old.path == old_path) {
            if replace.old.version != old_version {
                hint = Some(replace.syntax);
                continue;
            }
            if found {
                self.syntax.remove_line(replace.syntax);
                replace.old = ModuleVersion::default();
                replace.new = ModuleVersion::default();
            } else {
                replace.new = ModuleVersion::new(new_path, new_version);
                self.syntax.update_line(replace.syntax, tokens.clone());
                found = true;
            }
        }
        if found {
            debug!(old_path, old_version, new_path, new_version, "updated replacement");
            return Ok(());
        }

        let syntax = self.syntax.add_line(hint, tokens);
        self.replace.push(Replace {
            old: ModuleVersion::new(old_path, old_version),
            new: ModuleVersion::new(new_path, new_version),
            syntax,
        });
        debug!(old_path, old_version, new_path, new_version, "added replacement");
        Ok(())
    }

    pub fn drop_replace(&mut self, old_path: &str, old_version: &str) -> Result<(), ModFileError> {
        for replace in self
            .replace
            .iter_mut()
            .filter(|r| r.old.path == old_path && r.old.version == old_version)
        {
            self.syntax.remove_line(replace.syntax);
            replace.old = ModuleVersion::default();
            replace.new = ModuleVersion::default();
        }
        debug!(old_path, old_version, "dropped replacement");
        Ok(())
    }

    /// Requirements that have not been dropped
    pub fn live_requires(&self) -> impl Iterator<Item = &Require> {
        self.require.iter().filter(|r| !r.module.is_cleared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(source: &str) -> ModFile {
        ModFile::parse("go.mod", source.as_bytes()).unwrap()
    }

    /// Lines backing more than one record
    fn shared_lines(f: &ModFile) -> Vec<LineId> {
        let mut seen = HashSet::new();
        f.require
            .iter()
            .map(|r| r.syntax)
            .chain(f.exclude.iter().map(|x| x.syntax))
            .chain(f.replace.iter().map(|r| r.syntax))
            .filter(|id| !seen.insert(*id))
            .collect()
    }

    #[test]
    fn set_module_adds_then_updates() {
        let mut f = ModFile::new("go.mod");
        f.set_module("example.com/m").unwrap();
        assert_eq!(f.format(), "module example.com/m\n");
        f.set_module("example.com/n").unwrap();
        f.set_module("example.com/n").unwrap();
        assert_eq!(f.format(), "module example.com/n\n");
        assert_eq!(f.module_path(), Some("example.com/n"));
    }

    #[test]
    fn add_require_appends_into_existing_statement() {
        let mut f = file("module m\n\nrequire example.com/a v1.0.0\n");
        f.add_require("example.com/b", "v1.1.0").unwrap();
        assert_eq!(
            f.format(),
            "module m\n\nrequire (\n\texample.com/a v1.0.0\n\texample.com/b v1.1.0\n)\n"
        );
        f.add_require("example.com/b", "v1.1.0").unwrap();
        assert_eq!(f.require.len(), 2);
    }

    #[test]
    fn add_require_updates_first_and_drops_duplicates() {
        let mut f = file("require (\n\texample.com/a v1.0.0\n\texample.com/a v1.1.0\n)\n");
        f.add_require("example.com/a", "v1.2.0").unwrap();
        assert_eq!(f.require[0].module.version, "v1.2.0");
        assert!(f.require[1].module.is_cleared());
        assert_eq!(f.format(), "require (\n\texample.com/a v1.2.0\n)\n");
        assert_eq!(f.live_requires().count(), 1);
    }

    #[test]
    fn set_require_reconciles_everything() {
        let mut f = file(
            "module m\n\nrequire (\n\texample.com/c v1.0.0 // keep me\n\texample.com/a v1.0.0\n\texample.com/gone v1.0.0\n)\n\nrequire example.com/a v1.1.0\n",
        );
        f.set_require(&[
            ModuleVersion::new("example.com/a", "v1.2.0"),
            ModuleVersion::new("example.com/c", "v1.0.1"),
            ModuleVersion::new("example.com/new", "v0.1.0"),
        ])
        .unwrap();

        assert_eq!(
            f.format(),
            "module m\n\nrequire (\n\texample.com/a v1.2.0\n\texample.com/c v1.0.1 // keep me\n\texample.com/new v0.1.0\n)\n"
        );
        let required: Vec<_> = f.require.iter().map(|r| r.module.to_string()).collect();
        assert_eq!(
            required,
            vec!["example.com/c@v1.0.1", "example.com/a@v1.2.0", "example.com/new@v0.1.0"]
        );
        assert!(shared_lines(&f).is_empty());
    }

    #[test]
    fn set_require_leaves_other_blocks_alone() {
        let mut f = file("require (\n\ta v1.0.0\n\tb v1.0.0\n)\n\nexclude (\n\ta v0.1.0\n\ta v0.2.0\n)\n");
        f.set_require(&[ModuleVersion::new("b", "v1.1.0")]).unwrap();
        assert_eq!(
            f.format(),
            "require (\n\tb v1.1.0\n)\n\nexclude (\n\ta v0.1.0\n\ta v0.2.0\n)\n"
        );
        assert_eq!(f.exclude.len(), 2);
    }

    #[test]
    fn set_require_last_duplicate_wins() {
        let mut f = file("require example.com/a v1.0.0\n");
        f.set_require(&[
            ModuleVersion::new("example.com/a", "v1.1.0"),
            ModuleVersion::new("example.com/a", "v1.3.0"),
        ])
        .unwrap();
        assert_eq!(f.format(), "require example.com/a v1.3.0\n");
    }

    #[test]
    fn set_require_to_nothing_removes_block() {
        let mut f = file("module m\n\nrequire (\n\ta v1.0.0\n\tb v1.0.0\n)\n");
        f.set_require(&[]).unwrap();
        assert_eq!(f.format(), "module m\n");
        assert!(f.require.is_empty());
    }

    #[test]
    fn set_require_twice_is_stable() {
        let mut f = file("module m\n\nrequire (\n\tb v1.0.0 // note\n\ta v1.0.0\n)\n");
        let desired = [ModuleVersion::new("a", "v1.1.0"), ModuleVersion::new("c", "v0.1.0")];
        f.set_require(&desired).unwrap();
        let once = f.format();
        f.set_require(&desired).unwrap();
        assert_eq!(f.format(), once);
        assert_eq!(once, "module m\n\nrequire (\n\ta v1.1.0\n\tc v0.1.0\n)\n");
        assert_eq!(f.require.len(), 2);
    }

    #[test]
    fn set_require_after_drop_removes_emptied_block() {
        let mut f = file("module m\n\nrequire (\n\ta v1.0.0\n\tb v1.0.0\n)\n");
        f.drop_require("a").unwrap();
        f.set_require(&[]).unwrap();
        assert_eq!(f.format(), "module m\n");
        assert!(f.require.is_empty());
    }

    #[test]
    fn drop_require_tombstones_all_matches() {
        let mut f = file("require (\n\ta v1.0.0\n\tb v1.0.0\n\ta v1.1.0\n)\n");
        f.drop_require("a").unwrap();
        assert_eq!(f.require.len(), 3);
        assert_eq!(f.live_requires().count(), 1);
        assert_eq!(f.format(), "require (\n\tb v1.0.0\n)\n");
    }

    #[test]
    fn add_exclude_is_idempotent_and_clusters() {
        let mut f = file("exclude (\n\ta v1.0.0\n\tb v1.0.0\n)\n");
        f.add_exclude("a", "v1.1.0").unwrap();
        f.add_exclude("a", "v1.1.0").unwrap();
        assert_eq!(f.exclude.len(), 3);
        assert_eq!(f.format(), "exclude (\n\ta v1.0.0\n\ta v1.1.0\n\tb v1.0.0\n)\n");
    }

    #[test]
    fn drop_exclude_needs_exact_pair() {
        let mut f = file("exclude a v1.0.0\n");
        f.drop_exclude("a", "v2.0.0").unwrap();
        assert_eq!(f.format(), "exclude a v1.0.0\n");
        f.drop_exclude("a", "v1.0.0").unwrap();
        assert_eq!(f.format(), "");
    }

    #[test]
    fn add_replace_updates_in_place() {
        let mut f = file("replace a v1.0.0 => ../a\n");
        f.add_replace("a", "v1.0.0", "example.com/fork", "v1.0.1").unwrap();
        assert_eq!(f.format(), "replace a v1.0.0 => example.com/fork v1.0.1\n");
        assert_eq!(f.replace.len(), 1);
        assert_eq!(f.replace[0].new, ModuleVersion::new("example.com/fork", "v1.0.1"));
    }

    #[test]
    fn add_replace_collapses_duplicate_keys() {
        let mut f = file("replace (\n\ta v1.0.0 => ../x\n\ta v1.0.0 => ../y\n)\n");
        f.add_replace("a", "v1.0.0", "../z", "").unwrap();
        f.add_replace("a", "v1.0.0", "../z", "").unwrap();
        assert_eq!(f.format(), "replace (\n\ta v1.0.0 => ../z\n)\n");
        assert_eq!(f.replace[0].new, ModuleVersion::new("../z", ""));
        assert!(f.replace[1].old.is_cleared());
        f.cleanup();
        assert_eq!(f.format(), "replace a v1.0.0 => ../z\n");
        assert_eq!(f.replace.len(), 1);
    }

    #[test]
    fn add_replace_requires_old_version() {
        let mut f = file("module m\n");
        let err = f.add_replace("example.com/a", "", "../a", "").unwrap_err();
        assert!(matches!(err, ModFileError::InvalidEdit(_)));
        assert_eq!(f.format(), "module m\n");
        assert!(f.replace.is_empty());

        f.add_replace("example.com/a", "v1.0.0", "../a", "").unwrap();
        let written = f.format();
        let reread = ModFile::parse("go.mod", written.as_bytes()).unwrap();
        assert_eq!(reread.replace[0].old, ModuleVersion::new("example.com/a", "v1.0.0"));
    }

    #[test]
    fn add_replace_groups_by_old_path() {
        let mut f = file("replace (\n\ta v1.0.0 => ../a\n\tb v1.0.0 => ../b\n)\n");
        f.add_replace("a", "v1.1.0", "../a2", "").unwrap();
        assert_eq!(
            f.format(),
            "replace (\n\ta v1.0.0 => ../a\n\ta v1.1.0 => ../a2\n\tb v1.0.0 => ../b\n)\n"
        );
    }

    #[test]
    fn add_replace_quotes_paths_that_need_it() {
        let mut f = ModFile::new("go.mod");
        f.add_replace("a", "v1.0.0", "../dir with space", "").unwrap();
        assert_eq!(f.format(), "replace a v1.0.0 => \"../dir with space\"\n");
    }

    #[test]
    fn drop_replace_removes_every_match() {
        let mut f = file("replace a v1.0.0 => ../a\nreplace a v1.0.0 => ../b\nreplace c v1.0.0 => ../c\n");
        f.drop_replace("a", "v1.0.0").unwrap();
        assert_eq!(f.format(), "replace c v1.0.0 => ../c\n");
        assert!(f.replace[0].old.is_cleared());
        assert!(f.replace[1].old.is_cleared());
    }
}
