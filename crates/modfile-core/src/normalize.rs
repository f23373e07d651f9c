//! Deduplication, sorting and compaction

use std::collections::HashSet;

use modfile_syntax::LineId;
use tracing::debug;

use crate::manifest::ModFile;

impl ModFile {
    /// Remove duplicate exclusions and replacements.
    ///
    /// The first `exclude` of a `path version` pair is kept. For
    /// `replace`, the last statement for an old `path version` wins, as it
    /// would when the file is read top to bottom. Duplicates are removed
    /// from both the records and the tree; dropped records are left for
    /// [`ModFile::cleanup`].
    pub fn remove_dups(&mut self) {
        let mut kill: HashSet<LineId> = HashSet::new();

        let mut seen = HashSet::new();
        for exclude in &self.exclude {
            if !exclude.module.is_cleared() && !seen.insert(&exclude.module) {
                kill.insert(exclude.syntax);
            }
        }

        let mut seen = HashSet::new();
        for replace in self.replace.iter().rev() {
            if !replace.old.is_cleared() && !seen.insert(&replace.old) {
                kill.insert(replace.syntax);
            }
        }

        if kill.is_empty() {
            return;
        }
        self.exclude.retain(|x| !kill.contains(&x.syntax));
        self.replace.retain(|r| !kill.contains(&r.syntax));
        self.syntax.retain_lines(|id, _| !kill.contains(&id));
        debug!(removed = kill.len(), "removed duplicate statements");
    }

    /// Remove duplicates, then sort the lines of every block
    pub fn sort_blocks(&mut self) {
        self.remove_dups();
        self.syntax.sort_blocks();
    }

    /// Purge dropped records and unlink their lines
    pub fn cleanup(&mut self) {
        let before = self.require.len() + self.exclude.len() + self.replace.len();
        self.require.retain(|r| !r.module.is_cleared());
        self.exclude.retain(|x| !x.module.is_cleared());
        self.replace.retain(|r| !r.old.is_cleared());
        self.syntax.cleanup();
        let after = self.require.len() + self.exclude.len() + self.replace.len();
        debug!(purged = before - after, "cleaned up manifest");
    }
}
