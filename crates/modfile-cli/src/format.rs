//! Implementation of the `modedit fmt` and `modedit check` commands.

use anyhow::{Context, Result};
use modfile_core::{DecodeOptions, ModFile};
use std::path::Path;
use tracing::debug;

/// Load and decode the manifest at `path`.
pub(crate) fn load_manifest(path: &Path) -> Result<ModFile> {
    if !path.exists() {
        return Err(anyhow::anyhow!("No {} found", path.display()));
    }
    ModFile::from_path(path, &DecodeOptions::default())
        .with_context(|| format!("Failed to load {}", path.display()))
}

/// Write `content` to `path` unless it already holds exactly that.
pub(crate) fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    let current = std::fs::read_to_string(path).unwrap_or_default();
    if current == content {
        debug!(path = %path.display(), "manifest unchanged");
        return Ok(false);
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Rewrite a manifest in canonical layout.
pub fn format_manifest(path: &Path, print: bool) -> Result<()> {
    let file = load_manifest(path)?;
    let content = file.format();
    if print {
        print!("{content}");
        return Ok(());
    }
    if write_if_changed(path, &content)? {
        println!("Formatted {}", path.display());
    }
    Ok(())
}

/// Decode a manifest and summarize it; any problems become the error.
pub fn check_manifest(path: &Path) -> Result<()> {
    let file = load_manifest(path)?;
    println!("{}", summary(path, &file));
    Ok(())
}

fn summary(path: &Path, file: &ModFile) -> String {
    format!(
        "{}: module {}, {} required, {} excluded, {} replaced",
        path.display(),
        file.module_path().unwrap_or("(none)"),
        file.require.len(),
        file.exclude.len(),
        file.replace.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use modfile_core::MANIFEST_FILE;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_manifest(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let manifest_path = dir.path().join(MANIFEST_FILE);
        fs::write(&manifest_path, content).unwrap();
        manifest_path
    }

    #[test]
    fn test_format_rewrites_layout() {
        let dir = TempDir::new().unwrap();
        let manifest_path = setup_test_manifest(
            &dir,
            "module   example.com/m\nrequire(\n    example.com/a   v1.0\n)\n\n\n",
        );

        format_manifest(&manifest_path, false).unwrap();

        let content = fs::read_to_string(&manifest_path).unwrap();
        assert_eq!(
            content,
            "module example.com/m\nrequire (\n\texample.com/a v1.0.0\n)\n"
        );
    }

    #[test]
    fn test_format_leaves_canonical_file_alone() {
        let dir = TempDir::new().unwrap();
        let manifest_path = setup_test_manifest(&dir, "module example.com/m\n");
        assert!(!write_if_changed(&manifest_path, "module example.com/m\n").unwrap());
        format_manifest(&manifest_path, false).unwrap();
        assert_eq!(
            fs::read_to_string(&manifest_path).unwrap(),
            "module example.com/m\n"
        );
    }

    #[test]
    fn test_check_reports_all_problems() {
        let dir = TempDir::new().unwrap();
        let manifest_path = setup_test_manifest(
            &dir,
            "module m\nrequire example.com/a bogus\nreplace example.com/b v1.0.0 => example.com/c\n",
        );

        let err = check_manifest(&manifest_path).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to load"));
        assert!(message.contains(":2: invalid module version \"bogus\""));
        assert!(message.contains(":3: replacement module without version must be directory path"));
    }

    #[test]
    fn test_check_missing_manifest() {
        let dir = TempDir::new().unwrap();
        let err = check_manifest(&dir.path().join(MANIFEST_FILE)).unwrap_err();
        assert!(err.to_string().starts_with("No "));
    }

    #[test]
    fn test_summary() {
        let file = ModFile::parse(
            MANIFEST_FILE,
            b"module example.com/m\nrequire example.com/a v1.0.0\n",
        )
        .unwrap();
        assert_eq!(
            summary(Path::new("go.mod"), &file),
            "go.mod: module example.com/m, 1 required, 0 excluded, 0 replaced"
        );
    }
}
