//! Implementation of the `modedit edit` command.

use anyhow::{bail, Context, Result};
use modfile_core::version;
use modfile_core::{is_directory_path, ModFile, ModuleVersion};
use std::path::Path;
use tracing::debug;

use crate::format::{load_manifest, write_if_changed};

/// Edits requested on the command line.
///
/// They are applied in a fixed order: module path, requirements,
/// exclusions, then replacements, with drops before additions in each
/// group.
#[derive(Debug, Default)]
pub struct EditOptions {
    pub module: Option<String>,
    /// `path@version` specs
    pub require: Vec<String>,
    pub drop_require: Vec<String>,
    /// `path@version` specs
    pub exclude: Vec<String>,
    pub drop_exclude: Vec<String>,
    /// `old@version=new[@version]` specs
    pub replace: Vec<String>,
    /// `old@version` specs
    pub drop_replace: Vec<String>,
    pub sort: bool,
    pub print: bool,
}

/// Parse a `path@version` spec, canonicalizing the version.
fn parse_path_version(spec: &str) -> Result<ModuleVersion> {
    let Some((path, raw)) = spec.rsplit_once('@') else {
        bail!("invalid `{spec}`: expected path@version");
    };
    if path.is_empty() {
        bail!("invalid `{spec}`: empty module path");
    }
    let Some(canonical) = version::canonical(raw) else {
        bail!("invalid `{spec}`: version must be of the form v1.2.3");
    };
    Ok(ModuleVersion::new(path, canonical))
}

/// Parse an `old@version=new[@version]` spec.
fn parse_replace_spec(spec: &str) -> Result<(ModuleVersion, ModuleVersion)> {
    let Some((old, new)) = spec.split_once('=') else {
        bail!("invalid `{spec}`: expected old@version=new[@version]");
    };
    let old = parse_path_version(old)?;
    let new = if is_directory_path(new) {
        ModuleVersion::new(new, "")
    } else if new.contains('@') {
        parse_path_version(new)?
    } else {
        bail!("invalid `{spec}`: replacement without version must be a directory path");
    };
    Ok((old, new))
}

/// Apply `options` to a loaded manifest.
pub(crate) fn apply_edits(file: &mut ModFile, options: &EditOptions) -> Result<()> {
    if let Some(path) = &options.module {
        file.set_module(path)?;
    }

    for path in &options.drop_require {
        file.drop_require(path)?;
    }
    for spec in &options.require {
        let module = parse_path_version(spec)?;
        file.add_require(&module.path, &module.version)?;
    }

    for spec in &options.drop_exclude {
        let module = parse_path_version(spec)?;
        file.drop_exclude(&module.path, &module.version)?;
    }
    for spec in &options.exclude {
        let module = parse_path_version(spec)?;
        file.add_exclude(&module.path, &module.version)?;
    }

    for spec in &options.drop_replace {
        let old = parse_path_version(spec)?;
        file.drop_replace(&old.path, &old.version)?;
    }
    for spec in &options.replace {
        let (old, new) = parse_replace_spec(spec)?;
        file.add_replace(&old.path, &old.version, &new.path, &new.version)?;
    }

    if options.sort {
        file.sort_blocks();
    }
    file.cleanup();
    Ok(())
}

/// Edit the manifest at `path`, writing it back or printing it.
pub fn edit_manifest(path: &Path, options: &EditOptions) -> Result<()> {
    let mut file = load_manifest(path)?;
    apply_edits(&mut file, options)?;
    let content = file.format();

    // never write out a manifest that would not load again
    ModFile::parse(&file.syntax.name, content.as_bytes())
        .context("Edits produced an invalid manifest")?;

    if options.print {
        print!("{content}");
        return Ok(());
    }
    let changed = write_if_changed(path, &content)?;
    debug!(path = %path.display(), changed, "applied edits");
    Ok(())
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
    fn test_parse_path_version() {
        let module = parse_path_version("example.com/a@v1.2").unwrap();
        assert_eq!(module, ModuleVersion::new("example.com/a", "v1.2.0"));
        assert!(parse_path_version("example.com/a").is_err());
        assert!(parse_path_version("@v1.0.0").is_err());
        assert!(parse_path_version("example.com/a@latest").is_err());
    }

    #[test]
    fn test_parse_replace_spec() {
        let (old, new) = parse_replace_spec("example.com/a@v1.0.0=../a").unwrap();
        assert_eq!(old, ModuleVersion::new("example.com/a", "v1.0.0"));
        assert_eq!(new, ModuleVersion::new("../a", ""));

        let (_, new) = parse_replace_spec("example.com/a@v1.0.0=example.com/b@v1.1.0").unwrap();
        assert_eq!(new, ModuleVersion::new("example.com/b", "v1.1.0"));

        assert!(parse_replace_spec("example.com/a@v1.0.0=example.com/b").is_err());
        assert!(parse_replace_spec("example.com/a@v1.0.0").is_err());
    }

    #[test]
    fn test_edit_writes_manifest() {
        let dir = TempDir::new().unwrap();
        let manifest_path = setup_test_manifest(
            &dir,
            "module example.com/m\n\nrequire (\n\texample.com/b v1.0.0 // keep\n\texample.com/old v1.0.0\n)\n",
        );

        let options = EditOptions {
            require: vec!["example.com/a@v0.2.0".into(), "example.com/b@v1.1.0".into()],
            drop_require: vec!["example.com/old".into()],
            exclude: vec!["example.com/b@v1.0.5".into()],
            replace: vec!["example.com/a@v0.2.0=./a".into()],
            sort: true,
            ..EditOptions::default()
        };
        edit_manifest(&manifest_path, &options).unwrap();

        let content = fs::read_to_string(&manifest_path).unwrap();
        assert_eq!(
            content,
            "module example.com/m\n\nrequire (\n\texample.com/a v0.2.0\n\texample.com/b v1.1.0 // keep\n)\n\nexclude example.com/b v1.0.5\n\nreplace example.com/a v0.2.0 => ./a\n"
        );
    }

    #[test]
    fn test_edit_drops_and_module() {
        let dir = TempDir::new().unwrap();
        let manifest_path = setup_test_manifest(
            &dir,
            "module example.com/m\n\nexclude example.com/x v1.0.0\n\nreplace example.com/y v1.0.0 => ../y\n",
        );

        let options = EditOptions {
            module: Some("example.com/renamed".into()),
            drop_exclude: vec!["example.com/x@v1.0.0".into()],
            drop_replace: vec!["example.com/y@v1.0.0".into()],
            ..EditOptions::default()
        };
        edit_manifest(&manifest_path, &options).unwrap();

        let content = fs::read_to_string(&manifest_path).unwrap();
        assert_eq!(content, "module example.com/renamed\n");
    }

    #[test]
    fn test_edit_rejects_invalid_result() {
        let dir = TempDir::new().unwrap();
        let original = "module example.com/m\n";
        let manifest_path = setup_test_manifest(&dir, original);

        let options = EditOptions {
            require: vec!["example.com/m/v2@v1.0.0".into()],
            ..EditOptions::default()
        };
        let err = edit_manifest(&manifest_path, &options).unwrap_err();
        assert!(format!("{err:#}").contains("should be v2, not v1"));
        assert_eq!(fs::read_to_string(&manifest_path).unwrap(), original);
    }

    #[test]
    fn test_edit_bad_spec_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let original = "module example.com/m\n";
        let manifest_path = setup_test_manifest(&dir, original);

        let options = EditOptions {
            exclude: vec!["example.com/a".into()],
            ..EditOptions::default()
        };
        assert!(edit_manifest(&manifest_path, &options).is_err());
        assert_eq!(fs::read_to_string(&manifest_path).unwrap(), original);
    }
}
