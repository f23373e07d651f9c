//! Version validation for manifest directives.
//!
//! Versions are semantic versions with a mandatory `v` prefix
//! (`v1.2.3`, `v2.0.0-rc.1`). The shorthands `v1` and `v1.2` are accepted
//! and expand to `v1.0.0` and `v1.2.0`; build metadata is dropped when a
//! version is canonicalized.
//!
//! A module path may carry its major version: `example.com/foo/v2` only
//! accepts `v2.x.y` versions, and legacy `gopkg.in/pkg.v3` paths encode
//! the major after a dot. A path without a major suffix accepts `v0.x.y`
//! and `v1.x.y`.

use crate::quote::{self, QuoteError};
use thiserror::Error;

/// Error type a version fix hook may return
pub type FixError = Box<dyn std::error::Error + Send + Sync>;

/// Caller-supplied hook that may rewrite a version before it is validated,
/// e.g. to resolve a branch name to a tagged version.
pub type VersionFixer<'a> = dyn Fn(&str, &str) -> Result<String, FixError> + 'a;

/// Errors from version parsing and major-version checks
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("invalid quoted string: {0}")]
    Quote(#[from] QuoteError),

    /// Failure reported by the fix hook, passed through unchanged
    #[error("{0}")]
    Fix(FixError),

    #[error("version must be of the form v1.2.3")]
    Malformed,

    #[error("module path has invalid version number {0}")]
    InvalidPathMajor(String),

    #[error("invalid module: {path} should be {expected}, not {actual} ({version})")]
    MajorMismatch {
        path: String,
        expected: String,
        actual: String,
        version: String,
    },
}

/// Canonical form of `version`, or `None` if it is not a valid version.
///
/// ```
/// use modfile_core::version::canonical;
///
/// assert_eq!(canonical("v1.2").as_deref(), Some("v1.2.0"));
/// assert_eq!(canonical("v1.2.3-pre+build").as_deref(), Some("v1.2.3-pre"));
/// assert_eq!(canonical("1.2.3"), None);
/// ```
#[must_use]
pub fn canonical(version: &str) -> Option<String> {
    let rest = version.strip_prefix('v')?;
    let core_end = rest.find(['-', '+']).unwrap_or(rest.len());
    let core = &rest[..core_end];
    let full = match core.split('.').count() {
        // shorthand forms cannot carry a prerelease or build suffix
        1 if core_end == rest.len() => format!("{core}.0.0"),
        2 if core_end == rest.len() => format!("{core}.0"),
        3 => rest.to_string(),
        _ => return None,
    };
    let parsed = semver::Version::parse(&full).ok()?;
    let mut out = format!("v{}.{}.{}", parsed.major, parsed.minor, parsed.patch);
    if !parsed.pre.is_empty() {
        out.push('-');
        out.push_str(parsed.pre.as_str());
    }
    Some(out)
}

#[must_use]
pub fn is_valid(version: &str) -> bool {
    canonical(version).is_some()
}

/// Major component of a valid version: `v2.3.4` -> `v2`
#[must_use]
pub fn major(version: &str) -> Option<String> {
    let canon = canonical(version)?;
    let end = canon.find('.').unwrap_or(canon.len());
    Some(canon[..end].to_string())
}

/// Run a version token through the decode pipeline.
///
/// The token is unquoted, handed to the fix hook (if any), validated and
/// finally rewritten in place to its canonical form, so the syntax tree
/// holds exactly the version that was checked.
pub fn parse_version(
    path: &str,
    token: &mut String,
    fixer: Option<&VersionFixer<'_>>,
) -> Result<String, VersionError> {
    let mut version = quote::parse_string(token)?;
    if let Some(fix) = fixer {
        version = fix(path, &version).map_err(VersionError::Fix)?;
    }
    let canon = canonical(&version).ok_or(VersionError::Malformed)?;
    token.clone_from(&canon);
    Ok(canon)
}

/// The major version a module path requires, e.g. `v2` for
/// `example.com/foo/v2` and `v1` for `example.com/foo`.
pub fn required_major(path: &str) -> Result<String, VersionError> {
    if let Some(gopkg) = parse_gopkg_in(path) {
        return Ok(gopkg.major);
    }
    let last = path.rsplit('/').next().unwrap_or(path);
    if !is_major_suffix(last) {
        return Ok(String::from("v1"));
    }
    // v0 and v1 are never spelled out in a path
    if last.as_bytes()[1] == b'0' || last == "v1" {
        return Err(VersionError::InvalidPathMajor(last.to_string()));
    }
    Ok(last.to_string())
}

/// Check that `version` is allowed for a module at `path`.
pub fn check_path_major(path: &str, version: &str) -> Result<(), VersionError> {
    let expected = required_major(path)?;
    let actual = major(version).ok_or(VersionError::Malformed)?;
    if expected == actual || (expected == "v1" && actual == "v0") {
        return Ok(());
    }
    Err(VersionError::MajorMismatch {
        path: path.to_string(),
        expected,
        actual,
        version: version.to_string(),
    })
}

/// `v` followed by one or more digits
fn is_major_suffix(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Components of a legacy `gopkg.in` import path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopkgIn {
    /// The path up to and including the versioned element
    pub root: String,
    /// The repository the path redirects to
    pub repo: String,
    pub major: String,
    pub subdir: String,
}

/// Split a `gopkg.in/pkg.vN` or `gopkg.in/user/pkg.vN` path
#[must_use]
pub fn parse_gopkg_in(path: &str) -> Option<GopkgIn> {
    if !path.starts_with("gopkg.in/") {
        return None;
    }
    let parts: Vec<&str> = path.split('/').collect();
    if let Some((elem, major)) = parts.get(1).and_then(|p| dot_v(p)) {
        return Some(GopkgIn {
            root: parts[..2].join("/"),
            repo: format!("github.com/go-{elem}/{elem}"),
            major: major.to_string(),
            subdir: parts[2..].join("/"),
        });
    }
    if let Some((elem, major)) = parts.get(2).and_then(|p| dot_v(p)) {
        return Some(GopkgIn {
            root: parts[..3].join("/"),
            repo: format!("github.com/{}/{elem}", parts[1]),
            major: major.to_string(),
            subdir: parts[3..].join("/"),
        });
    }
    None
}

/// Split `name.vN` into `("name", "vN")`. Only `v0` may start with zero.
fn dot_v(name: &str) -> Option<(&str, &str)> {
    let (elem, digits) = name.rsplit_once(".v")?;
    if elem.len() < 2 || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.starts_with('0') && digits.len() > 1 {
        return None;
    }
    Some((elem, &name[elem.len() + 1..]))
}
