//! Validation of template-supplied output paths
//!
//! `dir` sections and `@file` directives name paths relative to the current
//! output directory. Those names come from template text, so they are checked
//! before anything is created or removed: a path that is absolute, rooted or
//! climbs with `..` could otherwise wipe or write outside the output root.
//!
//! `Path::is_absolute()` alone is not enough on Windows, where `/tmp` is
//! rooted but not absolute, so the checks are component based.

use anyhow::{bail, Result};
use std::path::{Component, Path};

/// Check if path is absolute OR rooted (cross-platform)
///
/// # Examples
///
/// ```rust
/// use std::path::Path;
/// use testgen_core::path::has_absolute_or_rooted_component;
///
/// assert!(has_absolute_or_rooted_component(Path::new("/tmp")));
/// assert!(!has_absolute_or_rooted_component(Path::new("integer/add")));
/// ```
pub fn has_absolute_or_rooted_component(path: &Path) -> bool {
    if path.is_absolute() {
        return true;
    }

    path.components()
        .any(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}

/// Check that `path` stays below the directory it is joined to
///
/// Accepts one or more normal components; `.` components are tolerated.
///
/// # Errors
///
/// Fails for empty, absolute or rooted paths, drive prefixes and `..`.
///
/// # Examples
///
/// ```rust
/// use std::path::Path;
/// use testgen_core::path::is_safe_relative;
///
/// assert!(is_safe_relative(Path::new("integer")).is_ok());
/// assert!(is_safe_relative(Path::new("integer/add.c")).is_ok());
/// assert!(is_safe_relative(Path::new("../escape")).is_err());
/// assert!(is_safe_relative(Path::new("/tmp")).is_err());
/// ```
pub fn is_safe_relative(path: &Path) -> Result<()> {
    if has_absolute_or_rooted_component(path) {
        bail!("Path cannot be absolute or rooted: '{}'", path.display());
    }

    let mut normal_count = 0;

    for component in path.components() {
        match component {
            Component::Normal(_) => normal_count += 1,
            Component::CurDir => {}
            Component::Prefix(_) => {
                bail!("Path cannot contain drive prefix: '{}'", path.display())
            }
            Component::RootDir => {
                bail!("Path cannot be absolute or rooted: '{}'", path.display())
            }
            Component::ParentDir => {
                bail!(
                    "Path cannot contain parent directory (..): '{}'",
                    path.display()
                )
            }
        }
    }

    if normal_count == 0 {
        bail!("Path must name a file or directory: '{}'", path.display());
    }

    Ok(())
}
