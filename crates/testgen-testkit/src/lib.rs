//! Test utilities for testgen
//!
//! This crate provides shared testing utilities used across the testgen workspace.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// This ensures all test temporary files are centralized in a single location
/// that is gitignored and easy to clean up manually if needed.
///
/// # Returns
///
/// A `TempDir` instance that automatically cleans up on drop.
/// The directory is created at `.tmp/<random-name>` relative to the current
/// directory.
///
/// # Panics
///
/// Panics if:
/// - Unable to determine current directory
/// - Unable to create `.tmp/` directory
/// - Unable to create temporary subdirectory
///
/// # Examples
///
/// ```rust
/// use testgen_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("test.txt");
/// std::fs::write(&file_path, "test data").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// Write `content` to `dir/name`, creating parent directories
///
/// Returns the path of the written file.
///
/// # Examples
///
/// ```rust
/// use testgen_testkit::{temp_dir_in_workspace, write_template};
///
/// let temp = temp_dir_in_workspace();
/// let path = write_template(temp.path(), "suite/int.tt", "@comment\n@comment_\n");
/// assert!(path.ends_with("suite/int.tt"));
/// ```
pub fn write_template(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("Failed to create {}: {}", parent.display(), e));
    }
    std::fs::write(&path, content)
        .unwrap_or_else(|e| panic!("Failed to write {}: {}", path.display(), e));
    path
}

/// Snapshot every file below `root` as `relative path -> content`
///
/// Paths use `/` separators. Directories are not listed, so two trees
/// compare equal when they hold the same files with the same bytes.
pub fn snapshot_tree(root: &Path) -> BTreeMap<String, String> {
    let mut snapshot = BTreeMap::new();

    for entry in WalkDir::new(root) {
        let entry = entry.unwrap_or_else(|e| panic!("Failed to walk {}: {}", root.display(), e));
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("walked path should be below root");
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read_to_string(entry.path())
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", entry.path().display(), e));

        snapshot.insert(key, content);
    }

    snapshot
}

/// Create an executable stand-in for a toolchain program in `dir`
///
/// Point `PATH` at `dir` to make toolchain lookups succeed without a real
/// compiler installed.
pub fn fake_tool(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir)
        .unwrap_or_else(|e| panic!("Failed to create {}: {}", dir.display(), e));

    #[cfg(windows)]
    let path = dir.join(format!("{}.exe", name));
    #[cfg(not(windows))]
    let path = dir.join(name);

    std::fs::write(&path, "#!/bin/sh\nexit 0\n")
        .unwrap_or_else(|e| panic!("Failed to write {}: {}", path.display(), e));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path)
            .expect("Failed to get metadata")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("Failed to set permissions");
    }

    path
}
