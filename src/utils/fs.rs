//! Filesystem helpers for locating executables.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// The user's home directory.
pub fn home_directory() -> Option<PathBuf> {
    dirs::home_dir()
}

/// Whether `path` names something the OS will run.
///
/// On Unix this means a regular file with any execute bit set. On Windows
/// the extension decides: `.exe`, `.bat`, `.com` or `.cmd`.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    has_exec_permission(path, &metadata)
}

#[cfg(unix)]
fn has_exec_permission(_path: &Path, metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_permission(path: &Path, _metadata: &Metadata) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "exe" | "bat" | "com" | "cmd"))
}

/// Resolve a program name to an absolute executable path.
///
/// Names containing a path separator are resolved against `cwd` and not
/// searched. Bare names are looked up in each entry of `path_var`
/// (an empty entry means `cwd`).
pub fn resolve_executable(name: &str, path_var: Option<&OsStr>, cwd: &Path) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let as_path = Path::new(name);
    if as_path.components().count() > 1 || as_path.is_absolute() {
        let candidate = cwd.join(as_path);
        return is_executable(&candidate).then_some(candidate);
    }

    std::env::split_paths(path_var?)
        .map(|dir| if dir.as_os_str().is_empty() { cwd.to_path_buf() } else { cwd.join(dir) })
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}
