//! Path helpers for project-root and build-directory checks.

use std::path::{Path, PathBuf};

/// Makes `path` absolute against the current directory without touching the
/// filesystem. Falls back to the path itself if the current directory is
/// unavailable.
pub fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Returns `true` if `ancestor` is `path` itself or one of its ancestors.
///
/// The comparison is component-wise, so `/p/app` is not an ancestor of
/// `/p/application`.
pub fn is_ancestor(ancestor: &Path, path: &Path) -> bool {
    path.starts_with(ancestor)
}
