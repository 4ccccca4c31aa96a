//! Which targets and files a build covers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use kiln_project::BuildTarget;

/// The part of the project a build was asked to cover.
pub trait BuildScope: Send + Sync {
    /// Returns `true` if `file` of `target` is within the build.
    fn is_affected(&self, target: &BuildTarget, file: &Path) -> bool;

    /// Files of `target` deleted since its last successful build.
    fn removed_files(&self, target: &BuildTarget) -> Vec<PathBuf>;
}

/// The scope of one `kiln build` invocation.
#[derive(Debug, Clone, Default)]
pub struct CompileScope {
    targets: Option<BTreeSet<BuildTarget>>,
    files: Option<BTreeSet<PathBuf>>,
    removed: BTreeMap<BuildTarget, Vec<PathBuf>>,
}

impl CompileScope {
    /// A scope covering every target and file.
    pub fn all() -> Self {
        Self::default()
    }

    /// A scope covering only `targets`.
    pub fn for_targets(targets: impl IntoIterator<Item = BuildTarget>) -> Self {
        Self {
            targets: Some(targets.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Restricts the scope to `files`.
    pub fn with_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.files = Some(files.into_iter().collect());
        self
    }

    /// Sets the removed files reported per target.
    pub fn with_removed(mut self, removed: BTreeMap<BuildTarget, Vec<PathBuf>>) -> Self {
        self.removed = removed;
        self
    }

    /// Returns `true` if `target` is covered.
    pub fn contains_target(&self, target: &BuildTarget) -> bool {
        self.targets.as_ref().map_or(true, |t| t.contains(target))
    }
}

impl BuildScope for CompileScope {
    fn is_affected(&self, target: &BuildTarget, file: &Path) -> bool {
        self.contains_target(target) && self.files.as_ref().map_or(true, |f| f.contains(file))
    }

    fn removed_files(&self, target: &BuildTarget) -> Vec<PathBuf> {
        if !self.contains_target(target) {
            return Vec::new();
        }
        self.removed.get(target).cloned().unwrap_or_default()
    }
}
