//! The per-target set of files waiting for recompilation.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kiln_project::{BuildTarget, SourceRoot};

/// Files to recompile, grouped by the source root they were found under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaData {
    /// Dirty files per source root.
    pub sources_to_recompile: BTreeMap<SourceRoot, BTreeSet<PathBuf>>,
}

/// The files of one target that changed since its last successful build.
///
/// Shared between the filesystem state and the holders of a round; readers
/// hold the lock only while copying entries out.
#[derive(Debug, Default)]
pub struct FilesDelta {
    data: Mutex<DeltaData>,
}

impl FilesDelta {
    /// An empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// A delta holding `sources`.
    pub fn from_sources(sources: BTreeMap<SourceRoot, BTreeSet<PathBuf>>) -> Self {
        Self {
            data: Mutex::new(DeltaData {
                sources_to_recompile: sources,
            }),
        }
    }

    /// Locks the delta. The lock is released when the guard is dropped.
    pub fn lock_data(&self) -> MutexGuard<'_, DeltaData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `file` under `root` as needing recompilation.
    pub fn mark_dirty(&self, root: SourceRoot, file: PathBuf) {
        self.lock_data()
            .sources_to_recompile
            .entry(root)
            .or_default()
            .insert(file);
    }

    /// Number of dirty files across all roots.
    pub fn len(&self) -> usize {
        self.lock_data().sources_to_recompile.values().map(BTreeSet::len).sum()
    }

    /// Returns `true` if no file is dirty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Supplies the effective delta of a target.
pub trait FilesDeltaProvider: Send + Sync {
    /// The delta of `target`; empty if nothing is known about it.
    fn effective_files_delta(&self, target: &BuildTarget) -> Arc<FilesDelta>;
}
