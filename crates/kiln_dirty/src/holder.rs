//! Per-round snapshots of dirty and removed files.
//!
//! A holder computes its snapshot on first access and keeps it for the rest
//! of the round. Later changes to the underlying deltas are not observed.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use kiln_project::{BuildTarget, ModuleChunk, SourceRoot};

use crate::collector::{collect_dirty_files, removed_source_files};
use crate::delta::FilesDeltaProvider;
use crate::scope::BuildScope;

static NO_FILES: BTreeSet<PathBuf> = BTreeSet::new();

/// Dirty and removed source files of one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetFiles {
    /// Files to recompile.
    pub dirty: BTreeSet<PathBuf>,
    /// Deleted files whose outputs must be dropped.
    pub removed: BTreeSet<PathBuf>,
}

impl TargetFiles {
    /// Returns `true` if there is nothing to do for the target.
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && self.removed.is_empty()
    }
}

fn snapshot(
    target: &BuildTarget,
    provider: &dyn FilesDeltaProvider,
    scope: &dyn BuildScope,
) -> TargetFiles {
    let delta = provider.effective_files_delta(target);
    let mut dirty = BTreeSet::new();
    collect_dirty_files(target, &delta, scope, |_, file, _| {
        dirty.insert(file.to_path_buf());
        true
    });
    TargetFiles {
        dirty,
        removed: removed_source_files(scope, target),
    }
}

/// Dirty files of a single target.
pub struct TargetDirtyFilesHolder<'a> {
    target: BuildTarget,
    provider: &'a dyn FilesDeltaProvider,
    scope: &'a dyn BuildScope,
    files: OnceLock<TargetFiles>,
}

impl<'a> TargetDirtyFilesHolder<'a> {
    /// Creates a holder for `target`.
    pub fn new(
        target: BuildTarget,
        provider: &'a dyn FilesDeltaProvider,
        scope: &'a dyn BuildScope,
    ) -> Self {
        Self {
            target,
            provider,
            scope,
            files: OnceLock::new(),
        }
    }

    /// The target this holder covers.
    pub fn target(&self) -> &BuildTarget {
        &self.target
    }

    /// The memoized snapshot.
    pub fn files(&self) -> &TargetFiles {
        self.files
            .get_or_init(|| snapshot(&self.target, self.provider, self.scope))
    }

    /// Files to recompile.
    pub fn dirty_files(&self) -> &BTreeSet<PathBuf> {
        &self.files().dirty
    }

    /// Deleted source files.
    pub fn removed_files(&self) -> &BTreeSet<PathBuf> {
        &self.files().removed
    }

    /// Returns `true` if the target has anything to compile or clean up.
    pub fn has_dirty_or_removed_files(&self) -> bool {
        !self.files().is_empty()
    }

    /// Feeds the current dirty files to `processor` without using the snapshot.
    pub fn process_dirty_files<F>(&self, processor: F) -> bool
    where
        F: FnMut(&BuildTarget, &Path, &SourceRoot) -> bool,
    {
        let delta = self.provider.effective_files_delta(&self.target);
        collect_dirty_files(&self.target, &delta, self.scope, processor)
    }
}

/// Dirty files of every target of a chunk.
///
/// Targets without dirty and without removed files are left out of
/// [`by_target`](Self::by_target). The snapshot is computed once, even when
/// first accessed from several threads at the same time.
pub struct ChunkDirtyFilesHolder<'a> {
    chunk: &'a ModuleChunk,
    provider: &'a dyn FilesDeltaProvider,
    scope: &'a dyn BuildScope,
    by_target: OnceLock<BTreeMap<BuildTarget, TargetFiles>>,
}

impl<'a> ChunkDirtyFilesHolder<'a> {
    /// Creates a holder for `chunk`.
    pub fn new(
        chunk: &'a ModuleChunk,
        provider: &'a dyn FilesDeltaProvider,
        scope: &'a dyn BuildScope,
    ) -> Self {
        Self {
            chunk,
            provider,
            scope,
            by_target: OnceLock::new(),
        }
    }

    /// The chunk this holder covers.
    pub fn chunk(&self) -> &ModuleChunk {
        self.chunk
    }

    /// The memoized snapshot of the targets that have work.
    pub fn by_target(&self) -> &BTreeMap<BuildTarget, TargetFiles> {
        self.by_target.get_or_init(|| {
            self.chunk
                .targets()
                .filter_map(|target| {
                    let files = snapshot(target, self.provider, self.scope);
                    (!files.is_empty()).then(|| (target.clone(), files))
                })
                .collect()
        })
    }

    /// Dirty files of `target`.
    pub fn dirty_files(&self, target: &BuildTarget) -> &BTreeSet<PathBuf> {
        self.by_target().get(target).map_or(&NO_FILES, |f| &f.dirty)
    }

    /// Removed files of `target`.
    pub fn removed_files(&self, target: &BuildTarget) -> &BTreeSet<PathBuf> {
        self.by_target().get(target).map_or(&NO_FILES, |f| &f.removed)
    }

    /// File names of the removed files of every target.
    pub fn removed_file_names(&self) -> Vec<String> {
        self.by_target()
            .values()
            .flat_map(|f| &f.removed)
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Returns `true` if any target has dirty files.
    pub fn has_dirty_files(&self) -> bool {
        self.by_target().values().any(|f| !f.dirty.is_empty())
    }

    /// Returns `true` if any target has removed files.
    pub fn has_removed_files(&self) -> bool {
        self.by_target().values().any(|f| !f.removed.is_empty())
    }

    /// Number of distinct removed files across targets.
    pub fn removed_files_count(&self) -> usize {
        self.by_target()
            .values()
            .flat_map(|f| &f.removed)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Dirty files of every target.
    pub fn all_dirty_files(&self) -> BTreeSet<PathBuf> {
        self.by_target()
            .values()
            .flat_map(|f| f.dirty.iter().cloned())
            .collect()
    }

    /// Dirty and removed files of every target.
    pub fn dirty_or_removed_files(&self) -> BTreeSet<PathBuf> {
        self.by_target()
            .values()
            .flat_map(|f| f.dirty.iter().chain(&f.removed).cloned())
            .collect()
    }

    /// Returns `true` if any target of the chunk has work.
    pub fn has_dirty_or_removed_files(&self) -> bool {
        !self.by_target().is_empty()
    }

    /// Feeds the dirty files of every target to `processor`, target by
    /// target, stopping as soon as it returns `false`.
    pub fn process_dirty_files<F>(&self, mut processor: F) -> bool
    where
        F: FnMut(&BuildTarget, &Path, &SourceRoot) -> bool,
    {
        for target in self.chunk.targets() {
            let delta = self.provider.effective_files_delta(target);
            if !collect_dirty_files(target, &delta, self.scope, &mut processor) {
                return false;
            }
        }
        true
    }
}
