//! Filesystem state: what changed on disk since the last successful build.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use kiln_cache::{ChangeSet, FileStateManifest, SourceHasher, TargetFileState};
use kiln_common::ContentHash;
use kiln_project::{collect_source_files, BuildTarget, ProjectModel, SourceRoot};

use crate::delta::{FilesDelta, FilesDeltaProvider};
use crate::scope::CompileScope;

#[derive(Debug, Default)]
struct TargetState {
    delta: Arc<FilesDelta>,
    changes: ChangeSet,
    hashes: BTreeMap<PathBuf, ContentHash>,
}

/// The result of comparing every target's sources against the file-state
/// manifest.
///
/// New and modified files become dirty under the root they were found in;
/// files recorded in the manifest that no longer exist become removed files.
#[derive(Debug, Default)]
pub struct FsState {
    targets: BTreeMap<BuildTarget, TargetState>,
}

impl FsState {
    /// Scans the effective source roots of every target of `model`.
    pub fn scan(model: &ProjectModel, manifest: &FileStateManifest) -> Self {
        let empty = TargetFileState::default();
        let mut targets = BTreeMap::new();
        for target in model.targets() {
            let mut root_of = BTreeMap::new();
            for root in model.target_roots(&target) {
                let mut files = Vec::new();
                collect_source_files(&root.path, &mut files);
                for file in files {
                    root_of.entry(file).or_insert_with(|| root.clone());
                }
            }

            let paths: Vec<PathBuf> = root_of.keys().cloned().collect();
            let hashes = SourceHasher::hash_files(&paths);
            let previous = manifest.target(&target.to_string()).unwrap_or(&empty);
            let changes = SourceHasher::detect_changes(&hashes, previous);

            let mut dirty: BTreeMap<SourceRoot, _> = BTreeMap::new();
            for file in changes.dirty_files() {
                if let Some(root) = root_of.get(file) {
                    dirty
                        .entry(root.clone())
                        .or_insert_with(BTreeSet::new)
                        .insert(file.clone());
                }
            }
            tracing::debug!(
                build_target = %target,
                dirty = changes.dirty_count(),
                removed = changes.deleted_files.len(),
                "scanned target sources"
            );
            targets.insert(
                target,
                TargetState {
                    delta: Arc::new(FilesDelta::from_sources(dirty)),
                    changes,
                    hashes,
                },
            );
        }
        Self { targets }
    }

    /// Targets known to this state.
    pub fn targets(&self) -> impl Iterator<Item = &BuildTarget> {
        self.targets.keys()
    }

    /// The change set computed for `target`.
    pub fn changes(&self, target: &BuildTarget) -> Option<&ChangeSet> {
        self.targets.get(target).map(|t| &t.changes)
    }

    /// Files of `target` deleted since its last successful build.
    pub fn removed_files(&self, target: &BuildTarget) -> &[PathBuf] {
        self.targets
            .get(target)
            .map(|t| t.changes.deleted_files.as_slice())
            .unwrap_or_default()
    }

    /// A scope covering `targets` (every target when `None`) that reports
    /// the removed files found by the scan.
    pub fn compile_scope(&self, targets: Option<Vec<BuildTarget>>) -> CompileScope {
        let removed = self
            .targets
            .iter()
            .filter(|(_, t)| !t.changes.deleted_files.is_empty())
            .map(|(target, t)| (target.clone(), t.changes.deleted_files.clone()))
            .collect();
        let scope = match targets {
            Some(targets) => CompileScope::for_targets(targets),
            None => CompileScope::all(),
        };
        scope.with_removed(removed)
    }

    /// Records the scanned hashes of `target` as its new up-to-date state.
    ///
    /// Call only after the target compiled successfully, so that a failed
    /// target stays dirty for the next build.
    pub fn mark_up_to_date(&self, target: &BuildTarget, manifest: &mut FileStateManifest) {
        if let Some(state) = self.targets.get(target) {
            manifest.set_target(
                target.to_string(),
                TargetFileState {
                    files: state.hashes.clone(),
                },
            );
        }
    }
}

impl FilesDeltaProvider for FsState {
    fn effective_files_delta(&self, target: &BuildTarget) -> Arc<FilesDelta> {
        self.targets
            .get(target)
            .map(|t| Arc::clone(&t.delta))
            .unwrap_or_default()
    }
}
