//! Source file hashing and change detection.
//!
//! Computes content hashes for source files and compares them against a
//! target's recorded state to identify which files are new, modified,
//! deleted, or unchanged since the target's last successful build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_common::ContentHash;

use crate::error::CacheError;
use crate::manifest::TargetFileState;

/// Result of comparing current source hashes against a recorded state.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Files that are not present in the recorded state.
    pub new_files: Vec<PathBuf>,

    /// Files whose content hash differs from the recorded state.
    pub modified_files: Vec<PathBuf>,

    /// Files present in the recorded state but not in the current file set.
    pub deleted_files: Vec<PathBuf>,

    /// Files whose content hash matches the recorded state.
    pub unchanged_files: Vec<PathBuf>,
}

impl ChangeSet {
    /// Returns `true` if there are no new, modified, or deleted files.
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty()
    }

    /// Files that need recompilation: new files, then modified ones.
    pub fn dirty_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.new_files.iter().chain(self.modified_files.iter())
    }

    /// Returns the number of files that need recompilation.
    pub fn dirty_count(&self) -> usize {
        self.new_files.len() + self.modified_files.len()
    }
}

/// Computes content hashes of source files and detects changes.
pub struct SourceHasher;

impl SourceHasher {
    /// Computes the content hash of a single file.
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        ContentHash::of_file(path).map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Computes content hashes for multiple files.
    ///
    /// Files that cannot be read are skipped and therefore show up as
    /// deleted in the change set.
    pub fn hash_files(paths: &[PathBuf]) -> BTreeMap<PathBuf, ContentHash> {
        let mut hashes = BTreeMap::new();
        for path in paths {
            match Self::hash_file(path) {
                Ok(hash) => {
                    hashes.insert(path.clone(), hash);
                }
                Err(e) => tracing::debug!(%e, "skipping unreadable source file"),
            }
        }
        hashes
    }

    /// Categorizes `current_hashes` against the recorded `previous` state.
    pub fn detect_changes(
        current_hashes: &BTreeMap<PathBuf, ContentHash>,
        previous: &TargetFileState,
    ) -> ChangeSet {
        let mut changes = ChangeSet::default();

        for (path, hash) in current_hashes {
            match previous.files.get(path) {
                Some(old) if old == hash => changes.unchanged_files.push(path.clone()),
                Some(_) => changes.modified_files.push(path.clone()),
                None => changes.new_files.push(path.clone()),
            }
        }

        changes.deleted_files = previous
            .files
            .keys()
            .filter(|p| !current_hashes.contains_key(*p))
            .cloned()
            .collect();

        changes
    }
}
