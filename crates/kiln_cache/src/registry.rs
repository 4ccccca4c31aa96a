//! Recording build changes into a module's history file.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::CacheError;
use crate::storage::{BuildDifference, BuildDiffsStorage, DirtyData};

/// Default number of build differences retained per history file.
pub const DEFAULT_MAX_HISTORY_ENTRIES: usize = 10;

/// A sink for the changes produced by successive builds of one module.
pub trait ChangesRegistry: Send + Sync {
    /// Appends a precise record of what a build at `ts` changed.
    fn register_changes(&self, ts: i64, dirty_data: DirtyData) -> Result<(), CacheError>;

    /// Discards the recorded history and starts over with a single
    /// non-incremental entry at `ts`, meaning "anything may have changed".
    fn unknown_changes(&self, ts: i64) -> Result<(), CacheError>;
}

/// A [`ChangesRegistry`] backed by a build history file.
pub struct FileChangesRegistry {
    file: PathBuf,
    max_entries: usize,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileChangesRegistry {
    /// Creates a registry writing to `file`, keeping the default number of entries.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self::with_max_entries(file, DEFAULT_MAX_HISTORY_ENTRIES)
    }

    /// Creates a registry writing to `file`, keeping at most `max_entries`.
    /// At least one entry is always kept.
    pub fn with_max_entries(file: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            file: file.into(),
            max_entries: max_entries.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// The history file this registry writes.
    pub fn file(&self) -> &Path {
        &self.file
    }

    fn append(&self, diff: BuildDifference) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut storage = BuildDiffsStorage::read_from_file(&self.file).unwrap_or_default();
        storage.build_diffs.push(diff);
        storage.write_to_file(&self.file, self.max_entries)
    }
}

impl ChangesRegistry for FileChangesRegistry {
    fn register_changes(&self, ts: i64, dirty_data: DirtyData) -> Result<(), CacheError> {
        tracing::debug!(
            file = %self.file.display(),
            ts,
            lookups = dirty_data.dirty_lookup_symbols.len(),
            classes = dirty_data.dirty_classes_fq_names.len(),
            "registering build changes"
        );
        self.append(BuildDifference {
            ts,
            is_incremental: true,
            dirty_data,
        })
    }

    fn unknown_changes(&self, ts: i64) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = std::fs::remove_file(&self.file) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(file = %self.file.display(), %e, "could not remove build history");
            }
        }
        tracing::debug!(file = %self.file.display(), ts, "build history reset: unknown changes");
        let storage = BuildDiffsStorage::new(vec![BuildDifference {
            ts,
            is_incremental: false,
            dirty_data: DirtyData::default(),
        }]);
        storage.write_to_file(&self.file, self.max_entries)
    }
}
