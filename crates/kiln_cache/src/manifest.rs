//! File-state manifest recording source hashes of the last successful build.
//!
//! Stored as `fs-state.json` in the cache directory. Each build target has its
//! own file map so that a chunk that failed to compile keeps its old hashes
//! and stays dirty for the next build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kiln_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::storage::replace_file;

/// Name of the manifest file within the cache directory.
const MANIFEST_FILE: &str = "fs-state.json";

/// Source file hashes per build target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileStateManifest {
    /// Kiln version that produced this manifest. Invalidated on version change.
    pub kiln_version: String,

    /// Per-target file state, keyed by the target's display name (`app`, `app:test`).
    pub targets: BTreeMap<String, TargetFileState>,
}

/// Hashes of a target's source files as of its last successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFileState {
    /// Content hash per absolute source file path.
    pub files: BTreeMap<PathBuf, ContentHash>,
}

impl FileStateManifest {
    /// Creates an empty manifest for the given Kiln version.
    pub fn new(kiln_version: &str) -> Self {
        Self {
            kiln_version: kiln_version.to_string(),
            targets: BTreeMap::new(),
        }
    }

    /// Loads the manifest from the cache directory, returning `None` if the
    /// file doesn't exist or can't be parsed.
    pub fn load(cache_dir: &Path) -> Option<Self> {
        let path = cache_dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                let err = CacheError::ManifestParse {
                    reason: e.to_string(),
                };
                tracing::debug!(path = %path.display(), %err, "discarding file-state manifest");
                None
            }
        }
    }

    /// Loads a compatible manifest or starts from an empty one.
    pub fn load_or_new(cache_dir: &Path, kiln_version: &str) -> Self {
        Self::load(cache_dir)
            .filter(|m| m.is_compatible(kiln_version))
            .unwrap_or_else(|| Self::new(kiln_version))
    }

    /// Saves the manifest, replacing the previous file atomically.
    ///
    /// Creates the cache directory if it doesn't exist.
    pub fn save(&self, cache_dir: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        replace_file(&cache_dir.join(MANIFEST_FILE), json.as_bytes())
    }

    /// Returns `true` if this manifest was produced by a compatible Kiln version.
    pub fn is_compatible(&self, current_version: &str) -> bool {
        self.kiln_version == current_version
    }

    /// The recorded state of a target; empty if the target never built.
    pub fn target(&self, key: &str) -> Option<&TargetFileState> {
        self.targets.get(key)
    }

    /// Replaces the recorded state of a target.
    pub fn set_target(&mut self, key: impl Into<String>, state: TargetFileState) {
        self.targets.insert(key.into(), state);
    }

    /// Forgets a target so that all of its files read as new.
    pub fn invalidate_target(&mut self, key: &str) {
        self.targets.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(files: &[(&str, &[u8])]) -> TargetFileState {
        TargetFileState {
            files: files
                .iter()
                .map(|(p, c)| (PathBuf::from(p), ContentHash::from_bytes(c)))
                .collect(),
        }
    }

    #[test]
    fn new_manifest_is_empty() {
        let m = FileStateManifest::new("0.1.0");
        assert_eq!(m.kiln_version, "0.1.0");
        assert!(m.targets.is_empty());
        assert!(m.target("app").is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = FileStateManifest::new("0.1.0");
        m.set_target("app", state(&[("/p/app/src/App.kt", b"class App")]));
        m.save(dir.path()).unwrap();

        let loaded = FileStateManifest::load(dir.path()).unwrap();
        assert_eq!(loaded.kiln_version, "0.1.0");
        assert_eq!(loaded.target("app"), m.target("app"));
    }

    #[test]
    fn load_nonexistent_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileStateManifest::load(dir.path()).is_none());
    }

    #[test]
    fn load_corrupt_json_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "not valid json {{{").unwrap();
        assert!(FileStateManifest::load(dir.path()).is_none());
    }

    #[test]
    fn version_change_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let mut m = FileStateManifest::new("0.1.0");
        m.set_target("app", state(&[("/p/App.kt", b"x")]));
        m.save(dir.path()).unwrap();

        let fresh = FileStateManifest::load_or_new(dir.path(), "0.2.0");
        assert!(fresh.targets.is_empty());
        assert_eq!(fresh.kiln_version, "0.2.0");

        let same = FileStateManifest::load_or_new(dir.path(), "0.1.0");
        assert_eq!(same.targets.len(), 1);
    }

    #[test]
    fn invalidate_target_forgets_state() {
        let mut m = FileStateManifest::new("0.1.0");
        m.set_target("app", state(&[("/p/App.kt", b"x")]));
        m.invalidate_target("app");
        assert!(m.target("app").is_none());
    }

    #[test]
    fn save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deeply").join("nested").join(".kiln");
        FileStateManifest::new("0.1.0").save(&nested).unwrap();
        assert!(nested.join(MANIFEST_FILE).exists());
    }
}
