//! Persistent incremental-build state.
//!
//! Two kinds of state survive between build sessions:
//! - the file-state manifest, recording content hashes of every source file
//!   as of the last successful build of each target, from which the
//!   "changed since last build" delta is computed;
//! - per-module build history files holding the declaration-level changes of
//!   recent builds ([`BuildDiffsStorage`]), appended through a
//!   [`ChangesRegistry`] and consulted by downstream modules.
//!
//! Every read is fail-safe: a missing or corrupt file reads as "no state",
//! which degrades to a full rebuild rather than failing the build.

#![warn(missing_docs)]

pub mod error;
pub mod hasher;
pub mod manifest;
pub mod registry;
pub mod storage;

pub use error::CacheError;
pub use hasher::{ChangeSet, SourceHasher};
pub use manifest::{FileStateManifest, TargetFileState};
pub use registry::{ChangesRegistry, FileChangesRegistry, DEFAULT_MAX_HISTORY_ENTRIES};
pub use storage::{BuildDifference, BuildDiffsStorage, DirtyData, LookupSymbol};
