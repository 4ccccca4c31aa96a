//! Dirty-file tracking for incremental builds.
//!
//! The filesystem state ([`FsState`]) knows, per build target, which source
//! files changed since the target last compiled successfully and which were
//! deleted. The holders in this crate take a snapshot of that state for one
//! build round, filtered by the [`BuildScope`] and by the source-file
//! classifier. Files under roots borrowed from common modules are always
//! collected, even when the scope does not cover them.

#![warn(missing_docs)]

pub mod collector;
pub mod delta;
pub mod fs_state;
pub mod holder;
pub mod scope;

pub use collector::{collect_dirty_files, removed_source_files};
pub use delta::{DeltaData, FilesDelta, FilesDeltaProvider};
pub use fs_state::FsState;
pub use holder::{ChunkDirtyFilesHolder, TargetDirtyFilesHolder, TargetFiles};
pub use scope::{BuildScope, CompileScope};
