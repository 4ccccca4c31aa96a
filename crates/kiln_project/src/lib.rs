//! Project model of an incremental build session.
//!
//! Build targets, module chunks and source roots are created once per session
//! from the project configuration and shared read-only by every other part of
//! the build. The [`ProjectModel`] answers module-graph questions: effective
//! source roots (including roots borrowed from common modules), output
//! directories, classpaths, and the chunk order in which modules compile.

#![warn(missing_docs)]

pub mod chunks;
pub mod common_roots;
pub mod model;
pub mod root;
pub mod target;

pub use chunks::{chunk_levels, compute_chunks};
pub use common_roots::CommonSourceRootPropagator;
pub use model::{collect_source_files, Module, ProjectModel};
pub use root::{RootKind, SourceRoot};
pub use target::{BuildTarget, ModuleChunk, TargetKind};
