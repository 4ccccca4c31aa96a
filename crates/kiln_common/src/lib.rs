//! Shared foundational types used across the Kiln incremental build engine.
//!
//! This crate provides content hashing for change detection, the source file
//! classifier that decides which files belong to the language, and small path
//! helpers used when reasoning about project and build directories.

#![warn(missing_docs)]

pub mod hash;
pub mod paths;
pub mod source_file;

pub use hash::ContentHash;
pub use paths::{absolute, is_ancestor};
pub use source_file::{is_source_file, SOURCE_EXTENSION};
