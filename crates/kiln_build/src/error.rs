//! Error types for build rounds.

use std::path::PathBuf;

use kiln_cache::CacheError;

/// Errors that fail a build round.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The module descriptor file could not be created.
    #[error("could not create module file when building chunk {chunk} in dir {}", dir.display())]
    ModuleFile {
        /// The chunk being built.
        chunk: String,
        /// Directory the file was to be created in.
        dir: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The compiler ran but reported failure, or could not be started.
    #[error("compilation of {chunk} failed: {reason}")]
    Compiler {
        /// The chunk being built.
        chunk: String,
        /// What went wrong.
        reason: String,
    },

    /// A build history file could not be updated.
    #[error("failed to update build history: {0}")]
    History(#[from] CacheError),

    /// An I/O error outside the descriptor and history files.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
