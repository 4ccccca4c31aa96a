//! Error types for incremental-state operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing persisted build state.
///
/// Reads are fail-safe: decoding errors are logged and turned into "no
/// state". Writes propagate their errors, since a build that cannot persist
/// its own history cannot be trusted by later incremental builds.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a state file.
    #[error("build state I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file-state manifest could not be parsed as valid JSON.
    #[error("failed to parse file-state manifest: {reason}")]
    ManifestParse {
        /// Description of the parse failure.
        reason: String,
    },

    /// A history file has an invalid or missing header.
    #[error("invalid history header in {path}: {reason}")]
    InvalidHeader {
        /// The history file path.
        path: PathBuf,
        /// Description of the header problem.
        reason: String,
    },

    /// The stored checksum does not match the checksum of the payload.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// The history file path.
        path: PathBuf,
        /// The checksum recorded in the header.
        expected: String,
        /// The checksum computed from the payload.
        actual: String,
    },

    /// The history format version does not match the current version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The history file path.
        path: PathBuf,
        /// The expected format version.
        expected: u32,
        /// The format version found in the file.
        actual: u32,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}
