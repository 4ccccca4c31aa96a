//! Build history files: the recent declaration-level changes of one module.
//!
//! A history file is always rewritten as a whole. It starts with a 4-byte
//! little-endian header length, followed by a bincode header (magic bytes,
//! format version, payload checksum) and the bincode-encoded list of
//! [`BuildDifference`]s. Any inconsistency reads as "no history".

use std::io::Write;
use std::path::Path;

use kiln_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Magic bytes identifying a build history file.
const DIFFS_MAGIC: [u8; 4] = *b"KDIF";

/// Current history format version. Increment on breaking changes.
const DIFFS_FORMAT_VERSION: u32 = 1;

/// A symbol lookup whose result may have changed: a name looked up in a scope
/// (a package or class fully-qualified name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LookupSymbol {
    /// The simple name looked up.
    pub name: String,
    /// The scope it was looked up in.
    pub scope: String,
}

/// The declarations a build changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyData {
    /// Lookups whose resolution may differ after the build.
    pub dirty_lookup_symbols: Vec<LookupSymbol>,
    /// Classes whose signatures changed.
    pub dirty_classes_fq_names: Vec<String>,
}

impl DirtyData {
    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.dirty_lookup_symbols.is_empty() && self.dirty_classes_fq_names.is_empty()
    }
}

/// One persisted build: when it happened, whether its changes are precise,
/// and what changed.
///
/// `is_incremental == false` marks a point where the history is unknown;
/// consumers must treat it as "anything may have changed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDifference {
    /// Build timestamp in milliseconds since the Unix epoch.
    pub ts: i64,
    /// Whether `dirty_data` is a precise diff.
    pub is_incremental: bool,
    /// Changed declarations.
    pub dirty_data: DirtyData,
}

#[derive(Debug, Serialize, Deserialize)]
struct DiffsHeader {
    magic: [u8; 4],
    format_version: u32,
    checksum: ContentHash,
}

/// The complete content of one history file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDiffsStorage {
    /// Build differences, oldest first.
    pub build_diffs: Vec<BuildDifference>,
}

impl BuildDiffsStorage {
    /// Creates a storage holding `build_diffs`.
    pub fn new(build_diffs: Vec<BuildDifference>) -> Self {
        Self { build_diffs }
    }

    /// Reads a history file.
    ///
    /// Returns `None` if the file is missing or is not a complete, valid
    /// history; the reason is logged at debug level.
    pub fn read_from_file(path: &Path) -> Option<Self> {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(source) => {
                let err = CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                };
                tracing::debug!(%err, "build history unreadable");
                return None;
            }
        };
        match Self::decode(&raw, path) {
            Ok(storage) => Some(storage),
            Err(err) => {
                tracing::debug!(%err, "ignoring corrupt build history");
                None
            }
        }
    }

    /// Writes the `max_entries` differences with the latest timestamps to
    /// `path` in timestamp order, replacing the file atomically. Entries with
    /// equal timestamps keep their relative order. Parent directories are
    /// created as needed.
    pub fn write_to_file(&self, path: &Path, max_entries: usize) -> Result<(), CacheError> {
        let mut diffs = self.build_diffs.clone();
        diffs.sort_by_key(|d| d.ts);
        let skip = diffs.len().saturating_sub(max_entries);
        let retained = Self::new(diffs.split_off(skip));
        let bytes = retained.encode()?;
        replace_file(path, &bytes)
    }

    fn encode(&self) -> Result<Vec<u8>, CacheError> {
        let config = bincode::config::standard();
        let payload = bincode::serde::encode_to_vec(&self.build_diffs, config)
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        let header = DiffsHeader {
            magic: DIFFS_MAGIC,
            format_version: DIFFS_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes =
            bincode::serde::encode_to_vec(&header, config).map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);
        Ok(output)
    }

    fn decode(raw: &[u8], path: &Path) -> Result<Self, CacheError> {
        let invalid = |reason: &str| CacheError::InvalidHeader {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid("file shorter than header length"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_end = 4usize
            .checked_add(header_len)
            .filter(|end| *end <= raw.len())
            .ok_or_else(|| invalid("truncated header"))?;

        let config = bincode::config::standard();
        let (header, _): (DiffsHeader, usize) =
            bincode::serde::decode_from_slice(&raw[4..header_end], config)
                .map_err(|e| invalid(&e.to_string()))?;
        if header.magic != DIFFS_MAGIC {
            return Err(invalid("bad magic bytes"));
        }
        if header.format_version != DIFFS_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path: path.to_path_buf(),
                expected: DIFFS_FORMAT_VERSION,
                actual: header.format_version,
            });
        }

        let payload = &raw[header_end..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        let (build_diffs, _): (Vec<BuildDifference>, usize) =
            bincode::serde::decode_from_slice(payload, config).map_err(|e| {
                CacheError::Serialization {
                    reason: e.to_string(),
                }
            })?;
        Ok(Self { build_diffs })
    }
}

/// Replaces `path` with `bytes` by writing a sibling temporary file and
/// renaming it over the destination, so readers never observe a partial file.
pub(crate) fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
