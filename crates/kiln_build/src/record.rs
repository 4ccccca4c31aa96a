//! Recording the outcome of compiled rounds in module history files.

use std::time::{SystemTime, UNIX_EPOCH};

use kiln_cache::{ChangesRegistry, DirtyData, FileChangesRegistry};
use kiln_project::{ModuleChunk, ProjectModel};

use crate::error::BuildError;

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}

/// Appends the changes of a compiled chunk to the history file of each of
/// its modules. Unknown changes reset those histories.
pub fn record_changes(
    model: &ProjectModel,
    chunk: &ModuleChunk,
    changes: Option<&DirtyData>,
    ts: i64,
    max_entries: usize,
) -> Result<(), BuildError> {
    for name in chunk.modules() {
        let Some(module) = model.module(name) else {
            continue;
        };
        let registry = FileChangesRegistry::with_max_entries(&module.history_file, max_entries);
        match changes {
            Some(data) => registry.register_changes(ts, data.clone())?,
            None => registry.unknown_changes(ts)?,
        }
    }
    Ok(())
}
