//! Module metadata inside archives.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use zip::ZipArchive;

/// Suffix of the compiled module metadata entries, compared case-insensitively.
const MODULE_METADATA_SUFFIX: &str = ".kotlin_module";

/// Names of the modules whose metadata the archive at `path` contains.
///
/// A module name is the file stem of a metadata entry, so
/// `META-INF/core.kotlin_module` yields `core`. An archive that cannot be
/// opened or read yields no names.
pub fn module_names_in_archive(path: &Path) -> BTreeSet<String> {
    match read_module_names(path) {
        Ok(names) => names,
        Err(e) => {
            tracing::debug!(path = %path.display(), %e, "cannot read archive entries");
            BTreeSet::new()
        }
    }
}

fn read_module_names(path: &Path) -> zip::result::ZipResult<BTreeSet<String>> {
    let mut zip = ZipArchive::new(File::open(path)?)?;
    let mut names = BTreeSet::new();
    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        let name = entry.name();
        if !name.to_ascii_lowercase().ends_with(MODULE_METADATA_SUFFIX) {
            continue;
        }
        if let Some(stem) = Path::new(name).file_stem() {
            names.insert(stem.to_string_lossy().into_owned());
        }
    }
    Ok(names)
}
