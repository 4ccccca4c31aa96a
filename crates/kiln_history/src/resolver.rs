//! Mapping artifacts back to the history files of the modules that built them.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use kiln_common::{absolute, is_ancestor};

use crate::archive::module_names_in_archive;
use crate::modules::{GradleModule, GradleModulesInfo};

/// Finds the build history file of the module that produced an artifact.
pub trait ModulesApiHistory: Send + Sync {
    /// The history file of the module owning `file`, a class directory entry
    /// or an archive; `None` if no module of the project owns it.
    fn history_file_for_artifact(&self, file: &Path) -> Option<PathBuf>;
}

/// A resolver that knows no modules.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyModulesApiHistory;

impl ModulesApiHistory for EmptyModulesApiHistory {
    fn history_file_for_artifact(&self, _file: &Path) -> Option<PathBuf> {
        None
    }
}

/// Resolves artifacts against the modules of a [`GradleModulesInfo`].
///
/// Directory lookups are memoized for the lifetime of the resolver, which
/// may be shared between chunk workers.
pub struct GradleModulesApiHistory {
    info: GradleModulesInfo,
    project_root: PathBuf,
    dir_cache: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
}

impl GradleModulesApiHistory {
    /// Creates a resolver over `info`.
    pub fn new(info: GradleModulesInfo) -> Self {
        let project_root = absolute(&info.project_root);
        Self {
            info,
            project_root,
            dir_cache: Mutex::new(HashMap::new()),
        }
    }

    /// The modules this resolver knows.
    pub fn modules_info(&self) -> &GradleModulesInfo {
        &self.info
    }

    fn history_for_archive(&self, jar: &Path) -> Option<PathBuf> {
        let candidates: BTreeSet<&GradleModule> = module_names_in_archive(jar)
            .iter()
            .filter_map(|name| self.info.name_to_modules.get(name))
            .flatten()
            .collect();
        candidates
            .into_iter()
            .find(|m| is_ancestor(&absolute(&m.build_dir), jar))
            .map(|m| m.build_history_file.clone())
    }

    fn history_for_dir(&self, start: &Path) -> Option<PathBuf> {
        let mut cache = self.dir_cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut visited = Vec::new();
        let mut dir = start;
        let result = loop {
            if let Some(cached) = cache.get(dir) {
                break cached.clone();
            }
            visited.push(dir.to_path_buf());
            if let Some(module) = self.info.dir_to_module.get(dir) {
                break Some(module.build_history_file.clone());
            }
            match dir.parent() {
                Some(parent) if is_ancestor(&self.project_root, parent) => dir = parent,
                _ => break None,
            }
        };
        for dir in visited {
            cache.insert(dir, result.clone());
        }
        result
    }
}

impl ModulesApiHistory for GradleModulesApiHistory {
    fn history_file_for_artifact(&self, file: &Path) -> Option<PathBuf> {
        let file = absolute(file);
        if !is_ancestor(&self.project_root, &file) {
            return None;
        }
        let is_archive = file
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("jar"));
        if is_archive {
            self.history_for_archive(&file)
        } else {
            self.history_for_dir(file.parent()?)
        }
    }
}
