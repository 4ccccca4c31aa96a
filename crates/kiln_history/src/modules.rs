//! Description of the modules of one build session.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use kiln_project::ProjectModel;
use serde::{Deserialize, Serialize};

/// A module as seen by the history resolver.
///
/// Ordered by project path first, so sets of modules iterate in a stable
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GradleModule {
    /// Project path of the module, e.g. `:app` or `:libs:core`.
    pub project_path: String,
    /// Module name as recorded in compiled module metadata.
    pub name: String,
    /// Build directory; every artifact the module produces lives below it.
    pub build_dir: PathBuf,
    /// The module's build history file.
    pub build_history_file: PathBuf,
}

/// All modules of a session, indexed for artifact lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradleModulesInfo {
    /// Project root directory.
    pub project_root: PathBuf,
    /// Modules keyed by module directory.
    pub dir_to_module: BTreeMap<PathBuf, GradleModule>,
    /// Modules keyed by name. Several modules may share a name.
    pub name_to_modules: BTreeMap<String, BTreeSet<GradleModule>>,
}

impl GradleModulesInfo {
    /// Indexes `modules`, each given with its module directory.
    pub fn new(
        project_root: impl Into<PathBuf>,
        modules: impl IntoIterator<Item = (PathBuf, GradleModule)>,
    ) -> Self {
        let mut info = Self {
            project_root: project_root.into(),
            ..Self::default()
        };
        for (dir, module) in modules {
            info.name_to_modules
                .entry(module.name.clone())
                .or_default()
                .insert(module.clone());
            info.dir_to_module.insert(dir, module);
        }
        info
    }

    /// Describes the modules of a project model.
    pub fn from_model(model: &ProjectModel) -> Self {
        let modules = model.modules().map(|m| {
            let module = GradleModule {
                project_path: project_path(model.root(), &m.dir),
                name: m.name.clone(),
                build_dir: m.build_dir.clone(),
                build_history_file: m.history_file.clone(),
            };
            (m.dir.clone(), module)
        });
        Self::new(model.root(), modules)
    }

    /// Serializes the description as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Reads a description serialized with [`GradleModulesInfo::to_json`].
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// `:`-separated path of `dir` relative to the project root; `:` for the root.
fn project_path(root: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(root).unwrap_or(dir);
    let segments: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!(":{}", segments.join(":"))
}
