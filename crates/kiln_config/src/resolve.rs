//! Resolution of module declarations into absolute filesystem layouts.

use crate::types::{DependencySpec, ModuleConfig, ProjectConfig};
use std::path::{Path, PathBuf};

/// A source root of a module with its path resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoot {
    /// Absolute root directory.
    pub path: PathBuf,
    /// Whether this is a test source root.
    pub tests: bool,
    /// Whether the root holds generated sources.
    pub generated: bool,
    /// Package prefix of the root.
    pub package_prefix: Option<String>,
}

/// A module with every path made absolute and every default applied.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    /// Module name.
    pub name: String,
    /// Absolute module directory.
    pub dir: PathBuf,
    /// Production, generated and test source roots, in declaration order.
    pub roots: Vec<ResolvedRoot>,
    /// Absolute build directory.
    pub build_dir: PathBuf,
    /// Absolute production output directory.
    pub output_dir: PathBuf,
    /// Absolute test output directory.
    pub test_output_dir: PathBuf,
    /// Declared dependencies.
    pub dependencies: Vec<DependencySpec>,
    /// Implemented common modules.
    pub expected_by: Vec<String>,
    /// Absolute library classpath entries.
    pub libraries: Vec<PathBuf>,
    /// Absolute build history file.
    pub history_file: PathBuf,
}

/// Resolves all modules of `config` against `project_dir`, in name order.
pub fn resolve_modules(config: &ProjectConfig, project_dir: &Path) -> Vec<ResolvedModule> {
    config
        .modules
        .iter()
        .map(|(name, module)| resolve_module(name, module, project_dir))
        .collect()
}

fn resolve_module(name: &str, module: &ModuleConfig, project_dir: &Path) -> ResolvedModule {
    let dir = project_dir.join(module.path.as_deref().unwrap_or(name));
    let build_dir = dir.join(&module.build_dir);

    let root = |rel: &String, tests: bool, generated: bool| ResolvedRoot {
        path: dir.join(rel),
        tests,
        generated,
        package_prefix: module.package_prefix.clone(),
    };
    let mut roots: Vec<ResolvedRoot> = module.sources.iter().map(|s| root(s, false, false)).collect();
    roots.extend(module.generated_sources.iter().map(|s| root(s, false, true)));
    roots.extend(module.test_sources.iter().map(|s| root(s, true, false)));

    let output_dir = module
        .output_dir
        .as_ref()
        .map(|p| dir.join(p))
        .unwrap_or_else(|| build_dir.join("classes").join("kotlin").join("main"));
    let test_output_dir = module
        .test_output_dir
        .as_ref()
        .map(|p| dir.join(p))
        .unwrap_or_else(|| build_dir.join("classes").join("kotlin").join("test"));
    let history_file = module
        .history_file
        .as_ref()
        .map(|p| dir.join(p))
        .unwrap_or_else(|| build_dir.join("kotlin").join("build-history.bin"));

    ResolvedModule {
        name: name.to_string(),
        libraries: module.libraries.iter().map(|l| dir.join(l)).collect(),
        dependencies: module.dependencies.clone(),
        expected_by: module.expected_by.clone(),
        dir,
        roots,
        build_dir,
        output_dir,
        test_output_dir,
        history_file,
    }
}
