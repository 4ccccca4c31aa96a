//! Configuration types deserialized from `kiln.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Build settings.
    #[serde(default)]
    pub build: BuildConfig,
    /// External compiler invocation.
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Modules of the project, keyed by module name.
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,
}

/// Core project metadata required in every `kiln.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Settings controlling incremental builds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// When `false`, every round compiles all sources of the affected targets
    /// instead of only the dirty ones.
    pub incremental: bool,
    /// Keep module descriptor files after the compiler ran.
    pub keep_module_files: bool,
    /// Directory for module descriptor files (system temp dir if unset).
    pub module_file_dir: Option<String>,
    /// Number of build differences retained per history file.
    pub max_history_entries: usize,
    /// Directory holding the file-state manifest, relative to the project.
    pub cache_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            incremental: true,
            keep_module_files: false,
            module_file_dir: None,
            max_history_entries: 10,
            cache_dir: ".kiln".to_string(),
        }
    }
}

/// The external compiler command.
///
/// The path of the module descriptor file is appended as the last argument.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompilerConfig {
    /// Program followed by its fixed arguments.
    #[serde(default)]
    pub command: Vec<String>,
}

/// Configuration of a single module.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleConfig {
    /// Module directory relative to the project; defaults to the module name.
    #[serde(default)]
    pub path: Option<String>,
    /// Production source roots relative to the module directory.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    /// Test source roots relative to the module directory.
    #[serde(default = "default_test_sources")]
    pub test_sources: Vec<String>,
    /// Production source roots holding generated code.
    #[serde(default)]
    pub generated_sources: Vec<String>,
    /// Package prefix applied to all source roots of the module.
    #[serde(default)]
    pub package_prefix: Option<String>,
    /// Build directory relative to the module directory.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    /// Production output directory; defaults to `<build_dir>/classes/kotlin/main`.
    #[serde(default)]
    pub output_dir: Option<String>,
    /// Test output directory; defaults to `<build_dir>/classes/kotlin/test`.
    #[serde(default)]
    pub test_output_dir: Option<String>,
    /// Module dependencies.
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    /// Common modules whose expected declarations this module implements.
    #[serde(default)]
    pub expected_by: Vec<String>,
    /// Library classpath entries (jars or class directories).
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Build history file; defaults to `<build_dir>/kotlin/build-history.bin`.
    #[serde(default)]
    pub history_file: Option<String>,
}

fn default_sources() -> Vec<String> {
    vec!["src/main/kotlin".to_string()]
}

fn default_test_sources() -> Vec<String> {
    vec!["src/test/kotlin".to_string()]
}

fn default_build_dir() -> String {
    "build".to_string()
}

/// A dependency on another module: either a bare module name or a table.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// `"core"` means compile scope, not exported.
    Name(String),
    /// `{ module = "core", scope = "test", exported = true }`.
    Detailed {
        /// The module depended upon.
        module: String,
        /// Classpath scope of the dependency.
        #[serde(default)]
        scope: DependencyScope,
        /// Whether dependents of this module see the dependency too.
        #[serde(default)]
        exported: bool,
    },
}

impl DependencySpec {
    /// Name of the module depended upon.
    pub fn module(&self) -> &str {
        match self {
            DependencySpec::Name(name) => name,
            DependencySpec::Detailed { module, .. } => module,
        }
    }

    /// Classpath scope of the dependency.
    pub fn scope(&self) -> DependencyScope {
        match self {
            DependencySpec::Name(_) => DependencyScope::Compile,
            DependencySpec::Detailed { scope, .. } => *scope,
        }
    }

    /// Whether the dependency is re-exported to dependents.
    pub fn exported(&self) -> bool {
        matches!(self, DependencySpec::Detailed { exported: true, .. })
    }
}

/// Classpath scope of a module dependency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyScope {
    /// Visible to production and test compilation.
    #[default]
    Compile,
    /// Visible to test compilation only.
    Test,
    /// Not visible to compilation at all.
    Runtime,
    /// Visible to compilation but not packaged.
    Provided,
}

impl DependencyScope {
    /// Whether the dependency is on the compile classpath of production
    /// (`tests == false`) or test (`tests == true`) compilation.
    pub fn in_compile_classpath(self, tests: bool) -> bool {
        match self {
            DependencyScope::Compile | DependencyScope::Provided => true,
            DependencyScope::Test => tests,
            DependencyScope::Runtime => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_classpath_inclusion() {
        assert!(DependencyScope::Compile.in_compile_classpath(false));
        assert!(DependencyScope::Compile.in_compile_classpath(true));
        assert!(DependencyScope::Provided.in_compile_classpath(false));
        assert!(!DependencyScope::Test.in_compile_classpath(false));
        assert!(DependencyScope::Test.in_compile_classpath(true));
        assert!(!DependencyScope::Runtime.in_compile_classpath(true));
    }

    #[test]
    fn dependency_spec_accessors() {
        let bare = DependencySpec::Name("core".to_string());
        assert_eq!(bare.module(), "core");
        assert_eq!(bare.scope(), DependencyScope::Compile);
        assert!(!bare.exported());

        let detailed = DependencySpec::Detailed {
            module: "testkit".to_string(),
            scope: DependencyScope::Test,
            exported: true,
        };
        assert_eq!(detailed.module(), "testkit");
        assert_eq!(detailed.scope(), DependencyScope::Test);
        assert!(detailed.exported());
    }

    #[test]
    fn build_defaults() {
        let b = BuildConfig::default();
        assert!(b.incremental);
        assert!(!b.keep_module_files);
        assert_eq!(b.max_history_entries, 10);
        assert_eq!(b.cache_dir, ".kiln");
    }
}
