//! The project module graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use kiln_common::is_source_file;
use kiln_config::{resolve_modules, DependencySpec, ProjectConfig, ResolvedModule};

use crate::common_roots::CommonSourceRootPropagator;
use crate::root::{RootKind, SourceRoot};
use crate::target::{BuildTarget, TargetKind};

/// A module of the project, with every path resolved.
pub type Module = ResolvedModule;

/// The module graph of one build session.
///
/// Built once from the project configuration and shared read-only.
#[derive(Debug, Clone)]
pub struct ProjectModel {
    root: PathBuf,
    modules: BTreeMap<String, Module>,
}

impl ProjectModel {
    /// Creates a model from already-resolved modules.
    pub fn new(root: impl Into<PathBuf>, modules: impl IntoIterator<Item = Module>) -> Self {
        Self {
            root: root.into(),
            modules: modules.into_iter().map(|m| (m.name.clone(), m)).collect(),
        }
    }

    /// Resolves `config` against `project_dir` and builds the model.
    pub fn from_config(config: &ProjectConfig, project_dir: &Path) -> Self {
        Self::new(project_dir, resolve_modules(config, project_dir))
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All modules in name order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// Looks up a module by name.
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Production and test targets of every module.
    pub fn targets(&self) -> Vec<BuildTarget> {
        self.modules
            .keys()
            .flat_map(|name| [BuildTarget::production(name), BuildTarget::test(name)])
            .collect()
    }

    /// Direct dependencies of the target's module that are on the target's
    /// compile classpath.
    pub fn compile_dependencies<'a>(
        &'a self,
        target: &BuildTarget,
    ) -> impl Iterator<Item = &'a DependencySpec> + 'a {
        let tests = target.is_tests();
        self.module(&target.module)
            .into_iter()
            .flat_map(|m| m.dependencies.iter())
            .filter(move |d| d.scope().in_compile_classpath(tests))
    }

    /// Roots declared by the target's own module.
    pub fn native_roots(&self, target: &BuildTarget) -> Vec<SourceRoot> {
        let Some(module) = self.module(&target.module) else {
            return Vec::new();
        };
        module
            .roots
            .iter()
            .filter(|r| r.tests == target.is_tests())
            .map(|r| SourceRoot {
                path: r.path.clone(),
                target: target.clone(),
                generated: r.generated,
                tests: r.tests,
                package_prefix: r.package_prefix.clone(),
                kind: RootKind::Native,
            })
            .collect()
    }

    /// The target's effective roots: its own roots followed by the roots
    /// borrowed from implemented common modules.
    pub fn target_roots(&self, target: &BuildTarget) -> Vec<SourceRoot> {
        let mut roots = self.native_roots(target);
        roots.extend(CommonSourceRootPropagator::new(self).additional_roots(target));
        roots
    }

    /// Output directory of a target.
    pub fn output_dir(&self, target: &BuildTarget) -> Option<&Path> {
        let module = self.module(&target.module)?;
        Some(match target.kind {
            TargetKind::Production => &module.output_dir,
            TargetKind::Test => &module.test_output_dir,
        })
    }

    /// Output directories whose internal declarations the target may see.
    /// A test target is a friend of its module's production output.
    pub fn friend_output_dirs(&self, target: &BuildTarget) -> Vec<PathBuf> {
        match (target.kind, self.module(&target.module)) {
            (TargetKind::Test, Some(module)) => vec![module.output_dir.clone()],
            _ => Vec::new(),
        }
    }

    /// Compile classpath of a target: outputs and libraries of dependency
    /// modules (followed transitively through exported dependencies), the
    /// module's own libraries, and for tests the module's production output.
    ///
    /// Entries that do not exist are kept only when they look like a class
    /// file or an archive, so that missing libraries are reported by the
    /// compiler rather than silently dropped.
    pub fn classpath_roots(&self, target: &BuildTarget) -> Vec<PathBuf> {
        let Some(module) = self.module(&target.module) else {
            return Vec::new();
        };
        let tests = target.is_tests();
        let mut roots = Vec::new();
        if tests {
            roots.push(module.output_dir.clone());
        }
        roots.extend(module.libraries.iter().cloned());

        let mut visited = BTreeSet::from([module.name.as_str()]);
        let mut queue: VecDeque<&DependencySpec> =
            self.compile_dependencies(target).collect();
        while let Some(dep) = queue.pop_front() {
            if !visited.insert(dep.module()) {
                continue;
            }
            let Some(dep_module) = self.module(dep.module()) else {
                continue;
            };
            roots.push(dep_module.output_dir.clone());
            if tests {
                roots.push(dep_module.test_output_dir.clone());
            }
            roots.extend(dep_module.libraries.iter().cloned());
            queue.extend(
                dep_module
                    .dependencies
                    .iter()
                    .filter(|d| d.exported() && d.scope().in_compile_classpath(tests)),
            );
        }

        let mut seen = BTreeSet::new();
        roots.retain(|r| seen.insert(r.clone()) && keep_classpath_entry(r));
        roots
    }

    /// Every source file under the target's effective roots, sorted.
    pub fn source_files(&self, target: &BuildTarget) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in self.target_roots(target) {
            collect_source_files(&root.path, &mut files);
        }
        files.sort();
        files.dedup();
        files
    }
}

fn keep_classpath_entry(path: &Path) -> bool {
    path.exists() || matches!(path.extension().and_then(|e| e.to_str()), Some("class" | "jar"))
}

/// Recursively collects source files below `dir`. Missing or unreadable
/// directories contribute nothing.
pub fn collect_source_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_source_files(&path, files);
        } else if is_source_file(&path) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::load_config_from_str;

    const CONFIG: &str = r#"
[project]
name = "demo"
version = "0.1.0"

[modules.base]
libraries = ["libs/base.jar", "libs/missing-dir"]

[modules.core]
dependencies = [{ module = "base", exported = true }]

[modules.app]
dependencies = ["core", { module = "testkit", scope = "test" }]

[modules.testkit]
"#;

    fn model() -> ProjectModel {
        let config = load_config_from_str(CONFIG).unwrap();
        ProjectModel::from_config(&config, Path::new("/p"))
    }

    #[test]
    fn targets_cover_all_modules() {
        let targets = model().targets();
        assert_eq!(targets.len(), 8);
        assert!(targets.contains(&BuildTarget::test("app")));
    }

    #[test]
    fn compile_dependencies_respect_scope() {
        let m = model();
        let prod: Vec<_> = m
            .compile_dependencies(&BuildTarget::production("app"))
            .map(|d| d.module())
            .collect();
        assert_eq!(prod, vec!["core"]);
        let test: Vec<_> = m
            .compile_dependencies(&BuildTarget::test("app"))
            .map(|d| d.module())
            .collect();
        assert_eq!(test, vec!["core", "testkit"]);
    }

    #[test]
    fn native_roots_split_by_kind() {
        let m = model();
        let prod = m.native_roots(&BuildTarget::production("app"));
        assert_eq!(prod.len(), 1);
        assert_eq!(prod[0].path, PathBuf::from("/p/app/src/main/kotlin"));
        assert!(!prod[0].is_common());
        let test = m.native_roots(&BuildTarget::test("app"));
        assert_eq!(test[0].path, PathBuf::from("/p/app/src/test/kotlin"));
        assert!(test[0].tests);
    }

    #[test]
    fn output_and_friend_dirs() {
        let m = model();
        assert_eq!(
            m.output_dir(&BuildTarget::production("app")).unwrap(),
            Path::new("/p/app/build/classes/kotlin/main")
        );
        assert!(m.friend_output_dirs(&BuildTarget::production("app")).is_empty());
        assert_eq!(
            m.friend_output_dirs(&BuildTarget::test("app")),
            vec![PathBuf::from("/p/app/build/classes/kotlin/main")]
        );
        assert!(m.output_dir(&BuildTarget::production("nope")).is_none());
    }

    #[test]
    fn classpath_follows_exported_dependencies() {
        let m = model();
        let cp = m.classpath_roots(&BuildTarget::production("app"));
        // core's output directory does not exist and is not an archive; the
        // exported base library jar is kept even though it is missing.
        assert!(cp.contains(&PathBuf::from("/p/base/libs/base.jar")));
        assert!(!cp.contains(&PathBuf::from("/p/base/libs/missing-dir")));
        assert!(!cp.iter().any(|p| p.starts_with("/p/testkit")));
    }

    #[test]
    fn classpath_keeps_existing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_str(CONFIG).unwrap();
        let m = ProjectModel::from_config(&config, dir.path());
        let core_out = m.module("core").unwrap().output_dir.clone();
        std::fs::create_dir_all(&core_out).unwrap();

        let cp = m.classpath_roots(&BuildTarget::production("app"));
        assert_eq!(cp[0], core_out);
    }

    #[test]
    fn source_files_are_discovered() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_str(CONFIG).unwrap();
        let m = ProjectModel::from_config(&config, dir.path());
        let src = dir.path().join("app/src/main/kotlin/com/example");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("App.kt"), "class App").unwrap();
        std::fs::write(src.join("Util.java"), "class Util {}").unwrap();

        let files = m.source_files(&BuildTarget::production("app"));
        assert_eq!(files, vec![src.join("App.kt")]);
        assert!(m.source_files(&BuildTarget::test("app")).is_empty());
    }
}
