//! Source roots borrowed from common (platform-independent) modules.
//!
//! A platform module that implements a common module compiles the common
//! module's sources together with its own. The borrowed roots are attached to
//! the platform target and tagged [`RootKind::Common`] so that dirty-file
//! collection can let them bypass the build scope.

use crate::model::ProjectModel;
use crate::root::{RootKind, SourceRoot};
use crate::target::BuildTarget;

/// Computes the additional common roots of platform targets.
pub struct CommonSourceRootPropagator<'a> {
    model: &'a ProjectModel,
}

impl<'a> CommonSourceRootPropagator<'a> {
    /// Creates a propagator over `model`.
    pub fn new(model: &'a ProjectModel) -> Self {
        Self { model }
    }

    /// Roots of the modules `target`'s module is expected by.
    ///
    /// Only direct dependencies on the target's compile classpath count. A
    /// test target gets the common module's test roots; production roots are
    /// added for both production and test targets.
    pub fn additional_roots(&self, target: &BuildTarget) -> Vec<SourceRoot> {
        let Some(module) = self.model.module(&target.module) else {
            return Vec::new();
        };
        if module.expected_by.is_empty() {
            return Vec::new();
        }

        let mut result = Vec::new();
        for dep in self.model.compile_dependencies(target) {
            if !module.expected_by.iter().any(|name| name == dep.module()) {
                continue;
            }
            let Some(common) = self.model.module(dep.module()) else {
                continue;
            };
            if target.is_tests() {
                self.add_roots(&mut result, common, true, target);
            }
            self.add_roots(&mut result, common, false, target);
        }
        result
    }

    fn add_roots(
        &self,
        result: &mut Vec<SourceRoot>,
        common: &crate::model::Module,
        tests: bool,
        target: &BuildTarget,
    ) {
        result.extend(common.roots.iter().filter(|r| r.tests == tests).map(|r| SourceRoot {
            path: r.path.clone(),
            target: target.clone(),
            generated: r.generated,
            tests: r.tests,
            package_prefix: r.package_prefix.clone(),
            kind: RootKind::Common {
                owner_module: common.name.clone(),
            },
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::load_config_from_str;
    use std::path::{Path, PathBuf};

    const CONFIG: &str = r#"
[project]
name = "mpp"
version = "0.1.0"

[modules.common]
sources = ["src/commonMain/kotlin"]
test_sources = ["src/commonTest/kotlin"]
generated_sources = ["build/generated"]

[modules.jvm]
dependencies = ["common"]
expected_by = ["common"]

[modules.js]
dependencies = [{ module = "common", scope = "test" }]
expected_by = ["common"]

[modules.plain]
dependencies = ["common"]
"#;

    fn model() -> ProjectModel {
        ProjectModel::from_config(&load_config_from_str(CONFIG).unwrap(), Path::new("/p"))
    }

    fn paths(roots: &[SourceRoot]) -> Vec<PathBuf> {
        roots.iter().map(|r| r.path.clone()).collect()
    }

    #[test]
    fn production_target_gets_production_roots() {
        let m = model();
        let target = BuildTarget::production("jvm");
        let roots = CommonSourceRootPropagator::new(&m).additional_roots(&target);
        assert_eq!(
            paths(&roots),
            vec![
                PathBuf::from("/p/common/src/commonMain/kotlin"),
                PathBuf::from("/p/common/build/generated"),
            ]
        );
        assert!(roots.iter().all(|r| r.common_owner() == Some("common")));
        assert!(roots.iter().all(|r| r.target == target));
        assert!(roots[1].generated);
    }

    #[test]
    fn test_target_gets_test_and_production_roots() {
        let m = model();
        let roots = CommonSourceRootPropagator::new(&m).additional_roots(&BuildTarget::test("jvm"));
        assert_eq!(
            paths(&roots),
            vec![
                PathBuf::from("/p/common/src/commonTest/kotlin"),
                PathBuf::from("/p/common/src/commonMain/kotlin"),
                PathBuf::from("/p/common/build/generated"),
            ]
        );
        assert!(roots[0].tests);
    }

    #[test]
    fn dependency_outside_classpath_is_ignored() {
        let m = model();
        let propagator = CommonSourceRootPropagator::new(&m);
        assert!(propagator
            .additional_roots(&BuildTarget::production("js"))
            .is_empty());
        assert_eq!(propagator.additional_roots(&BuildTarget::test("js")).len(), 3);
    }

    #[test]
    fn module_without_expected_by_gets_nothing() {
        let m = model();
        let propagator = CommonSourceRootPropagator::new(&m);
        assert!(propagator
            .additional_roots(&BuildTarget::production("plain"))
            .is_empty());
        assert!(propagator
            .additional_roots(&BuildTarget::production("common"))
            .is_empty());
    }

    #[test]
    fn target_roots_merge_native_and_common() {
        let m = model();
        let roots = m.target_roots(&BuildTarget::production("jvm"));
        assert_eq!(roots.len(), 3);
        assert!(!roots[0].is_common());
        assert!(roots[1].is_common() && roots[2].is_common());
    }
}
