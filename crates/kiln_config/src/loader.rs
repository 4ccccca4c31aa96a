//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::BTreeSet;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "kiln.toml";

/// Loads and validates a `kiln.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates a `kiln.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks required fields and the consistency of the declared module graph.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.build.max_history_entries == 0 {
        return Err(ConfigError::ValidationError(
            "build.max_history_entries must be at least 1".to_string(),
        ));
    }

    for (name, module) in &config.modules {
        let mut deps = BTreeSet::new();
        for dep in &module.dependencies {
            let target = dep.module();
            if target == name {
                return Err(ConfigError::ValidationError(format!(
                    "module '{name}' depends on itself"
                )));
            }
            if !config.modules.contains_key(target) {
                return Err(ConfigError::UnknownModule {
                    module: name.clone(),
                    reference: target.to_string(),
                });
            }
            deps.insert(target);
        }
        for common in &module.expected_by {
            if !config.modules.contains_key(common) {
                return Err(ConfigError::UnknownModule {
                    module: name.clone(),
                    reference: common.clone(),
                });
            }
            if !deps.contains(common.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "module '{name}' is expected by '{common}' but does not depend on it"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DependencyScope, DependencySpec};

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
[project]
name = "demo"
version = "0.1.0"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.name, "demo");
        assert!(config.modules.is_empty());
        assert!(config.build.incremental);
        assert!(config.compiler.command.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
name = "demo"
version = "0.1.0"
description = "multiplatform demo"

[build]
incremental = false
keep_module_files = true
module_file_dir = "out/tmp"
max_history_entries = 5
cache_dir = ".cache/kiln"

[compiler]
command = ["kotlinc", "-Xbuild-file"]

[modules.common]
sources = ["src/commonMain/kotlin"]
test_sources = ["src/commonTest/kotlin"]

[modules.testkit]

[modules.jvm]
path = "platform/jvm"
generated_sources = ["build/generated"]
package_prefix = "com.example"
dependencies = ["common", { module = "testkit", scope = "test", exported = true }]
expected_by = ["common"]
libraries = ["libs/annotations.jar"]
history_file = "build/history.bin"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(!config.build.incremental);
        assert!(config.build.keep_module_files);
        assert_eq!(config.build.module_file_dir.as_deref(), Some("out/tmp"));
        assert_eq!(config.build.max_history_entries, 5);
        assert_eq!(config.compiler.command, vec!["kotlinc", "-Xbuild-file"]);
        assert_eq!(config.modules.len(), 3);

        let jvm = &config.modules["jvm"];
        assert_eq!(jvm.path.as_deref(), Some("platform/jvm"));
        assert_eq!(jvm.sources, vec!["src/main/kotlin"]);
        assert_eq!(jvm.expected_by, vec!["common"]);
        assert_eq!(jvm.dependencies.len(), 2);
        match &jvm.dependencies[1] {
            DependencySpec::Detailed {
                module,
                scope,
                exported,
            } => {
                assert_eq!(module, "testkit");
                assert_eq!(*scope, DependencyScope::Test);
                assert!(*exported);
            }
            other => panic!("expected detailed dependency, got {other:?}"),
        }
    }

    #[test]
    fn missing_name_errors() {
        let toml = r#"
[project]
name = ""
version = "0.1.0"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn unknown_dependency_errors() {
        let toml = r#"
[project]
name = "demo"
version = "0.1.0"

[modules.app]
dependencies = ["core"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        match err {
            ConfigError::UnknownModule { module, reference } => {
                assert_eq!(module, "app");
                assert_eq!(reference, "core");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn self_dependency_errors() {
        let toml = r#"
[project]
name = "demo"
version = "0.1.0"

[modules.app]
dependencies = ["app"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn expected_by_requires_dependency() {
        let toml = r#"
[project]
name = "demo"
version = "0.1.0"

[modules.common]

[modules.jvm]
expected_by = ["common"]
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_history_entries_rejected() {
        let toml = r#"
[project]
name = "demo"
version = "0.1.0"

[build]
max_history_entries = 0
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[project]\nname = \"demo\"\nversion = \"1.0\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.version, "1.0");
    }

    #[test]
    fn io_error_from_nonexistent_dir() {
        let err = load_config(Path::new("/nonexistent/dir")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
