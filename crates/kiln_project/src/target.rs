//! Build targets and module chunks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Whether a target compiles a module's production or test sources.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Production sources.
    Production,
    /// Test sources.
    Test,
}

/// A compilable unit: one module's production or test sources.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct BuildTarget {
    /// Name of the owning module.
    pub module: String,
    /// Production or test.
    pub kind: TargetKind,
}

impl BuildTarget {
    /// The production target of `module`.
    pub fn production(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            kind: TargetKind::Production,
        }
    }

    /// The test target of `module`.
    pub fn test(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            kind: TargetKind::Test,
        }
    }

    /// Returns `true` for test targets.
    pub fn is_tests(&self) -> bool {
        self.kind == TargetKind::Test
    }

    /// Module kind written into the compiler's module descriptor.
    pub fn type_id(&self) -> &'static str {
        match self.kind {
            TargetKind::Production => "java-production",
            TargetKind::Test => "java-test",
        }
    }

    /// Human-readable name, e.g. `Module 'app' tests`.
    pub fn presentable_name(&self) -> String {
        match self.kind {
            TargetKind::Production => format!("Module '{}' production", self.module),
            TargetKind::Test => format!("Module '{}' tests", self.module),
        }
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TargetKind::Production => write!(f, "{}", self.module),
            TargetKind::Test => write!(f, "{}:test", self.module),
        }
    }
}

/// Targets that are compiled together because their modules depend on each
/// other. A chunk without a cycle holds exactly one target.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ModuleChunk {
    targets: BTreeSet<BuildTarget>,
}

impl ModuleChunk {
    /// Creates a chunk from its targets.
    ///
    /// # Panics
    ///
    /// Panics if `targets` is empty; a chunk always has a representative.
    pub fn new(targets: impl IntoIterator<Item = BuildTarget>) -> Self {
        let targets: BTreeSet<_> = targets.into_iter().collect();
        assert!(!targets.is_empty(), "module chunk without targets");
        Self { targets }
    }

    /// A chunk holding a single target.
    pub fn single(target: BuildTarget) -> Self {
        Self::new([target])
    }

    /// The targets of this chunk in order.
    pub fn targets(&self) -> impl Iterator<Item = &BuildTarget> {
        self.targets.iter()
    }

    /// Number of targets in this chunk.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns `true` if `target` belongs to this chunk.
    pub fn contains(&self, target: &BuildTarget) -> bool {
        self.targets.contains(target)
    }

    /// The first target; names the chunk in messages and file names.
    pub fn representative_target(&self) -> &BuildTarget {
        // `new` rejects empty chunks.
        self.targets
            .iter()
            .next()
            .unwrap_or_else(|| unreachable!("module chunk without targets"))
    }

    /// Distinct module names of this chunk, sorted.
    pub fn modules(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.targets.iter().map(|t| t.module.as_str()).collect();
        names.into_iter().collect()
    }

    /// Returns `true` if any target compiles test sources.
    pub fn contains_tests(&self) -> bool {
        self.targets.iter().any(BuildTarget::is_tests)
    }
}

impl fmt::Display for ModuleChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.targets.iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join(", "))
    }
}
