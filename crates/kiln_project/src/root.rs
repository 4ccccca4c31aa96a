//! Source roots attached to build targets.

use crate::target::BuildTarget;
use std::path::PathBuf;

/// Where a source root comes from.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum RootKind {
    /// A root declared by the target's own module.
    Native,
    /// A root borrowed from a common module the target's module implements.
    /// Files under it are dirty regardless of the build scope.
    Common {
        /// The module that declares the root.
        owner_module: String,
    },
}

/// A directory of sources compiled as part of a target.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SourceRoot {
    /// Root directory.
    pub path: PathBuf,
    /// The target compiling the root's files.
    pub target: BuildTarget,
    /// Whether the root holds generated sources.
    pub generated: bool,
    /// Whether the root is a test root of its declaring module.
    pub tests: bool,
    /// Package prefix of the files under this root.
    pub package_prefix: Option<String>,
    /// Native or borrowed from a common module.
    pub kind: RootKind,
}

impl SourceRoot {
    /// A native, non-generated root without package prefix.
    pub fn native(path: impl Into<PathBuf>, target: BuildTarget) -> Self {
        Self {
            path: path.into(),
            tests: target.is_tests(),
            target,
            generated: false,
            package_prefix: None,
            kind: RootKind::Native,
        }
    }

    /// A root borrowed from `owner_module`.
    pub fn common(path: impl Into<PathBuf>, target: BuildTarget, owner_module: impl Into<String>) -> Self {
        Self {
            kind: RootKind::Common {
                owner_module: owner_module.into(),
            },
            ..Self::native(path, target)
        }
    }

    /// Returns `true` if the root was borrowed from a common module.
    pub fn is_common(&self) -> bool {
        matches!(self.kind, RootKind::Common { .. })
    }

    /// The declaring common module, for borrowed roots.
    pub fn common_owner(&self) -> Option<&str> {
        match &self.kind {
            RootKind::Native => None,
            RootKind::Common { owner_module } => Some(owner_module),
        }
    }
}
