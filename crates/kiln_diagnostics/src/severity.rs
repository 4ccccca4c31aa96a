//! Message severity levels ordered from least to most severe.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a build message.
///
/// Ordered from least severe (`Info`) to most severe (`Error`). A
/// `StrongWarning` is always shown to the user, even when ordinary warnings
/// are filtered out.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational output.
    Info,
    /// A potential issue that doesn't prevent the build.
    Warning,
    /// A warning the user must not miss, such as a cyclic module chunk.
    StrongWarning,
    /// A problem that fails the build of the affected chunk.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Returns `true` for both warning levels.
    pub fn is_warning(self) -> bool {
        matches!(self, Severity::Warning | Severity::StrongWarning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning | Severity::StrongWarning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}
