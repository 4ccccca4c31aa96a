//! Message codes with category prefixes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a message code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Build errors, prefixed with `E`.
    Error,
    /// Build warnings, prefixed with `W`.
    Warning,
    /// Incremental-state notes, prefixed with `I`.
    Incremental,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Incremental => 'I',
        }
    }
}

/// A message code: category prefix plus a zero-padded 3-digit number.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this code.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Modules of one chunk depend on each other.
    pub const CYCLIC_CHUNK: Self = Self::new(Category::Warning, 101);
    /// The module descriptor file could not be written.
    pub const MODULE_FILE: Self = Self::new(Category::Error, 201);
    /// The compiler invocation failed.
    pub const COMPILER_FAILED: Self = Self::new(Category::Error, 202);
    /// A history file could not be updated.
    pub const HISTORY_WRITE: Self = Self::new(Category::Error, 301);
    /// The change set of a round is unknown; history was reset.
    pub const UNKNOWN_CHANGES: Self = Self::new(Category::Incremental, 1);

    /// Creates a new code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
