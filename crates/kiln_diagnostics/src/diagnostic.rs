//! Structured build messages.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured build message, optionally attributed to a module chunk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this message.
    pub severity: Severity,
    /// The code identifying the kind of message.
    pub code: DiagnosticCode,
    /// The main message.
    pub message: String,
    /// Display name of the chunk the message is about, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,
    /// Explanatory footnotes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a message with an explicit severity.
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            chunk: None,
            notes: Vec::new(),
        }
    }

    /// Creates an error message.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    /// Creates a warning message.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    /// Creates a strong warning message.
    pub fn strong_warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::StrongWarning, code, message)
    }

    /// Attributes this message to a chunk.
    pub fn in_chunk(mut self, chunk: impl Into<String>) -> Self {
        self.chunk = Some(chunk.into());
        self
    }

    /// Adds a note to this message.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error() {
        let diag = Diagnostic::error(DiagnosticCode::MODULE_FILE, "could not create module file");
        assert_eq!(diag.severity, Severity::Error);
        assert!(diag.chunk.is_none());
        assert_eq!(diag.code.to_string(), "E201");
    }

    #[test]
    fn builder_methods() {
        let diag = Diagnostic::strong_warning(DiagnosticCode::CYCLIC_CHUNK, "cycle")
            .in_chunk("a, b")
            .with_note("modules: a, b");
        assert_eq!(diag.severity, Severity::StrongWarning);
        assert_eq!(diag.chunk.as_deref(), Some("a, b"));
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn json_skips_empty_fields() {
        let diag = Diagnostic::warning(DiagnosticCode::CYCLIC_CHUNK, "cycle");
        let json = serde_json::to_string(&diag).unwrap();
        assert!(!json.contains("chunk"));
        assert!(!json.contains("notes"));
        assert!(json.contains("\"warning\""));
    }
}
