//! Rendering backends for human-readable and machine-readable output.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Trait for rendering messages into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single message into a formatted string.
    fn render(&self, diag: &Diagnostic) -> String;
}

/// Renders messages in a rustc-like terminal format:
///
/// ```text
/// warning[W101]: circular dependencies are only partially supported
///   --> chunk a, b
///    = note: ...
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, severity: Severity) -> (&'static str, &'static str) {
        if !self.color {
            return ("", "");
        }
        match severity {
            Severity::Error => ("\x1b[1;31m", "\x1b[0m"),
            Severity::StrongWarning | Severity::Warning => ("\x1b[1;33m", "\x1b[0m"),
            Severity::Info => ("\x1b[1;36m", "\x1b[0m"),
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        let (on, off) = self.paint(diag.severity);
        let mut out = format!("{on}{}[{}]{off}: {}\n", diag.severity, diag.code, diag.message);
        if let Some(chunk) = &diag.chunk {
            out.push_str(&format!("  --> chunk {chunk}\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        out
    }
}

/// Renders each message as one line of JSON.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic) -> String {
        serde_json::to_string(diag).unwrap_or_else(|e| {
            format!("{{\"severity\":\"error\",\"message\":\"unrenderable message: {e}\"}}")
        })
    }
}
