//! Build messages reported while compiling module chunks.
//!
//! This crate provides structured [`Diagnostic`] messages with severity levels
//! and codes. The thread-safe [`DiagnosticSink`] accumulates messages from
//! parallel chunk workers, and [`DiagnosticRenderer`] implementations format
//! them for the terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
