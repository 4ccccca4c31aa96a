//! The seam between build rounds and the compiler.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Command;

use kiln_cache::DirtyData;
use kiln_project::ModuleChunk;

use crate::descriptor::ModuleDescriptor;
use crate::error::BuildError;

/// Everything the compiler needs for one chunk.
#[derive(Debug, Clone)]
pub struct CompileRequest {
    /// The chunk being compiled.
    pub chunk: ModuleChunk,
    /// The descriptor file written for this round.
    pub module_file: PathBuf,
    /// The descriptor written to `module_file`.
    pub descriptor: ModuleDescriptor,
    /// Dirty files of every target of the chunk.
    pub dirty_files: BTreeSet<PathBuf>,
    /// Removed files of every target of the chunk.
    pub removed_files: BTreeSet<PathBuf>,
}

/// What a successful compilation reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    /// The declarations the compilation changed; `None` when the compiler
    /// cannot tell, in which case downstream history is reset.
    pub changes: Option<DirtyData>,
}

/// Runs the compiler on a chunk.
pub trait CompilerInvoker: Send + Sync {
    /// Compiles the chunk described by `request`.
    fn invoke(&self, request: &CompileRequest) -> Result<CompileOutput, BuildError>;
}

/// Runs an external compiler command with the descriptor path appended.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    command: Vec<String>,
}

impl CommandInvoker {
    /// An invoker for `command`, program first.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl CompilerInvoker for CommandInvoker {
    fn invoke(&self, request: &CompileRequest) -> Result<CompileOutput, BuildError> {
        let failed = |reason: String| BuildError::Compiler {
            chunk: request.chunk.to_string(),
            reason,
        };
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| failed("no compiler command configured".to_string()))?;

        tracing::debug!(%program, module_file = %request.module_file.display(), "running compiler");
        let output = Command::new(program)
            .args(args)
            .arg(&request.module_file)
            .output()
            .map_err(|e| failed(format!("cannot run `{program}`: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => output.status.to_string(),
                msg => msg.to_string(),
            };
            return Err(failed(reason));
        }
        // An external command does not report declaration-level changes.
        Ok(CompileOutput { changes: None })
    }
}
