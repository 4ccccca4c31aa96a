//! One build round: decide, describe, compile.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use kiln_cache::DirtyData;
use kiln_diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink};
use kiln_dirty::{BuildScope, ChunkDirtyFilesHolder, FilesDeltaProvider};
use kiln_project::{BuildTarget, ModuleChunk, ProjectModel};
use tempfile::NamedTempFile;

use crate::descriptor::{JvmSourceRoot, ModuleDescriptor, ModuleEntry};
use crate::error::BuildError;
use crate::invoker::{CompileRequest, CompilerInvoker};

/// Settings shared by every round of a session.
#[derive(Debug, Clone)]
pub struct RoundSettings {
    /// Compile only dirty files; otherwise every source file of a target
    /// with work is listed.
    pub incremental: bool,
    /// Keep descriptor files after the compiler ran.
    pub keep_module_files: bool,
    /// Directory for descriptor files; the system temp dir when `None`.
    pub module_file_dir: Option<PathBuf>,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            incremental: true,
            keep_module_files: false,
            module_file_dir: None,
        }
    }
}

/// The session-wide collaborators of a round.
#[derive(Clone, Copy)]
pub struct RoundContext<'a> {
    /// The project model.
    pub model: &'a ProjectModel,
    /// Source of per-target deltas.
    pub deltas: &'a dyn FilesDeltaProvider,
    /// What the build covers.
    pub scope: &'a dyn BuildScope,
    /// Where messages go.
    pub sink: &'a DiagnosticSink,
    /// Session settings.
    pub settings: &'a RoundSettings,
}

/// A chunk the compiler ran on.
#[derive(Debug, Clone)]
pub struct CompiledChunk {
    /// Targets that had dirty or removed files.
    pub targets: Vec<BuildTarget>,
    /// Files listed as sources in the descriptor.
    pub compiled_files: BTreeSet<PathBuf>,
    /// Number of distinct removed files.
    pub removed_files_count: usize,
    /// Changes reported by the compiler.
    pub changes: Option<DirtyData>,
    /// The descriptor file, when it was kept.
    pub module_file: Option<PathBuf>,
}

/// Result of a round that did not fail.
#[derive(Debug, Clone)]
pub enum RoundOutcome {
    /// Nothing changed; the compiler was not called.
    Skipped,
    /// The compiler ran.
    Compiled(CompiledChunk),
}

/// A build round over one chunk.
pub struct BuildRound<'a> {
    ctx: RoundContext<'a>,
    chunk: &'a ModuleChunk,
    holder: ChunkDirtyFilesHolder<'a>,
}

impl<'a> BuildRound<'a> {
    /// Prepares a round for `chunk`. Dirty files are snapshotted on first use.
    pub fn new(ctx: RoundContext<'a>, chunk: &'a ModuleChunk) -> Self {
        Self {
            holder: ChunkDirtyFilesHolder::new(chunk, ctx.deltas, ctx.scope),
            ctx,
            chunk,
        }
    }

    /// The dirty files of this round.
    pub fn dirty_files_holder(&self) -> &ChunkDirtyFilesHolder<'a> {
        &self.holder
    }

    /// Runs the round.
    pub fn run(&self, invoker: &dyn CompilerInvoker) -> Result<RoundOutcome, BuildError> {
        if !self.holder.has_dirty_or_removed_files() {
            tracing::debug!(
                "Not compiling, because no files affected: {}",
                self.presentable_targets()
            );
            return Ok(RoundOutcome::Skipped);
        }

        let modules = self.chunk.modules();
        if modules.len() > 1 {
            self.ctx.sink.emit(
                Diagnostic::strong_warning(
                    DiagnosticCode::CYCLIC_CHUNK,
                    format!(
                        "Circular dependencies are only partially supported. The following \
                         modules depend on each other: {}. Kiln will compile them, but some \
                         strange effects may happen",
                        modules.join(", ")
                    ),
                )
                .in_chunk(self.chunk.to_string()),
            );
        }

        let (descriptor, compiled_files) = self.describe();
        let targets: Vec<BuildTarget> = self.holder.by_target().keys().cloned().collect();
        let removed_files_count = self.holder.removed_files_count();

        let module_file = self.write_module_file(&descriptor)?;
        let removed = if removed_files_count == 0 {
            String::new()
        } else {
            format!(" ({removed_files_count} removed files)")
        };
        tracing::debug!(
            "Compiling {} files{} in {}",
            compiled_files.len(),
            removed,
            self.presentable_targets()
        );

        let request = CompileRequest {
            chunk: self.chunk.clone(),
            module_file: module_file.path().to_path_buf(),
            descriptor,
            dirty_files: self.holder.all_dirty_files(),
            removed_files: self
                .holder
                .by_target()
                .values()
                .flat_map(|f| f.removed.iter().cloned())
                .collect(),
        };
        let output = invoker.invoke(&request);

        // Dropping the temporary file deletes it.
        let kept = if self.ctx.settings.keep_module_files {
            module_file
                .keep()
                .map(|(_, path)| Some(path))
                .map_err(|e| BuildError::Io {
                    path: request.module_file.clone(),
                    source: e.error,
                })
        } else {
            Ok(None)
        };
        let output = output?;

        Ok(RoundOutcome::Compiled(CompiledChunk {
            targets,
            compiled_files,
            removed_files_count,
            changes: output.changes,
            module_file: kept?,
        }))
    }

    fn presentable_targets(&self) -> String {
        self.chunk
            .targets()
            .map(BuildTarget::presentable_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds the descriptor entries of every chunk target.
    fn describe(&self) -> (ModuleDescriptor, BTreeSet<PathBuf>) {
        let model = self.ctx.model;
        let output_dirs: BTreeSet<PathBuf> = self
            .chunk
            .targets()
            .filter_map(|t| model.output_dir(t))
            .map(Path::to_path_buf)
            .collect();

        let mut descriptor = ModuleDescriptor::new();
        let mut compiled = BTreeSet::new();
        for target in self.chunk.targets() {
            let sources: Vec<PathBuf> = if self.ctx.settings.incremental {
                self.holder.dirty_files(target).iter().cloned().collect()
            } else if self.holder.by_target().contains_key(target) {
                model.source_files(target)
            } else {
                Vec::new()
            };
            compiled.extend(sources.iter().cloned());

            let java_source_roots = model
                .target_roots(target)
                .into_iter()
                .filter(|r| r.path.exists())
                .map(|r| JvmSourceRoot {
                    path: r.path,
                    package_prefix: r.package_prefix.filter(|p| !p.is_empty()),
                })
                .collect();

            let entry = ModuleEntry {
                name: target.module.clone(),
                module_type: target.type_id().to_string(),
                is_tests: target.is_tests(),
                output_dir: model
                    .output_dir(target)
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
                sources,
                java_source_roots,
                classpath: model.classpath_roots(target),
                friend_dirs: model.friend_output_dirs(target),
            };
            descriptor.add_module(entry, &output_dirs);
        }
        (descriptor, compiled)
    }

    /// Writes the descriptor to a fresh temporary file.
    fn write_module_file(&self, descriptor: &ModuleDescriptor) -> Result<NamedTempFile, BuildError> {
        let dir = self
            .ctx
            .settings
            .module_file_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let mut readable = sanitize_identifier(&self.chunk.representative_target().module);
        if self.chunk.contains_tests() {
            readable.push_str("-test");
        }

        let mut file = create_module_file(&dir, &format!("{readable}.script.xml"))
            .or_else(|e| {
                tracing::debug!(%e, "retrying module file creation without readable suffix");
                create_module_file(&dir, ".script.xml")
            })
            .map_err(|source| BuildError::ModuleFile {
                chunk: self.chunk.to_string(),
                dir: dir.clone(),
                source,
            })?;

        file.write_all(descriptor.to_xml().as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| BuildError::Io {
                path: file.path().to_path_buf(),
                source,
            })?;
        Ok(file)
    }
}

fn create_module_file(dir: &Path, suffix: &str) -> std::io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("kjps")
        .suffix(suffix)
        .tempfile_in(dir)
}

/// Replaces every character that cannot appear in an identifier with `_`.
fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_identifier("app"), "app");
        assert_eq!(sanitize_identifier("my-lib.core"), "my_lib_core");
        assert_eq!(sanitize_identifier("2d"), "_2d");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn default_settings_are_incremental() {
        let settings = RoundSettings::default();
        assert!(settings.incremental);
        assert!(!settings.keep_module_files);
        assert!(settings.module_file_dir.is_none());
    }

    #[test]
    fn module_file_names_carry_prefix_and_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let file = create_module_file(dir.path(), "app-test.script.xml").unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("kjps"));
        assert!(name.ends_with("app-test.script.xml"));
    }
}
