//! Running the rounds of a whole project.
//!
//! Chunks are grouped into levels: every chunk depends only on chunks of
//! earlier levels. Levels run one after another, the chunks of a level in
//! parallel on a rayon pool. Once a chunk fails, later levels are not built.

use kiln_diagnostics::{Diagnostic, DiagnosticCode, Severity};
use kiln_project::{BuildTarget, ModuleChunk};
use rayon::prelude::*;

use crate::error::BuildError;
use crate::invoker::CompilerInvoker;
use crate::record::{now_millis, record_changes};
use crate::round::{BuildRound, CompiledChunk, RoundContext, RoundOutcome};

/// Session-level options.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Worker threads; `0` picks one per core.
    pub jobs: usize,
    /// Whether compiled rounds update module history files.
    pub record_history: bool,
    /// Entries kept per history file.
    pub max_history_entries: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            jobs: 0,
            record_history: true,
            max_history_entries: kiln_cache::DEFAULT_MAX_HISTORY_ENTRIES,
        }
    }
}

/// What happened to one chunk.
#[derive(Debug, Clone)]
pub enum ChunkStatus {
    /// Nothing to compile.
    Skipped,
    /// Compiled successfully.
    Compiled(CompiledChunk),
    /// The round failed with the given message.
    Failed(String),
    /// Not attempted because an earlier level failed.
    Blocked,
}

/// The status of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkReport {
    /// The chunk.
    pub chunk: ModuleChunk,
    /// What happened to it.
    pub status: ChunkStatus,
}

/// The result of a session.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Chunks in build order.
    pub chunks: Vec<ChunkReport>,
}

impl BuildReport {
    fn count(&self, pred: impl Fn(&ChunkStatus) -> bool) -> usize {
        self.chunks.iter().filter(|c| pred(&c.status)).count()
    }

    /// Number of compiled chunks.
    pub fn compiled_count(&self) -> usize {
        self.count(|s| matches!(s, ChunkStatus::Compiled(_)))
    }

    /// Number of skipped chunks.
    pub fn skipped_count(&self) -> usize {
        self.count(|s| matches!(s, ChunkStatus::Skipped))
    }

    /// Number of failed chunks.
    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, ChunkStatus::Failed(_)))
    }

    /// Returns `true` if no chunk failed or was blocked.
    pub fn is_success(&self) -> bool {
        self.count(|s| matches!(s, ChunkStatus::Failed(_) | ChunkStatus::Blocked)) == 0
    }

    /// Targets that compiled successfully and had work.
    pub fn compiled_targets(&self) -> impl Iterator<Item = &BuildTarget> {
        self.chunks.iter().flat_map(|c| match &c.status {
            ChunkStatus::Compiled(compiled) => compiled.targets.as_slice(),
            _ => &[][..],
        })
    }
}

/// Builds chunk levels with a shared round context.
pub struct BuildSession<'a> {
    ctx: RoundContext<'a>,
    options: SessionOptions,
}

impl<'a> BuildSession<'a> {
    /// Creates a session.
    pub fn new(ctx: RoundContext<'a>, options: SessionOptions) -> Self {
        Self { ctx, options }
    }

    /// Builds `levels` in order.
    pub fn run(&self, levels: &[Vec<ModuleChunk>], invoker: &dyn CompilerInvoker) -> BuildReport {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .build();
        if let Err(e) = &pool {
            tracing::warn!("failed to create thread pool ({e}), building sequentially");
        }

        let mut report = BuildReport::default();
        let mut failed = false;
        for (index, level) in levels.iter().enumerate() {
            if failed {
                report.chunks.extend(level.iter().map(|chunk| ChunkReport {
                    chunk: chunk.clone(),
                    status: ChunkStatus::Blocked,
                }));
                continue;
            }
            tracing::debug!(level = index, chunks = level.len(), "building level");
            let results: Vec<ChunkReport> = match &pool {
                Ok(pool) => pool.install(|| {
                    level
                        .par_iter()
                        .map(|chunk| self.build_chunk(chunk, invoker))
                        .collect()
                }),
                Err(_) => level.iter().map(|chunk| self.build_chunk(chunk, invoker)).collect(),
            };
            failed = results.iter().any(|r| matches!(r.status, ChunkStatus::Failed(_)));
            report.chunks.extend(results);
        }
        report
    }

    fn build_chunk(&self, chunk: &ModuleChunk, invoker: &dyn CompilerInvoker) -> ChunkReport {
        let status = match BuildRound::new(self.ctx, chunk).run(invoker) {
            Ok(RoundOutcome::Skipped) => ChunkStatus::Skipped,
            Ok(RoundOutcome::Compiled(compiled)) => match self.record(chunk, &compiled) {
                Ok(()) => ChunkStatus::Compiled(compiled),
                Err(e) => self.fail(chunk, &e),
            },
            Err(e) => self.fail(chunk, &e),
        };
        ChunkReport {
            chunk: chunk.clone(),
            status,
        }
    }

    fn record(&self, chunk: &ModuleChunk, compiled: &CompiledChunk) -> Result<(), BuildError> {
        if !self.options.record_history {
            return Ok(());
        }
        if compiled.changes.is_none() {
            self.ctx.sink.emit(
                Diagnostic::new(
                    Severity::Info,
                    DiagnosticCode::UNKNOWN_CHANGES,
                    format!(
                        "changes of {} are unknown; build history of {} was reset",
                        chunk,
                        chunk.modules().join(", ")
                    ),
                )
                .in_chunk(chunk.to_string()),
            );
        }
        record_changes(
            self.ctx.model,
            chunk,
            compiled.changes.as_ref(),
            now_millis(),
            self.options.max_history_entries,
        )
    }

    fn fail(&self, chunk: &ModuleChunk, err: &BuildError) -> ChunkStatus {
        let code = match err {
            BuildError::ModuleFile { .. } | BuildError::Io { .. } => DiagnosticCode::MODULE_FILE,
            BuildError::Compiler { .. } => DiagnosticCode::COMPILER_FAILED,
            BuildError::History(_) => DiagnosticCode::HISTORY_WRITE,
        };
        self.ctx
            .sink
            .emit(Diagnostic::error(code, err.to_string()).in_chunk(chunk.to_string()));
        ChunkStatus::Failed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::RoundSettings;
    use kiln_cache::FileStateManifest;
    use kiln_config::load_config_from_str;
    use kiln_diagnostics::DiagnosticSink;
    use kiln_dirty::FsState;
    use kiln_project::{chunk_levels, ProjectModel};

    use crate::invoker::{CompileOutput, CompileRequest};

    struct FailOn(&'static str);

    impl CompilerInvoker for FailOn {
        fn invoke(&self, request: &CompileRequest) -> Result<CompileOutput, BuildError> {
            if request.chunk.modules().contains(&self.0) {
                return Err(BuildError::Compiler {
                    chunk: request.chunk.to_string(),
                    reason: "boom".to_string(),
                });
            }
            Ok(CompileOutput::default())
        }
    }

    #[test]
    fn failure_blocks_later_levels() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_str(
            r#"
[project]
name = "demo"
version = "0.1.0"

[modules.core]
[modules.app]
dependencies = ["core"]
"#,
        )
        .unwrap();
        let model = ProjectModel::from_config(&config, dir.path());
        for module in ["core", "app"] {
            let src = dir.path().join(module).join("src/main/kotlin");
            std::fs::create_dir_all(&src).unwrap();
            std::fs::write(src.join("Main.kt"), "fun main() {}").unwrap();
        }

        let fs = FsState::scan(&model, &FileStateManifest::new("0.1.0"));
        let scope = fs.compile_scope(None);
        let sink = DiagnosticSink::new();
        let settings = RoundSettings::default();
        let ctx = RoundContext {
            model: &model,
            deltas: &fs,
            scope: &scope,
            sink: &sink,
            settings: &settings,
        };
        let options = SessionOptions {
            jobs: 2,
            record_history: false,
            ..SessionOptions::default()
        };

        let report = BuildSession::new(ctx, options).run(&chunk_levels(&model), &FailOn("core"));
        assert!(!report.is_success());
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.compiled_count(), 0);
        let app = report
            .chunks
            .iter()
            .find(|c| c.chunk.contains(&BuildTarget::production("app")))
            .unwrap();
        assert!(matches!(app.status, ChunkStatus::Blocked));
        assert_eq!(sink.error_count(), 1);
    }
}
