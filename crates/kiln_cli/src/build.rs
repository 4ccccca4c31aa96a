//! `kiln build`: the incremental build pipeline.
//!
//! 1. Find the project root and load `kiln.toml`
//! 2. Load the file-state manifest from the cache directory
//! 3. Scan every target's sources against it
//! 4. Build the chunk levels, compiling the chunks with changes
//! 5. Record the new file state of the targets that are now up to date
//! 6. Render messages and the summary

use std::path::PathBuf;

use kiln_build::{
    BuildReport, BuildSession, ChunkStatus, CommandInvoker, RoundContext, RoundSettings,
    SessionOptions,
};
use kiln_cache::FileStateManifest;
use kiln_diagnostics::DiagnosticSink;
use kiln_dirty::FsState;
use kiln_project::{chunk_levels, BuildTarget};

use crate::pipeline::{load_project, render_diagnostics, Project};
use crate::{BuildArgs, GlobalArgs, ReportFormat};

/// Version written into the manifest; a different version invalidates it.
pub const MANIFEST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs the `kiln build` command.
///
/// Returns exit code 0 if every chunk built, 1 otherwise.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Building {} v{}",
            project.config.project.name, project.config.project.version
        );
    }

    let sink = DiagnosticSink::new();
    let report = build_project(&project, args, &sink)?;
    render_diagnostics(&sink, args.format, global);

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                eprintln!(
                    "   Finished: {} compiled, {} up to date, {} failed",
                    report.compiled_count(),
                    report.skipped_count(),
                    report.failed_count()
                );
            }
        }
        ReportFormat::Json => println!("{}", summary_json(&report)),
    }

    Ok(if report.is_success() { 0 } else { 1 })
}

/// Builds the project and saves the updated manifest.
pub fn build_project(
    project: &Project,
    args: &BuildArgs,
    sink: &DiagnosticSink,
) -> Result<BuildReport, Box<dyn std::error::Error>> {
    let config = &project.config;
    if config.compiler.command.is_empty() {
        return Err("no compiler configured; set `command` in the [compiler] section".into());
    }
    let selected = select_targets(project, &args.modules)?;

    let cache_dir = project.cache_dir();
    let mut manifest = FileStateManifest::load_or_new(&cache_dir, MANIFEST_VERSION);
    if args.rebuild {
        let targets = selected.clone().unwrap_or_else(|| project.model.targets());
        for target in &targets {
            manifest.invalidate_target(&target.to_string());
        }
        tracing::debug!(targets = targets.len(), "forgot recorded file state");
    }

    let fs = FsState::scan(&project.model, &manifest);
    let scope = fs.compile_scope(selected);
    let settings = RoundSettings {
        incremental: config.build.incremental,
        keep_module_files: config.build.keep_module_files || args.keep_module_files,
        module_file_dir: config
            .build
            .module_file_dir
            .as_ref()
            .map(|dir| project.root.join(dir)),
    };
    let options = SessionOptions {
        jobs: args.jobs.unwrap_or(0),
        record_history: true,
        max_history_entries: config.build.max_history_entries,
    };
    let ctx = RoundContext {
        model: &project.model,
        deltas: &fs,
        scope: &scope,
        sink,
        settings: &settings,
    };

    let invoker = CommandInvoker::new(config.compiler.command.clone());
    let report = BuildSession::new(ctx, options).run(&chunk_levels(&project.model), &invoker);

    // Failed or out-of-scope targets keep their old state and stay dirty.
    let up_to_date: Vec<&BuildTarget> = report
        .compiled_targets()
        .chain(fs.targets().filter(|t| fs.changes(t).is_some_and(|c| c.is_empty())))
        .filter(|t| scope.contains_target(t))
        .collect();
    for target in up_to_date {
        fs.mark_up_to_date(target, &mut manifest);
    }
    manifest.save(&cache_dir)?;
    Ok(report)
}

/// Production and test targets of the named modules; `None` for all.
fn select_targets(
    project: &Project,
    modules: &[String],
) -> Result<Option<Vec<BuildTarget>>, Box<dyn std::error::Error>> {
    if modules.is_empty() {
        return Ok(None);
    }
    let mut targets = Vec::new();
    for name in modules {
        if project.model.module(name).is_none() {
            return Err(format!("unknown module '{name}'").into());
        }
        targets.push(BuildTarget::production(name));
        targets.push(BuildTarget::test(name));
    }
    Ok(Some(targets))
}

fn summary_json(report: &BuildReport) -> serde_json::Value {
    let chunks: Vec<serde_json::Value> = report
        .chunks
        .iter()
        .map(|c| {
            let (status, detail) = match &c.status {
                ChunkStatus::Skipped => ("up-to-date", serde_json::Value::Null),
                ChunkStatus::Compiled(compiled) => (
                    "compiled",
                    serde_json::json!({
                        "files": compiled.compiled_files.len(),
                        "removed": compiled.removed_files_count,
                        "module_file": compiled.module_file.as_ref().map(|p: &PathBuf| p.display().to_string()),
                    }),
                ),
                ChunkStatus::Failed(reason) => ("failed", serde_json::Value::String(reason.clone())),
                ChunkStatus::Blocked => ("blocked", serde_json::Value::Null),
            };
            serde_json::json!({
                "chunk": c.chunk.to_string(),
                "status": status,
                "detail": detail,
            })
        })
        .collect();
    serde_json::json!({
        "success": report.is_success(),
        "compiled": report.compiled_count(),
        "up_to_date": report.skipped_count(),
        "failed": report.failed_count(),
        "chunks": chunks,
    })
}
