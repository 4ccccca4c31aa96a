use kiln_build::{
    BuildError, BuildSession, ChunkStatus, CompileOutput, CompileRequest, CompilerInvoker,
    RoundContext, RoundSettings, SessionOptions,
};
use kiln_cache::{BuildDiffsStorage, FileStateManifest};
use kiln_config::load_config_from_str;
use kiln_diagnostics::{DiagnosticCode, DiagnosticSink};
use kiln_dirty::FsState;
use kiln_project::{chunk_levels, BuildTarget, ProjectModel};

const CONFIG: &str = r#"
[project]
name = "demo"
version = "0.1.0"

[modules.core]
[modules.app]
dependencies = ["core"]
"#;

struct Succeed;

impl CompilerInvoker for Succeed {
    fn invoke(&self, _request: &CompileRequest) -> Result<CompileOutput, BuildError> {
        Ok(CompileOutput::default())
    }
}

fn build(model: &ProjectModel, manifest: &mut FileStateManifest, sink: &DiagnosticSink) -> kiln_build::BuildReport {
    let fs = FsState::scan(model, manifest);
    let scope = fs.compile_scope(None);
    let settings = RoundSettings::default();
    let ctx = RoundContext {
        model,
        deltas: &fs,
        scope: &scope,
        sink,
        settings: &settings,
    };
    let report = BuildSession::new(ctx, SessionOptions::default()).run(&chunk_levels(model), &Succeed);
    for target in report.compiled_targets() {
        fs.mark_up_to_date(target, manifest);
    }
    for target in fs.targets() {
        if fs.changes(target).is_some_and(|c| c.is_empty()) {
            fs.mark_up_to_date(target, manifest);
        }
    }
    report
}

#[test]
fn second_build_of_unchanged_project_skips_everything() {
    let dir = tempfile::tempdir().unwrap();
    let model = ProjectModel::from_config(&load_config_from_str(CONFIG).unwrap(), dir.path());
    for module in ["core", "app"] {
        let src = dir.path().join(module).join("src/main/kotlin");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("Main.kt"), format!("object {module}")).unwrap();
    }
    let mut manifest = FileStateManifest::new("0.1.0");

    let sink = DiagnosticSink::new();
    let first = build(&model, &mut manifest, &sink);
    assert!(first.is_success());
    assert_eq!(first.compiled_count(), 2);
    let unknown = sink
        .diagnostics()
        .into_iter()
        .filter(|d| d.code == DiagnosticCode::UNKNOWN_CHANGES)
        .count();
    assert_eq!(unknown, 2);

    for module in ["core", "app"] {
        let history = &model.module(module).unwrap().history_file;
        let diffs = BuildDiffsStorage::read_from_file(history).unwrap().build_diffs;
        assert_eq!(diffs.len(), 1);
        assert!(!diffs[0].is_incremental);
        assert!(diffs[0].dirty_data.is_empty());
    }

    let second = build(&model, &mut manifest, &DiagnosticSink::new());
    assert!(second.is_success());
    assert_eq!(second.compiled_count(), 0);
    assert!(second.chunks.iter().all(|c| matches!(c.status, ChunkStatus::Skipped)));
}

#[test]
fn only_the_edited_module_recompiles() {
    let dir = tempfile::tempdir().unwrap();
    let model = ProjectModel::from_config(&load_config_from_str(CONFIG).unwrap(), dir.path());
    let mut files = Vec::new();
    for module in ["core", "app"] {
        let src = dir.path().join(module).join("src/main/kotlin");
        std::fs::create_dir_all(&src).unwrap();
        let file = src.join("Main.kt");
        std::fs::write(&file, "object Main").unwrap();
        files.push(file);
    }
    let mut manifest = FileStateManifest::new("0.1.0");
    build(&model, &mut manifest, &DiagnosticSink::new());

    std::fs::write(&files[0], "object Main { val x = 1 }").unwrap();
    let report = build(&model, &mut manifest, &DiagnosticSink::new());
    let compiled: Vec<&BuildTarget> = report.compiled_targets().collect();
    assert_eq!(compiled, vec![&BuildTarget::production("core")]);
}
