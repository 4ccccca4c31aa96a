//! Shared helpers for CLI commands: project root discovery, loading the
//! project model, tracing setup and message rendering.

use std::path::{Path, PathBuf};

use kiln_config::{ProjectConfig, CONFIG_FILE};
use kiln_diagnostics::{
    DiagnosticRenderer, DiagnosticSink, JsonRenderer, Severity, TerminalRenderer,
};
use kiln_project::ProjectModel;

use crate::{GlobalArgs, ReportFormat};

/// A loaded project.
pub struct Project {
    /// Directory holding `kiln.toml`.
    pub root: PathBuf,
    /// The parsed configuration.
    pub config: ProjectConfig,
    /// The module graph.
    pub model: ProjectModel,
}

impl Project {
    /// Directory holding the file-state manifest.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.config.build.cache_dir)
    }
}

/// Walks up from `start` looking for the nearest directory containing `kiln.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file means its parent dir,
/// dir means itself). Otherwise walks up from the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Finds, loads and resolves the project.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let root = kiln_common::absolute(&resolve_project_root(global)?);
    let config = kiln_config::load_config(&root)?;
    let model = ProjectModel::from_config(&config, &root);
    tracing::debug!(root = %root.display(), modules = config.modules.len(), "loaded project");
    Ok(Project {
        root,
        config,
        model,
    })
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `-v` enables debug output and
/// `-q` limits output to errors.
pub fn init_tracing(global: &GlobalArgs) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(global.color),
        )
        .with(filter)
        .try_init();
}

/// Renders every message of `sink`. Text goes to stderr, JSON lines to stdout.
///
/// Info messages are hidden in quiet text mode. Returns the number of
/// messages rendered.
pub fn render_diagnostics(sink: &DiagnosticSink, format: ReportFormat, global: &GlobalArgs) -> usize {
    let diagnostics = sink.diagnostics();
    let mut rendered = 0;
    match format {
        ReportFormat::Text => {
            let renderer = TerminalRenderer::new(global.color);
            for diag in &diagnostics {
                if global.quiet && diag.severity == Severity::Info {
                    continue;
                }
                eprint!("{}", renderer.render(diag));
                rendered += 1;
            }
        }
        ReportFormat::Json => {
            for diag in &diagnostics {
                println!("{}", JsonRenderer.render(diag));
                rendered += 1;
            }
        }
    }
    rendered
}
