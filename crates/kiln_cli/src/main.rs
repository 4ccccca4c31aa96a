//! Kiln CLI, the command-line front end of the incremental build driver.
//!
//! Provides `kiln status` to show what changed since the last build,
//! `kiln build` to run the build rounds of a project, `kiln history` to find
//! the history file of the module that produced an artifact, and
//! `kiln diffs` to inspect a history file.

#![warn(missing_docs)]

mod build;
mod diffs;
mod history;
mod pipeline;
mod status;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Kiln, an incremental multi-module build driver.
#[derive(Parser, Debug)]
#[command(name = "kiln", version, about = "Kiln incremental build driver")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `kiln.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the dirty and removed files of every target.
    Status(StatusArgs),
    /// Compile the chunks whose sources changed.
    Build(BuildArgs),
    /// Find the build history file of the module that produced an artifact.
    History(HistoryArgs),
    /// Print the entries of a build history file.
    Diffs(DiffsArgs),
}

/// Arguments for the `kiln status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `kiln build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Restrict the build to these modules (repeatable).
    #[arg(short, long = "module")]
    pub modules: Vec<String>,

    /// Forget the recorded file state of the selected targets first.
    #[arg(long)]
    pub rebuild: bool,

    /// Number of parallel chunk workers (default: one per core).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep module descriptor files after the compiler ran.
    #[arg(long)]
    pub keep_module_files: bool,

    /// Output format for messages and the build summary.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `kiln history` subcommand.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// A class file or an archive produced by the build.
    pub artifact: Option<String>,

    /// Print the module table used for resolution as JSON.
    #[arg(long)]
    pub dump_modules: bool,
}

/// Arguments for the `kiln diffs` subcommand.
#[derive(Parser, Debug)]
pub struct DiffsArgs {
    /// The build history file to read.
    pub history_file: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Output format of reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    pipeline::init_tracing(&global);

    let result = match cli.command {
        Command::Status(ref args) => status::run(args, &global),
        Command::Build(ref args) => build::run(args, &global),
        Command::History(ref args) => history::run(args, &global),
        Command::Diffs(ref args) => diffs::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
