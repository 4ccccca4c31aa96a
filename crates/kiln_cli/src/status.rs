//! `kiln status`: what the next build would see as changed.

use kiln_cache::FileStateManifest;
use kiln_dirty::FsState;

use crate::build::MANIFEST_VERSION;
use crate::pipeline::load_project;
use crate::{GlobalArgs, ReportFormat, StatusArgs};

/// One target's line of the status report.
#[derive(Debug, PartialEq, Eq)]
pub struct TargetStatus {
    /// The target, as keyed in the manifest.
    pub target: String,
    /// New or modified source files.
    pub dirty: usize,
    /// Source files deleted since the last build.
    pub removed: usize,
}

/// Runs the `kiln status` command. Always returns exit code 0.
pub fn run(args: &StatusArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let manifest = FileStateManifest::load_or_new(&project.cache_dir(), MANIFEST_VERSION);
    let statuses = collect(&FsState::scan(&project.model, &manifest));

    match args.format {
        ReportFormat::Text => {
            let mut clean = true;
            for s in statuses.iter().filter(|s| s.dirty + s.removed > 0) {
                clean = false;
                println!("{}: {} dirty, {} removed", s.target, s.dirty, s.removed);
            }
            if clean && !global.quiet {
                println!("all targets up to date");
            }
        }
        ReportFormat::Json => {
            let targets: Vec<serde_json::Value> = statuses
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "target": s.target,
                        "dirty": s.dirty,
                        "removed": s.removed,
                    })
                })
                .collect();
            println!("{}", serde_json::Value::Array(targets));
        }
    }
    Ok(0)
}

/// Status of every target in target order.
pub fn collect(fs: &FsState) -> Vec<TargetStatus> {
    fs.targets()
        .map(|target| {
            let (dirty, removed) = fs
                .changes(target)
                .map_or((0, 0), |c| (c.dirty_count(), c.deleted_files.len()));
            TargetStatus {
                target: target.to_string(),
                dirty,
                removed,
            }
        })
        .collect()
}
