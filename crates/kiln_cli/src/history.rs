//! `kiln history`: which module's build history covers an artifact.

use std::path::Path;

use kiln_history::{GradleModulesApiHistory, GradleModulesInfo, ModulesApiHistory};

use crate::pipeline::load_project;
use crate::{GlobalArgs, HistoryArgs};

/// Runs the `kiln history` command.
///
/// Prints the history file and returns 0 when a module owns the artifact,
/// 1 when none does, and 2 when neither an artifact nor `--dump-modules`
/// was given.
pub fn run(args: &HistoryArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let info = GradleModulesInfo::from_model(&project.model);
    if args.dump_modules {
        println!("{}", info.to_json()?);
    }
    let Some(artifact) = &args.artifact else {
        return Ok(if args.dump_modules { 0 } else { 2 });
    };

    let resolver = GradleModulesApiHistory::new(info);
    match resolver.history_file_for_artifact(Path::new(artifact)) {
        Some(file) => {
            println!("{}", file.display());
            Ok(0)
        }
        None => {
            if !global.quiet {
                eprintln!("no module of {} produced {artifact}", project.config.project.name);
            }
            Ok(1)
        }
    }
}
