//! `kiln diffs`: the entries of a build history file.

use std::path::Path;

use kiln_cache::{BuildDifference, BuildDiffsStorage};

use crate::{DiffsArgs, GlobalArgs, ReportFormat};

/// Runs the `kiln diffs` command. Returns 1 if the file cannot be read.
pub fn run(args: &DiffsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let path = Path::new(&args.history_file);
    let Some(storage) = BuildDiffsStorage::read_from_file(path) else {
        if !global.quiet {
            eprintln!("no readable build history at {}", path.display());
        }
        return Ok(1);
    };

    match args.format {
        ReportFormat::Text => {
            for diff in &storage.build_diffs {
                print!("{}", describe(diff));
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&storage)?),
    }
    Ok(0)
}

fn describe(diff: &BuildDifference) -> String {
    let kind = if diff.is_incremental {
        "incremental"
    } else {
        "non-incremental"
    };
    let data = &diff.dirty_data;
    let mut out = format!(
        "{} {kind}: {} lookup symbols, {} classes\n",
        diff.ts,
        data.dirty_lookup_symbols.len(),
        data.dirty_classes_fq_names.len()
    );
    for symbol in &data.dirty_lookup_symbols {
        out.push_str(&format!("  symbol {} in {}\n", symbol.name, symbol.scope));
    }
    for class in &data.dirty_classes_fq_names {
        out.push_str(&format!("  class {class}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_cache::{DirtyData, LookupSymbol};

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: None,
        }
    }

    #[test]
    fn describes_entries() {
        let diff = BuildDifference {
            ts: 42,
            is_incremental: true,
            dirty_data: DirtyData {
                dirty_lookup_symbols: vec![LookupSymbol {
                    name: "foo".to_string(),
                    scope: "com.example".to_string(),
                }],
                dirty_classes_fq_names: vec!["com.example.Bar".to_string()],
            },
        };
        assert_eq!(
            describe(&diff),
            "42 incremental: 1 lookup symbols, 1 classes\n  symbol foo in com.example\n  class com.example.Bar\n"
        );
    }

    #[test]
    fn missing_file_exits_with_one() {
        let tmp = tempfile::tempdir().unwrap();
        let args = DiffsArgs {
            history_file: tmp.path().join("none.bin").to_string_lossy().into_owned(),
            format: ReportFormat::Text,
        };
        assert_eq!(run(&args, &global()).unwrap(), 1);
    }

    #[test]
    fn readable_file_exits_with_zero() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("history.bin");
        BuildDiffsStorage::new(vec![BuildDifference {
            ts: 1,
            is_incremental: false,
            dirty_data: DirtyData::default(),
        }])
        .write_to_file(&file, 10)
        .unwrap();

        let args = DiffsArgs {
            history_file: file.to_string_lossy().into_owned(),
            format: ReportFormat::Json,
        };
        assert_eq!(run(&args, &global()).unwrap(), 0);
    }
}
