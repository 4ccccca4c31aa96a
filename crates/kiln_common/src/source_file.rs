//! Classification of source files by extension.

use std::path::Path;

/// Canonical extension of the language's source files.
pub const SOURCE_EXTENSION: &str = "kt";

/// Returns `true` if `path` names a source file of the language.
///
/// The check is an exact, case-sensitive match on the file name's extension.
pub fn is_source_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_source_extension() {
        assert!(is_source_file(Path::new("src/main/kotlin/App.kt")));
        assert!(is_source_file(Path::new("App.kt")));
    }

    #[test]
    fn extension_is_case_sensitive() {
        assert!(!is_source_file(Path::new("App.KT")));
        assert!(!is_source_file(Path::new("App.Kt")));
    }

    #[test]
    fn rejects_other_files() {
        assert!(!is_source_file(Path::new("App.java")));
        assert!(!is_source_file(Path::new("build.gradle.kts")));
        assert!(!is_source_file(Path::new("kt")));
        assert!(!is_source_file(Path::new("src/kt/")));
        assert!(!is_source_file(Path::new("")));
    }
}
