//! The module descriptor handed to the compiler.
//!
//! The descriptor lists, per target of a chunk, the output directory, the
//! source files to compile, the source roots with their package prefixes,
//! the classpath and the friend directories whose internal declarations are
//! visible. It is written as XML:
//!
//! ```xml
//! <modules>
//!   <!-- Module script for production -->
//!   <module name="app" type="java-production" outputDir="/p/app/build/classes/kotlin/main">
//!     <sources path="/p/app/src/main/kotlin/App.kt"/>
//!     <javaSourceRoots path="/p/app/src/main/kotlin" packagePrefix="com.example"/>
//!     <classpath path="/p/core/build/classes/kotlin/main"/>
//!   </module>
//! </modules>
//! ```

use std::collections::BTreeSet;
use std::fmt::Write;
use std::path::PathBuf;

/// A source root as the compiler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JvmSourceRoot {
    /// Root directory.
    pub path: PathBuf,
    /// Package prefix of the root, if any.
    pub package_prefix: Option<String>,
}

/// One target of a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    /// Module name.
    pub name: String,
    /// Module kind, `java-production` or `java-test`.
    pub module_type: String,
    /// Whether the entry compiles test sources.
    pub is_tests: bool,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Source files to compile.
    pub sources: Vec<PathBuf>,
    /// Existing source roots.
    pub java_source_roots: Vec<JvmSourceRoot>,
    /// Classpath entries.
    pub classpath: Vec<PathBuf>,
    /// Friend output directories.
    pub friend_dirs: Vec<PathBuf>,
}

/// The descriptor of a whole chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDescriptor {
    modules: Vec<ModuleEntry>,
}

impl ModuleDescriptor {
    /// An empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entry`, dropping the classpath entries in `excluded_dirs`.
    ///
    /// Rounds pass the output directories of the chunk's own targets.
    pub fn add_module(&mut self, mut entry: ModuleEntry, excluded_dirs: &BTreeSet<PathBuf>) {
        entry.classpath.retain(|p| !excluded_dirs.contains(p));
        self.modules.push(entry);
    }

    /// The entries in insertion order.
    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    /// Returns `true` if no entry was added.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Renders the descriptor as XML.
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<modules>\n");
        for module in &self.modules {
            let kind = if module.is_tests { "tests" } else { "production" };
            let _ = writeln!(out, "  <!-- Module script for {kind} -->");
            let _ = writeln!(
                out,
                "  <module name=\"{}\" type=\"{}\" outputDir=\"{}\">",
                escape(&module.name),
                escape(&module.module_type),
                escape_path(&module.output_dir),
            );
            for dir in &module.friend_dirs {
                let _ = writeln!(out, "    <friendDir path=\"{}\"/>", escape_path(dir));
            }
            for source in &module.sources {
                let _ = writeln!(out, "    <sources path=\"{}\"/>", escape_path(source));
            }
            for root in &module.java_source_roots {
                let _ = write!(out, "    <javaSourceRoots path=\"{}\"", escape_path(&root.path));
                if let Some(prefix) = &root.package_prefix {
                    let _ = write!(out, " packagePrefix=\"{}\"", escape(prefix));
                }
                out.push_str("/>\n");
            }
            for entry in &module.classpath {
                let _ = writeln!(out, "    <classpath path=\"{}\"/>", escape_path(entry));
            }
            out.push_str("  </module>\n");
        }
        out.push_str("</modules>\n");
        out
    }
}

fn escape_path(path: &std::path::Path) -> String {
    escape(&path.to_string_lossy())
}

/// Escapes the XML attribute metacharacters of `value`.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, is_tests: bool) -> ModuleEntry {
        ModuleEntry {
            name: name.to_string(),
            module_type: if is_tests { "java-test" } else { "java-production" }.to_string(),
            is_tests,
            output_dir: PathBuf::from(format!("/p/{name}/out")),
            sources: vec![PathBuf::from(format!("/p/{name}/src/A.kt"))],
            java_source_roots: vec![JvmSourceRoot {
                path: PathBuf::from(format!("/p/{name}/src")),
                package_prefix: Some("com.example".to_string()),
            }],
            classpath: vec![PathBuf::from("/p/lib.jar")],
            friend_dirs: Vec::new(),
        }
    }

    #[test]
    fn xml_lists_every_element() {
        let mut descriptor = ModuleDescriptor::new();
        let mut test = entry("app", true);
        test.friend_dirs.push(PathBuf::from("/p/app/main"));
        descriptor.add_module(test, &BTreeSet::new());

        let xml = descriptor.to_xml();
        assert!(xml.starts_with("<modules>\n"));
        assert!(xml.ends_with("</modules>\n"));
        assert!(xml.contains("<!-- Module script for tests -->"));
        assert!(xml.contains(r#"<module name="app" type="java-test" outputDir="/p/app/out">"#));
        assert!(xml.contains(r#"<friendDir path="/p/app/main"/>"#));
        assert!(xml.contains(r#"<sources path="/p/app/src/A.kt"/>"#));
        assert!(xml.contains(r#"<javaSourceRoots path="/p/app/src" packagePrefix="com.example"/>"#));
        assert!(xml.contains(r#"<classpath path="/p/lib.jar"/>"#));
    }

    #[test]
    fn chunk_outputs_are_excluded_from_classpath() {
        let mut descriptor = ModuleDescriptor::new();
        let mut a = entry("a", false);
        a.classpath.push(PathBuf::from("/p/b/out"));
        let excluded = BTreeSet::from([PathBuf::from("/p/a/out"), PathBuf::from("/p/b/out")]);
        descriptor.add_module(a, &excluded);
        descriptor.add_module(entry("b", false), &excluded);

        assert_eq!(descriptor.modules().len(), 2);
        assert_eq!(descriptor.modules()[0].classpath, vec![PathBuf::from("/p/lib.jar")]);
        assert!(!descriptor.to_xml().contains(r#"<classpath path="/p/b/out"/>"#));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut descriptor = ModuleDescriptor::new();
        let mut odd = entry("a&b", false);
        odd.java_source_roots[0].package_prefix = None;
        odd.sources = vec![PathBuf::from("/p/\"quoted\"/<A>.kt")];
        descriptor.add_module(odd, &BTreeSet::new());

        let xml = descriptor.to_xml();
        assert!(xml.contains(r#"name="a&amp;b""#));
        assert!(xml.contains(r#"path="/p/&quot;quoted&quot;/&lt;A&gt;.kt""#));
        assert!(!xml.contains("packagePrefix"));
    }

    #[test]
    fn empty_descriptor() {
        let descriptor = ModuleDescriptor::new();
        assert!(descriptor.is_empty());
        assert_eq!(descriptor.to_xml(), "<modules>\n</modules>\n");
    }
}
