//! Collection of a target's dirty and removed source files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use kiln_common::is_source_file;
use kiln_project::{BuildTarget, RootKind, SourceRoot};

use crate::delta::FilesDelta;
use crate::scope::BuildScope;

/// Feeds the dirty source files of `target` to `processor`.
///
/// Entries of other targets are skipped. Files under common roots are taken
/// regardless of the scope; files under native roots only when the scope
/// covers them. Files the classifier rejects are never passed on.
///
/// Returns `false` as soon as `processor` does, which stops the iteration.
pub fn collect_dirty_files<F>(
    target: &BuildTarget,
    delta: &FilesDelta,
    scope: &dyn BuildScope,
    mut processor: F,
) -> bool
where
    F: FnMut(&BuildTarget, &Path, &SourceRoot) -> bool,
{
    // The guard is released before `processor` runs, so it may query the delta.
    let entries: Vec<(SourceRoot, PathBuf)> = {
        let data = delta.lock_data();
        data.sources_to_recompile
            .iter()
            .filter(|(root, _)| &root.target == target)
            .flat_map(|(root, files)| files.iter().map(move |f| (root.clone(), f.clone())))
            .collect()
    };
    for (root, file) in &entries {
        let in_scope = match root.kind {
            RootKind::Common { .. } => true,
            RootKind::Native => scope.is_affected(target, file),
        };
        if in_scope && is_source_file(file) && !processor(target, file, root) {
            return false;
        }
    }
    true
}

/// The deleted source files of `target` reported by the scope.
pub fn removed_source_files(scope: &dyn BuildScope, target: &BuildTarget) -> BTreeSet<PathBuf> {
    scope
        .removed_files(target)
        .into_iter()
        .filter(|f| is_source_file(f))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::CompileScope;
    use std::collections::BTreeMap;

    fn collect(target: &BuildTarget, delta: &FilesDelta, scope: &dyn BuildScope) -> Vec<PathBuf> {
        let mut files = Vec::new();
        collect_dirty_files(target, delta, scope, |_, f, _| {
            files.push(f.to_path_buf());
            true
        });
        files
    }

    #[test]
    fn common_roots_bypass_scope() {
        let jvm = BuildTarget::production("jvm");
        let delta = FilesDelta::new();
        delta.mark_dirty(
            SourceRoot::common("/p/common/src", jvm.clone(), "common"),
            PathBuf::from("/p/common/src/Shared.kt"),
        );
        delta.mark_dirty(
            SourceRoot::native("/p/jvm/src", jvm.clone()),
            PathBuf::from("/p/jvm/src/Platform.kt"),
        );
        let scope = CompileScope::for_targets([BuildTarget::production("other")]);

        assert_eq!(collect(&jvm, &delta, &scope), vec![PathBuf::from("/p/common/src/Shared.kt")]);
    }

    #[test]
    fn native_roots_need_scope_and_classifier() {
        let a = BuildTarget::production("a");
        let root = SourceRoot::native("/p/a/src", a.clone());
        let delta = FilesDelta::new();
        delta.mark_dirty(root.clone(), PathBuf::from("/p/a/src/A.kt"));
        delta.mark_dirty(root.clone(), PathBuf::from("/p/a/src/B.java"));
        delta.mark_dirty(root.clone(), PathBuf::from("/p/a/src/C.KT"));
        delta.mark_dirty(root, PathBuf::from("/p/a/src/D.kt"));
        let scope = CompileScope::all().with_files([
            PathBuf::from("/p/a/src/A.kt"),
            PathBuf::from("/p/a/src/B.java"),
            PathBuf::from("/p/a/src/C.KT"),
        ]);

        assert_eq!(collect(&a, &delta, &scope), vec![PathBuf::from("/p/a/src/A.kt")]);
    }

    #[test]
    fn entries_of_other_targets_are_skipped() {
        let a = BuildTarget::production("a");
        let delta = FilesDelta::new();
        delta.mark_dirty(
            SourceRoot::native("/p/a/test", BuildTarget::test("a")),
            PathBuf::from("/p/a/test/ATest.kt"),
        );
        assert!(collect(&a, &delta, &CompileScope::all()).is_empty());
    }

    #[test]
    fn processor_can_stop_early() {
        let a = BuildTarget::production("a");
        let root = SourceRoot::native("/p/a/src", a.clone());
        let delta = FilesDelta::new();
        for name in ["A.kt", "B.kt", "C.kt"] {
            delta.mark_dirty(root.clone(), PathBuf::from("/p/a/src").join(name));
        }

        let mut seen = 0;
        let completed = collect_dirty_files(&a, &delta, &CompileScope::all(), |_, _, _| {
            seen += 1;
            seen < 2
        });
        assert!(!completed);
        assert_eq!(seen, 2);
    }

    #[test]
    fn processor_may_touch_the_delta() {
        let a = BuildTarget::production("a");
        let root = SourceRoot::native("/p/a/src", a.clone());
        let delta = FilesDelta::new();
        delta.mark_dirty(root.clone(), PathBuf::from("/p/a/src/A.kt"));
        delta.mark_dirty(root.clone(), PathBuf::from("/p/a/src/B.kt"));

        let mut sizes = Vec::new();
        let completed = collect_dirty_files(&a, &delta, &CompileScope::all(), |_, file, root| {
            sizes.push(delta.len());
            delta.mark_dirty(root.clone(), file.with_extension("kts"));
            true
        });
        assert!(completed);
        assert_eq!(sizes, vec![2, 3]);
        assert_eq!(delta.len(), 4);
    }

    #[test]
    fn removed_files_are_classified() {
        let a = BuildTarget::production("a");
        let scope = CompileScope::all().with_removed(BTreeMap::from([(
            a.clone(),
            vec![PathBuf::from("/p/a/Old.kt"), PathBuf::from("/p/a/notes.txt")],
        )]));
        let removed: Vec<_> = removed_source_files(&scope, &a).into_iter().collect();
        assert_eq!(removed, vec![PathBuf::from("/p/a/Old.kt")]);
    }
}
