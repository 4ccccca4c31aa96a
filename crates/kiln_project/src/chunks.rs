//! Chunking of the target dependency graph.
//!
//! Targets whose modules depend on each other form a strongly connected
//! component and must be compiled together as one [`ModuleChunk`]. Chunks are
//! returned in build order (dependencies first), and can be grouped into
//! levels whose chunks are independent of each other.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::model::ProjectModel;
use crate::target::{BuildTarget, ModuleChunk};

/// Builds the target graph: an edge `a -> b` means `a` needs `b` compiled first.
fn target_graph(model: &ProjectModel) -> (DiGraph<BuildTarget, ()>, HashMap<BuildTarget, NodeIndex>) {
    let mut graph = DiGraph::new();
    let mut index = HashMap::new();
    for target in model.targets() {
        let node = graph.add_node(target.clone());
        index.insert(target, node);
    }

    for target in model.targets() {
        let from = index[&target];
        if target.is_tests() {
            graph.add_edge(from, index[&BuildTarget::production(&target.module)], ());
        }
        for dep in model.compile_dependencies(&target) {
            let dep_targets = if target.is_tests() {
                vec![BuildTarget::production(dep.module()), BuildTarget::test(dep.module())]
            } else {
                vec![BuildTarget::production(dep.module())]
            };
            for dep_target in dep_targets {
                if let Some(&to) = index.get(&dep_target) {
                    graph.add_edge(from, to, ());
                }
            }
        }
    }
    (graph, index)
}

/// Computes the chunks of `model` in build order.
pub fn compute_chunks(model: &ProjectModel) -> Vec<ModuleChunk> {
    let (graph, _) = target_graph(model);
    // Tarjan yields components in post-order, which for dependent -> dependency
    // edges puts every chunk after the chunks it depends on.
    tarjan_scc(&graph)
        .into_iter()
        .map(|component| ModuleChunk::new(component.into_iter().map(|n| graph[n].clone())))
        .collect()
}

/// Groups the chunks of `model` into levels. Every chunk depends only on
/// chunks of earlier levels, so the chunks of one level may build in parallel.
pub fn chunk_levels(model: &ProjectModel) -> Vec<Vec<ModuleChunk>> {
    let (graph, index) = target_graph(model);
    let chunks = compute_chunks(model);

    let mut chunk_of = HashMap::new();
    for (i, chunk) in chunks.iter().enumerate() {
        for target in chunk.targets() {
            chunk_of.insert(index[target], i);
        }
    }

    let mut level = vec![0usize; chunks.len()];
    for (i, chunk) in chunks.iter().enumerate() {
        for target in chunk.targets() {
            for dep in graph.neighbors(index[target]) {
                let j = chunk_of[&dep];
                if j != i {
                    level[i] = level[i].max(level[j] + 1);
                }
            }
        }
    }

    let depth = level.iter().copied().max().map_or(0, |d| d + 1);
    let mut levels = vec![Vec::new(); depth];
    for (chunk, l) in chunks.into_iter().zip(level) {
        levels[l].push(chunk);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::load_config_from_str;
    use std::path::Path;

    fn model(toml: &str) -> ProjectModel {
        ProjectModel::from_config(&load_config_from_str(toml).unwrap(), Path::new("/p"))
    }

    fn position(chunks: &[ModuleChunk], target: &BuildTarget) -> usize {
        chunks.iter().position(|c| c.contains(target)).unwrap()
    }

    const LINEAR: &str = r#"
[project]
name = "demo"
version = "0.1.0"

[modules.core]
[modules.app]
dependencies = ["core"]
"#;

    const CYCLIC: &str = r#"
[project]
name = "demo"
version = "0.1.0"

[modules.a]
dependencies = ["b"]
[modules.b]
dependencies = ["a"]
[modules.c]
dependencies = ["a"]
"#;

    #[test]
    fn acyclic_graph_has_singleton_chunks_in_order() {
        let chunks = compute_chunks(&model(LINEAR));
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.len() == 1));
        let core = position(&chunks, &BuildTarget::production("core"));
        let app = position(&chunks, &BuildTarget::production("app"));
        let app_test = position(&chunks, &BuildTarget::test("app"));
        assert!(core < app);
        assert!(app < app_test);
    }

    #[test]
    fn cycle_forms_one_chunk() {
        let chunks = compute_chunks(&model(CYCLIC));
        let prod = &chunks[position(&chunks, &BuildTarget::production("a"))];
        assert_eq!(prod.modules(), vec!["a", "b"]);
        assert!(prod.contains(&BuildTarget::production("b")));
        assert!(!prod.contains_tests());

        let tests = &chunks[position(&chunks, &BuildTarget::test("a"))];
        assert_eq!(tests.modules(), vec!["a", "b"]);
        assert!(tests.contains_tests());
    }

    #[test]
    fn levels_respect_dependencies() {
        let levels = chunk_levels(&model(CYCLIC));
        let level_of = |t: &BuildTarget| levels.iter().position(|l| l.iter().any(|c| c.contains(t))).unwrap();
        assert_eq!(level_of(&BuildTarget::production("a")), 0);
        assert_eq!(level_of(&BuildTarget::production("c")), 1);
        assert!(level_of(&BuildTarget::test("c")) > level_of(&BuildTarget::production("c")));
        let total: usize = levels.iter().map(Vec::len).sum();
        assert_eq!(total, compute_chunks(&model(CYCLIC)).len());
    }

    #[test]
    fn empty_project_has_no_levels() {
        let toml = "[project]\nname = \"x\"\nversion = \"0\"\n";
        assert!(chunk_levels(&model(toml)).is_empty());
    }
}
