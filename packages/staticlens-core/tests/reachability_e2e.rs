//! End-to-end unused-code reachability scenarios.

use pretty_assertions::assert_eq;
use staticlens_core::config::ReachabilityConfig;
use staticlens_core::features::reachability::{
    DenseGraph, DirectionOptimizingBfs, UnusedCodeDetector,
};
use staticlens_core::shared::models::{
    Declaration, DeclarationKind, Location, Reference, ReferenceContext, SourceRange,
};

fn decl(name: &str, file: &str, start_line: u32, end_line: u32) -> Declaration {
    Declaration::new(
        name,
        DeclarationKind::Function,
        Location::new(file, start_line, 0),
    )
    .with_range(SourceRange::lines(file, start_line, end_line))
}

fn config() -> ReachabilityConfig {
    let mut config = ReachabilityConfig::default();
    config.roots.treat_public_as_root = false;
    config
}

#[test]
fn unreached_component_is_unused() {
    // E6: declarations {A(root), B, C, D} with edges A→B and C→D.
    // Reachable = {A, B}; unused = {C, D}.
    let declarations = vec![
        decl("main", "app.swift", 1, 10),
        decl("bootstrap", "app.swift", 20, 30),
        decl("legacyEntry", "legacy.swift", 1, 10),
        decl("legacyHelper", "legacy.swift", 20, 30),
    ];
    let references = vec![
        Reference::new(
            "bootstrap",
            Location::new("app.swift", 4, 4),
            ReferenceContext::Call,
        ),
        Reference::new(
            "legacyHelper",
            Location::new("legacy.swift", 4, 4),
            ReferenceContext::Call,
        ),
    ];

    let output = UnusedCodeDetector::new(config()).detect(&declarations, &references);

    assert_eq!(output.total_declarations, 4);
    assert_eq!(output.reachable_declarations, 2);

    let mut unused: Vec<&str> = output
        .findings
        .iter()
        .map(|finding| finding.declaration.name.as_str())
        .collect();
    unused.sort_unstable();
    assert_eq!(unused, vec!["legacyEntry", "legacyHelper"]);
}

#[test]
fn direction_switch_matches_sequential() {
    // E7: 100k nodes, branching factor ≈ 8, one root. The traversal must
    // use a bottom-up phase and agree with the sequential result.
    let n: u32 = 100_000;
    let tree_size: u32 = 98_000;
    let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); n as usize];
    for node in 0..tree_size {
        for child in 1..=8u32 {
            let target = node * 8 + child;
            if target < tree_size {
                adjacency[node as usize].push(target);
            }
        }
    }
    // A chain tail pulls the traversal back to top-down late.
    adjacency[1].push(tree_size);
    for node in tree_size..n - 1 {
        adjacency[node as usize].push(node + 1);
    }
    let graph = DenseGraph::from_adjacency(adjacency, vec![0]);

    let bfs = DirectionOptimizingBfs::new(&config());
    let (visited, stats) = bfs.compute_reachable(&graph);
    let sequential = DirectionOptimizingBfs::compute_reachable_sequential(&graph);

    assert!(stats.ran_parallel);
    assert!(stats.bottom_up_steps >= 1, "no bottom-up phase: {stats:?}");
    assert!(stats.top_down_steps >= 2);
    assert_eq!(visited.pop_count(), sequential.pop_count());
    for node in 0..n as usize {
        assert_eq!(visited.test(node), sequential.test(node), "node {node}");
    }
    assert_eq!(visited.pop_count(), n as usize);
}

#[test]
fn visited_count_equals_popcount() {
    let graph = DenseGraph::from_adjacency(
        vec![vec![1, 2, 3], vec![4], vec![4], vec![], vec![]],
        vec![0],
    );
    let (visited, _) = DirectionOptimizingBfs::new(&config()).compute_reachable(&graph);
    assert_eq!(visited.pop_count(), visited.set_bits().len());
    assert_eq!(visited.pop_count(), 5);
}

#[test]
fn roots_are_always_reachable() {
    let graph = DenseGraph::from_adjacency(vec![vec![], vec![], vec![]], vec![0, 2]);
    let (visited, _) = DirectionOptimizingBfs::new(&config()).compute_reachable(&graph);
    assert!(visited.test(0));
    assert!(!visited.test(1));
    assert!(visited.test(2));
}
