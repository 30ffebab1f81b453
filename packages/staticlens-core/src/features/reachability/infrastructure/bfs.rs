//! Direction-optimizing parallel BFS (Beamer et al., SC'12)
//!
//! Top-down steps expand the frontier outward over `adjacency`; bottom-up
//! steps sweep the unvisited nodes and probe `reverse_adjacency` against a
//! frontier snapshot. The traversal switches top-down → bottom-up when
//! `frontier_edges · alpha > remaining_edges`, and back when
//! `|frontier| · beta < N`.
//!
//! The atomic visited bitmap is the only shared mutable state; the graph
//! is frozen before traversal. Whichever thread wins the `test_and_set`
//! claims the node, so the visited *set* is deterministic even though the
//! visit order is not. Graphs smaller than `min_parallel_size` (and empty
//! root sets) take the sequential path.

use std::collections::VecDeque;

use rayon::prelude::*;
use tracing::debug;

use crate::config::ReachabilityConfig;
use crate::features::reachability::domain::DenseGraph;
use crate::shared::memory::{AtomicBitmap, Bitmap};

/// Traversal statistics, collected per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub iterations: usize,
    pub top_down_steps: usize,
    pub bottom_up_steps: usize,
    pub max_frontier: usize,
    pub ran_parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    TopDown,
    BottomUp,
}

/// Configured direction-optimizing traversal.
#[derive(Debug, Clone)]
pub struct DirectionOptimizingBfs {
    alpha: u64,
    beta: u64,
    min_parallel_size: usize,
    max_concurrency: usize,
}

impl DirectionOptimizingBfs {
    pub fn new(config: &ReachabilityConfig) -> Self {
        Self {
            alpha: config.clamped_alpha() as u64,
            beta: config.clamped_beta() as u64,
            min_parallel_size: config.min_parallel_size,
            max_concurrency: config.clamped_concurrency(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(&ReachabilityConfig::default())
    }

    /// Compute the set of nodes reachable from the graph's roots.
    pub fn compute_reachable(&self, graph: &DenseGraph) -> (AtomicBitmap, TraversalStats) {
        let node_count = graph.node_count();
        let visited = AtomicBitmap::new(node_count);
        let mut stats = TraversalStats::default();

        if node_count == 0 || graph.roots().is_empty() {
            return (visited, stats);
        }
        if node_count < self.min_parallel_size {
            Self::sequential_into(graph, &visited, &mut stats);
            return (visited, stats);
        }
        stats.ran_parallel = true;

        let mut frontier: Vec<u32> = graph
            .roots()
            .iter()
            .copied()
            .filter(|&root| visited.test_and_set(root as usize))
            .collect();

        let mut direction = Direction::TopDown;
        while !frontier.is_empty() {
            stats.iterations += 1;
            stats.max_frontier = stats.max_frontier.max(frontier.len());

            let frontier_edges: u64 = frontier
                .iter()
                .map(|&v| graph.out_degree(v) as u64)
                .sum();
            let remaining_edges: u64 = (0..node_count as u32)
                .into_par_iter()
                .filter(|&v| !visited.test(v as usize))
                .map(|v| graph.out_degree(v) as u64)
                .sum();

            let previous = direction;
            direction = match direction {
                Direction::TopDown
                    if remaining_edges > 0 && frontier_edges * self.alpha > remaining_edges =>
                {
                    Direction::BottomUp
                }
                Direction::BottomUp
                    if (frontier.len() as u64) * self.beta < node_count as u64 =>
                {
                    Direction::TopDown
                }
                unchanged => unchanged,
            };
            if direction != previous {
                debug!(
                    iteration = stats.iterations,
                    frontier = frontier.len(),
                    frontier_edges,
                    remaining_edges,
                    ?direction,
                    "traversal switched direction"
                );
            }

            frontier = match direction {
                Direction::TopDown => {
                    stats.top_down_steps += 1;
                    self.top_down_step(graph, &visited, &frontier)
                }
                Direction::BottomUp => {
                    stats.bottom_up_steps += 1;
                    self.bottom_up_step(graph, &visited, &frontier)
                }
            };
        }

        (visited, stats)
    }

    /// Reference implementation: plain sequential BFS over `adjacency`.
    pub fn compute_reachable_sequential(graph: &DenseGraph) -> Bitmap {
        let mut visited = Bitmap::new(graph.node_count());
        let mut queue: VecDeque<u32> = VecDeque::new();
        for &root in graph.roots() {
            if !visited.test(root as usize) {
                visited.set(root as usize);
                queue.push_back(root);
            }
        }
        while let Some(node) = queue.pop_front() {
            for &next in graph.adjacency(node) {
                if !visited.test(next as usize) {
                    visited.set(next as usize);
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    fn sequential_into(graph: &DenseGraph, visited: &AtomicBitmap, stats: &mut TraversalStats) {
        let mut queue: VecDeque<u32> = VecDeque::new();
        for &root in graph.roots() {
            if visited.test_and_set(root as usize) {
                queue.push_back(root);
            }
        }
        stats.max_frontier = queue.len();
        while let Some(node) = queue.pop_front() {
            for &next in graph.adjacency(node) {
                if visited.test_and_set(next as usize) {
                    queue.push_back(next);
                }
            }
        }
    }

    /// Expand the frontier outward; small frontiers stay sequential.
    fn top_down_step(
        &self,
        graph: &DenseGraph,
        visited: &AtomicBitmap,
        frontier: &[u32],
    ) -> Vec<u32> {
        if frontier.len() < 2 * self.max_concurrency {
            let mut next = Vec::new();
            for &node in frontier {
                for &neighbor in graph.adjacency(node) {
                    if visited.test_and_set(neighbor as usize) {
                        next.push(neighbor);
                    }
                }
            }
            return next;
        }

        let chunk_size = frontier.len().div_ceil(self.max_concurrency);
        let locals: Vec<Vec<u32>> = frontier
            .par_chunks(chunk_size)
            .map(|chunk| {
                let mut local = Vec::new();
                for &node in chunk {
                    for &neighbor in graph.adjacency(node) {
                        if visited.test_and_set(neighbor as usize) {
                            local.push(neighbor);
                        }
                    }
                }
                local
            })
            .collect();
        locals.concat()
    }

    /// Sweep unvisited nodes, probing predecessors against an immutable
    /// frontier snapshot. The `[0, N)` range is cut into `max_concurrency`
    /// chunks so no unvisited-node array is materialized.
    fn bottom_up_step(
        &self,
        graph: &DenseGraph,
        visited: &AtomicBitmap,
        frontier: &[u32],
    ) -> Vec<u32> {
        let node_count = graph.node_count();
        let snapshot = Bitmap::from_indices(node_count, frontier);
        let chunk_size = node_count.div_ceil(self.max_concurrency);

        let locals: Vec<Vec<u32>> = (0..self.max_concurrency)
            .into_par_iter()
            .map(|worker| {
                let start = worker * chunk_size;
                let end = ((worker + 1) * chunk_size).min(node_count);
                let mut local = Vec::new();
                for node in start..end {
                    if visited.test(node) {
                        continue;
                    }
                    for &predecessor in graph.reverse_adjacency(node as u32) {
                        if snapshot.test(predecessor as usize) {
                            if visited.test_and_set(node) {
                                local.push(node as u32);
                            }
                            break;
                        }
                    }
                }
                local
            })
            .collect();
        locals.concat()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parallel_config() -> ReachabilityConfig {
        ReachabilityConfig {
            min_parallel_size: 1,
            ..ReachabilityConfig::default()
        }
    }

    fn visited_set(bitmap: &AtomicBitmap) -> Vec<u32> {
        bitmap.set_bits()
    }

    #[test]
    fn test_empty_graph() {
        let graph = DenseGraph::from_adjacency(vec![], vec![]);
        let (visited, stats) = DirectionOptimizingBfs::with_defaults().compute_reachable(&graph);
        assert_eq!(visited.pop_count(), 0);
        assert_eq!(stats.iterations, 0);
    }

    #[test]
    fn test_no_roots_visits_nothing() {
        let graph = DenseGraph::from_adjacency(vec![vec![1], vec![]], vec![]);
        let (visited, _) = DirectionOptimizingBfs::with_defaults().compute_reachable(&graph);
        assert_eq!(visited.pop_count(), 0);
    }

    #[test]
    fn test_two_components() {
        // A -> B, C -> D; only A is a root.
        let graph = DenseGraph::from_adjacency(vec![vec![1], vec![], vec![3], vec![]], vec![0]);
        let (visited, stats) = DirectionOptimizingBfs::with_defaults().compute_reachable(&graph);

        assert_eq!(visited_set(&visited), vec![0, 1]);
        assert!(!visited.test(2));
        assert!(!visited.test(3));
        // Small graph: sequential fallback.
        assert!(!stats.ran_parallel);
    }

    #[test]
    fn test_parallel_matches_sequential_on_random_graph() {
        // Deterministic pseudo-random graph via an LCG.
        let n = 5000u32;
        let mut state = 0x5eed_1234u64;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as u32
        };
        let adjacency: Vec<Vec<u32>> = (0..n)
            .map(|_| (0..6).map(|_| next() % n).collect())
            .collect();
        let graph = DenseGraph::from_adjacency(adjacency, vec![0, 17, 4242]);

        let sequential = DirectionOptimizingBfs::compute_reachable_sequential(&graph);
        let (parallel, stats) =
            DirectionOptimizingBfs::new(&parallel_config()).compute_reachable(&graph);

        assert!(stats.ran_parallel);
        assert_eq!(parallel.pop_count(), sequential.pop_count());
        for node in 0..n as usize {
            assert_eq!(parallel.test(node), sequential.test(node), "node {node}");
        }
        // Reachable set always contains the roots.
        for &root in graph.roots() {
            assert!(parallel.test(root as usize));
        }
    }

    #[test]
    fn test_direction_switch_on_tree_with_tail() {
        // 8-ary tree over the first 98k nodes, then a 2k chain hanging off
        // node 1: the wide levels trigger bottom-up, the chain drags the
        // traversal back to top-down.
        let n: u32 = 100_000;
        let tree_size: u32 = 98_000;
        let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); n as usize];
        for v in 0..tree_size {
            for i in 1..=8u32 {
                let child = v * 8 + i;
                if child < tree_size {
                    adjacency[v as usize].push(child);
                }
            }
        }
        adjacency[1].push(tree_size);
        for v in tree_size..n - 1 {
            adjacency[v as usize].push(v + 1);
        }
        let graph = DenseGraph::from_adjacency(adjacency, vec![0]);

        let bfs = DirectionOptimizingBfs::new(&parallel_config());
        let (visited, stats) = bfs.compute_reachable(&graph);

        assert!(stats.ran_parallel);
        assert!(stats.bottom_up_steps >= 1, "expected a bottom-up phase: {stats:?}");
        assert!(stats.top_down_steps > stats.bottom_up_steps);

        let sequential = DirectionOptimizingBfs::compute_reachable_sequential(&graph);
        assert_eq!(visited.pop_count(), sequential.pop_count());
        assert_eq!(visited.pop_count(), n as usize);
    }

    #[test]
    fn test_cycle_terminates() {
        let graph = DenseGraph::from_adjacency(vec![vec![1], vec![2], vec![0]], vec![0]);
        let (visited, _) = DirectionOptimizingBfs::with_defaults().compute_reachable(&graph);
        assert_eq!(visited.pop_count(), 3);
    }

    #[test]
    fn test_popcount_matches_set_size() {
        let graph = DenseGraph::from_adjacency(
            vec![vec![1, 2], vec![3], vec![3], vec![], vec![]],
            vec![0],
        );
        let (visited, _) = DirectionOptimizingBfs::with_defaults().compute_reachable(&graph);
        assert_eq!(visited.pop_count(), visited.set_bits().len());
        assert_eq!(visited.pop_count(), 4);
    }
}
