//! Declaration reachability graph
//!
//! Nodes are declarations interned by their `(file, line, name)` triple
//! into dense integer ids; edges live in flat adjacency vectors rather
//! than ownership-by-reference, so cyclic graphs cost nothing special.
//! The builder is single-writer: parallel extractors produce edge batches
//! that are merged in one synchronized insertion step, then the graph is
//! frozen into its dense query form.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::shared::models::DependencyKind;

/// Interning identity of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub file: String,
    pub line: u32,
    pub name: String,
}

/// One dependency edge between interned declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub from: u32,
    pub to: u32,
    pub kind: DependencyKind,
}

/// Mutable build-phase graph. Append-only, single-threaded.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    ids: FxHashMap<NodeKey, u32>,
    keys: Vec<NodeKey>,
    edges: Vec<DependencyEdge>,
    roots: FxHashSet<u32>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a `(file, line, name)` triple, returning its dense id.
    pub fn intern(&mut self, file: &str, line: u32, name: &str) -> u32 {
        let key = NodeKey {
            file: file.to_string(),
            line,
            name: name.to_string(),
        };
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.keys.len() as u32;
        self.ids.insert(key.clone(), id);
        self.keys.push(key);
        id
    }

    pub fn node_count(&self) -> usize {
        self.keys.len()
    }

    pub fn key(&self, id: u32) -> Option<&NodeKey> {
        self.keys.get(id as usize)
    }

    pub fn add_root(&mut self, id: u32) {
        if (id as usize) < self.keys.len() {
            self.roots.insert(id);
        }
    }

    /// Merge a batch of edges produced by the parallel extractors.
    ///
    /// This is the single synchronized insertion step; edges referencing
    /// unknown nodes are dropped.
    pub fn insert_edges(&mut self, batch: impl IntoIterator<Item = DependencyEdge>) {
        let node_count = self.keys.len() as u32;
        self.edges.extend(
            batch
                .into_iter()
                .filter(|edge| edge.from < node_count && edge.to < node_count),
        );
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Freeze into the dense query form. The builder stays usable; the
    /// frozen graph is immutable and safe to share across worker threads.
    pub fn freeze(&self) -> DenseGraph {
        let node_count = self.keys.len();
        let mut adjacency: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        let mut reverse_adjacency: Vec<Vec<u32>> = vec![Vec::new(); node_count];

        for edge in &self.edges {
            adjacency[edge.from as usize].push(edge.to);
            reverse_adjacency[edge.to as usize].push(edge.from);
        }
        for list in adjacency.iter_mut().chain(reverse_adjacency.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }

        let mut roots: Vec<u32> = self.roots.iter().copied().collect();
        roots.sort_unstable();

        DenseGraph {
            node_count,
            adjacency,
            reverse_adjacency,
            roots,
        }
    }
}

/// Frozen dense graph: sorted adjacency vectors plus the root set.
///
/// Reachability ignores edge kinds, so the dense form stores none.
#[derive(Debug, Clone, Default)]
pub struct DenseGraph {
    node_count: usize,
    adjacency: Vec<Vec<u32>>,
    reverse_adjacency: Vec<Vec<u32>>,
    roots: Vec<u32>,
}

impl DenseGraph {
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn adjacency(&self, node: u32) -> &[u32] {
        &self.adjacency[node as usize]
    }

    pub fn reverse_adjacency(&self, node: u32) -> &[u32] {
        &self.reverse_adjacency[node as usize]
    }

    pub fn roots(&self) -> &[u32] {
        &self.roots
    }

    pub fn out_degree(&self, node: u32) -> usize {
        self.adjacency[node as usize].len()
    }

    pub fn total_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    /// Test-support constructor from explicit adjacency lists.
    pub fn from_adjacency(adjacency: Vec<Vec<u32>>, roots: Vec<u32>) -> Self {
        let node_count = adjacency.len();
        let mut reverse_adjacency: Vec<Vec<u32>> = vec![Vec::new(); node_count];
        for (from, targets) in adjacency.iter().enumerate() {
            for &to in targets {
                reverse_adjacency[to as usize].push(from as u32);
            }
        }
        let mut adjacency = adjacency;
        for list in adjacency.iter_mut().chain(reverse_adjacency.iter_mut()) {
            list.sort_unstable();
            list.dedup();
        }
        let mut roots = roots;
        roots.sort_unstable();
        roots.dedup();
        Self {
            node_count,
            adjacency,
            reverse_adjacency,
            roots,
        }
    }
}
