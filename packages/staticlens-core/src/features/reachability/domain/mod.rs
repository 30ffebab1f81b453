//! Reachability graph model.

pub mod graph;

pub use graph::{DenseGraph, DependencyEdge, GraphBuilder, NodeKey};
