//! Unused-Code Reachability Engine
//!
//! Declarations and references become a dense, bitmap-indexed dependency
//! graph; a direction-optimizing (Beamer-style) parallel BFS computes the
//! set reachable from the entry roots, and everything unreached is
//! classified as unused. Edge kinds exist for classification only; the
//! traversal ignores them.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{UnusedCodeDetector, UnusedCodeOutput};
pub use domain::{DenseGraph, DependencyEdge, GraphBuilder, NodeKey};
pub use infrastructure::{
    DependencyExtractor, DirectionOptimizingBfs, ExtractedGraph, TraversalStats,
};
