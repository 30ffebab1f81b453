//! Dependency extraction and graph traversal.

pub mod bfs;
pub mod extractor;

pub use bfs::{DirectionOptimizingBfs, TraversalStats};
pub use extractor::{DependencyExtractor, ExtractedGraph};
