//! Clone Detection Engine
//!
//! Token sequences → shingled block documents → MinHash signatures →
//! LSH candidate pairs (optionally multi-probe) → exact-Jaccard
//! verification → transitive clone groups.
//!
//! Recall/precision is tunable through `CloneConfig`: the banding is
//! derived from `minimum_similarity`, multi-probe widens recall without
//! growing the index, and `verify_with_exact` trades time for precision.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{CloneDetectionOutput, CloneDetectionStats, CloneDetector};
pub use domain::{DocumentPair, Shingle, ShingledDocument, Shingler};
pub use infrastructure::{
    estimate_similarity, exact_jaccard, optimal_bands_and_rows, LshIndex, LshIndexStats,
    MinHashGenerator, MinHashSignature, MultiProbeLshIndex,
};
