//! Clone-detection infrastructure: MinHash and LSH.

pub mod lsh;
pub mod minhash;

pub use lsh::{optimal_bands_and_rows, LshIndex, LshIndexStats, MultiProbeLshIndex};
pub use minhash::{estimate_similarity, exact_jaccard, MinHashGenerator, MinHashSignature};
