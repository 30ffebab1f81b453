//! Locality-sensitive hashing layers.

pub mod index;
pub mod multi_probe;

pub use index::{optimal_bands_and_rows, LshIndex, LshIndexStats};
pub use multi_probe::{perturbation_vectors, MultiProbeLshIndex, PerturbationVector};
