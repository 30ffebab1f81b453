//! Clone-detection use case.

pub mod pipeline;

pub use pipeline::{CloneDetectionOutput, CloneDetectionStats, CloneDetector};
