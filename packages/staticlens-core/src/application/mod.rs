//! Engine facade.

pub mod engine;

pub use engine::AnalysisEngine;
