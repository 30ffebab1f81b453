//! Iterative data-flow analyses.

pub mod liveness;
pub mod reaching;

pub use liveness::{LiveVariableAnalysis, LivenessResult};
pub use reaching::{DefUseChain, ReachingDefinitions, ReachingResult};
