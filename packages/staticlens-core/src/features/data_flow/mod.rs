//! Data-Flow Analyses
//!
//! Live variables (backward, may) and reaching definitions (forward, may)
//! as monotone worklist fixed points over per-function CFGs, bounded by
//! `max_iterations`. Produces dead stores, uninitialized uses, unused
//! variables, and def-use chains.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{FlowAnalyzer, FunctionFlowFindings};
pub use domain::DefinitionSite;
pub use infrastructure::{
    DefUseChain, LiveVariableAnalysis, LivenessResult, ReachingDefinitions, ReachingResult,
};
