//! Data-flow use case.

pub mod analyzer;

pub use analyzer::{FlowAnalyzer, FunctionFlowFindings};
