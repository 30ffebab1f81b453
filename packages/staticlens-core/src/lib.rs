/*
 * staticlens-core - Static analysis engines for class/struct/protocol languages
 *
 * Feature-first layout:
 * - shared/      : models, parsing ports, memory substrate, hashing
 * - features/    : vertical slices (clone_detection, flow_graph, data_flow,
 *                  reachability, cache)
 * - application/ : engine facade composing the slices
 * - config/      : all engine knobs
 *
 * Two engines share the crate:
 * - Clone detection: tokens → shingles → MinHash → (multi-probe) LSH →
 *   exact-Jaccard verification → transitive clone groups
 * - Unused code: per-function CFGs + data-flow analyses, plus a dense
 *   dependency graph traversed by a direction-optimizing parallel BFS
 */

pub mod application;
pub mod config;
pub mod features;
pub mod shared;

pub use application::AnalysisEngine;
pub use config::{AnalysisConfig, CloneConfig, DataFlowConfig, ReachabilityConfig, RootPolicy};
pub use features::cache::{CacheData, FileState, IncrementalCache};
pub use features::clone_detection::{CloneDetectionOutput, CloneDetector};
pub use features::data_flow::{FlowAnalyzer, FunctionFlowFindings};
pub use features::flow_graph::CfgBuilder;
pub use features::reachability::{UnusedCodeDetector, UnusedCodeOutput};
pub use shared::models::{
    AnalysisReport, CloneGroup, CoreError, CoreResult, DeadStore, Declaration, Reference,
    TokenSequence, UninitializedUse, UnusedCode,
};
pub use shared::ports::{ParsedFile, SourceParser};
