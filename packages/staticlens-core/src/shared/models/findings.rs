//! Findings emitted by the two engines
//!
//! All finding types serialize with serde so the surrounding tooling can
//! report them without further conversion. The engine always produces a
//! (possibly empty) report; per-file failures travel in the `errors` map
//! rather than aborting the run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::declaration::Declaration;
use super::span::Location;

/// Clone classification reported per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneType {
    /// Token-identical blocks (similarity 1.0)
    Exact,
    /// Near-identical blocks above the similarity threshold
    Near,
    /// Reserved for semantically-normalized token streams
    Semantic,
}

impl CloneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloneType::Exact => "exact",
            CloneType::Near => "near",
            CloneType::Semantic => "semantic",
        }
    }
}

/// One cloned block inside a clone group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneInstance {
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub token_count: usize,
}

/// A transitively-grouped set of similar blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneGroup {
    pub clone_type: CloneType,
    pub clones: Vec<CloneInstance>,
    /// Average pairwise similarity of the verified pairs in the group
    pub similarity: f64,
    /// Sorted, joined document ids; stable identity for the group
    pub fingerprint: String,
}

/// Why a declaration was reported unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnusedReason {
    /// No reference to the name anywhere in the analyzed set
    NeverReferenced,
    /// Referenced somewhere, but unreachable from the entry roots
    Unreachable,
    /// A written value that can never be read
    DeadStore,
    /// A definition shadowed before any use
    ShadowedDefinition,
}

impl UnusedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnusedReason::NeverReferenced => "never_referenced",
            UnusedReason::Unreachable => "unreachable",
            UnusedReason::DeadStore => "dead_store",
            UnusedReason::ShadowedDefinition => "shadowed_definition",
        }
    }
}

/// Reporting confidence for an unused-code finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// An unused declaration finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedCode {
    pub declaration: Declaration,
    pub reason: UnusedReason,
    pub confidence: Confidence,
    pub suggestion: String,
}

/// A write whose value can never be observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadStore {
    pub variable: String,
    pub location: Location,
    pub assigned_value: Option<String>,
    pub suggestion: String,
}

/// A read with no (or not-on-all-paths) reaching definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UninitializedUse {
    pub variable: String,
    pub location: Location,
    /// True when no definition reaches the use on any path
    pub definitely_uninitialized: bool,
    /// Number of real definitions that may reach the use
    pub reaching_definition_count: usize,
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub clone_groups: Vec<CloneGroup>,
    pub unused: Vec<UnusedCode>,
    pub dead_stores: Vec<DeadStore>,
    pub uninitialized_uses: Vec<UninitializedUse>,
    /// Per-file failures keyed by path; analysis of other files continues
    pub errors: BTreeMap<String, String>,
}

impl AnalysisReport {
    pub fn is_clean(&self) -> bool {
        self.clone_groups.is_empty()
            && self.unused.is_empty()
            && self.dead_stores.is_empty()
            && self.uninitialized_uses.is_empty()
    }

    pub fn finding_count(&self) -> usize {
        self.clone_groups.len()
            + self.unused.len()
            + self.dead_stores.len()
            + self.uninitialized_uses.len()
    }
}
