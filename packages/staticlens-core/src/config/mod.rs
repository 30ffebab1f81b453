//! Analysis configuration
//!
//! All engine knobs gathered into serde-friendly structs with defaults and
//! a `validate()` pass. Out-of-range BFS tuning values are clamped at use
//! time rather than rejected, matching the traversal contract.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Logical CPU count, detected once per process.
static DETECTED_CPUS: Lazy<usize> = Lazy::new(num_cpus::get);

/// Clone-detection knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    /// Shingle window width in tokens
    pub shingle_size: usize,
    /// MinHash signature dimension
    pub num_hashes: usize,
    /// Jaccard threshold used to derive the LSH banding
    pub minimum_similarity: f64,
    /// Multi-probe aggressiveness; 0 disables multi-probe
    pub probes_per_band: usize,
    /// Compute exact Jaccard before emitting clone pairs
    pub verify_with_exact: bool,
    /// Clone block size in tokens
    pub minimum_tokens: usize,
    /// Deterministic MinHash seed
    pub seed: u64,
    /// Rewrite identifier/literal spellings to positional placeholders
    pub normalize_identifiers: bool,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            shingle_size: 5,
            num_hashes: 128,
            minimum_similarity: 0.8,
            probes_per_band: 0,
            verify_with_exact: true,
            minimum_tokens: 50,
            seed: 42,
            normalize_identifiers: true,
        }
    }
}

impl CloneConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.shingle_size == 0 {
            return Err("shingle_size must be at least 1".to_string());
        }
        if self.num_hashes == 0 {
            return Err("num_hashes must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.minimum_similarity) {
            return Err(format!(
                "minimum_similarity must lie in [0, 1], got {}",
                self.minimum_similarity
            ));
        }
        if self.minimum_tokens < self.shingle_size {
            return Err(format!(
                "minimum_tokens ({}) must not be smaller than shingle_size ({})",
                self.minimum_tokens, self.shingle_size
            ));
        }
        Ok(())
    }
}

/// Entry-root policy for the reachability engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootPolicy {
    pub treat_public_as_root: bool,
    pub treat_objc_as_root: bool,
    pub treat_tests_as_root: bool,
    pub treat_ui_framework_views_as_root: bool,
    pub treat_ui_framework_property_wrappers_as_root: bool,
    pub treat_preview_providers_as_root: bool,
    /// Protocol conformances that mark UI-framework entry views
    pub ui_view_conformances: Vec<String>,
    /// Protocol conformances that mark preview providers
    pub preview_conformances: Vec<String>,
    /// Property-wrapper attributes that pin declarations as roots
    pub property_wrapper_attributes: Vec<String>,
}

impl Default for RootPolicy {
    fn default() -> Self {
        Self {
            treat_public_as_root: true,
            treat_objc_as_root: false,
            treat_tests_as_root: true,
            treat_ui_framework_views_as_root: true,
            treat_ui_framework_property_wrappers_as_root: true,
            treat_preview_providers_as_root: true,
            ui_view_conformances: vec![
                "App".to_string(),
                "View".to_string(),
                "Scene".to_string(),
                "Widget".to_string(),
            ],
            preview_conformances: vec!["PreviewProvider".to_string()],
            property_wrapper_attributes: vec![
                "State".to_string(),
                "StateObject".to_string(),
                "ObservedObject".to_string(),
                "EnvironmentObject".to_string(),
                "Binding".to_string(),
                "Environment".to_string(),
            ],
        }
    }
}

/// Reachability traversal knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReachabilityConfig {
    /// Top-down → bottom-up switch factor (Beamer alpha), clamped to 1..=100
    pub alpha: u32,
    /// Bottom-up → top-down switch factor (Beamer beta), clamped to 1..=100
    pub beta: u32,
    /// Below this node count the traversal stays sequential
    pub min_parallel_size: usize,
    /// Worker cap, clamped to 1..=logical CPUs
    pub max_concurrency: usize,
    pub roots: RootPolicy,
}

impl Default for ReachabilityConfig {
    fn default() -> Self {
        Self {
            alpha: 14,
            beta: 24,
            min_parallel_size: 1000,
            max_concurrency: *DETECTED_CPUS,
            roots: RootPolicy::default(),
        }
    }
}

impl ReachabilityConfig {
    pub fn clamped_alpha(&self) -> u32 {
        self.alpha.clamp(1, 100)
    }

    pub fn clamped_beta(&self) -> u32 {
        self.beta.clamp(1, 100)
    }

    pub fn clamped_concurrency(&self) -> usize {
        self.max_concurrency.clamp(1, *DETECTED_CPUS)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_parallel_size == 0 {
            return Err("min_parallel_size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Data-flow fixed-point knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFlowConfig {
    /// Worklist iteration cap; the last stable state is returned at the cap
    pub max_iterations: usize,
    /// Names excluded from liveness and reaching-definitions
    pub ignored_variables: FxHashSet<String>,
}

impl Default for DataFlowConfig {
    fn default() -> Self {
        let mut ignored_variables = FxHashSet::default();
        ignored_variables.insert("_".to_string());
        Self {
            max_iterations: 1000,
            ignored_variables,
        }
    }
}

impl DataFlowConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub clone_detection: CloneConfig,
    pub reachability: ReachabilityConfig,
    pub data_flow: DataFlowConfig,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.clone_detection.validate()?;
        self.reachability.validate()?;
        self.data_flow.validate()?;
        Ok(())
    }
}
