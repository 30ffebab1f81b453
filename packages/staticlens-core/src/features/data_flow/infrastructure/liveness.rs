//! Live-variable analysis (backward, may)
//!
//! Classical iterative fixed point over the CFG:
//!
//! ```text
//! liveOut[B] = ⋃ liveIn[S]  for S ∈ succ(B)
//! liveIn[B]  = use[B] ∪ (liveOut[B] \ def[B])
//! ```
//!
//! The worklist is bounded by `max_iterations`; at the cap the last stable
//! state is returned with `converged = false`. Ignored names (`_` by
//! default) are excluded throughout.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use crate::config::DataFlowConfig;
use crate::features::flow_graph::domain::ControlFlowGraph;
use crate::shared::models::{DeadStore, Location};

/// Per-block live-in/live-out sets.
#[derive(Debug, Clone, Default)]
pub struct LivenessResult {
    pub live_in: FxHashMap<String, FxHashSet<String>>,
    pub live_out: FxHashMap<String, FxHashSet<String>>,
    pub iterations: usize,
    pub converged: bool,
}

/// Backward may-analysis over live variables.
#[derive(Debug, Clone)]
pub struct LiveVariableAnalysis {
    config: DataFlowConfig,
}

impl LiveVariableAnalysis {
    pub fn new(config: DataFlowConfig) -> Self {
        Self { config }
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.config.ignored_variables.contains(name)
    }

    /// Run the fixed point to convergence (or the iteration cap).
    pub fn analyze(&self, cfg: &ControlFlowGraph) -> LivenessResult {
        let mut use_sets: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
        let mut def_sets: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();

        for block in cfg.blocks() {
            let (mut uses, mut defs) = block.use_def();
            uses.retain(|name| !self.is_ignored(name));
            defs.retain(|name| !self.is_ignored(name));
            use_sets.insert(block.id.clone(), uses);
            def_sets.insert(block.id.clone(), defs);
        }

        let mut result = LivenessResult::default();
        for id in cfg.block_ids() {
            result.live_in.insert(id.clone(), FxHashSet::default());
            result.live_out.insert(id.clone(), FxHashSet::default());
        }

        let mut worklist: VecDeque<String> = cfg.block_ids().iter().cloned().collect();
        let mut queued: FxHashSet<String> = worklist.iter().cloned().collect();

        let mut iterations = 0usize;
        let mut converged = true;
        while let Some(id) = worklist.pop_front() {
            queued.remove(&id);
            iterations += 1;
            if iterations > self.config.max_iterations {
                warn!(
                    function = cfg.function.as_str(),
                    cap = self.config.max_iterations,
                    "liveness fixed point hit the iteration cap"
                );
                converged = false;
                break;
            }

            let Some(block) = cfg.block(&id) else { continue };

            let mut live_out = FxHashSet::default();
            for successor in &block.successors {
                if let Some(successor_in) = result.live_in.get(successor) {
                    live_out.extend(successor_in.iter().cloned());
                }
            }

            let mut live_in = use_sets[&id].clone();
            for name in &live_out {
                if !def_sets[&id].contains(name) {
                    live_in.insert(name.clone());
                }
            }

            let out_changed = result.live_out.get(&id) != Some(&live_out);
            let in_changed = result.live_in.get(&id) != Some(&live_in);
            result.live_out.insert(id.clone(), live_out);
            result.live_in.insert(id.clone(), live_in);

            if in_changed || out_changed {
                for predecessor in &block.predecessors {
                    if queued.insert(predecessor.clone()) {
                        worklist.push_back(predecessor.clone());
                    }
                }
            }
        }

        result.iterations = iterations.min(self.config.max_iterations);
        result.converged = converged;
        result
    }

    /// Dead stores: a write to `x` with `x` not live immediately after the
    /// write and not also used by the same statement.
    pub fn dead_stores(&self, cfg: &ControlFlowGraph, result: &LivenessResult) -> Vec<DeadStore> {
        let mut findings = Vec::new();

        for block in cfg.blocks() {
            let Some(live_exit) = result.live_out.get(&block.id) else {
                continue;
            };
            let mut live: FxHashSet<String> = live_exit.clone();

            for statement in block.statements.iter().rev() {
                for def in &statement.defs {
                    if self.is_ignored(def) {
                        continue;
                    }
                    // Declared-without-value bindings store nothing.
                    if statement.is_uninitialized_declaration() {
                        continue;
                    }
                    // Parameters are bound by the caller, not stored here.
                    if statement.assigned_value.as_deref() == Some("<argument>") {
                        continue;
                    }
                    let used_by_same_statement = statement.uses.iter().any(|u| u == def);
                    if !live.contains(def) && !used_by_same_statement {
                        findings.push(DeadStore {
                            variable: def.clone(),
                            location: statement.location.clone(),
                            assigned_value: statement.assigned_value.clone(),
                            suggestion: format!(
                                "Value assigned to '{def}' is never read; remove the assignment"
                            ),
                        });
                    }
                }

                for def in &statement.defs {
                    live.remove(def);
                }
                for used in &statement.uses {
                    if !self.is_ignored(used) {
                        live.insert(used.clone());
                    }
                }
            }
        }

        findings.sort_by(|a, b| a.location.cmp(&b.location));
        findings
    }

    /// Variables defined somewhere and never used anywhere.
    pub fn unused_variables(&self, cfg: &ControlFlowGraph) -> Vec<(String, Location)> {
        let mut defined: FxHashMap<String, Location> = FxHashMap::default();
        let mut used: FxHashSet<String> = FxHashSet::default();

        for block in cfg.blocks() {
            for statement in &block.statements {
                for def in &statement.defs {
                    if self.is_ignored(def) {
                        continue;
                    }
                    // Unused parameters are the reachability engine's call.
                    if statement.assigned_value.as_deref() == Some("<argument>") {
                        continue;
                    }
                    defined
                        .entry(def.clone())
                        .or_insert_with(|| statement.location.clone());
                }
                used.extend(statement.uses.iter().cloned());
            }
        }

        let mut unused: Vec<(String, Location)> = defined
            .into_iter()
            .filter(|(name, _)| !used.contains(name))
            .collect();
        unused.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        unused
    }
}
