//! Reaching-definitions analysis (forward, may)
//!
//! ```text
//! reachIn[B]  = ⋃ reachOut[P]  for P ∈ pred(B)
//! reachOut[B] = gen[B] ∪ (reachIn[B] \ kill[B])
//! ```
//!
//! Within a block a later definition of a name kills earlier ones, so
//! `gen[B]` holds the last definition per name; `kill[B]` holds every
//! other definition of the names defined in `B`. Iteration runs in
//! reverse postorder and is bounded by `max_iterations`.
//!
//! Declared-but-unassigned bindings (`var x: Int`) generate an
//! *uninitialized marker* definition: a use reached only by markers is
//! definitely uninitialized; one reached by markers and real definitions
//! is uninitialized on some path.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::warn;

use crate::config::DataFlowConfig;
use crate::features::data_flow::domain::DefinitionSite;
use crate::features::flow_graph::domain::ControlFlowGraph;
use crate::shared::models::{Location, UninitializedUse};

/// Per-block reaching-definition sets.
#[derive(Debug, Clone, Default)]
pub struct ReachingResult {
    pub reach_in: FxHashMap<String, FxHashSet<DefinitionSite>>,
    pub reach_out: FxHashMap<String, FxHashSet<DefinitionSite>>,
    pub gen: FxHashMap<String, FxHashSet<DefinitionSite>>,
    pub kill: FxHashMap<String, FxHashSet<DefinitionSite>>,
    pub iterations: usize,
    pub converged: bool,
}

/// One use site together with the definitions that may reach it.
#[derive(Debug, Clone, PartialEq)]
pub struct DefUseChain {
    pub variable: String,
    pub use_block: String,
    pub use_statement_index: usize,
    pub use_location: Location,
    /// Real (non-marker) definitions reaching the use
    pub definitions: Vec<DefinitionSite>,
}

/// Forward may-analysis over definition sites.
#[derive(Debug, Clone)]
pub struct ReachingDefinitions {
    config: DataFlowConfig,
}

impl ReachingDefinitions {
    pub fn new(config: DataFlowConfig) -> Self {
        Self { config }
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.config.ignored_variables.contains(name)
    }

    /// Definition sites created by each block, in statement order.
    fn block_definitions(&self, cfg: &ControlFlowGraph) -> FxHashMap<String, Vec<DefinitionSite>> {
        let mut by_block = FxHashMap::default();
        for block in cfg.blocks() {
            let mut sites = Vec::new();
            for (index, statement) in block.statements.iter().enumerate() {
                for def in &statement.defs {
                    if self.is_ignored(def) {
                        continue;
                    }
                    sites.push(DefinitionSite {
                        variable: def.clone(),
                        block: block.id.clone(),
                        statement_index: index,
                        location: statement.location.clone(),
                        value: statement.assigned_value.clone(),
                        is_initial: statement.is_initial_binding,
                    });
                }
            }
            by_block.insert(block.id.clone(), sites);
        }
        by_block
    }

    /// Run the fixed point to convergence (or the iteration cap).
    pub fn analyze(&self, cfg: &ControlFlowGraph) -> ReachingResult {
        let definitions = self.block_definitions(cfg);

        // All definitions per variable, for kill-set construction.
        let mut all_by_variable: FxHashMap<String, FxHashSet<DefinitionSite>> =
            FxHashMap::default();
        for sites in definitions.values() {
            for site in sites {
                all_by_variable
                    .entry(site.variable.clone())
                    .or_default()
                    .insert(site.clone());
            }
        }

        let mut result = ReachingResult::default();
        for block in cfg.blocks() {
            // Later definitions of a name kill earlier in-block ones.
            let mut last_per_variable: FxHashMap<&str, &DefinitionSite> = FxHashMap::default();
            for site in &definitions[&block.id] {
                last_per_variable.insert(site.variable.as_str(), site);
            }
            let gen: FxHashSet<DefinitionSite> =
                last_per_variable.values().map(|site| (*site).clone()).collect();

            let mut kill = FxHashSet::default();
            for variable in last_per_variable.keys() {
                if let Some(sites) = all_by_variable.get(*variable) {
                    for site in sites {
                        if !gen.contains(site) {
                            kill.insert(site.clone());
                        }
                    }
                }
            }

            result.reach_in.insert(block.id.clone(), FxHashSet::default());
            result.reach_out.insert(block.id.clone(), gen.clone());
            result.gen.insert(block.id.clone(), gen);
            result.kill.insert(block.id.clone(), kill);
        }

        // Reverse postorder seeds the worklist; unreachable blocks follow
        // so every block still reaches a fixed point.
        let mut seed: Vec<String> = cfg.reverse_postorder().to_vec();
        for id in cfg.block_ids() {
            if !seed.iter().any(|s| s == id) {
                seed.push(id.clone());
            }
        }
        let mut worklist: VecDeque<String> = seed.into();
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
                    "reaching-definitions fixed point hit the iteration cap"
                );
                converged = false;
                break;
            }

            let Some(block) = cfg.block(&id) else { continue };

            let mut reach_in = FxHashSet::default();
            for predecessor in &block.predecessors {
                if let Some(predecessor_out) = result.reach_out.get(predecessor) {
                    reach_in.extend(predecessor_out.iter().cloned());
                }
            }

            let mut reach_out = result.gen[&id].clone();
            for site in &reach_in {
                if !result.kill[&id].contains(site) {
                    reach_out.insert(site.clone());
                }
            }

            let in_changed = result.reach_in.get(&id) != Some(&reach_in);
            let out_changed = result.reach_out.get(&id) != Some(&reach_out);
            result.reach_in.insert(id.clone(), reach_in);
            result.reach_out.insert(id.clone(), reach_out);

            if in_changed || out_changed {
                for successor in &block.successors {
                    if queued.insert(successor.clone()) {
                        worklist.push_back(successor.clone());
                    }
                }
            }
        }

        result.iterations = iterations.min(self.config.max_iterations);
        result.converged = converged;
        result
    }

    /// Uses with no real reaching definition.
    pub fn uninitialized_uses(
        &self,
        cfg: &ControlFlowGraph,
        result: &ReachingResult,
    ) -> Vec<UninitializedUse> {
        let mut findings = Vec::new();

        for block in cfg.blocks() {
            let Some(reach_entry) = result.reach_in.get(&block.id) else {
                continue;
            };
            let mut current: FxHashSet<DefinitionSite> = reach_entry.clone();

            for (index, statement) in block.statements.iter().enumerate() {
                for used in &statement.uses {
                    if self.is_ignored(used) {
                        continue;
                    }
                    let mut real = 0usize;
                    let mut markers = 0usize;
                    for site in current.iter().filter(|site| &site.variable == used) {
                        if site.is_uninitialized_marker() {
                            markers += 1;
                        } else {
                            real += 1;
                        }
                    }
                    // A name with no definition sites at all is not a local
                    // variable of this function.
                    if markers > 0 {
                        findings.push(UninitializedUse {
                            variable: used.clone(),
                            location: statement.location.clone(),
                            definitely_uninitialized: real == 0,
                            reaching_definition_count: real,
                        });
                    }
                }

                for def in &statement.defs {
                    if self.is_ignored(def) {
                        continue;
                    }
                    current.retain(|site| &site.variable != def);
                    current.insert(DefinitionSite {
                        variable: def.clone(),
                        block: block.id.clone(),
                        statement_index: index,
                        location: statement.location.clone(),
                        value: statement.assigned_value.clone(),
                        is_initial: statement.is_initial_binding,
                    });
                }
            }
        }

        findings.sort_by(|a, b| a.location.cmp(&b.location).then_with(|| a.variable.cmp(&b.variable)));
        findings
    }

    /// Def-use chains: for every statement use, the set of real reaching
    /// definitions at that point.
    pub fn def_use_chains(
        &self,
        cfg: &ControlFlowGraph,
        result: &ReachingResult,
    ) -> Vec<DefUseChain> {
        let mut chains = Vec::new();

        for block in cfg.blocks() {
            let Some(reach_entry) = result.reach_in.get(&block.id) else {
                continue;
            };
            let mut current: FxHashSet<DefinitionSite> = reach_entry.clone();

            for (index, statement) in block.statements.iter().enumerate() {
                for used in &statement.uses {
                    if self.is_ignored(used) {
                        continue;
                    }
                    let mut definitions: Vec<DefinitionSite> = current
                        .iter()
                        .filter(|site| &site.variable == used && !site.is_uninitialized_marker())
                        .cloned()
                        .collect();
                    if definitions.is_empty() {
                        continue;
                    }
                    definitions.sort_by(|a, b| {
                        a.location.cmp(&b.location).then_with(|| a.block.cmp(&b.block))
                    });
                    chains.push(DefUseChain {
                        variable: used.clone(),
                        use_block: block.id.clone(),
                        use_statement_index: index,
                        use_location: statement.location.clone(),
                        definitions,
                    });
                }

                for def in &statement.defs {
                    if self.is_ignored(def) {
                        continue;
                    }
                    current.retain(|site| &site.variable != def);
                    current.insert(DefinitionSite {
                        variable: def.clone(),
                        block: block.id.clone(),
                        statement_index: index,
                        location: statement.location.clone(),
                        value: statement.assigned_value.clone(),
                        is_initial: statement.is_initial_binding,
                    });
                }
            }
        }

        chains
    }
}
