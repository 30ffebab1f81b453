//! Control-flow graph model
//!
//! Blocks are identified by string ids with distinguished `entry` and
//! `exit` blocks. Every non-exit block carries exactly one terminator;
//! successor/predecessor lists are kept symmetric by the builder.
//! Reverse postorder is computed once at construction.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::shared::models::Location;

/// Id of the distinguished entry block.
pub const ENTRY_BLOCK: &str = "entry";

/// Id of the distinguished exit block.
pub const EXIT_BLOCK: &str = "exit";

/// Block terminator: the single control transfer ending a basic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Terminator {
    Branch {
        target: String,
    },
    ConditionalBranch {
        condition: String,
        true_target: String,
        false_target: String,
    },
    Switch {
        subject: String,
        cases: Vec<(String, String)>,
        default_target: Option<String>,
    },
    Return {
        value: Option<String>,
    },
    Throw {
        value: String,
    },
    Fallthrough {
        target: String,
    },
    Break {
        target: Option<String>,
    },
    Continue {
        target: Option<String>,
    },
    Unreachable,
}

impl Terminator {
    /// Block ids this terminator transfers to.
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Terminator::Branch { target } | Terminator::Fallthrough { target } => {
                vec![target.as_str()]
            }
            Terminator::ConditionalBranch {
                true_target,
                false_target,
                ..
            } => vec![true_target.as_str(), false_target.as_str()],
            Terminator::Switch {
                cases,
                default_target,
                ..
            } => {
                let mut targets: Vec<&str> = cases.iter().map(|(_, t)| t.as_str()).collect();
                if let Some(default) = default_target {
                    targets.push(default.as_str());
                }
                targets
            }
            Terminator::Break { target } | Terminator::Continue { target } => {
                target.iter().map(|t| t.as_str()).collect()
            }
            Terminator::Return { .. } | Terminator::Throw { .. } | Terminator::Unreachable => {
                Vec::new()
            }
        }
    }
}

/// One statement inside a basic block, with extracted use/def sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfgStatement {
    /// Rendered statement text, used in findings
    pub text: String,
    pub location: Location,
    /// Variables read before any in-statement write
    pub uses: Vec<String>,
    /// Variables written
    pub defs: Vec<String>,
    /// Rendered right-hand side when the statement is a single store
    pub assigned_value: Option<String>,
    /// True for `var`/`let` bindings and other first definitions
    pub is_initial_binding: bool,
}

impl CfgStatement {
    pub fn new(text: impl Into<String>, location: Location) -> Self {
        Self {
            text: text.into(),
            location,
            uses: Vec::new(),
            defs: Vec::new(),
            assigned_value: None,
            is_initial_binding: false,
        }
    }

    /// True for a declared-but-uninitialized binding (`var x: Int`).
    pub fn is_uninitialized_declaration(&self) -> bool {
        self.is_initial_binding && self.assigned_value.is_none()
    }
}

/// A basic block: straight-line statements plus one terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub id: String,
    pub statements: Vec<CfgStatement>,
    pub terminator: Option<Terminator>,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
    pub is_loop_header: bool,
}

impl BasicBlock {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            statements: Vec::new(),
            terminator: None,
            predecessors: Vec::new(),
            successors: Vec::new(),
            is_loop_header: false,
        }
    }

    /// Block-level `use` (upward-exposed reads) and `def` sets, derived
    /// from the statement-level sets in order.
    pub fn use_def(&self) -> (FxHashSet<String>, FxHashSet<String>) {
        let mut uses = FxHashSet::default();
        let mut defs = FxHashSet::default();
        for statement in &self.statements {
            for used in &statement.uses {
                if !defs.contains(used) {
                    uses.insert(used.clone());
                }
            }
            for defined in &statement.defs {
                defs.insert(defined.clone());
            }
        }
        (uses, defs)
    }
}

/// An immutable per-function control-flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub function: String,
    blocks: FxHashMap<String, BasicBlock>,
    /// Block ids in creation order (stable iteration)
    order: Vec<String>,
    reverse_postorder: Vec<String>,
}

impl ControlFlowGraph {
    pub(crate) fn from_parts(
        function: String,
        blocks: FxHashMap<String, BasicBlock>,
        order: Vec<String>,
    ) -> Self {
        let reverse_postorder = compute_reverse_postorder(&blocks);
        Self {
            function,
            blocks,
            order,
            reverse_postorder,
        }
    }

    pub fn block(&self, id: &str) -> Option<&BasicBlock> {
        self.blocks.get(id)
    }

    pub fn entry(&self) -> &BasicBlock {
        &self.blocks[ENTRY_BLOCK]
    }

    pub fn exit(&self) -> &BasicBlock {
        &self.blocks[EXIT_BLOCK]
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn block_ids(&self) -> &[String] {
        &self.order
    }

    /// Blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &BasicBlock> {
        self.order.iter().map(|id| &self.blocks[id])
    }

    /// Reverse postorder over blocks reachable from `entry`, computed once.
    pub fn reverse_postorder(&self) -> &[String] {
        &self.reverse_postorder
    }

    /// Check the structural invariants; returns human-readable violations.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for block in self.blocks() {
            if block.id != EXIT_BLOCK && block.terminator.is_none() {
                issues.push(format!("block '{}' has no terminator", block.id));
            }
            if block.id == EXIT_BLOCK && block.terminator.is_some() {
                issues.push("exit block must not have a terminator".to_string());
            }
            for successor in &block.successors {
                match self.blocks.get(successor) {
                    Some(target) => {
                        if !target.predecessors.contains(&block.id) {
                            issues.push(format!(
                                "edge {} -> {} missing reverse predecessor entry",
                                block.id, successor
                            ));
                        }
                    }
                    None => issues.push(format!(
                        "block '{}' references unknown successor '{}'",
                        block.id, successor
                    )),
                }
            }
            if let Some(terminator) = &block.terminator {
                for target in terminator.targets() {
                    if !block.successors.iter().any(|s| s == target) {
                        issues.push(format!(
                            "terminator target '{}' of block '{}' missing from successors",
                            target, block.id
                        ));
                    }
                }
            }
        }

        if !self.entry().predecessors.is_empty() {
            issues.push("entry block must have no predecessors".to_string());
        }
        if !self.exit().successors.is_empty() {
            issues.push("exit block must have no successors".to_string());
        }

        issues
    }
}

/// Depth-first postorder from `entry`, reversed.
fn compute_reverse_postorder(blocks: &FxHashMap<String, BasicBlock>) -> Vec<String> {
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut postorder: Vec<String> = Vec::with_capacity(blocks.len());

    // Iterative DFS; the explicit stack carries a successor cursor.
    let mut stack: Vec<(&str, usize)> = Vec::new();
    if blocks.contains_key(ENTRY_BLOCK) {
        visited.insert(ENTRY_BLOCK);
        stack.push((ENTRY_BLOCK, 0));
    }

    while let Some((id, cursor)) = stack.pop() {
        let block = &blocks[id];
        if cursor < block.successors.len() {
            stack.push((id, cursor + 1));
            let successor = block.successors[cursor].as_str();
            if visited.insert(successor) {
                stack.push((successor, 0));
            }
        } else {
            postorder.push(id.to_string());
        }
    }

    postorder.reverse();
    postorder
}
