//! Per-function control-flow graphs
//!
//! Builds an immutable CFG from the structured body syntax supplied by the
//! parser front-end: basic blocks with string ids, one terminator per
//! non-exit block, symmetric edge lists, and reverse postorder computed
//! once. Exceptional flow from `do` bodies is represented as pending edges
//! to catch blocks, applied at finalization; `defer` is over-approximated
//! by appending its body to the current block.

pub mod domain;
pub mod infrastructure;

pub use domain::{BasicBlock, CfgStatement, ControlFlowGraph, Terminator, ENTRY_BLOCK, EXIT_BLOCK};
pub use infrastructure::{expr_effects, expr_reads, render_expr, CfgBuilder};
