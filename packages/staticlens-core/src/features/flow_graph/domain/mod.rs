//! Control-flow graph model types.

pub mod cfg;

pub use cfg::{
    BasicBlock, CfgStatement, ControlFlowGraph, Terminator, ENTRY_BLOCK, EXIT_BLOCK,
};
