//! CFG construction and use/def extraction.

pub mod builder;
pub mod use_def;

pub use builder::CfgBuilder;
pub use use_def::{expr_effects, expr_reads, render_expr, ExprEffects};
