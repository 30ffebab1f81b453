//! Small shared utilities.

pub mod fnv;

pub use fnv::{fnv1a, Fnv1a, FNV_OFFSET, FNV_PRIME};
