//! Unused-code use case.

pub mod unused;

pub use unused::{UnusedCodeDetector, UnusedCodeOutput};
