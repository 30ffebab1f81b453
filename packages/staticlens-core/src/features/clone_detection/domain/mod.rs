//! Clone-detection domain types.

pub mod document;
pub mod pair;
pub mod shingle;

pub use document::ShingledDocument;
pub use pair::DocumentPair;
pub use shingle::{Shingle, Shingler};
