//! Data-flow domain types.

pub mod definition;

pub use definition::DefinitionSite;
