//! Definition sites tracked by reaching-definitions analysis.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::shared::models::Location;

/// One write to a variable at a specific statement.
///
/// Identity is the `(variable, block, statement_index, location,
/// is_initial)` 5-tuple; the rendered `value` is carried for reporting but
/// excluded from equality and hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionSite {
    pub variable: String,
    pub block: String,
    pub statement_index: usize,
    pub location: Location,
    pub value: Option<String>,
    pub is_initial: bool,
}

impl DefinitionSite {
    /// True for a declared-but-unassigned binding: the pseudo-definition
    /// that marks "no value yet" paths.
    pub fn is_uninitialized_marker(&self) -> bool {
        self.is_initial && self.value.is_none()
    }
}

impl PartialEq for DefinitionSite {
    fn eq(&self, other: &Self) -> bool {
        self.variable == other.variable
            && self.block == other.block
            && self.statement_index == other.statement_index
            && self.location == other.location
            && self.is_initial == other.is_initial
    }
}

impl Eq for DefinitionSite {}

impl Hash for DefinitionSite {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variable.hash(state);
        self.block.hash(state);
        self.statement_index.hash(state);
        self.location.hash(state);
        self.is_initial.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    fn site(value: Option<&str>) -> DefinitionSite {
        DefinitionSite {
            variable: "x".to_string(),
            block: "entry".to_string(),
            statement_index: 0,
            location: Location::new("f.swift", 2, 0),
            value: value.map(str::to_string),
            is_initial: true,
        }
    }

    #[test]
    fn test_value_excluded_from_identity() {
        let with_value = site(Some("1"));
        let without_value = site(None);
        assert_eq!(with_value, without_value);

        let mut set = FxHashSet::default();
        set.insert(with_value);
        set.insert(without_value);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_uninitialized_marker() {
        assert!(site(None).is_uninitialized_marker());
        assert!(!site(Some("1")).is_uninitialized_marker());
    }
}
