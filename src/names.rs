//! Ability name lookup.

use crate::ids::AbilityId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An id → display name table for labelling per-ability statistics.
///
/// The table is built by the caller from whatever ability metadata the log
/// provides and handed to the report functions; the engine never keeps one
/// of its own.
///
/// # Examples
///
/// ```rust
/// use esolens::{AbilityId, AbilityNames};
///
/// let names: AbilityNames = [(AbilityId::new(183006), "Cephaliarch's Flail")]
///     .into_iter()
///     .collect();
///
/// assert_eq!(names.name(AbilityId::new(183006)), "Cephaliarch's Flail");
/// assert_eq!(names.name(AbilityId::new(1)), "Unknown (1)");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityNames {
    names: HashMap<AbilityId, String>,
}

impl AbilityNames {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a name.
    pub fn insert(&mut self, ability: AbilityId, name: impl Into<String>) {
        self.names.insert(ability, name.into());
    }

    /// Look up a name without a fallback.
    pub fn get(&self, ability: AbilityId) -> Option<&str> {
        self.names.get(&ability).map(String::as_str)
    }

    /// Look up a name, falling back to `Unknown (<id>)`.
    pub fn name(&self, ability: AbilityId) -> String {
        match self.get(ability) {
            Some(name) => name.to_string(),
            None => format!("Unknown ({})", ability),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(AbilityId, N)> for AbilityNames {
    fn from_iter<I: IntoIterator<Item = (AbilityId, N)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(|(id, n)| (id, n.into())).collect(),
        }
    }
}
