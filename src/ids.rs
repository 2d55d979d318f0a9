//! Identifier types.
//!
//! Provides the `AbilityId`, `ActorId` and `SetId` newtypes. Combat logs
//! identify everything with bare integers; wrapping them keeps an ability id
//! from being passed where an actor id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamps are log milliseconds.
pub type Timestamp = i64;

/// Game ability identifier (`abilityGameID` in the log).
///
/// Buffs, debuffs, auras and damaging abilities all share this id space.
///
/// # Examples
///
/// ```rust
/// use esolens::AbilityId;
///
/// let minor_berserk = AbilityId::new(61744);
/// let same: AbilityId = 61744.into();
///
/// assert_eq!(minor_berserk, same);
/// assert_eq!(minor_berserk.get(), 61744);
/// ```
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct AbilityId(u32);

impl AbilityId {
    /// Create a new `AbilityId`.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for AbilityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for AbilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Actor identifier (`sourceID` / `targetID` in the log).
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ActorId(i64);

impl ActorId {
    /// Create a new `ActorId`.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ActorId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Gear set identifier (`setID` on a gear piece).
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct SetId(u32);

impl SetId {
    /// Create a new `SetId`.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for SetId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ability_id_creation() {
        let a = AbilityId::new(61744);
        let b: AbilityId = 61744.into();
        assert_eq!(a, b);
        assert_eq!(a.get(), 61744);
    }

    #[test]
    fn test_ids_are_transparent_in_json() {
        let json = serde_json::to_string(&ActorId::new(42)).unwrap();
        assert_eq!(json, "42");

        let set: SetId = serde_json::from_str("568").unwrap();
        assert_eq!(set, SetId::new(568));
    }

    #[test]
    fn test_ability_id_ordering() {
        assert!(AbilityId::new(10) < AbilityId::new(61744));
    }
}
