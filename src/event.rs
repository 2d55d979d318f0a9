//! Typed combat events.
//!
//! These are the engine's inputs after normalization. See
//! [`normalize`](crate::normalize) for the conversion from raw log records.

use crate::ids::{AbilityId, ActorId, Timestamp};
use serde::{Deserialize, Serialize};

/// What a buff or debuff event does to its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuffEventKind {
    /// The effect lands on the target.
    Apply,
    /// The effect gains a stack or is refreshed.
    ApplyStack,
    /// The effect falls off.
    Remove,
}

/// A buff or debuff event, used to build an [`IntervalIndex`](crate::IntervalIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedBuffEvent {
    pub timestamp: Timestamp,
    pub kind: BuffEventKind,
    pub source: ActorId,
    pub target: ActorId,
    pub ability: AbilityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacks: Option<u32>,
}

impl TimedBuffEvent {
    /// Create an event without a stack count.
    pub fn new(
        timestamp: Timestamp,
        kind: BuffEventKind,
        source: ActorId,
        target: ActorId,
        ability: AbilityId,
    ) -> Self {
        Self {
            timestamp,
            kind,
            source,
            target,
            ability,
            stacks: None,
        }
    }

    /// Shorthand for an `Apply` event.
    pub fn apply(
        timestamp: Timestamp,
        source: impl Into<ActorId>,
        target: impl Into<ActorId>,
        ability: impl Into<AbilityId>,
    ) -> Self {
        Self::new(
            timestamp,
            BuffEventKind::Apply,
            source.into(),
            target.into(),
            ability.into(),
        )
    }

    /// Shorthand for an `ApplyStack` event.
    pub fn apply_stack(
        timestamp: Timestamp,
        source: impl Into<ActorId>,
        target: impl Into<ActorId>,
        ability: impl Into<AbilityId>,
    ) -> Self {
        Self::new(
            timestamp,
            BuffEventKind::ApplyStack,
            source.into(),
            target.into(),
            ability.into(),
        )
    }

    /// Shorthand for a `Remove` event.
    pub fn remove(
        timestamp: Timestamp,
        source: impl Into<ActorId>,
        target: impl Into<ActorId>,
        ability: impl Into<AbilityId>,
    ) -> Self {
        Self::new(
            timestamp,
            BuffEventKind::Remove,
            source.into(),
            target.into(),
            ability.into(),
        )
    }
}

/// Whether a hit was critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitType {
    #[default]
    Normal,
    Critical,
}

/// A damage event as reported by the log.
///
/// Only the final `amount` is observed; everything that produced it has to be
/// reconstructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub timestamp: Timestamp,
    pub source: ActorId,
    pub target: ActorId,
    pub ability: AbilityId,
    pub amount: f64,
    pub hit_type: HitType,
    /// Periodic damage. Ticks never benefit from Empower.
    #[serde(default)]
    pub tick: bool,
    #[serde(default = "default_true")]
    pub source_is_friendly: bool,
    #[serde(default)]
    pub target_is_friendly: bool,
    /// Buff ids the log recorded as active on the attacker, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffs: Option<Vec<AbilityId>>,
}

fn default_true() -> bool {
    true
}

impl DamageEvent {
    /// A friendly, direct, normal hit from `source` on `target`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use esolens::{DamageEvent, HitType};
    ///
    /// let hit = DamageEvent::new(1000, 1, 100, 183006, 5000.0).critical();
    ///
    /// assert_eq!(hit.hit_type, HitType::Critical);
    /// assert!(hit.is_direct());
    /// assert!(hit.is_friendly_to_hostile());
    /// ```
    pub fn new(
        timestamp: Timestamp,
        source: impl Into<ActorId>,
        target: impl Into<ActorId>,
        ability: impl Into<AbilityId>,
        amount: f64,
    ) -> Self {
        Self {
            timestamp,
            source: source.into(),
            target: target.into(),
            ability: ability.into(),
            amount,
            hit_type: HitType::Normal,
            tick: false,
            source_is_friendly: true,
            target_is_friendly: false,
            buffs: None,
        }
    }

    /// Mark the hit as critical.
    pub fn critical(mut self) -> Self {
        self.hit_type = HitType::Critical;
        self
    }

    /// Mark the hit as a periodic tick.
    pub fn ticking(mut self) -> Self {
        self.tick = true;
        self
    }

    /// Set the friendliness of both sides.
    pub fn with_sides(mut self, source_is_friendly: bool, target_is_friendly: bool) -> Self {
        self.source_is_friendly = source_is_friendly;
        self.target_is_friendly = target_is_friendly;
        self
    }

    /// Attach the attacker's buff snapshot.
    pub fn with_buffs(mut self, buffs: Vec<AbilityId>) -> Self {
        self.buffs = Some(buffs);
        self
    }

    pub fn is_critical(&self) -> bool {
        self.hit_type == HitType::Critical
    }

    /// Direct damage, i.e. not a periodic tick.
    pub fn is_direct(&self) -> bool {
        !self.tick
    }

    /// A player hitting an enemy.
    pub fn is_friendly_to_hostile(&self) -> bool {
        self.source_is_friendly && !self.target_is_friendly
    }
}
