//! # esolens - Damage Modifier Resolution & Accuracy Engine
//!
//! Reconstructs the modifiers behind every damage event of a combat log and
//! checks how well they explain the observed numbers:
//! - **Interval index** of buff and debuff activity with point-in-time queries
//! - **Source registries** for penetration, critical damage and damage done
//! - **Deterministic** composition (same input → same output)
//! - **Tooltip inference** with per-ability accuracy diagnostics
//!
//! ## Core Concepts
//!
//! ### Pipeline
//!
//! ```text
//! [raw records] → [IntervalIndex] → [SourceRegistry] → [ModifierResult] → [AbilityAccuracyStats] → [report]
//! ```
//!
//! 1. **Events** are normalized and folded into per-ability intervals
//! 2. **Sources** contribute to a channel when their condition holds
//! 3. **Channels** add internally and multiply with each other
//! 4. **Inference** divides each hit by its multiplier to recover the base damage
//!
//! ### Static and dynamic sources
//!
//! Sources that only read the loadout (gear, passives, slotted skills) are
//! evaluated once per player. Sources that depend on buffs and debuffs are
//! evaluated per hit. Both paths share one evaluation function, so their sum
//! equals a single-pass resolution.
//!
//! ## Example
//!
//! ```rust
//! use esolens::*;
//! use esolens::abilities::{MAJOR_BERSERK, MINOR_VULNERABILITY};
//!
//! let buffs = IntervalIndex::build(&[TimedBuffEvent::apply(0, 1, 1, MAJOR_BERSERK)], 60_000).unwrap();
//! let debuffs = IntervalIndex::build(
//!     &[TimedBuffEvent::apply(0, 1, 100, MINOR_VULNERABILITY)],
//!     60_000,
//! )
//! .unwrap();
//! let indices = FightIndices { buffs, debuffs };
//!
//! let composer = ModifierComposer::with_defaults().unwrap();
//! let hit = DamageEvent::new(5000, 1, 100, 183006, 8000.0);
//! let result = composer.compose(&hit, &indices, Loadout::empty(), 0.0);
//!
//! // (1 + 10%) × (1 + 5%)
//! assert!((result.total_multiplier - 1.155).abs() < 1e-9);
//! ```
//!
//! ## Modules
//!
//! - [`ids`] - Ability, actor and set identifiers
//! - [`abilities`] - Known ability and set ids
//! - [`event`] - Typed buff and damage events
//! - [`normalize`] - Raw log record conversion
//! - [`interval`] - Buff/debuff interval index
//! - [`snapshot`] - Gear, auras and talents of a player
//! - [`source`] - Modifier sources
//! - [`registry`] - Source registries and channel totals
//! - [`catalog`] - Default registries
//! - [`composer`] - Per-hit modifier composition
//! - [`inference`] - Tooltip inference and diagnostics
//! - [`report`] - Player and fight reports
//! - [`config`] - Tunable constants
//! - [`error`] - Error types

pub mod abilities;
pub mod catalog;
pub mod composer;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod inference;
pub mod interval;
pub mod names;
pub mod normalize;
pub mod registry;
pub mod report;
pub mod snapshot;
pub mod source;
pub mod stats;

// Re-export main types for convenience
pub use composer::{ModifierComposer, ModifierResult, PlayerResolver, Registries, TargetResistance};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use event::{BuffEventKind, DamageEvent, HitType, TimedBuffEvent};
pub use ids::{AbilityId, ActorId, SetId, Timestamp};
pub use interval::{AliasGroup, FightIndices, Interval, IntervalIndex};
pub use names::AbilityNames;

// Re-export source and registry types
pub use registry::{ActiveSource, ChannelTotals, SourceRegistry};
pub use snapshot::{ArmorWeight, CombatantSnapshot, GearPiece, Loadout, PlayerData};
pub use source::{Channel, ModifierSource, ResolveContext, SourceKind};

// Re-export analysis types
pub use inference::{AbilityAccuracyStats, TooltipInference};
pub use report::{FightAccuracyReport, FightInput, PlayerAccuracyReport, ReportBuilder};
