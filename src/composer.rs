//! Modifier composition.
//!
//! Turns the three registries' channel totals and a target resistance into
//! the multiplier the game applied to one hit:
//!
//! ```text
//! penetration       = min(Σ penetration, cap)
//! resistance        = min(max(0, target resistance − penetration), max resistance)
//! reduction %       = min(max reduction, resistance / divisor)
//! crit bonus %      = base + Σ critical damage          (critical hits only)
//! damage done       = (1 + Σ done%) × (1 + Σ taken%) × (1 + empower%)   (empower on direct hits only)
//! total             = damage done × (1 − reduction%) × (1 + crit bonus%)
//! ```
//!
//! Within a channel contributions add; channels multiply.

use crate::abilities::KNOWN_DAMAGE_BUFFS;
use crate::catalog;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::event::DamageEvent;
use crate::ids::{AbilityId, ActorId};
use crate::interval::{FightIndices, IntervalIndex};
use crate::registry::{ActiveSource, ChannelTotals, PreparedRegistry, SourceRegistry};
use crate::snapshot::Loadout;
use crate::source::{Channel, ResolveContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The three source families the composer reads.
#[derive(Debug, Clone)]
pub struct Registries {
    pub penetration: SourceRegistry,
    pub critical_damage: SourceRegistry,
    pub damage: SourceRegistry,
}

impl Registries {
    /// The default catalog.
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            penetration: catalog::penetration_registry()?,
            critical_damage: catalog::critical_damage_registry()?,
            damage: catalog::damage_registry()?,
        })
    }
}

/// Resistance per target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetResistance {
    pub default: f64,
    #[serde(default)]
    pub overrides: BTreeMap<ActorId, f64>,
}

impl TargetResistance {
    /// The same resistance for every target.
    pub fn uniform(default: f64) -> Self {
        Self {
            default,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_override(mut self, target: impl Into<ActorId>, resistance: f64) -> Self {
        self.overrides.insert(target.into(), resistance);
        self
    }

    pub fn for_target(&self, target: ActorId) -> f64 {
        self.overrides.get(&target).copied().unwrap_or(self.default)
    }
}

impl Default for TargetResistance {
    fn default() -> Self {
        Self::uniform(EngineConfig::default().default_target_resistance)
    }
}

/// The damage done, damage taken and Empower part of a hit's multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageDoneBreakdown {
    pub damage_done_percent: f64,
    pub damage_taken_percent: f64,
    /// Zero for periodic ticks.
    pub empower_percent: f64,
    pub multiplier: f64,
}

impl DamageDoneBreakdown {
    fn from_totals(totals: &ChannelTotals, direct: bool) -> Self {
        let empower_percent = if direct { totals.empower } else { 0.0 };
        let multiplier = (1.0 + totals.damage_done / 100.0)
            * (1.0 + totals.damage_taken / 100.0)
            * (1.0 + empower_percent / 100.0);
        Self {
            damage_done_percent: totals.damage_done,
            damage_taken_percent: totals.damage_taken,
            empower_percent,
            multiplier,
        }
    }
}

/// Comparison of a hit's logged buff snapshot with the interval index.
///
/// Informational only; it never changes the multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuffReconciliation {
    /// Buff ids the log recorded on the attacker.
    pub snapshot_ids: Vec<AbilityId>,
    /// Known damage buffs both recorded and detected.
    pub matched: usize,
    /// Known damage buffs recorded but not detected.
    pub missing_from_index: Vec<AbilityId>,
    /// Known damage buffs detected but not recorded.
    pub extra_in_index: Vec<AbilityId>,
}

/// Reconcile a hit's buff snapshot against `buffs` for the ids in `known`.
///
/// Returns `None` when the event carries no snapshot.
pub fn reconcile_buffs(
    event: &DamageEvent,
    buffs: &IntervalIndex,
    known: &[AbilityId],
) -> Option<BuffReconciliation> {
    let snapshot = event.buffs.as_ref()?;
    let mut matched = 0;
    let mut missing_from_index = Vec::new();
    let mut extra_in_index = Vec::new();

    for &id in known {
        let recorded = snapshot.contains(&id);
        let detected = buffs.is_active_at(id, event.timestamp, Some(event.source));
        match (recorded, detected) {
            (true, true) => matched += 1,
            (true, false) => missing_from_index.push(id),
            (false, true) => extra_in_index.push(id),
            (false, false) => {}
        }
    }

    Some(BuffReconciliation {
        snapshot_ids: snapshot.clone(),
        matched,
        missing_from_index,
        extra_in_index,
    })
}

/// Every modifier that shaped one hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierResult {
    /// Penetration after the cap.
    pub penetration: f64,
    pub effective_resistance: f64,
    pub damage_reduction_percent: f64,
    pub is_critical: bool,
    /// Total critical damage in percent, zero for normal hits.
    pub crit_damage_bonus: f64,
    pub crit_multiplier: f64,
    pub damage_done: DamageDoneBreakdown,
    pub total_multiplier: f64,
    /// Sources that affected this hit.
    pub active_sources: Vec<ActiveSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buff_reconciliation: Option<BuffReconciliation>,
}

impl ModifierResult {
    /// The damage-done multiplier.
    pub fn damage_done_multiplier(&self) -> f64 {
        self.damage_done.multiplier
    }
}

/// Effective resistance and damage reduction percent for a hit.
///
/// # Examples
///
/// ```rust
/// use esolens::{composer::damage_reduction, EngineConfig};
///
/// let config = EngineConfig::default();
/// let (resistance, reduction) = damage_reduction(&config, 18200.0, 0.0);
///
/// assert_eq!(resistance, 18200.0);
/// assert!((reduction - 27.5757).abs() < 1e-3);
/// assert_eq!(damage_reduction(&config, 100_000.0, 0.0).1, 50.0);
/// ```
pub fn damage_reduction(config: &EngineConfig, target_resistance: f64, penetration: f64) -> (f64, f64) {
    let effective = (target_resistance - penetration)
        .max(0.0)
        .min(config.max_resistance);
    let reduction = (effective / config.resistance_divisor).min(config.max_damage_reduction_percent);
    (effective, reduction)
}

fn finish(
    config: &EngineConfig,
    event: &DamageEvent,
    totals: ChannelTotals,
    mut active_sources: Vec<ActiveSource>,
    resistance: f64,
    buff_reconciliation: Option<BuffReconciliation>,
) -> ModifierResult {
    let penetration = totals.penetration.min(config.penetration_cap);
    let (effective_resistance, damage_reduction_percent) =
        damage_reduction(config, resistance, penetration);

    let is_critical = event.is_critical();
    let crit_damage_bonus = if is_critical {
        config.base_critical_damage + totals.critical_damage
    } else {
        0.0
    };
    let crit_multiplier = 1.0 + crit_damage_bonus / 100.0;

    let damage_done = DamageDoneBreakdown::from_totals(&totals, event.is_direct());
    let total_multiplier =
        damage_done.multiplier * (1.0 - damage_reduction_percent / 100.0) * crit_multiplier;

    active_sources.retain(|s| match s.channel {
        Channel::CriticalDamage => is_critical,
        Channel::Empower => event.is_direct(),
        _ => true,
    });

    ModifierResult {
        penetration,
        effective_resistance,
        damage_reduction_percent,
        is_critical,
        crit_damage_bonus,
        crit_multiplier,
        damage_done,
        total_multiplier,
        active_sources,
        buff_reconciliation,
    }
}

/// Combines registries and configuration into per-hit modifiers.
///
/// # Examples
///
/// ```rust
/// use esolens::{DamageEvent, FightIndices, Loadout, ModifierComposer};
///
/// let composer = ModifierComposer::with_defaults().unwrap();
/// let indices = FightIndices::default();
/// let hit = DamageEvent::new(1000, 1, 100, 183006, 5000.0);
///
/// let result = composer.compose(&hit, &indices, Loadout::empty(), 18200.0);
/// assert!((result.total_multiplier - 0.7242).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct ModifierComposer {
    config: EngineConfig,
    registries: Registries,
    known_buffs: Vec<AbilityId>,
}

impl ModifierComposer {
    /// Create a composer. The configuration is validated.
    pub fn new(config: EngineConfig, registries: Registries) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registries,
            known_buffs: KNOWN_DAMAGE_BUFFS.to_vec(),
        })
    }

    /// Default configuration and catalog.
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default(), Registries::defaults()?)
    }

    /// Replace the buffs checked by [`reconcile_buffs`].
    pub fn with_known_buffs(mut self, known: impl IntoIterator<Item = AbilityId>) -> Self {
        self.known_buffs = known.into_iter().collect();
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Compose one hit, resolving every source in a single pass.
    pub fn compose(
        &self,
        event: &DamageEvent,
        indices: &FightIndices,
        loadout: Loadout<'_>,
        resistance: f64,
    ) -> ModifierResult {
        let ctx = ResolveContext::new(indices, loadout, event.timestamp, event.source, event.target);
        let mut totals = ChannelTotals::default();
        let mut active = Vec::new();
        for registry in self.registry_list() {
            totals += registry.resolve(&ctx);
            active.extend(registry.active_sources(&ctx));
        }
        let reconciliation = reconcile_buffs(event, &indices.buffs, &self.known_buffs);
        finish(&self.config, event, totals, active, resistance, reconciliation)
    }

    /// Evaluate the time-independent sources for one player's fight.
    pub fn prepare<'c>(&'c self, indices: &'c FightIndices, loadout: Loadout<'c>) -> PlayerResolver<'c> {
        let [penetration, critical_damage, damage] =
            self.registry_list().map(|r| r.prepare(loadout));
        PlayerResolver {
            composer: self,
            indices,
            loadout,
            prepared: [penetration, critical_damage, damage],
        }
    }

    fn registry_list(&self) -> [&SourceRegistry; 3] {
        [
            &self.registries.penetration,
            &self.registries.critical_damage,
            &self.registries.damage,
        ]
    }
}

/// A composer bound to one player's fight, with static sources evaluated.
#[derive(Debug, Clone)]
pub struct PlayerResolver<'c> {
    composer: &'c ModifierComposer,
    indices: &'c FightIndices,
    loadout: Loadout<'c>,
    prepared: [PreparedRegistry<'c>; 3],
}

impl<'c> PlayerResolver<'c> {
    /// Static totals across the three registries.
    pub fn static_totals(&self) -> ChannelTotals {
        self.prepared
            .iter()
            .fold(ChannelTotals::default(), |acc, p| acc + p.static_totals())
    }

    /// Compose one hit.
    pub fn compose(&self, event: &DamageEvent, resistance: f64) -> ModifierResult {
        let ctx = ResolveContext::new(
            self.indices,
            self.loadout,
            event.timestamp,
            event.source,
            event.target,
        );
        let mut totals = ChannelTotals::default();
        let mut active = Vec::new();
        for prepared in &self.prepared {
            let (t, a) = prepared.resolve_detailed(&ctx);
            totals += t;
            active.extend(a);
        }
        let reconciliation =
            reconcile_buffs(event, &self.indices.buffs, &self.composer.known_buffs);
        finish(
            &self.composer.config,
            event,
            totals,
            active,
            resistance,
            reconciliation,
        )
    }
}
