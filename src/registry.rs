//! Source registries.
//!
//! A [`SourceRegistry`] owns one family of [`ModifierSource`]s and resolves
//! them into per-channel totals. The registry partitions its sources once,
//! at construction, into the ones that only read the loadout and the ones
//! that depend on the event time. A fight evaluates the first group once per
//! player through [`SourceRegistry::prepare`] and the second group per event.
//! For every moment, `static_totals + dynamic_totals` equals the single-pass
//! [`SourceRegistry::resolve`].

use crate::error::{EngineError, Result};
use crate::ids::ActorId;
use crate::interval::FightIndices;
use crate::snapshot::Loadout;
use crate::source::{Channel, ModifierSource, ResolveContext};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::{Add, AddAssign};
use std::sync::Arc;

/// Summed contributions per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelTotals {
    pub penetration: f64,
    pub critical_damage: f64,
    pub damage_done: f64,
    pub damage_taken: f64,
    pub empower: f64,
}

impl ChannelTotals {
    pub fn apply(&mut self, channel: Channel, value: f64) {
        match channel {
            Channel::Penetration => self.penetration += value,
            Channel::CriticalDamage => self.critical_damage += value,
            Channel::DamageDone => self.damage_done += value,
            Channel::DamageTaken => self.damage_taken += value,
            Channel::Empower => self.empower += value,
        }
    }

    pub fn get(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Penetration => self.penetration,
            Channel::CriticalDamage => self.critical_damage,
            Channel::DamageDone => self.damage_done,
            Channel::DamageTaken => self.damage_taken,
            Channel::Empower => self.empower,
        }
    }
}

impl AddAssign for ChannelTotals {
    fn add_assign(&mut self, other: Self) {
        self.penetration += other.penetration;
        self.critical_damage += other.critical_damage;
        self.damage_done += other.damage_done;
        self.damage_taken += other.damage_taken;
        self.empower += other.empower;
    }
}

impl Add for ChannelTotals {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

/// A source that contributed a non-zero value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSource {
    pub name: Arc<str>,
    pub channel: Channel,
    pub value: f64,
}

/// A source together with whether it ever contributed during a fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceState {
    pub name: Arc<str>,
    pub description: String,
    pub channel: Channel,
    pub was_active: bool,
}

/// A named, immutable list of modifier sources.
///
/// # Examples
///
/// ```rust
/// use esolens::{
///     AbilityId, Channel, FightIndices, Loadout, ModifierSource, ResolveContext,
///     SourceKind, SourceRegistry,
/// };
/// use esolens::source::AlwaysOnValue;
///
/// let registry = SourceRegistry::new(
///     "critical damage",
///     vec![
///         ModifierSource::new(
///             "Fighting Finesse",
///             Channel::CriticalDamage,
///             SourceKind::AlwaysOn(AlwaysOnValue::Constant(8.0)),
///         ),
///         ModifierSource::new(
///             "Minor Force",
///             Channel::CriticalDamage,
///             SourceKind::Buff { ability: AbilityId::new(61746), value: 10.0 },
///         ),
///     ],
/// )
/// .unwrap();
///
/// let indices = FightIndices::default();
/// let ctx = ResolveContext::new(&indices, Loadout::empty(), 0, 1.into(), 2.into());
///
/// assert_eq!(registry.static_len(), 1);
/// assert_eq!(registry.resolve(&ctx).critical_damage, 8.0);
/// ```
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    name: String,
    sources: Vec<ModifierSource>,
    static_indices: Vec<usize>,
    dynamic_indices: Vec<usize>,
}

impl SourceRegistry {
    /// Create a registry and partition its sources.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateSource`] if two sources share a name.
    pub fn new(name: impl Into<String>, sources: Vec<ModifierSource>) -> Result<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name().clone()) {
                return Err(EngineError::DuplicateSource {
                    registry: name,
                    name: source.name().to_string(),
                });
            }
        }

        let (dynamic_indices, static_indices): (Vec<usize>, Vec<usize>) =
            (0..sources.len()).partition(|&i| sources[i].is_time_dependent());

        tracing::debug!(
            registry = %name,
            static_sources = static_indices.len(),
            dynamic_sources = dynamic_indices.len(),
            "partitioned source registry"
        );

        Ok(Self {
            name,
            sources,
            static_indices,
            dynamic_indices,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sources(&self) -> &[ModifierSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of time-independent sources.
    pub fn static_len(&self) -> usize {
        self.static_indices.len()
    }

    /// Number of time-dependent sources.
    pub fn dynamic_len(&self) -> usize {
        self.dynamic_indices.len()
    }

    /// Sum every source at the moment of `ctx` in one pass.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> ChannelTotals {
        let mut totals = ChannelTotals::default();
        for source in &self.sources {
            totals.apply(source.channel(), source.contribution_at(ctx));
        }
        totals
    }

    /// Sum the time-independent sources.
    pub fn static_totals(&self, loadout: Loadout<'_>) -> ChannelTotals {
        let mut totals = ChannelTotals::default();
        for source in self.static_sources() {
            totals.apply(
                source.channel(),
                source.evaluate(loadout, None).unwrap_or(0.0),
            );
        }
        totals
    }

    /// Sum the time-dependent sources at the moment of `ctx`.
    pub fn dynamic_totals(&self, ctx: &ResolveContext<'_>) -> ChannelTotals {
        let mut totals = ChannelTotals::default();
        for source in self.dynamic_sources() {
            totals.apply(source.channel(), source.contribution_at(ctx));
        }
        totals
    }

    /// Evaluate the time-independent half once for a loadout.
    pub fn prepare(&self, loadout: Loadout<'_>) -> PreparedRegistry<'_> {
        let static_active = collect_active(self.static_sources(), |s| {
            s.evaluate(loadout, None).unwrap_or(0.0)
        });
        PreparedRegistry {
            registry: self,
            static_totals: self.static_totals(loadout),
            static_active,
        }
    }

    /// Every source with a non-zero contribution at the moment of `ctx`.
    pub fn active_sources(&self, ctx: &ResolveContext<'_>) -> Vec<ActiveSource> {
        collect_active(self.sources.iter(), |s| s.contribution_at(ctx))
    }

    /// Every source, flagged with whether it contributed at any point.
    pub fn sources_with_state(
        &self,
        loadout: Loadout<'_>,
        indices: &FightIndices,
        attacker: Option<ActorId>,
    ) -> Vec<SourceState> {
        self.sources
            .iter()
            .map(|s| SourceState {
                name: s.name().clone(),
                description: s.description().to_string(),
                channel: s.channel(),
                was_active: s.was_ever_active(loadout, indices, attacker),
            })
            .collect()
    }

    fn static_sources(&self) -> impl Iterator<Item = &ModifierSource> {
        self.static_indices.iter().map(move |&i| &self.sources[i])
    }

    fn dynamic_sources(&self) -> impl Iterator<Item = &ModifierSource> {
        self.dynamic_indices.iter().map(move |&i| &self.sources[i])
    }
}

fn collect_active<'r>(
    sources: impl Iterator<Item = &'r ModifierSource>,
    value: impl Fn(&ModifierSource) -> f64,
) -> Vec<ActiveSource> {
    sources
        .filter_map(|s| {
            let v = value(s);
            (v != 0.0).then(|| ActiveSource {
                name: s.name().clone(),
                channel: s.channel(),
                value: v,
            })
        })
        .collect()
}

/// A registry with its time-independent half already evaluated.
#[derive(Debug, Clone)]
pub struct PreparedRegistry<'r> {
    registry: &'r SourceRegistry,
    static_totals: ChannelTotals,
    static_active: Vec<ActiveSource>,
}

impl<'r> PreparedRegistry<'r> {
    pub fn registry(&self) -> &'r SourceRegistry {
        self.registry
    }

    pub fn static_totals(&self) -> ChannelTotals {
        self.static_totals
    }

    /// Static totals plus the dynamic half at the moment of `ctx`.
    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> ChannelTotals {
        self.static_totals + self.registry.dynamic_totals(ctx)
    }

    /// Active sources at the moment of `ctx`, static ones first.
    pub fn active_sources(&self, ctx: &ResolveContext<'_>) -> Vec<ActiveSource> {
        self.resolve_detailed(ctx).1
    }

    /// Totals and active sources at the moment of `ctx`, evaluating each
    /// dynamic source once.
    pub fn resolve_detailed(&self, ctx: &ResolveContext<'_>) -> (ChannelTotals, Vec<ActiveSource>) {
        let dynamic = collect_active(self.registry.dynamic_sources(), |s| {
            s.contribution_at(ctx)
        });
        let mut dynamic_totals = ChannelTotals::default();
        for source in &dynamic {
            dynamic_totals.apply(source.channel, source.value);
        }
        let mut active = self.static_active.clone();
        active.extend(dynamic);
        (self.static_totals + dynamic_totals, active)
    }
}
