//! Modifier sources.
//!
//! A [`ModifierSource`] is one independently activated contribution to a
//! damage modifier: a passive, a set bonus, a buff on the attacker, a debuff
//! on the target. Every source kind is a variant of [`SourceKind`] and every
//! variant is evaluated by the single match in [`ModifierSource::evaluate`],
//! which is what both the static and the per-event paths of a registry call.
//!
//! Sources that read the loadout contribute nothing when the part of the
//! loadout they need is missing:
//!
//! - `Aura` and `GearCount` need the snapshot.
//! - `Computed` rules need the snapshot and the player data, including the
//!   plain `Passive` values.
//! - `AlwaysOn` constants contribute unconditionally; the per-piece variant
//!   needs the snapshot.

use crate::ids::{AbilityId, ActorId, SetId, Timestamp};
use crate::interval::FightIndices;
use crate::snapshot::{ArmorWeight, GearPiece, Loadout, WeaponKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The modifier family a source feeds.
///
/// Sources in one channel add up; the channels are then combined by the
/// damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Channel {
    /// Flat penetration.
    Penetration,
    /// Critical damage, in percent.
    CriticalDamage,
    /// Attacker-side damage done, in percent.
    DamageDone,
    /// Target-side damage taken, in percent.
    DamageTaken,
    /// Direct-damage-only bonus, in percent.
    Empower,
}

/// Everything a source can look at for one damage event.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub indices: &'a FightIndices,
    pub loadout: Loadout<'a>,
    pub timestamp: Timestamp,
    /// Buffs are checked on this actor.
    pub attacker: ActorId,
    /// Debuffs are checked on this actor.
    pub target: ActorId,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        indices: &'a FightIndices,
        loadout: Loadout<'a>,
        timestamp: Timestamp,
        attacker: ActorId,
        target: ActorId,
    ) -> Self {
        Self {
            indices,
            loadout,
            timestamp,
            attacker,
            target,
        }
    }

    /// Is `ability` active on the attacker right now?
    pub fn buff_active(&self, ability: AbilityId) -> bool {
        self.indices
            .buffs
            .is_active_at(ability, self.timestamp, Some(self.attacker))
    }

    /// Is `ability` active on the target right now?
    pub fn debuff_active(&self, ability: AbilityId) -> bool {
        self.indices
            .debuffs
            .is_active_at(ability, self.timestamp, Some(self.target))
    }
}

/// A contribution computed from the loadout alone.
pub trait LoadoutRule: Send + Sync {
    fn value(&self, loadout: Loadout<'_>) -> f64;
}

impl<F> LoadoutRule for F
where
    F: Fn(Loadout<'_>) -> f64 + Send + Sync,
{
    fn value(&self, loadout: Loadout<'_>) -> f64 {
        self(loadout)
    }
}

/// A contribution that depends on the moment of the event.
pub trait MomentRule: Send + Sync {
    fn value(&self, ctx: &ResolveContext<'_>) -> f64;
}

impl<F> MomentRule for F
where
    F: Fn(&ResolveContext<'_>) -> f64 + Send + Sync,
{
    fn value(&self, ctx: &ResolveContext<'_>) -> f64 {
        self(ctx)
    }
}

/// How slotted abilities are recognised for a skill line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkillMatch {
    /// By name, front bar only.
    FrontBarNames(&'static [&'static str]),
    /// By ability id, on either bar.
    AnyBarIds(&'static [AbilityId]),
}

impl SkillMatch {
    fn count(&self, loadout: Loadout<'_>) -> usize {
        let Some(snapshot) = loadout.snapshot else {
            return 0;
        };
        match self {
            SkillMatch::FrontBarNames(names) => snapshot
                .front_bar_talents()
                .iter()
                .filter(|t| names.contains(&t.name.as_str()))
                .count(),
            SkillMatch::AnyBarIds(ids) => snapshot
                .talents
                .iter()
                .filter(|t| ids.contains(&t.guid))
                .count(),
        }
    }
}

/// Which front-bar weapons a weapon rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponMatch {
    Kind(WeaponKind),
    /// A one-handed weapon with the given trait.
    OneHandedTrait(u32),
    /// A two-handed weapon with the given trait.
    TwoHandedTrait(u32),
}

impl WeaponMatch {
    fn matches(&self, kind: WeaponKind, piece: &GearPiece) -> bool {
        match *self {
            WeaponMatch::Kind(k) => kind == k,
            WeaponMatch::OneHandedTrait(t) => kind.is_one_handed() && piece.gear_trait == t,
            WeaponMatch::TwoHandedTrait(t) => kind.is_two_handed() && piece.gear_trait == t,
        }
    }

    fn count(&self, loadout: Loadout<'_>) -> usize {
        loadout.snapshot.map_or(0, |s| {
            s.front_bar_weapons()
                .filter(|(kind, piece)| self.matches(*kind, piece))
                .count()
        })
    }
}

/// An always-active contribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlwaysOnValue {
    Constant(f64),
    /// Scales with worn pieces of one armor weight.
    PerArmorPiece { weight: ArmorWeight, value: f64 },
}

/// A contribution computed from the loadout or the moment.
#[derive(Clone)]
pub enum ComputedRule {
    /// `value × stacks` per matching slotted ability, while one of the gate
    /// auras is present.
    PerSlottedAbility {
        skills: SkillMatch,
        value: f64,
        stacks: f64,
        gate: &'static [AbilityId],
    },
    /// `value` once, for a passive every character with a known loadout has.
    Passive { value: f64 },
    /// `value` per worn armor piece of `weight`, optionally gated by an aura.
    PerArmorPiece {
        weight: ArmorWeight,
        value: f64,
        gate: Option<AbilityId>,
    },
    /// `value` per matching front-bar weapon.
    PerWeapon { weapon: WeaponMatch, value: f64 },
    /// `value` once if any front-bar weapon matches.
    Wielding { weapon: WeaponMatch, value: f64 },
    /// `value` per set in the group that reaches its piece count.
    SetGroup {
        sets: &'static [(SetId, usize)],
        value: f64,
    },
    /// `value` per listed debuff active on the target. Time dependent.
    PerActiveDebuff {
        debuffs: &'static [AbilityId],
        value: f64,
    },
    /// `value` while the wearer's aura is present or the buff is active on
    /// the attacker. Time dependent.
    AuraOrBuff {
        aura: AbilityId,
        buff: AbilityId,
        value: f64,
    },
    /// A caller-supplied loadout rule.
    Static(Arc<dyn LoadoutRule>),
    /// A caller-supplied time-dependent rule.
    Dynamic(Arc<dyn MomentRule>),
}

impl ComputedRule {
    /// Wrap a loadout closure.
    pub fn custom_static<F>(rule: F) -> Self
    where
        F: Fn(Loadout<'_>) -> f64 + Send + Sync + 'static,
    {
        ComputedRule::Static(Arc::new(rule))
    }

    /// Wrap a per-event closure.
    pub fn custom_dynamic<F>(rule: F) -> Self
    where
        F: Fn(&ResolveContext<'_>) -> f64 + Send + Sync + 'static,
    {
        ComputedRule::Dynamic(Arc::new(rule))
    }

    fn is_time_dependent(&self) -> bool {
        matches!(
            self,
            ComputedRule::PerActiveDebuff { .. }
                | ComputedRule::AuraOrBuff { .. }
                | ComputedRule::Dynamic(_)
        )
    }
}

impl fmt::Debug for ComputedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputedRule::PerSlottedAbility {
                skills,
                value,
                stacks,
                gate,
            } => f
                .debug_struct("PerSlottedAbility")
                .field("skills", skills)
                .field("value", value)
                .field("stacks", stacks)
                .field("gate", gate)
                .finish(),
            ComputedRule::Passive { value } => {
                f.debug_struct("Passive").field("value", value).finish()
            }
            ComputedRule::PerArmorPiece {
                weight,
                value,
                gate,
            } => f
                .debug_struct("PerArmorPiece")
                .field("weight", weight)
                .field("value", value)
                .field("gate", gate)
                .finish(),
            ComputedRule::PerWeapon { weapon, value } => f
                .debug_struct("PerWeapon")
                .field("weapon", weapon)
                .field("value", value)
                .finish(),
            ComputedRule::Wielding { weapon, value } => f
                .debug_struct("Wielding")
                .field("weapon", weapon)
                .field("value", value)
                .finish(),
            ComputedRule::SetGroup { sets, value } => f
                .debug_struct("SetGroup")
                .field("sets", sets)
                .field("value", value)
                .finish(),
            ComputedRule::PerActiveDebuff { debuffs, value } => f
                .debug_struct("PerActiveDebuff")
                .field("debuffs", debuffs)
                .field("value", value)
                .finish(),
            ComputedRule::AuraOrBuff { aura, buff, value } => f
                .debug_struct("AuraOrBuff")
                .field("aura", aura)
                .field("buff", buff)
                .field("value", value)
                .finish(),
            ComputedRule::Static(_) => f.write_str("Static(<rule>)"),
            ComputedRule::Dynamic(_) => f.write_str("Dynamic(<rule>)"),
        }
    }
}

/// How a source is activated and what it is worth.
#[derive(Debug, Clone)]
pub enum SourceKind {
    /// Present in the snapshot's auras.
    Aura { ability: AbilityId, value: f64 },
    /// Active on the attacker at the event time.
    Buff { ability: AbilityId, value: f64 },
    /// Active on the target at the event time.
    Debuff { ability: AbilityId, value: f64 },
    /// At least `pieces` items of `set` equipped.
    GearCount {
        set: SetId,
        pieces: usize,
        value: f64,
    },
    Computed(ComputedRule),
    AlwaysOn(AlwaysOnValue),
}

/// One named contribution to a modifier channel.
///
/// # Examples
///
/// ```rust
/// use esolens::{AbilityId, Channel, CombatantSnapshot, Loadout, ModifierSource, SourceKind};
/// use esolens::snapshot::Aura;
///
/// let hemorrhage = ModifierSource::new(
///     "Hemorrhage",
///     Channel::CriticalDamage,
///     SourceKind::Aura { ability: AbilityId::new(45060), value: 10.0 },
/// );
///
/// let snapshot = CombatantSnapshot {
///     auras: vec![Aura::new(45060)],
///     ..Default::default()
/// };
///
/// assert!(!hemorrhage.is_time_dependent());
/// assert_eq!(hemorrhage.evaluate(Loadout::new(Some(&snapshot), None), None), Some(10.0));
/// assert_eq!(hemorrhage.evaluate(Loadout::empty(), None), Some(0.0));
/// ```
#[derive(Debug, Clone)]
pub struct ModifierSource {
    name: Arc<str>,
    description: String,
    channel: Channel,
    kind: SourceKind,
}

impl ModifierSource {
    pub fn new(name: impl Into<Arc<str>>, channel: Channel, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            channel,
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Whether the contribution can change during a fight.
    pub fn is_time_dependent(&self) -> bool {
        match &self.kind {
            SourceKind::Buff { .. } | SourceKind::Debuff { .. } => true,
            SourceKind::Computed(rule) => rule.is_time_dependent(),
            SourceKind::Aura { .. } | SourceKind::GearCount { .. } | SourceKind::AlwaysOn(_) => {
                false
            }
        }
    }

    /// Evaluate the contribution.
    ///
    /// Time-independent sources only read `loadout`. Time-dependent sources
    /// need `moment` and return `None` without it.
    pub fn evaluate(&self, loadout: Loadout<'_>, moment: Option<&ResolveContext<'_>>) -> Option<f64> {
        let value = match &self.kind {
            SourceKind::Aura { ability, value } => {
                gate(loadout.snapshot.is_some_and(|s| s.has_aura(*ability)), *value)
            }
            SourceKind::GearCount { set, pieces, value } => gate(
                loadout.snapshot.is_some_and(|s| s.set_count(*set) >= *pieces),
                *value,
            ),
            SourceKind::AlwaysOn(AlwaysOnValue::Constant(value)) => *value,
            SourceKind::AlwaysOn(AlwaysOnValue::PerArmorPiece { weight, value }) => {
                loadout.snapshot.map_or(0.0, |s| s.armor_count(*weight) as f64 * value)
            }
            SourceKind::Buff { ability, value } => gate(moment?.buff_active(*ability), *value),
            SourceKind::Debuff { ability, value } => gate(moment?.debuff_active(*ability), *value),
            SourceKind::Computed(rule) => evaluate_rule(rule, loadout, moment)?,
        };
        Some(value)
    }

    /// The contribution at the moment of `ctx`.
    pub fn contribution_at(&self, ctx: &ResolveContext<'_>) -> f64 {
        self.evaluate(ctx.loadout, Some(ctx)).unwrap_or(0.0)
    }

    /// Whether the source contributed at any point of the fight.
    ///
    /// Custom time-dependent rules cannot be answered without a moment and
    /// report `false`.
    pub fn was_ever_active(
        &self,
        loadout: Loadout<'_>,
        indices: &FightIndices,
        attacker: Option<ActorId>,
    ) -> bool {
        match &self.kind {
            SourceKind::Buff { ability, .. } => indices.buffs.was_ever_active(*ability, attacker),
            SourceKind::Debuff { ability, .. } => indices.debuffs.was_ever_active(*ability, None),
            SourceKind::Computed(ComputedRule::PerActiveDebuff { debuffs, .. }) => debuffs
                .iter()
                .any(|d| indices.debuffs.was_ever_active(*d, None)),
            SourceKind::Computed(ComputedRule::AuraOrBuff { aura, buff, .. }) => {
                loadout.snapshot.is_some_and(|s| s.has_aura(*aura))
                    || indices.buffs.was_ever_active(*buff, attacker)
            }
            SourceKind::Computed(ComputedRule::Dynamic(_)) => false,
            _ => self.evaluate(loadout, None).is_some_and(|v| v != 0.0),
        }
    }
}

fn gate(active: bool, value: f64) -> f64 {
    if active {
        value
    } else {
        0.0
    }
}

fn evaluate_rule(
    rule: &ComputedRule,
    loadout: Loadout<'_>,
    moment: Option<&ResolveContext<'_>>,
) -> Option<f64> {
    let full = loadout.with_player();
    let value = match rule {
        ComputedRule::PerSlottedAbility {
            skills,
            value,
            stacks,
            gate: auras,
        } => match full {
            Some(s) if s.has_any_aura(auras) => skills.count(loadout) as f64 * stacks * value,
            _ => 0.0,
        },
        ComputedRule::Passive { value } => gate(full.is_some(), *value),
        ComputedRule::PerArmorPiece {
            weight,
            value,
            gate: aura,
        } => match full {
            Some(s) if aura.map_or(true, |a| s.has_aura(a)) => s.armor_count(*weight) as f64 * value,
            _ => 0.0,
        },
        ComputedRule::PerWeapon { weapon, value } => match full {
            Some(_) => weapon.count(loadout) as f64 * value,
            None => 0.0,
        },
        ComputedRule::Wielding { weapon, value } => {
            gate(full.is_some() && weapon.count(loadout) > 0, *value)
        }
        ComputedRule::SetGroup { sets, value } => full.map_or(0.0, |s| {
            let reached = sets
                .iter()
                .filter(|(set, pieces)| s.set_count(*set) >= *pieces)
                .count();
            reached as f64 * value
        }),
        ComputedRule::Static(custom) => custom.value(loadout),
        ComputedRule::PerActiveDebuff { debuffs, value } => {
            let ctx = moment?;
            debuffs.iter().filter(|d| ctx.debuff_active(**d)).count() as f64 * value
        }
        ComputedRule::AuraOrBuff { aura, buff, value } => {
            let ctx = moment?;
            let worn = loadout.snapshot.is_some_and(|s| s.has_aura(*aura));
            gate(worn || ctx.buff_active(*buff), *value)
        }
        ComputedRule::Dynamic(custom) => custom.value(moment?),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TimedBuffEvent;
    use crate::interval::IntervalIndex;
    use crate::snapshot::{slot, Aura, CombatantSnapshot, PlayerData, Talent};

    fn indices(buffs: &[TimedBuffEvent], debuffs: &[TimedBuffEvent]) -> FightIndices {
        FightIndices {
            buffs: IntervalIndex::build(buffs, 10_000).unwrap(),
            debuffs: IntervalIndex::build(debuffs, 10_000).unwrap(),
        }
    }

    #[test]
    fn test_buff_is_scoped_to_attacker() {
        let source = ModifierSource::new(
            "Minor Force",
            Channel::CriticalDamage,
            SourceKind::Buff {
                ability: AbilityId::new(61746),
                value: 10.0,
            },
        );
        let idx = indices(&[TimedBuffEvent::apply(0, 5, 1, 61746u32)], &[]);
        let on_one = ResolveContext::new(&idx, Loadout::empty(), 100, 1.into(), 99.into());
        let on_two = ResolveContext::new(&idx, Loadout::empty(), 100, 2.into(), 99.into());
        assert_eq!(source.contribution_at(&on_one), 10.0);
        assert_eq!(source.contribution_at(&on_two), 0.0);
        assert_eq!(source.evaluate(Loadout::empty(), None), None);
    }

    #[test]
    fn test_per_active_debuff_counts() {
        static WEAKNESSES: [AbilityId; 3] = [
            AbilityId::new(1),
            AbilityId::new(2),
            AbilityId::new(3),
        ];
        let source = ModifierSource::new(
            "Catalyst",
            Channel::CriticalDamage,
            SourceKind::Computed(ComputedRule::PerActiveDebuff {
                debuffs: &WEAKNESSES,
                value: 5.0,
            }),
        );
        let idx = indices(
            &[],
            &[
                TimedBuffEvent::apply(0, 1, 50, 1u32),
                TimedBuffEvent::apply(0, 1, 50, 3u32),
                TimedBuffEvent::apply(0, 1, 60, 2u32),
            ],
        );
        let ctx = ResolveContext::new(&idx, Loadout::empty(), 10, 1.into(), 50.into());
        assert_eq!(source.contribution_at(&ctx), 10.0);
    }

    #[test]
    fn test_computed_needs_player_data() {
        let snapshot = CombatantSnapshot {
            gear: vec![
                GearPiece::new(slot::MAIN_HAND, 0, 2),
                GearPiece::new(slot::OFF_HAND, 0, 2),
            ],
            ..Default::default()
        };
        let player = PlayerData::new(1, "P");
        let source = ModifierSource::new(
            "Twin Blade and Blunt",
            Channel::Penetration,
            SourceKind::Computed(ComputedRule::PerWeapon {
                weapon: WeaponMatch::Kind(WeaponKind::Mace),
                value: 1487.0,
            }),
        );
        assert_eq!(
            source.evaluate(Loadout::new(Some(&snapshot), Some(&player)), None),
            Some(2974.0)
        );
        assert_eq!(
            source.evaluate(Loadout::new(Some(&snapshot), None), None),
            Some(0.0)
        );
    }

    #[test]
    fn test_slotted_ability_gate() {
        static IDS: [AbilityId; 2] = [AbilityId::new(10), AbilityId::new(11)];
        static GATE: [AbilityId; 1] = [AbilityId::new(99)];
        let source = ModifierSource::new(
            "Splintered",
            Channel::Penetration,
            SourceKind::Computed(ComputedRule::PerSlottedAbility {
                skills: SkillMatch::AnyBarIds(&IDS),
                value: 620.0,
                stacks: 2.0,
                gate: &GATE,
            }),
        );
        let player = PlayerData::new(1, "P");
        let mut snapshot = CombatantSnapshot {
            talents: vec![Talent::new(10u32, "a"), Talent::new(11u32, "b")],
            ..Default::default()
        };
        let loadout = Loadout::new(Some(&snapshot), Some(&player));
        assert_eq!(source.evaluate(loadout, None), Some(0.0));

        snapshot.auras.push(Aura::new(99u32));
        let loadout = Loadout::new(Some(&snapshot), Some(&player));
        assert_eq!(source.evaluate(loadout, None), Some(2480.0));
    }

    #[test]
    fn test_always_on_constant_without_snapshot() {
        let source = ModifierSource::new(
            "Flat",
            Channel::CriticalDamage,
            SourceKind::AlwaysOn(AlwaysOnValue::Constant(8.0)),
        );
        assert_eq!(source.evaluate(Loadout::empty(), None), Some(8.0));
    }

    #[test]
    fn test_passive_needs_full_loadout() {
        let source = ModifierSource::new(
            "Fighting Finesse",
            Channel::CriticalDamage,
            SourceKind::Computed(ComputedRule::Passive { value: 8.0 }),
        );
        let snapshot = CombatantSnapshot::default();
        let player = PlayerData::new(1, "P");

        assert!(!source.is_time_dependent());
        assert_eq!(source.evaluate(Loadout::empty(), None), Some(0.0));
        assert_eq!(source.evaluate(Loadout::new(Some(&snapshot), None), None), Some(0.0));
        assert_eq!(source.evaluate(Loadout::new(None, Some(&player)), None), Some(0.0));
        assert_eq!(
            source.evaluate(Loadout::new(Some(&snapshot), Some(&player)), None),
            Some(8.0)
        );
    }

    #[test]
    fn test_custom_rules() {
        let fixed = ModifierSource::new(
            "Fixed",
            Channel::DamageDone,
            SourceKind::Computed(ComputedRule::custom_static(|_| 3.0)),
        );
        let late = ModifierSource::new(
            "Late",
            Channel::DamageDone,
            SourceKind::Computed(ComputedRule::custom_dynamic(|ctx| {
                if ctx.timestamp > 500 {
                    7.0
                } else {
                    0.0
                }
            })),
        );
        assert!(!fixed.is_time_dependent());
        assert!(late.is_time_dependent());

        let idx = FightIndices::default();
        let ctx = ResolveContext::new(&idx, Loadout::empty(), 600, 1.into(), 2.into());
        assert_eq!(fixed.contribution_at(&ctx), 3.0);
        assert_eq!(late.contribution_at(&ctx), 7.0);
    }
}
