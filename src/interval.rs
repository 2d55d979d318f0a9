//! Temporal interval index.
//!
//! This module turns a stream of buff or debuff events into closed
//! `[start, end]` intervals per ability and target, and answers the one
//! question every modifier source asks: was this effect active on this actor
//! at this instant?
//!
//! Intervals for the same ability and target never overlap. A second `Apply`
//! while an interval is open continues it, a `Remove` without an open interval
//! is ignored, and anything still open when the fight ends is closed at the
//! fight end.

use crate::error::{EngineError, Result};
use crate::event::{BuffEventKind, TimedBuffEvent};
use crate::ids::{AbilityId, ActorId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A closed activity interval. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: Timestamp,
    pub end: Timestamp,
    /// The actor the effect was on.
    pub target: ActorId,
    /// The actor whose event opened the interval.
    pub source: ActorId,
}

impl Interval {
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t <= self.end
    }

    pub fn duration(&self) -> Timestamp {
        self.end - self.start
    }
}

/// A set of ability ids that count as one effect.
///
/// Some effects show up under a different id depending on whether the actor
/// is the wearer or a recipient. Querying any member of a group answers for
/// the whole group.
///
/// # Examples
///
/// ```rust
/// use esolens::{AbilityId, AliasGroup};
///
/// let group = AliasGroup::new("Lucent Echoes", [AbilityId::new(220015), AbilityId::new(220016)]);
///
/// assert_eq!(group.name(), "Lucent Echoes");
/// assert!(group.contains(AbilityId::new(220016)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasGroup {
    name: String,
    ids: Vec<AbilityId>,
}

impl AliasGroup {
    pub fn new(name: impl Into<String>, ids: impl IntoIterator<Item = AbilityId>) -> Self {
        let mut ids: Vec<AbilityId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self {
            name: name.into(),
            ids,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ids(&self) -> &[AbilityId] {
        &self.ids
    }

    pub fn contains(&self, ability: AbilityId) -> bool {
        self.ids.binary_search(&ability).is_ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AbilityIntervals {
    /// Every interval of the ability, ordered by start then target.
    all: Vec<Interval>,
    /// Per-target intervals, ordered by start and non-overlapping.
    by_target: BTreeMap<ActorId, Vec<Interval>>,
}

impl AbilityIntervals {
    fn active_on(&self, target: ActorId, t: Timestamp) -> bool {
        self.by_target
            .get(&target)
            .is_some_and(|intervals| active_in(intervals, t))
    }

    fn active_anywhere(&self, t: Timestamp) -> bool {
        self.by_target
            .values()
            .any(|intervals| active_in(intervals, t))
    }
}

/// Binary search over sorted, non-overlapping intervals.
fn active_in(intervals: &[Interval], t: Timestamp) -> bool {
    let idx = intervals.partition_point(|i| i.start <= t);
    idx > 0 && intervals[idx - 1].end >= t
}

/// Queryable per-ability intervals for one fight.
///
/// Built once and never modified, so it can be shared freely between
/// threads.
///
/// # Examples
///
/// ```rust
/// use esolens::{IntervalIndex, TimedBuffEvent};
///
/// let events = vec![
///     TimedBuffEvent::apply(1000, 1, 1, 61744),
///     TimedBuffEvent::remove(5000, 1, 1, 61744),
/// ];
/// let index = IntervalIndex::build(&events, 10_000).unwrap();
///
/// assert!(!index.is_active_at(61744.into(), 500, None));
/// assert!(index.is_active_at(61744.into(), 3000, Some(1.into())));
/// assert!(index.is_active_at(61744.into(), 5000, None));
/// assert!(!index.is_active_at(61744.into(), 6000, None));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalIndex {
    abilities: BTreeMap<AbilityId, AbilityIntervals>,
    groups: Vec<AliasGroup>,
    group_of: HashMap<AbilityId, usize>,
}

impl IntervalIndex {
    /// Build an index without alias groups.
    pub fn build(events: &[TimedBuffEvent], fight_end: Timestamp) -> Result<Self> {
        Self::builder().build(events, fight_end)
    }

    pub fn builder() -> IntervalIndexBuilder {
        IntervalIndexBuilder::default()
    }

    /// Was `ability` (or any alias of it) active at `t`?
    ///
    /// With a target, only intervals on that target count. Without one, an
    /// interval on any target does.
    pub fn is_active_at(&self, ability: AbilityId, t: Timestamp, target: Option<ActorId>) -> bool {
        self.member_intervals(ability).any(|a| match target {
            Some(target) => a.active_on(target, t),
            None => a.active_anywhere(t),
        })
    }

    /// Was `ability` (or any alias of it) active at any point of the fight?
    pub fn was_ever_active(&self, ability: AbilityId, target: Option<ActorId>) -> bool {
        self.member_intervals(ability).any(|a| match target {
            Some(target) => a.by_target.contains_key(&target),
            None => !a.all.is_empty(),
        })
    }

    /// Targets `ability` (or any alias of it) was active on at `t`, sorted.
    pub fn active_targets(&self, ability: AbilityId, t: Timestamp) -> Vec<ActorId> {
        let mut targets: Vec<ActorId> = self
            .member_intervals(ability)
            .flat_map(|a| {
                a.by_target
                    .iter()
                    .filter(move |(_, intervals)| active_in(intervals, t))
                    .map(|(target, _)| *target)
            })
            .collect();
        targets.sort();
        targets.dedup();
        targets
    }

    /// Stored intervals of exactly this id, ordered by start.
    pub fn intervals(&self, ability: AbilityId) -> &[Interval] {
        self.abilities
            .get(&ability)
            .map(|a| a.all.as_slice())
            .unwrap_or(&[])
    }

    /// Abilities with at least one interval, in id order.
    pub fn abilities(&self) -> impl Iterator<Item = AbilityId> + '_ {
        self.abilities.keys().copied()
    }

    /// The alias group an ability belongs to.
    pub fn alias_group(&self, ability: AbilityId) -> Option<&AliasGroup> {
        self.group_of.get(&ability).map(|&i| &self.groups[i])
    }

    pub fn interval_count(&self) -> usize {
        self.abilities.values().map(|a| a.all.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Stored intervals of the ability's alias group, or of the ability alone.
    fn member_intervals(&self, ability: AbilityId) -> impl Iterator<Item = &AbilityIntervals> + '_ {
        let group: &[AbilityId] = match self.group_of.get(&ability) {
            Some(&i) => self.groups[i].ids(),
            None => &[],
        };
        let lone = group.is_empty().then_some(ability);
        group
            .iter()
            .copied()
            .chain(lone)
            .filter_map(move |id| self.abilities.get(&id))
    }
}

/// Builder for an [`IntervalIndex`] with alias groups.
///
/// # Examples
///
/// ```rust
/// use esolens::{AbilityId, AliasGroup, IntervalIndex, TimedBuffEvent};
///
/// let wearer = AbilityId::new(220016);
/// let recipient = AbilityId::new(220015);
/// let events = vec![TimedBuffEvent::apply(0, 1, 1, wearer)];
///
/// let index = IntervalIndex::builder()
///     .alias_group(AliasGroup::new("Lucent Echoes", [wearer, recipient]))
///     .build(&events, 1000)
///     .unwrap();
///
/// assert!(index.is_active_at(recipient, 500, Some(1.into())));
/// ```
#[derive(Debug, Clone, Default)]
pub struct IntervalIndexBuilder {
    groups: Vec<AliasGroup>,
}

impl IntervalIndexBuilder {
    pub fn alias_group(mut self, group: AliasGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn alias_groups(mut self, groups: impl IntoIterator<Item = AliasGroup>) -> Self {
        self.groups.extend(groups);
        self
    }

    /// Build the index.
    ///
    /// Events are processed in timestamp order; ties keep their input order.
    ///
    /// # Errors
    ///
    /// - [`EngineError::EmptyAliasGroup`] for a group without ids
    /// - [`EngineError::OverlappingAliasGroups`] when an id is in two groups
    /// - [`EngineError::InvertedInterval`] when `fight_end` lies before an
    ///   interval that is still open
    pub fn build(self, events: &[TimedBuffEvent], fight_end: Timestamp) -> Result<IntervalIndex> {
        let group_of = index_groups(&self.groups)?;

        let mut ordered: Vec<&TimedBuffEvent> = events.iter().collect();
        ordered.sort_by_key(|e| e.timestamp);

        let mut open: BTreeMap<(AbilityId, ActorId), (Timestamp, ActorId)> = BTreeMap::new();
        let mut closed: Vec<(AbilityId, Interval)> = Vec::new();
        let mut unmatched_removes = 0usize;

        for event in ordered {
            let key = (event.ability, event.target);
            match event.kind {
                BuffEventKind::Apply | BuffEventKind::ApplyStack => {
                    open.entry(key)
                        .or_insert((event.timestamp, event.source));
                }
                BuffEventKind::Remove => match open.remove(&key) {
                    Some((start, source)) => closed.push((
                        event.ability,
                        Interval {
                            start,
                            end: event.timestamp,
                            target: event.target,
                            source,
                        },
                    )),
                    None => {
                        unmatched_removes += 1;
                        tracing::trace!(
                            ability = %event.ability,
                            target = %event.target,
                            timestamp = event.timestamp,
                            "remove without open interval"
                        );
                    }
                },
            }
        }

        for ((ability, target), (start, source)) in open {
            if fight_end < start {
                return Err(EngineError::InvertedInterval {
                    ability,
                    target,
                    start,
                    end: fight_end,
                });
            }
            closed.push((
                ability,
                Interval {
                    start,
                    end: fight_end,
                    target,
                    source,
                },
            ));
        }

        let mut abilities: BTreeMap<AbilityId, AbilityIntervals> = BTreeMap::new();
        for (ability, interval) in closed {
            let entry = abilities.entry(ability).or_default();
            entry.all.push(interval);
            entry
                .by_target
                .entry(interval.target)
                .or_default()
                .push(interval);
        }
        for entry in abilities.values_mut() {
            entry.all.sort_by_key(|i| (i.start, i.target, i.end));
            for intervals in entry.by_target.values_mut() {
                intervals.sort_by_key(|i| i.start);
            }
        }

        let index = IntervalIndex {
            abilities,
            groups: self.groups,
            group_of,
        };
        tracing::debug!(
            abilities = index.abilities.len(),
            intervals = index.interval_count(),
            alias_groups = index.groups.len(),
            unmatched_removes,
            "built interval index"
        );
        Ok(index)
    }
}

fn index_groups(groups: &[AliasGroup]) -> Result<HashMap<AbilityId, usize>> {
    let mut group_of = HashMap::new();
    for (i, group) in groups.iter().enumerate() {
        if group.ids().is_empty() {
            return Err(EngineError::EmptyAliasGroup(group.name().to_string()));
        }
        for &id in group.ids() {
            if let Some(&previous) = group_of.get(&id) {
                let first: &AliasGroup = &groups[previous];
                return Err(EngineError::OverlappingAliasGroups {
                    ability: id,
                    first: first.name().to_string(),
                    second: group.name().to_string(),
                });
            }
            group_of.insert(id, i);
        }
    }
    Ok(group_of)
}

/// The buff and debuff indices of one fight.
///
/// Buffs are scoped to the actor wearing them (the attacker for damage-done
/// effects); debuffs to the actor they were applied to (the target).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FightIndices {
    pub buffs: IntervalIndex,
    pub debuffs: IntervalIndex,
}

impl FightIndices {
    /// Build both indices with the same alias groups.
    pub fn build(
        buff_events: &[TimedBuffEvent],
        debuff_events: &[TimedBuffEvent],
        fight_end: Timestamp,
        groups: &[AliasGroup],
    ) -> Result<Self> {
        let buffs = IntervalIndex::builder()
            .alias_groups(groups.iter().cloned())
            .build(buff_events, fight_end)?;
        let debuffs = IntervalIndex::builder()
            .alias_groups(groups.iter().cloned())
            .build(debuff_events, fight_end)?;
        Ok(Self { buffs, debuffs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUFF: u32 = 61744;

    #[test]
    fn test_reapply_continues_open_interval() {
        let events = vec![
            TimedBuffEvent::apply(100, 1, 1, BUFF),
            TimedBuffEvent::apply(200, 2, 1, BUFF),
            TimedBuffEvent::apply_stack(300, 1, 1, BUFF),
            TimedBuffEvent::remove(400, 1, 1, BUFF),
        ];
        let index = IntervalIndex::build(&events, 1000).unwrap();
        let intervals = index.intervals(BUFF.into());
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].start, 100);
        assert_eq!(intervals[0].end, 400);
        assert_eq!(intervals[0].source, ActorId::new(1));
    }

    #[test]
    fn test_apply_after_remove_opens_new_interval() {
        let events = vec![
            TimedBuffEvent::apply(100, 1, 1, BUFF),
            TimedBuffEvent::remove(200, 1, 1, BUFF),
            TimedBuffEvent::apply(300, 1, 1, BUFF),
        ];
        let index = IntervalIndex::build(&events, 1000).unwrap();
        let intervals = index.intervals(BUFF.into());
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[1].end, 1000);
        assert!(!index.is_active_at(BUFF.into(), 250, None));
    }

    #[test]
    fn test_apply_stack_opens_when_closed() {
        let events = vec![TimedBuffEvent::apply_stack(100, 1, 1, BUFF)];
        let index = IntervalIndex::build(&events, 1000).unwrap();
        assert!(index.is_active_at(BUFF.into(), 500, Some(ActorId::new(1))));
    }

    #[test]
    fn test_unmatched_remove_is_ignored() {
        let events = vec![TimedBuffEvent::remove(100, 1, 1, BUFF)];
        let index = IntervalIndex::build(&events, 1000).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_events_are_sorted_before_processing() {
        let events = vec![
            TimedBuffEvent::remove(500, 1, 1, BUFF),
            TimedBuffEvent::apply(100, 1, 1, BUFF),
        ];
        let index = IntervalIndex::build(&events, 1000).unwrap();
        assert_eq!(index.intervals(BUFF.into())[0].end, 500);
    }

    #[test]
    fn test_open_interval_after_fight_end_is_error() {
        let events = vec![TimedBuffEvent::apply(5000, 1, 7, BUFF)];
        let result = IntervalIndex::build(&events, 1000);
        assert!(matches!(
            result,
            Err(EngineError::InvertedInterval { start: 5000, end: 1000, .. })
        ));
    }

    #[test]
    fn test_overlapping_alias_groups_rejected() {
        let result = IntervalIndex::builder()
            .alias_group(AliasGroup::new("A", [AbilityId::new(1), AbilityId::new(2)]))
            .alias_group(AliasGroup::new("B", [AbilityId::new(2), AbilityId::new(3)]))
            .build(&[], 0);
        assert!(matches!(
            result,
            Err(EngineError::OverlappingAliasGroups { .. })
        ));
    }

    #[test]
    fn test_empty_alias_group_rejected() {
        let result = IntervalIndex::builder()
            .alias_group(AliasGroup::new("Empty", []))
            .build(&[], 0);
        assert_eq!(
            result.unwrap_err(),
            EngineError::EmptyAliasGroup("Empty".to_string())
        );
    }

    #[test]
    fn test_active_targets_and_was_ever_active() {
        let events = vec![
            TimedBuffEvent::apply(0, 9, 100, BUFF),
            TimedBuffEvent::apply(0, 9, 200, BUFF),
            TimedBuffEvent::remove(50, 9, 200, BUFF),
        ];
        let index = IntervalIndex::build(&events, 1000).unwrap();
        assert_eq!(
            index.active_targets(BUFF.into(), 25),
            vec![ActorId::new(100), ActorId::new(200)]
        );
        assert_eq!(index.active_targets(BUFF.into(), 75), vec![ActorId::new(100)]);
        assert!(index.was_ever_active(BUFF.into(), Some(ActorId::new(200))));
        assert!(!index.was_ever_active(BUFF.into(), Some(ActorId::new(300))));
        assert!(!index.was_ever_active(AbilityId::new(1), None));
    }

    #[test]
    fn test_unknown_ability_is_inactive() {
        let index = IntervalIndex::default();
        assert!(!index.is_active_at(AbilityId::new(u32::MAX), 0, None));
        assert!(index.intervals(AbilityId::new(5)).is_empty());
    }
}
