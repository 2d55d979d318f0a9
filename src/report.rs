//! Player and fight accuracy reports.

use crate::composer::{ModifierComposer, ModifierResult, TargetResistance};
use crate::event::DamageEvent;
use crate::ids::{AbilityId, ActorId, Timestamp};
use crate::inference::{AbilityAccuracyStats, EventAnalysis, TooltipInference};
use crate::interval::FightIndices;
use crate::names::AbilityNames;
use crate::snapshot::{CombatantSnapshot, Loadout, PlayerData};
use crate::stats::{RunningStats, ValueRange};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Ranges of the main modifiers across a player's hits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifierSummary {
    pub penetration: ValueRange,
    pub crit_damage_bonus: ValueRange,
    pub damage_reduction_percent: ValueRange,
    /// One when there were no hits.
    pub damage_done_multiplier: ValueRange,
}

impl ModifierSummary {
    fn from_modifiers<'a>(modifiers: impl Iterator<Item = &'a ModifierResult>) -> Self {
        let mut penetration = RunningStats::new();
        let mut crit = RunningStats::new();
        let mut reduction = RunningStats::new();
        let mut done = RunningStats::new();
        for m in modifiers {
            penetration.push(m.penetration);
            crit.push(m.crit_damage_bonus);
            reduction.push(m.damage_reduction_percent);
            done.push(m.damage_done.multiplier);
        }
        Self {
            penetration: penetration.range_or(0.0),
            crit_damage_bonus: crit.range_or(0.0),
            damage_reduction_percent: reduction.range_or(0.0),
            damage_done_multiplier: done.range_or(1.0),
        }
    }
}

/// Accuracy of the modifier model for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAccuracyReport {
    pub player: ActorId,
    pub player_name: String,
    /// Abilities with enough hits, most hits first.
    pub ability_stats: Vec<AbilityAccuracyStats>,
    /// Event-weighted accuracy over `ability_stats`; zero without stats.
    pub overall_accuracy: f64,
    /// Every hit of the player, including abilities below the sample minimum.
    pub total_events: usize,
    /// Number of critical-hit predictions.
    pub total_predictions: usize,
    /// Mean accuracy of the critical-hit predictions; 100 without any.
    pub mean_prediction_accuracy: f64,
    pub modifier_summary: ModifierSummary,
}

/// Accuracy of the modifier model over a whole fight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FightAccuracyReport {
    /// Players with at least one hit, most hits first.
    pub player_reports: Vec<PlayerAccuracyReport>,
    pub overall_accuracy: f64,
    pub total_events: usize,
    pub total_predictions: usize,
}

/// Everything needed to analyze one fight.
#[derive(Debug, Clone, Default)]
pub struct FightInput {
    pub damage_events: Vec<DamageEvent>,
    pub indices: FightIndices,
    pub players: BTreeMap<ActorId, PlayerData>,
    pub snapshots: BTreeMap<ActorId, CombatantSnapshot>,
    pub fight_start: Timestamp,
    pub resistance: TargetResistance,
}

/// Builds reports from a composer and an ability-name table.
#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder<'a> {
    composer: &'a ModifierComposer,
    names: &'a AbilityNames,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(composer: &'a ModifierComposer, names: &'a AbilityNames) -> Self {
        Self { composer, names }
    }

    /// Report for the hits `player` dealt among `events`.
    #[allow(clippy::too_many_arguments)]
    pub fn player_report(
        &self,
        player: ActorId,
        player_name: impl Into<String>,
        events: &[DamageEvent],
        indices: &FightIndices,
        loadout: Loadout<'_>,
        resistance: &TargetResistance,
        fight_start: Timestamp,
    ) -> PlayerAccuracyReport {
        let inference = TooltipInference::new(self.composer.config());
        let resolver = self.composer.prepare(indices, loadout);

        let analyzed: Vec<EventAnalysis> = events
            .iter()
            .filter(|e| e.source == player)
            .map(|e| {
                inference.analyze_event(&resolver, e, resistance.for_target(e.target), fight_start)
            })
            .collect();

        let total_events = analyzed.len();
        let modifier_summary = ModifierSummary::from_modifiers(analyzed.iter().map(|a| &a.modifiers));

        let mut by_ability: BTreeMap<AbilityId, Vec<EventAnalysis>> = BTreeMap::new();
        for analysis in analyzed {
            by_ability
                .entry(analysis.event.ability)
                .or_default()
                .push(analysis);
        }

        let min_events = self.composer.config().min_events_for_stats;
        let mut ability_stats: Vec<AbilityAccuracyStats> = by_ability
            .iter()
            .filter(|(_, hits)| hits.len() >= min_events)
            .map(|(&ability, hits)| inference.ability_stats(ability, self.names.name(ability), hits))
            .collect();
        ability_stats.sort_by(|a, b| b.total_events.cmp(&a.total_events));

        let crit_accuracies: RunningStats = ability_stats
            .iter()
            .flat_map(|s| s.critical_predictions())
            .map(|p| p.accuracy)
            .collect();
        let mean_prediction_accuracy = if crit_accuracies.count() > 0 {
            crit_accuracies.mean()
        } else {
            100.0
        };

        let overall_accuracy = weighted_accuracy(
            ability_stats
                .iter()
                .map(|s| (s.accuracy_score, s.total_events)),
        );

        tracing::debug!(
            player = %player,
            events = total_events,
            abilities = ability_stats.len(),
            overall_accuracy,
            "player report"
        );

        PlayerAccuracyReport {
            player,
            player_name: player_name.into(),
            overall_accuracy,
            total_events,
            total_predictions: crit_accuracies.count(),
            mean_prediction_accuracy,
            modifier_summary,
            ability_stats,
        }
    }

    /// Report for every friendly player who hit an enemy.
    ///
    /// Attackers without [`PlayerData`] are skipped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use esolens::{AbilityNames, DamageEvent, ModifierComposer, PlayerData};
    /// use esolens::report::{FightInput, ReportBuilder};
    ///
    /// let composer = ModifierComposer::with_defaults().unwrap();
    /// let names = AbilityNames::new();
    /// let mut input = FightInput::default();
    /// input.players.insert(1.into(), PlayerData::new(1, "Tank"));
    /// input.damage_events = vec![
    ///     DamageEvent::new(1000, 1, 100, 183006, 5000.0),
    ///     DamageEvent::new(2000, 1, 100, 183006, 5000.0),
    ///     DamageEvent::new(2500, 100, 101, 183006, 9000.0).with_sides(false, false),
    /// ];
    ///
    /// let report = ReportBuilder::new(&composer, &names).fight_report(&input);
    /// assert_eq!(report.total_events, 2);
    /// ```
    pub fn fight_report(&self, input: &FightInput) -> FightAccuracyReport {
        let friendly: Vec<DamageEvent> = input
            .damage_events
            .iter()
            .filter(|e| e.is_friendly_to_hostile())
            .cloned()
            .collect();
        let attackers: BTreeSet<ActorId> = friendly.iter().map(|e| e.source).collect();

        let mut player_reports: Vec<PlayerAccuracyReport> = attackers
            .into_iter()
            .filter_map(|id| {
                let Some(player) = input.players.get(&id) else {
                    tracing::debug!(actor = %id, "no player data, skipping attacker");
                    return None;
                };
                let loadout = Loadout::new(input.snapshots.get(&id), Some(player));
                let report = self.player_report(
                    id,
                    player.name.clone(),
                    &friendly,
                    &input.indices,
                    loadout,
                    &input.resistance,
                    input.fight_start,
                );
                (report.total_events > 0).then_some(report)
            })
            .collect();
        player_reports.sort_by(|a, b| b.total_events.cmp(&a.total_events));

        let total_events = player_reports.iter().map(|r| r.total_events).sum();
        let total_predictions = player_reports.iter().map(|r| r.total_predictions).sum();
        let overall_accuracy = weighted_accuracy(
            player_reports
                .iter()
                .map(|r| (r.overall_accuracy, r.total_events)),
        );

        tracing::info!(
            players = player_reports.len(),
            total_events,
            overall_accuracy,
            "fight accuracy report"
        );

        FightAccuracyReport {
            player_reports,
            overall_accuracy,
            total_events,
            total_predictions,
        }
    }

    /// Reports for many independent fights, computed in parallel.
    ///
    /// The output order matches `fights`.
    pub fn fight_reports(&self, fights: &[FightInput]) -> Vec<FightAccuracyReport> {
        fights.par_iter().map(|f| self.fight_report(f)).collect()
    }
}

fn weighted_accuracy(items: impl Iterator<Item = (f64, usize)>) -> f64 {
    let (weighted, total) = items.fold((0.0, 0usize), |(sum, n), (accuracy, events)| {
        (sum + accuracy * events as f64, n + events)
    });
    if total > 0 {
        weighted / total as f64
    } else {
        0.0
    }
}
