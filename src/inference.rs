//! Tooltip inference and accuracy statistics.
//!
//! Every hit is divided by its composed multiplier to recover the ability's
//! base ("tooltip") damage. Repeated casts of one ability should all recover
//! the same base, so the spread of the inferred values, and the way it
//! splits by hit type or modifier combination, shows where the modifier
//! model is wrong.

use crate::composer::{ModifierResult, PlayerResolver};
use crate::config::EngineConfig;
use crate::event::{DamageEvent, HitType};
use crate::ids::{AbilityId, Timestamp};
use crate::stats::{self, RunningStats};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// One hit with its modifiers and inferred base damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAnalysis {
    pub event: DamageEvent,
    pub modifiers: ModifierResult,
    pub inferred_base: f64,
    /// False when the multiplier was not positive and the raw amount was
    /// used instead. Unreliable hits are left out of every statistic.
    pub reliable: bool,
    /// Seconds since the fight started.
    pub relative_time: f64,
}

/// Invert a multiplier, falling back to the raw amount when it is unusable.
///
/// Returns the inferred base and whether it is reliable.
///
/// # Examples
///
/// ```rust
/// use esolens::inference::infer_base;
///
/// assert_eq!(infer_base(1000.0, 0.5), (2000.0, true));
/// assert_eq!(infer_base(1000.0, 0.0), (1000.0, false));
/// ```
pub fn infer_base(amount: f64, total_multiplier: f64) -> (f64, bool) {
    if total_multiplier > 0.0 && total_multiplier.is_finite() {
        (amount / total_multiplier, true)
    } else {
        (amount, false)
    }
}

/// Predicted vs. actual damage for one hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub timestamp: Timestamp,
    pub hit_type: HitType,
    pub predicted: f64,
    pub actual: f64,
    pub accuracy: f64,
    /// `actual − predicted`.
    pub difference: f64,
}

/// Direction of a systematic prediction error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bias {
    /// Not enough hits with a non-zero amount.
    Insufficient,
    Unbiased,
    /// Hits land higher than predicted: a damage source is not tracked.
    MissingSource,
    /// Hits land lower than predicted: a tracked source is not really there.
    PhantomSource,
}

/// Mean signed error of the hits against the median base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasReport {
    /// Mean of `(actual − predicted) / actual × 100`.
    pub mean_error_percent: f64,
    /// Hits above their prediction.
    pub above: usize,
    /// Hits below their prediction.
    pub below: usize,
    pub verdict: Bias,
}

/// Comparison of the base inferred from critical and from normal hits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CritSplit {
    /// Fewer than the required hits of either type.
    Insufficient,
    Consistent { difference_percent: f64 },
    /// Crits infer a higher base: the critical damage total is too low.
    MissingCritSource { difference_percent: f64 },
    /// Crits infer a lower base: the critical damage total is too high.
    PhantomCritSource { difference_percent: f64 },
}

/// Hits that share one combination of modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierGroup {
    pub penetration: f64,
    pub damage_done_multiplier: f64,
    pub crit_multiplier: f64,
    pub count: usize,
    pub median_base: f64,
    /// Difference to the largest group's median, in percent.
    pub delta_percent: f64,
    /// The delta is beyond the configured threshold.
    pub flagged: bool,
}

/// A hit whose inferred base is far from the ability's median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlier {
    pub timestamp: Timestamp,
    pub hit_type: HitType,
    pub inferred_base: f64,
    pub deviation_percent: f64,
    /// Timestamp of the hit it was compared with, if any.
    pub baseline: Option<Timestamp>,
    /// Sources active on the outlier but not on the baseline.
    pub gained: Vec<Arc<str>>,
    /// Sources active on the baseline but not on the outlier.
    pub lost: Vec<Arc<str>>,
}

/// Accuracy statistics for one ability of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityAccuracyStats {
    pub ability: AbilityId,
    pub ability_name: String,
    pub total_events: usize,
    pub normal_hits: usize,
    pub critical_hits: usize,
    pub unreliable_events: usize,
    pub mean_normal_base: f64,
    pub std_dev_normal_base: f64,
    /// `std_dev / mean` of the normal-hit bases.
    pub coefficient_of_variation: f64,
    pub mean_all_base: f64,
    pub std_dev_all_base: f64,
    pub median_base: f64,
    pub predictions: Vec<Prediction>,
    /// Mean accuracy over all predictions; 100 without predictions.
    pub accuracy_score: f64,
    pub bias: BiasReport,
    pub crit_split: CritSplit,
    pub modifier_groups: Vec<ModifierGroup>,
    pub outliers: Vec<Outlier>,
}

impl AbilityAccuracyStats {
    /// Predictions of critical hits.
    pub fn critical_predictions(&self) -> impl Iterator<Item = &Prediction> {
        self.predictions
            .iter()
            .filter(|p| p.hit_type == HitType::Critical)
    }
}

/// Per-hit inference and per-ability statistics.
#[derive(Debug, Clone, Copy)]
pub struct TooltipInference<'a> {
    config: &'a EngineConfig,
}

impl<'a> TooltipInference<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Compose and invert one hit.
    pub fn analyze_event(
        &self,
        resolver: &PlayerResolver<'_>,
        event: &DamageEvent,
        resistance: f64,
        fight_start: Timestamp,
    ) -> EventAnalysis {
        let modifiers = resolver.compose(event, resistance);
        let (inferred_base, reliable) = infer_base(event.amount, modifiers.total_multiplier);
        if !reliable {
            tracing::debug!(
                ability = %event.ability,
                timestamp = event.timestamp,
                multiplier = modifiers.total_multiplier,
                "non-positive multiplier, using raw amount"
            );
        }
        EventAnalysis {
            event: event.clone(),
            modifiers,
            inferred_base,
            reliable,
            relative_time: (event.timestamp - fight_start) as f64 / 1000.0,
        }
    }

    /// Statistics for the hits of one ability.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use esolens::{DamageEvent, FightIndices, Loadout, ModifierComposer};
    /// use esolens::inference::TooltipInference;
    ///
    /// let composer = ModifierComposer::with_defaults().unwrap();
    /// let indices = FightIndices::default();
    /// let resolver = composer.prepare(&indices, Loadout::empty());
    /// let inference = TooltipInference::new(composer.config());
    ///
    /// let hits: Vec<_> = (0..5)
    ///     .map(|i| DamageEvent::new(i * 1000, 1, 100, 183006, 3621.0))
    ///     .map(|e| inference.analyze_event(&resolver, &e, 18200.0, 0))
    ///     .collect();
    /// let stats = inference.ability_stats(183006.into(), "Cephaliarch's Flail", &hits);
    ///
    /// assert_eq!(stats.total_events, 5);
    /// assert!(stats.coefficient_of_variation < 1e-9);
    /// assert!((stats.accuracy_score - 100.0).abs() < 1e-9);
    /// ```
    pub fn ability_stats(
        &self,
        ability: AbilityId,
        name: impl Into<String>,
        events: &[EventAnalysis],
    ) -> AbilityAccuracyStats {
        let reliable: Vec<&EventAnalysis> = events.iter().filter(|e| e.reliable).collect();
        let (crits, normals): (Vec<&EventAnalysis>, Vec<&EventAnalysis>) =
            reliable.iter().copied().partition(|e| e.modifiers.is_critical);

        let normal_stats: RunningStats = normals.iter().map(|e| e.inferred_base).collect();
        let all_stats: RunningStats = reliable.iter().map(|e| e.inferred_base).collect();
        let all_bases: Vec<f64> = reliable.iter().map(|e| e.inferred_base).collect();
        let median_base = stats::median(&all_bases).unwrap_or(0.0);

        let baseline = if normal_stats.mean() > 0.0 {
            normal_stats.mean()
        } else {
            all_stats.mean()
        };
        let predictions: Vec<Prediction> = reliable
            .iter()
            .map(|e| {
                let predicted = (baseline * e.modifiers.total_multiplier).round();
                let actual = e.event.amount;
                Prediction {
                    timestamp: e.event.timestamp,
                    hit_type: e.event.hit_type,
                    predicted,
                    actual,
                    accuracy: stats::accuracy_between(predicted, actual),
                    difference: actual - predicted,
                }
            })
            .collect();
        let accuracy_score = if predictions.is_empty() {
            100.0
        } else {
            predictions.iter().map(|p| p.accuracy).sum::<f64>() / predictions.len() as f64
        };

        AbilityAccuracyStats {
            ability,
            ability_name: name.into(),
            total_events: events.len(),
            normal_hits: normals.len(),
            critical_hits: crits.len(),
            unreliable_events: events.len() - reliable.len(),
            mean_normal_base: normal_stats.mean(),
            std_dev_normal_base: normal_stats.sample_std_dev(),
            coefficient_of_variation: normal_stats.coefficient_of_variation(),
            mean_all_base: all_stats.mean(),
            std_dev_all_base: all_stats.sample_std_dev(),
            median_base,
            predictions,
            accuracy_score,
            bias: self.bias(&reliable, median_base),
            crit_split: self.crit_split(&crits, &normals),
            modifier_groups: self.modifier_groups(&reliable),
            outliers: self.outliers(&reliable, median_base),
        }
    }

    fn bias(&self, events: &[&EventAnalysis], reference: f64) -> BiasReport {
        let errors: Vec<f64> = events
            .iter()
            .filter(|e| e.event.amount != 0.0)
            .map(|e| {
                let predicted = reference * e.modifiers.total_multiplier;
                (e.event.amount - predicted) / e.event.amount * 100.0
            })
            .collect();

        if errors.is_empty() {
            return BiasReport {
                mean_error_percent: 0.0,
                above: 0,
                below: 0,
                verdict: Bias::Insufficient,
            };
        }

        let mean_error_percent = errors.iter().sum::<f64>() / errors.len() as f64;
        let threshold = self.config.bias_threshold_percent;
        let verdict = if mean_error_percent > threshold {
            Bias::MissingSource
        } else if mean_error_percent < -threshold {
            Bias::PhantomSource
        } else {
            Bias::Unbiased
        };

        BiasReport {
            mean_error_percent,
            above: errors.iter().filter(|e| **e > 0.0).count(),
            below: errors.iter().filter(|e| **e < 0.0).count(),
            verdict,
        }
    }

    fn crit_split(&self, crits: &[&EventAnalysis], normals: &[&EventAnalysis]) -> CritSplit {
        let min = self.config.crit_split_min_samples;
        if crits.len() < min || normals.len() < min {
            return CritSplit::Insufficient;
        }

        let crit_bases: Vec<f64> = crits.iter().map(|e| e.inferred_base).collect();
        let normal_bases: Vec<f64> = normals.iter().map(|e| e.inferred_base).collect();
        let (Some(crit), Some(normal)) = (stats::median(&crit_bases), stats::median(&normal_bases))
        else {
            return CritSplit::Insufficient;
        };
        let Some(difference_percent) = stats::percent_difference(crit, normal) else {
            return CritSplit::Insufficient;
        };

        let threshold = self.config.crit_split_threshold_percent;
        if difference_percent > threshold {
            CritSplit::MissingCritSource { difference_percent }
        } else if difference_percent < -threshold {
            CritSplit::PhantomCritSource { difference_percent }
        } else {
            CritSplit::Consistent { difference_percent }
        }
    }

    fn modifier_groups(&self, events: &[&EventAnalysis]) -> Vec<ModifierGroup> {
        if events.len() < self.config.modifier_group_min_events {
            return Vec::new();
        }

        // Signature: penetration, damage done and crit multipliers at 4 decimals.
        let mut by_signature: BTreeMap<(i64, i64, i64), Vec<&EventAnalysis>> = BTreeMap::new();
        for event in events {
            let m = &event.modifiers;
            let key = (
                m.penetration.round() as i64,
                (m.damage_done.multiplier * 10_000.0).round() as i64,
                (m.crit_multiplier * 10_000.0).round() as i64,
            );
            by_signature.entry(key).or_default().push(event);
        }

        let mut groups: Vec<ModifierGroup> = by_signature
            .into_values()
            .filter(|members| members.len() >= self.config.modifier_group_min_size)
            .filter_map(|members| {
                let bases: Vec<f64> = members.iter().map(|e| e.inferred_base).collect();
                let first = &members[0].modifiers;
                Some(ModifierGroup {
                    penetration: first.penetration,
                    damage_done_multiplier: first.damage_done.multiplier,
                    crit_multiplier: first.crit_multiplier,
                    count: members.len(),
                    median_base: stats::median(&bases)?,
                    delta_percent: 0.0,
                    flagged: false,
                })
            })
            .collect();

        if groups.len() < 2 {
            return Vec::new();
        }

        // Stable sort keeps signature order among equal counts.
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        let reference = groups[0].median_base;
        for group in &mut groups {
            group.delta_percent = stats::percent_difference(group.median_base, reference).unwrap_or(0.0);
            group.flagged = group.delta_percent.abs() > self.config.modifier_group_delta_percent;
        }
        groups
    }

    fn outliers(&self, events: &[&EventAnalysis], reference: f64) -> Vec<Outlier> {
        if reference <= 0.0 {
            return Vec::new();
        }
        let threshold = self.config.outlier_threshold_percent;
        let deviation = |e: &EventAnalysis| (e.inferred_base - reference) / reference * 100.0;
        let is_outlier = |e: &EventAnalysis| deviation(e).abs() > threshold;

        let first_inlier = |hit_type: Option<HitType>| {
            events
                .iter()
                .find(|e| !is_outlier(e) && hit_type.map_or(true, |h| e.event.hit_type == h))
                .copied()
        };

        events
            .iter()
            .filter(|e| is_outlier(e))
            .map(|e| {
                let baseline = first_inlier(Some(e.event.hit_type)).or_else(|| first_inlier(None));
                let (gained, lost) = match baseline {
                    Some(b) => diff_sources(e, b),
                    None => (Vec::new(), Vec::new()),
                };
                Outlier {
                    timestamp: e.event.timestamp,
                    hit_type: e.event.hit_type,
                    inferred_base: e.inferred_base,
                    deviation_percent: deviation(e),
                    baseline: baseline.map(|b| b.event.timestamp),
                    gained,
                    lost,
                }
            })
            .collect()
    }
}

fn diff_sources(outlier: &EventAnalysis, baseline: &EventAnalysis) -> (Vec<Arc<str>>, Vec<Arc<str>>) {
    let names = |e: &EventAnalysis| -> BTreeSet<Arc<str>> {
        e.modifiers
            .active_sources
            .iter()
            .map(|s| s.name.clone())
            .collect()
    };
    let ours = names(outlier);
    let theirs = names(baseline);
    (
        ours.difference(&theirs).cloned().collect(),
        theirs.difference(&ours).cloned().collect(),
    )
}
