//! Engine configuration.
//!
//! Every constant of the damage formula and of the statistical diagnostics is
//! a field here. The defaults match live game values.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Tunable constants for modifier composition and accuracy analysis.
///
/// Missing fields take their defaults when deserialized, so a JSON document
/// only has to name the values it overrides.
///
/// # Examples
///
/// ```rust
/// use esolens::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{ "penetration_cap": 20000 }"#).unwrap();
///
/// assert_eq!(config.penetration_cap, 20000.0);
/// assert_eq!(config.resistance_divisor, 660.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum penetration that counts against resistance.
    pub penetration_cap: f64,
    /// Resistance per percent of damage reduction.
    pub resistance_divisor: f64,
    /// Ceiling on effective resistance.
    pub max_resistance: f64,
    /// Ceiling on damage reduction, in percent.
    pub max_damage_reduction_percent: f64,
    /// Critical damage every character has, in percent.
    pub base_critical_damage: f64,
    /// Resistance assumed for targets without an override.
    pub default_target_resistance: f64,
    /// Minimum hits of an ability before it gets statistics.
    pub min_events_for_stats: usize,
    /// Deviation from the median, in percent, beyond which a hit is an outlier.
    pub outlier_threshold_percent: f64,
    /// Mean signed error, in percent, beyond which an ability is biased.
    pub bias_threshold_percent: f64,
    /// Crit vs. normal median difference, in percent, that flags a crit source.
    pub crit_split_threshold_percent: f64,
    /// Hits of each type needed before the crit split is evaluated.
    pub crit_split_min_samples: usize,
    /// Hits an ability needs before modifier groups are compared.
    pub modifier_group_min_events: usize,
    /// Hits a modifier group needs to be compared.
    pub modifier_group_min_size: usize,
    /// Median difference, in percent, that flags a modifier group.
    pub modifier_group_delta_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            penetration_cap: 18200.0,
            resistance_divisor: 660.0,
            max_resistance: 33000.0,
            max_damage_reduction_percent: 50.0,
            base_critical_damage: 50.0,
            default_target_resistance: 18200.0,
            min_events_for_stats: 2,
            outlier_threshold_percent: 10.0,
            bias_threshold_percent: 2.0,
            crit_split_threshold_percent: 2.0,
            crit_split_min_samples: 3,
            modifier_group_min_events: 10,
            modifier_group_min_size: 3,
            modifier_group_delta_percent: 3.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// The divisor must be positive, percentages and caps must be finite and
    /// non-negative, and the damage reduction ceiling cannot exceed 100.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("penetration_cap", self.penetration_cap),
            ("max_resistance", self.max_resistance),
            ("max_damage_reduction_percent", self.max_damage_reduction_percent),
            ("base_critical_damage", self.base_critical_damage),
            ("default_target_resistance", self.default_target_resistance),
            ("outlier_threshold_percent", self.outlier_threshold_percent),
            ("bias_threshold_percent", self.bias_threshold_percent),
            ("crit_split_threshold_percent", self.crit_split_threshold_percent),
            ("modifier_group_delta_percent", self.modifier_group_delta_percent),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{} must be a finite non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !self.resistance_divisor.is_finite() || self.resistance_divisor <= 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "resistance_divisor must be positive, got {}",
                self.resistance_divisor
            )));
        }

        if self.max_damage_reduction_percent > 100.0 {
            return Err(EngineError::InvalidConfig(format!(
                "max_damage_reduction_percent cannot exceed 100, got {}",
                self.max_damage_reduction_percent
            )));
        }

        if self.min_events_for_stats == 0 {
            return Err(EngineError::InvalidConfig(
                "min_events_for_stats must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_zero_divisor_rejected() {
        let result = EngineConfig::from_json_str(r#"{ "resistance_divisor": 0 }"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_reduction_above_100_rejected() {
        let config = EngineConfig {
            max_damage_reduction_percent: 150.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let result = EngineConfig::from_json_str("{ penetration_cap: }");
        assert!(matches!(result, Err(EngineError::ConfigParse(_))));
    }
}
