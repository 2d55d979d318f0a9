//! Error types for the engine.
//!
//! Only structural defects are errors. Expected gaps in the data (missing
//! loadouts, zero multipliers, empty inputs) resolve to zero contributions or
//! empty reports instead.

use crate::ids::{AbilityId, ActorId, Timestamp};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building indices, registries or configuration.
///
/// # Examples
///
/// ```rust
/// use esolens::{AbilityId, ActorId, EngineError};
///
/// let err = EngineError::InvertedInterval {
///     ability: AbilityId::new(61743),
///     target: ActorId::new(7),
///     start: 5000,
///     end: 1000,
/// };
/// assert!(err.to_string().contains("61743"));
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// An interval would close before it opened.
    ///
    /// This happens when the fight end lies before an interval that is
    /// still open, and means the input timeline is inconsistent.
    #[error("interval for ability {ability} on target {target} ends at {end} before it starts at {start}")]
    InvertedInterval {
        ability: AbilityId,
        target: ActorId,
        start: Timestamp,
        end: Timestamp,
    },

    /// An alias group was declared without any member ids.
    #[error("alias group `{0}` has no members")]
    EmptyAliasGroup(String),

    /// The same ability id was placed in two alias groups.
    #[error("ability {ability} is in both alias groups `{first}` and `{second}`")]
    OverlappingAliasGroups {
        ability: AbilityId,
        first: String,
        second: String,
    },

    /// Two sources in one registry share a name.
    ///
    /// Names identify sources in breakdowns and outlier diffs, so they
    /// must be unique per registry.
    #[error("registry `{registry}` contains source `{name}` more than once")]
    DuplicateSource { registry: String, name: String },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::ConfigParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::EmptyAliasGroup("Lucent Echoes".to_string());
        assert!(err.to_string().contains("Lucent Echoes"));
    }

    #[test]
    fn test_overlapping_alias_display() {
        let err = EngineError::OverlappingAliasGroups {
            ability: AbilityId::new(1),
            first: "A".to_string(),
            second: "B".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("`A`"));
        assert!(display.contains("`B`"));
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: EngineError = parse.unwrap_err().into();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }
}
