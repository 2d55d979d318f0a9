//! Conversion of raw log records into typed events.
//!
//! Records arrive as loosely typed JSON objects. Anything with a missing or
//! non-numeric required field is dropped; normalization never fails.

use crate::event::{BuffEventKind, DamageEvent, HitType, TimedBuffEvent};
use crate::ids::{AbilityId, ActorId};
use serde_json::Value;

/// Typed buff and debuff events, split by family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBuffs {
    pub buffs: Vec<TimedBuffEvent>,
    pub debuffs: Vec<TimedBuffEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Buff,
    Debuff,
}

fn classify(kind: &str) -> Option<(Family, BuffEventKind)> {
    Some(match kind {
        "applybuff" => (Family::Buff, BuffEventKind::Apply),
        "applybuffstack" => (Family::Buff, BuffEventKind::ApplyStack),
        "removebuff" => (Family::Buff, BuffEventKind::Remove),
        "applydebuff" => (Family::Debuff, BuffEventKind::Apply),
        "applydebuffstack" => (Family::Debuff, BuffEventKind::ApplyStack),
        "removedebuff" => (Family::Debuff, BuffEventKind::Remove),
        _ => return None,
    })
}

fn int_field(record: &Value, key: &str) -> Option<i64> {
    let value = record.get(key)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn actor(record: &Value, key: &str) -> Option<ActorId> {
    int_field(record, key).map(ActorId::new)
}

fn ability(record: &Value) -> Option<AbilityId> {
    int_field(record, "abilityGameID")
        .and_then(|id| u32::try_from(id).ok())
        .map(AbilityId::new)
}

fn buff_event(record: &Value) -> Option<(Family, TimedBuffEvent)> {
    let kind = record.get("type")?.as_str()?;
    let Some((family, kind)) = classify(kind) else {
        // removebuffstack and friends carry nothing the index needs
        tracing::trace!(kind, "ignoring record type");
        return None;
    };
    let mut event = TimedBuffEvent::new(
        int_field(record, "timestamp")?,
        kind,
        actor(record, "sourceID")?,
        actor(record, "targetID")?,
        ability(record)?,
    );
    event.stacks = int_field(record, "stack").and_then(|s| u32::try_from(s).ok());
    Some((family, event))
}

/// Normalize buff and debuff records in one pass.
///
/// # Examples
///
/// ```rust
/// use esolens::normalize::normalize_buff_events;
/// use serde_json::json;
///
/// let records = vec![
///     json!({"timestamp": 1000, "type": "applybuff", "sourceID": 1, "targetID": 1, "abilityGameID": 61744}),
///     json!({"timestamp": 1200, "type": "applydebuff", "sourceID": 1, "targetID": 100, "abilityGameID": 79717}),
///     json!({"timestamp": 1300, "type": "removebuffstack", "sourceID": 1, "targetID": 1, "abilityGameID": 61744}),
///     json!({"timestamp": "soon", "type": "removebuff", "sourceID": 1, "targetID": 1, "abilityGameID": 61744}),
/// ];
///
/// let normalized = normalize_buff_events(&records);
/// assert_eq!(normalized.buffs.len(), 1);
/// assert_eq!(normalized.debuffs.len(), 1);
/// ```
pub fn normalize_buff_events(records: &[Value]) -> NormalizedBuffs {
    let mut out = NormalizedBuffs::default();
    let mut dropped = 0usize;
    for record in records {
        match buff_event(record) {
            Some((Family::Buff, event)) => out.buffs.push(event),
            Some((Family::Debuff, event)) => out.debuffs.push(event),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(dropped, kept = out.buffs.len() + out.debuffs.len(), "buff records dropped");
    }
    out
}

fn hit_type(record: &Value) -> HitType {
    match record.get("hitType") {
        Some(Value::Number(n)) if n.as_i64() == Some(2) => HitType::Critical,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("critical") => HitType::Critical,
        _ => HitType::Normal,
    }
}

fn damage_event(record: &Value) -> Option<DamageEvent> {
    let amount = record.get("amount")?.as_f64().filter(|a| a.is_finite())?;
    let mut event = DamageEvent::new(
        int_field(record, "timestamp")?,
        actor(record, "sourceID")?,
        actor(record, "targetID")?,
        ability(record)?,
        amount,
    );
    event.hit_type = hit_type(record);
    event.tick = record.get("tick").and_then(Value::as_bool).unwrap_or(false);
    if let Some(friendly) = record.get("sourceIsFriendly").and_then(Value::as_bool) {
        event.source_is_friendly = friendly;
    }
    if let Some(friendly) = record.get("targetIsFriendly").and_then(Value::as_bool) {
        event.target_is_friendly = friendly;
    }
    event.buffs = record
        .get("buffs")
        .and_then(Value::as_str)
        .map(parse_buff_snapshot);
    Some(event)
}

/// Normalize damage records, dropping malformed ones.
///
/// `hitType` is critical for `2` or `"Critical"`, normal otherwise. Missing
/// friendliness flags default to a friendly source and a hostile target.
pub fn normalize_damage_events(records: &[Value]) -> Vec<DamageEvent> {
    let events: Vec<DamageEvent> = records.iter().filter_map(damage_event).collect();
    let dropped = records.len() - events.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = events.len(), "damage records dropped");
    }
    events
}

/// Parse a dot-separated buff snapshot, skipping pieces that are not ids.
///
/// # Examples
///
/// ```rust
/// use esolens::normalize::parse_buff_snapshot;
///
/// let ids = parse_buff_snapshot("61744.12345.");
/// assert_eq!(ids, vec![61744.into(), 12345.into()]);
/// ```
pub fn parse_buff_snapshot(snapshot: &str) -> Vec<AbilityId> {
    snapshot
        .split('.')
        .filter_map(|piece| piece.trim().parse::<u32>().ok())
        .map(AbilityId::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stack_events_map_to_apply_stack() {
        let records = vec![json!({
            "timestamp": 10, "type": "applydebuffstack", "sourceID": 1,
            "targetID": 100, "abilityGameID": 88401, "stack": 3
        })];
        let normalized = normalize_buff_events(&records);
        assert!(normalized.buffs.is_empty());
        let event = &normalized.debuffs[0];
        assert_eq!(event.kind, BuffEventKind::ApplyStack);
        assert_eq!(event.stacks, Some(3));
    }

    #[test]
    fn test_negative_ability_id_is_dropped() {
        let records = vec![json!({
            "timestamp": 10, "type": "applybuff", "sourceID": 1,
            "targetID": 1, "abilityGameID": -5
        })];
        assert_eq!(normalize_buff_events(&records), NormalizedBuffs::default());
    }

    #[test]
    fn test_non_integral_numbers_are_dropped() {
        let records = vec![
            json!({"timestamp": 1000.5, "type": "applybuff", "sourceID": 1, "targetID": 1, "abilityGameID": 7}),
            json!({"timestamp": 1e30, "type": "applybuff", "sourceID": 1, "targetID": 1, "abilityGameID": 7}),
            json!({"timestamp": 10, "type": "applybuff", "sourceID": 1.5, "targetID": 1, "abilityGameID": 7}),
            json!({"timestamp": 2000.0, "type": "applybuff", "sourceID": 1, "targetID": 1, "abilityGameID": 7}),
        ];
        let normalized = normalize_buff_events(&records);
        assert_eq!(normalized.buffs.len(), 1);
        assert_eq!(normalized.buffs[0].timestamp, 2000);
    }

    #[test]
    fn test_damage_record_fields() {
        let records = vec![
            json!({
                "timestamp": 1500, "sourceID": 1, "targetID": 100, "abilityGameID": 183006,
                "amount": 5123, "hitType": 2, "tick": true, "buffs": "61744.61737.",
                "sourceIsFriendly": true, "targetIsFriendly": false
            }),
            json!({
                "timestamp": 1600, "sourceID": 1, "targetID": 100, "abilityGameID": 183006
            }),
        ];
        let events = normalize_damage_events(&records);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert!(event.is_critical());
        assert!(!event.is_direct());
        assert_eq!(event.amount, 5123.0);
        assert_eq!(
            event.buffs.as_deref(),
            Some(&[AbilityId::new(61744), AbilityId::new(61737)][..])
        );
    }

    #[test]
    fn test_string_hit_type() {
        let records = vec![json!({
            "timestamp": 0, "sourceID": 1, "targetID": 2, "abilityGameID": 3,
            "amount": 1.0, "hitType": "Critical"
        })];
        assert!(normalize_damage_events(&records)[0].is_critical());
    }

    #[test]
    fn test_parse_buff_snapshot_skips_garbage() {
        assert_eq!(parse_buff_snapshot(""), Vec::<AbilityId>::new());
        assert_eq!(parse_buff_snapshot("1.x.2"), vec![AbilityId::new(1), AbilityId::new(2)]);
    }
}
