use esolens::abilities::{self, MAJOR_BERSERK};
use esolens::normalize::{normalize_buff_events, normalize_damage_events};
use esolens::*;
use serde_json::json;

fn input_with(events: Vec<DamageEvent>) -> FightInput {
    let mut input = FightInput::default();
    input.players.insert(ActorId::new(1), PlayerData::new(1, "Dps"));
    input.players.insert(ActorId::new(2), PlayerData::new(2, "Healer"));
    input.damage_events = events;
    input
}

/// Hostile-sourced damage never reaches the report.
#[test]
fn test_fight_report_excludes_hostile_sources() {
    let composer = ModifierComposer::with_defaults().unwrap();
    let names = AbilityNames::new();
    let input = input_with(vec![
        DamageEvent::new(1000, 1, 100, 7u32, 3000.0),
        DamageEvent::new(2000, 2, 100, 7u32, 3000.0),
        DamageEvent::new(3000, 100, 1, 9u32, 9000.0).with_sides(false, false),
    ]);

    let report = ReportBuilder::new(&composer, &names).fight_report(&input);
    assert_eq!(report.total_events, 2);
    assert_eq!(report.player_reports.len(), 2);
}

/// No events, no report content.
#[test]
fn test_empty_input_gives_empty_report() {
    let composer = ModifierComposer::with_defaults().unwrap();
    let names = AbilityNames::new();

    let report = ReportBuilder::new(&composer, &names).fight_report(&input_with(Vec::new()));
    assert!(report.player_reports.is_empty());
    assert_eq!(report.total_events, 0);
    assert_eq!(report.total_predictions, 0);
    assert_eq!(report.overall_accuracy, 0.0);
}

/// Raw records flow through normalization into a sorted report.
#[test]
fn test_report_from_raw_records() {
    let buff_records = vec![
        json!({"timestamp": 0, "type": "applybuff", "sourceID": 1, "targetID": 1, "abilityGameID": MAJOR_BERSERK.get()}),
        json!({"timestamp": 5000, "type": "removebuff", "sourceID": 1, "targetID": 1, "abilityGameID": MAJOR_BERSERK.get()}),
    ];
    let buffs = normalize_buff_events(&buff_records);
    let indices = FightIndices::build(
        &buffs.buffs,
        &buffs.debuffs,
        20_000,
        &abilities::default_alias_groups(),
    )
    .unwrap();

    // 3000 base, +10% while berserk, no resistance
    let mut damage_records = Vec::new();
    for t in [1000, 2000, 3000, 4000] {
        damage_records.push(json!({
            "timestamp": t, "sourceID": 1, "targetID": 100, "abilityGameID": 7,
            "amount": 3300, "hitType": 1
        }));
    }
    for t in [6000, 7000, 8000] {
        damage_records.push(json!({
            "timestamp": t, "sourceID": 1, "targetID": 100, "abilityGameID": 7,
            "amount": 3000, "hitType": 1
        }));
    }
    for t in [1500, 2500] {
        damage_records.push(json!({
            "timestamp": t, "sourceID": 2, "targetID": 100, "abilityGameID": 8,
            "amount": 500, "hitType": 1
        }));
    }
    damage_records.push(json!({"timestamp": 9000, "sourceID": 1}));

    let mut input = input_with(normalize_damage_events(&damage_records));
    input.indices = indices;
    input.resistance = TargetResistance::uniform(0.0);

    let composer = ModifierComposer::with_defaults().unwrap();
    let names: AbilityNames = [(AbilityId::new(7), "Jabs")].into_iter().collect();
    let report = ReportBuilder::new(&composer, &names).fight_report(&input);

    assert_eq!(report.total_events, 9);
    assert_eq!(report.player_reports[0].player_name, "Dps");
    let dps = &report.player_reports[0];
    assert_eq!(dps.total_events, 7);
    let jabs = &dps.ability_stats[0];
    assert_eq!(jabs.ability_name, "Jabs");
    assert!(jabs.coefficient_of_variation < 1e-9);
    assert!((jabs.accuracy_score - 100.0).abs() < 1e-9);
    assert!((dps.overall_accuracy - 100.0).abs() < 1e-9);
    assert!((dps.modifier_summary.damage_done_multiplier.max - 1.1).abs() < 1e-9);
    assert_eq!(dps.modifier_summary.damage_done_multiplier.min, 1.0);
}
