//! Accuracy report example: one player, one ability, a buff window
//!
//! This example demonstrates:
//! - Normalizing raw log records
//! - Building the buff/debuff indices
//! - Composing the modifiers of a single hit
//! - Producing a fight accuracy report

use esolens::abilities::{self, MAJOR_BREACH, MINOR_BERSERK};
use esolens::normalize::{normalize_buff_events, normalize_damage_events};
use esolens::snapshot::{slot, Talent};
use esolens::*;
use serde_json::json;

fn main() -> Result<()> {
    println!("=== Damage Accuracy Demo ===\n");

    // ===== Indices =====
    println!("1. Buff and debuff intervals\n");

    let raw_buffs = vec![
        json!({"timestamp": 1000, "type": "applybuff", "sourceID": 1, "targetID": 1, "abilityGameID": MINOR_BERSERK.get()}),
        json!({"timestamp": 9000, "type": "removebuff", "sourceID": 1, "targetID": 1, "abilityGameID": MINOR_BERSERK.get()}),
        json!({"timestamp": 0, "type": "applydebuff", "sourceID": 2, "targetID": 100, "abilityGameID": MAJOR_BREACH.get()}),
    ];
    let normalized = normalize_buff_events(&raw_buffs);
    let indices = FightIndices::build(
        &normalized.buffs,
        &normalized.debuffs,
        20_000,
        &abilities::default_alias_groups(),
    )?;
    println!(
        "  Minor Berserk active at 5s: {}",
        indices.buffs.is_active_at(MINOR_BERSERK, 5000, Some(1.into()))
    );
    println!(
        "  Major Breach on target 100 at 15s: {}\n",
        indices.debuffs.is_active_at(MAJOR_BREACH, 15_000, Some(100.into()))
    );

    // ===== Single hit =====
    println!("2. Composing one hit\n");

    let snapshot = CombatantSnapshot {
        gear: vec![GearPiece::new(slot::MAIN_HAND, 0u32, 4)],
        talents: vec![Talent::new(183006u32, "Cephaliarch's Flail")],
        ..Default::default()
    };
    let player = PlayerData::new(1, "Dps");
    let loadout = Loadout::new(Some(&snapshot), Some(&player));

    let composer = ModifierComposer::with_defaults()?;
    let hit = DamageEvent::new(5000, 1, 100, 183006, 6800.0).critical();
    let result = composer.compose(&hit, &indices, loadout, 18200.0);

    println!("  Penetration:      {:.0}", result.penetration);
    println!("  Damage reduction: {:.2}%", result.damage_reduction_percent);
    println!("  Crit multiplier:  {:.2}", result.crit_multiplier);
    println!("  Damage done:      {:.4}", result.damage_done.multiplier);
    println!("  Total multiplier: {:.4}", result.total_multiplier);
    for source in &result.active_sources {
        println!("    {:?} {} +{}", source.channel, source.name, source.value);
    }
    println!();

    // ===== Fight report =====
    println!("3. Fight report\n");

    let raw_damage: Vec<_> = (0..12)
        .map(|i| {
            let hit_type = if i % 4 == 0 { 2 } else { 1 };
            json!({
                "timestamp": 2000 + i * 1500, "sourceID": 1, "targetID": 100,
                "abilityGameID": 183006, "amount": 4200 + (i % 3) * 10,
                "hitType": hit_type
            })
        })
        .collect();

    let mut input = FightInput {
        damage_events: normalize_damage_events(&raw_damage),
        indices,
        ..Default::default()
    };
    input.players.insert(player.id, player.clone());
    input.snapshots.insert(player.id, snapshot.clone());

    let names: AbilityNames = [(AbilityId::new(183006), "Cephaliarch's Flail")]
        .into_iter()
        .collect();
    let report = ReportBuilder::new(&composer, &names).fight_report(&input);

    println!("  Overall accuracy: {:.2}%", report.overall_accuracy);
    for player in &report.player_reports {
        println!("  {} ({} hits)", player.player_name, player.total_events);
        for ability in &player.ability_stats {
            println!(
                "    {}: base {:.0}, CV {:.4}, accuracy {:.2}%, bias {:?}",
                ability.ability_name,
                ability.mean_normal_base,
                ability.coefficient_of_variation,
                ability.accuracy_score,
                ability.bias.verdict
            );
        }
    }

    Ok(())
}
