use esolens::abilities::{
    self, BALORGH, EMPOWER, LUCENT_ECHOES_RECIPIENT, MAJOR_BREACH, MAJOR_SLAYER, MINOR_BERSERK,
    MINOR_BRITTLE, MINOR_VULNERABILITY, SUL_XAN_TORMENT,
};
use esolens::catalog;
use esolens::inference::TooltipInference;
use esolens::snapshot::{slot, Aura, Talent};
use esolens::*;

const EPSILON: f64 = 1e-9;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn indices(buffs: &[TimedBuffEvent], debuffs: &[TimedBuffEvent], end: Timestamp) -> FightIndices {
    FightIndices::build(buffs, debuffs, end, &abilities::default_alias_groups()).unwrap()
}

fn crit_registries(critical_damage: SourceRegistry) -> Registries {
    Registries {
        penetration: catalog::penetration_registry().unwrap(),
        critical_damage,
        damage: catalog::damage_registry().unwrap(),
    }
}

/// Target resistance maps to damage reduction with the documented clamps.
#[test]
fn test_resistance_to_damage_reduction() {
    let composer = ModifierComposer::with_defaults().unwrap();
    let idx = FightIndices::default();
    let hit = DamageEvent::new(0, 1, 100, 1u32, 1000.0);

    let typical = composer.compose(&hit, &idx, Loadout::empty(), 18200.0);
    assert!((typical.damage_reduction_percent - 27.575).abs() < 1e-3);
    assert!((typical.total_multiplier - 0.7242).abs() < 1e-4);

    let extreme = composer.compose(&hit, &idx, Loadout::empty(), 100_000.0);
    assert_eq!(extreme.damage_reduction_percent, 50.0);
    assert!(approx(extreme.total_multiplier, 0.5));

    let none = composer.compose(&hit, &idx, Loadout::empty(), 0.0);
    assert_eq!(none.damage_reduction_percent, 0.0);
    assert!(approx(none.total_multiplier, 1.0));
}

/// Base critical damage is 50 and buffs/debuffs add to it.
#[test]
fn test_critical_damage_stacking() {
    let registry = SourceRegistry::new(
        "critical damage",
        vec![
            ModifierSource::new(
                "Lucent Echoes",
                Channel::CriticalDamage,
                SourceKind::Buff {
                    ability: LUCENT_ECHOES_RECIPIENT,
                    value: 11.0,
                },
            ),
            ModifierSource::new(
                "Minor Brittle",
                Channel::CriticalDamage,
                SourceKind::Debuff {
                    ability: MINOR_BRITTLE,
                    value: 10.0,
                },
            ),
        ],
    )
    .unwrap();
    let composer = ModifierComposer::new(EngineConfig::default(), crit_registries(registry)).unwrap();

    let bare = composer.compose(
        &DamageEvent::new(0, 1, 100, 1u32, 1000.0).critical(),
        &FightIndices::default(),
        Loadout::empty(),
        0.0,
    );
    assert!(approx(bare.crit_damage_bonus, 50.0));
    assert!(approx(bare.crit_multiplier, 1.5));

    let idx = indices(
        &[TimedBuffEvent::apply(1000, 2, 1, LUCENT_ECHOES_RECIPIENT)],
        &[TimedBuffEvent::apply(1000, 3, 100, MINOR_BRITTLE)],
        10_000,
    );
    let buffed = composer.compose(
        &DamageEvent::new(2000, 1, 100, 1u32, 1000.0).critical(),
        &idx,
        Loadout::empty(),
        0.0,
    );
    assert!(approx(buffed.crit_damage_bonus, 71.0));
    assert_eq!(buffed.active_sources.len(), 2);

    let normal = composer.compose(&DamageEvent::new(2000, 1, 100, 1u32, 1000.0), &idx, Loadout::empty(), 0.0);
    assert_eq!(normal.crit_damage_bonus, 0.0);
    assert!(normal.active_sources.is_empty());
}

/// The default catalog adds nothing to the base 50 without a loadout.
#[test]
fn test_default_catalog_base_critical_damage() {
    let composer = ModifierComposer::with_defaults().unwrap();
    let hit = DamageEvent::new(0, 1, 100, 1u32, 1000.0).critical();

    let result = composer.compose(&hit, &FightIndices::default(), Loadout::empty(), 0.0);
    assert!(approx(result.crit_damage_bonus, 50.0));
    assert!(approx(result.crit_multiplier, 1.5));
    assert!(result.active_sources.is_empty());
}

fn sample_snapshot() -> CombatantSnapshot {
    let mut gear: Vec<GearPiece> = [slot::HEAD, slot::CHEST, slot::SHOULDERS, slot::WAIST, slot::LEGS]
        .into_iter()
        .map(|s| GearPiece::new(s, SUL_XAN_TORMENT, 2))
        .collect();
    gear.push(GearPiece::new(slot::HANDS, BALORGH, 1));
    gear.push(GearPiece::new(slot::FEET, BALORGH, 3));
    gear.push(GearPiece::new(slot::MAIN_HAND, 0u32, 4));

    CombatantSnapshot {
        gear,
        auras: vec![Aura::new(abilities::FELINE_AMBUSH)],
        talents: vec![
            Talent::new(100u32, "Cephaliarch's Flail"),
            Talent::new(101u32, "Dizzying Swing"),
        ],
    }
}

/// Static plus dynamic totals equal the single-pass totals, for every
/// combination of snapshot, player data and time.
#[test]
fn test_static_dynamic_equivalence() {
    let snapshot = sample_snapshot();
    let player = PlayerData::new(1, "Dps");
    let idx = indices(
        &[
            TimedBuffEvent::apply(1000, 1, 1, MINOR_BERSERK),
            TimedBuffEvent::apply(1500, 2, 1, MAJOR_SLAYER),
            TimedBuffEvent::remove(4000, 1, 1, MINOR_BERSERK),
            TimedBuffEvent::apply(2000, 2, 1, EMPOWER),
        ],
        &[
            TimedBuffEvent::apply(500, 3, 100, MAJOR_BREACH),
            TimedBuffEvent::apply(1000, 3, 100, MINOR_VULNERABILITY),
            TimedBuffEvent::apply(1200, 3, 100, MINOR_BRITTLE),
            TimedBuffEvent::remove(3000, 3, 100, MINOR_BRITTLE),
        ],
        10_000,
    );
    let registries = Registries::defaults().unwrap();
    let loadouts = [
        Loadout::empty(),
        Loadout::new(Some(&snapshot), None),
        Loadout::new(None, Some(&player)),
        Loadout::new(Some(&snapshot), Some(&player)),
    ];
    let channels = [
        Channel::Penetration,
        Channel::CriticalDamage,
        Channel::DamageDone,
        Channel::DamageTaken,
        Channel::Empower,
    ];

    for registry in [&registries.penetration, &registries.critical_damage, &registries.damage] {
        for loadout in loadouts {
            let prepared = registry.prepare(loadout);
            for t in [0, 1000, 1250, 2500, 3500, 5000, 10_000] {
                let ctx = ResolveContext::new(&idx, loadout, t, ActorId::new(1), ActorId::new(100));
                let single = registry.resolve(&ctx);
                let split = registry.static_totals(loadout) + registry.dynamic_totals(&ctx);
                let via_prepared = prepared.resolve(&ctx);
                for channel in channels {
                    assert!(
                        approx(single.get(channel), split.get(channel)),
                        "{} {:?} at {}",
                        registry.name(),
                        channel,
                        t
                    );
                    assert!(approx(single.get(channel), via_prepared.get(channel)));
                }
            }
        }
    }
}

/// Every hit with the same modifiers infers the same base.
#[test]
fn test_identical_modifiers_give_perfect_accuracy() {
    let composer = ModifierComposer::with_defaults().unwrap();
    let idx = indices(&[TimedBuffEvent::apply(0, 1, 1, MINOR_BERSERK)], &[], 60_000);
    let resolver = composer.prepare(&idx, Loadout::empty());
    let inference = TooltipInference::new(composer.config());

    // 4000 base × 1.05 berserk × (1 − 27.5757%), as the log would round it
    let multiplier = resolver
        .compose(&DamageEvent::new(1000, 1, 100, 7u32, 1.0), 18200.0)
        .total_multiplier;
    let amount = (4000.0 * multiplier).round();
    let hits: Vec<_> = (1..=8)
        .map(|i| DamageEvent::new(i * 1000, 1, 100, 7u32, amount))
        .map(|e| inference.analyze_event(&resolver, &e, 18200.0, 0))
        .collect();
    let stats = inference.ability_stats(AbilityId::new(7), "Jabs", &hits);

    assert!(stats.coefficient_of_variation < 1e-9);
    assert!((stats.accuracy_score - 100.0).abs() < 1e-6);
    assert!((stats.mean_normal_base - 4000.0).abs() < 1.0);
    assert!(stats.outliers.is_empty());
}

/// A zero multiplier falls back to the raw amount instead of dividing.
#[test]
fn test_zero_multiplier_is_guarded() {
    let config = EngineConfig {
        max_damage_reduction_percent: 100.0,
        resistance_divisor: 100.0,
        ..EngineConfig::default()
    };
    let composer = ModifierComposer::new(config, Registries::defaults().unwrap()).unwrap();
    let idx = FightIndices::default();
    let resolver = composer.prepare(&idx, Loadout::empty());
    let inference = TooltipInference::new(composer.config());

    let analysis = inference.analyze_event(&resolver, &DamageEvent::new(0, 1, 2, 7u32, 1234.0), 20_000.0, 0);
    assert_eq!(analysis.modifiers.total_multiplier, 0.0);
    assert_eq!(analysis.inferred_base, 1234.0);
    assert!(!analysis.reliable);
}

/// Configuration loads from JSON with defaults for missing keys.
#[test]
fn test_config_from_json() {
    let config = EngineConfig::from_json_str(r#"{"penetration_cap": 20000}"#).unwrap();
    assert_eq!(config.penetration_cap, 20000.0);
    assert_eq!(config.resistance_divisor, 660.0);

    assert!(matches!(
        EngineConfig::from_json_str("{"),
        Err(EngineError::ConfigParse(_))
    ));
}
