//! Default source catalog.
//!
//! The penetration, critical damage and damage done/taken sources the engine
//! knows about out of the box. Callers with their own sources can build a
//! [`SourceRegistry`] directly.

use crate::abilities::*;
use crate::error::Result;
use crate::ids::{AbilityId, SetId};
use crate::registry::SourceRegistry;
use crate::snapshot::{gear_trait, ArmorWeight, WeaponKind};
use crate::source::{
    Channel, ComputedRule, ModifierSource, SkillMatch, SourceKind, WeaponMatch,
};

/// Penetration values.
pub mod penetration {
    pub const MAJOR_BREACH: f64 = 5948.0;
    pub const MINOR_BREACH: f64 = 2974.0;
    pub const CRUSHER: f64 = 2108.0;
    pub const RUNIC_SUNDER: f64 = 2200.0;
    pub const TREMORSCALE: f64 = 2640.0;
    pub const CRIMSON_OATH: f64 = 3541.0;
    pub const ROAR_OF_ALKOSH: f64 = 6000.0;
    pub const VELOTHI_UR_MAGE: f64 = 1650.0;
    pub const HUNTERS_EYE: f64 = 950.0;
    pub const DISMEMBER: f64 = 3271.0;
    pub const CONCENTRATION_PER_PIECE: f64 = 939.0;
    pub const SPLINTERED_SECRETS_PER_ABILITY: f64 = 620.0;
    /// Splintered Secrets stacks are not in the log; two is the sustained value.
    pub const SPLINTERED_SECRETS_STACKS: f64 = 2.0;
    pub const HEAVY_WEAPONS: f64 = 2974.0;
    pub const TWIN_BLADE_AND_BLUNT_PER_MACE: f64 = 1487.0;
    pub const CRYSTAL_WEAPON: f64 = 1000.0;
    pub const BALORGH: f64 = 11500.0;
    pub const SHARPENED_1H_PER_WEAPON: f64 = 1638.0;
    pub const SHARPENED_2H: f64 = 3276.0;
    pub const SET_GROUP_1496: f64 = 1496.0;
    pub const SET_GROUP_1487: f64 = 1487.0;
    pub const SET_GROUP_1190: f64 = 1190.0;
}

/// Critical damage values, in percent.
pub mod critical_damage {
    pub const MINOR_FORCE: f64 = 10.0;
    pub const MAJOR_FORCE: f64 = 20.0;
    pub const MINOR_BRITTLE: f64 = 10.0;
    pub const MAJOR_BRITTLE: f64 = 20.0;
    pub const LUCENT_ECHOES: f64 = 11.0;
    pub const HEMORRHAGE: f64 = 10.0;
    pub const PIERCING_SPEAR: f64 = 10.0;
    pub const FELINE_AMBUSH: f64 = 10.0;
    pub const FATED_FORTUNE_PER_ABILITY: f64 = 4.0;
    pub const ANIMAL_COMPANIONS_PER_ABILITY: f64 = 5.0;
    pub const DEXTERITY_PER_PIECE: f64 = 2.0;
    pub const FIGHTING_FINESSE: f64 = 8.0;
    pub const SUL_XAN_TORMENT: f64 = 12.0;
    pub const MORA_SCRIBE_THESIS: f64 = 12.0;
    pub const HARPOONER_WADING_KILT: f64 = 10.0;
    pub const DUAL_WIELD_AXE: f64 = 6.0;
    pub const TWO_HANDED_BATTLE_AXE: f64 = 12.0;
    pub const ELEMENTAL_CATALYST_PER_WEAKNESS: f64 = 5.0;
}

/// Damage done and taken values, in percent.
pub mod damage {
    pub const MINOR_BERSERK: f64 = 5.0;
    pub const MAJOR_BERSERK: f64 = 10.0;
    pub const MINOR_SLAYER: f64 = 5.0;
    pub const MAJOR_SLAYER: f64 = 10.0;
    pub const EMPOWER: f64 = 20.0;
    pub const MINOR_VULNERABILITY: f64 = 5.0;
    pub const MAJOR_VULNERABILITY: f64 = 10.0;
}

static SET_GROUP_1496: [(SetId, usize); 2] = [(RELEQUEN_PERFECTED, 4), (PERFECTED_ANSUULS_TORMENT, 4)];

static SET_GROUP_1487: [(SetId, usize); 13] = [
    (PERFECTED_ANSUULS_TORMENT, 4),
    (TIDEBORN_WILDSTALKER, 4),
    (RELEQUEN, 4),
    (ARCHDRUID_DEVYRIC, 1),
    (BLACK_GEM_MONSTROSITY, 1),
    (FLAME_BLOSSOM, 4),
    (JERENSI, 3),
    (KAZPIAN, 4),
    (KRAGH, 1),
    (THE_BLIND, 1),
    (NEW_MOON_ACOLYTE, 4),
    (PELINALS_WRATH, 3),
    (KAZPIAN_PERFECTED, 4),
];

static SET_GROUP_1190: [(SetId, usize); 2] = [
    (PERFECTED_CRUSHING_WALL, 2),
    (PERFECTED_MERCILESS_CHARGE, 2),
];

static SPLINTERED_SECRETS_GATE: [AbilityId; 2] = [SPLINTERED_SECRETS, SPLINTERED_SECRETS_ALT];
static FATED_FORTUNE_GATE: [AbilityId; 1] = [FATED_FORTUNE_STAGE_ONE];
static ADVANCED_SPECIES_GATE: [AbilityId; 1] = [ADVANCED_SPECIES];

fn aura(name: &str, channel: Channel, ability: AbilityId, value: f64) -> ModifierSource {
    ModifierSource::new(name, channel, SourceKind::Aura { ability, value })
}

fn buff(name: &str, channel: Channel, ability: AbilityId, value: f64) -> ModifierSource {
    ModifierSource::new(name, channel, SourceKind::Buff { ability, value })
}

fn debuff(name: &str, channel: Channel, ability: AbilityId, value: f64) -> ModifierSource {
    ModifierSource::new(name, channel, SourceKind::Debuff { ability, value })
}

fn gear(name: &str, channel: Channel, set: SetId, pieces: usize, value: f64) -> ModifierSource {
    ModifierSource::new(name, channel, SourceKind::GearCount { set, pieces, value })
}

fn computed(name: &str, channel: Channel, rule: ComputedRule) -> ModifierSource {
    ModifierSource::new(name, channel, SourceKind::Computed(rule))
}

/// Penetration sources.
///
/// Debuffs are checked on the damaged target.
pub fn penetration_registry() -> Result<SourceRegistry> {
    use penetration as v;
    let pen = Channel::Penetration;

    SourceRegistry::new(
        "penetration",
        vec![
            computed(
                "Armor Sets (1496)",
                pen,
                ComputedRule::SetGroup {
                    sets: &SET_GROUP_1496,
                    value: v::SET_GROUP_1496,
                },
            )
            .with_description("1496 penetration per qualifying set"),
            computed(
                "Armor Sets (1487)",
                pen,
                ComputedRule::SetGroup {
                    sets: &SET_GROUP_1487,
                    value: v::SET_GROUP_1487,
                },
            )
            .with_description("1487 penetration per qualifying set"),
            computed(
                "Armor Sets (1190)",
                pen,
                ComputedRule::SetGroup {
                    sets: &SET_GROUP_1190,
                    value: v::SET_GROUP_1190,
                },
            )
            .with_description("1190 penetration per qualifying set"),
            aura(
                "Velothi Ur-Mage's Amulet",
                pen,
                VELOTHI_UR_MAGE,
                v::VELOTHI_UR_MAGE,
            ),
            aura("Hunter's Eye", pen, HUNTERS_EYE, v::HUNTERS_EYE),
            aura("Dismember", pen, DISMEMBER, v::DISMEMBER),
            aura("Crystal Weapon", pen, CRYSTAL_WEAPON, v::CRYSTAL_WEAPON),
            computed(
                "Concentration",
                pen,
                ComputedRule::PerArmorPiece {
                    weight: ArmorWeight::Light,
                    value: v::CONCENTRATION_PER_PIECE,
                    gate: Some(CONCENTRATION),
                },
            )
            .with_description("939 penetration per light armor piece worn"),
            computed(
                "Splintered Secrets",
                pen,
                ComputedRule::PerSlottedAbility {
                    skills: SkillMatch::AnyBarIds(&HERALD_OF_THE_TOME),
                    value: v::SPLINTERED_SECRETS_PER_ABILITY,
                    stacks: v::SPLINTERED_SECRETS_STACKS,
                    gate: &SPLINTERED_SECRETS_GATE,
                },
            )
            .with_description("620 penetration per stack per Herald of the Tome ability slotted"),
            computed(
                "Heavy Weapons",
                pen,
                ComputedRule::Wielding {
                    weapon: WeaponMatch::Kind(WeaponKind::Maul),
                    value: v::HEAVY_WEAPONS,
                },
            ),
            computed(
                "Twin Blade and Blunt",
                pen,
                ComputedRule::PerWeapon {
                    weapon: WeaponMatch::Kind(WeaponKind::Mace),
                    value: v::TWIN_BLADE_AND_BLUNT_PER_MACE,
                },
            ),
            gear("Balorgh", pen, BALORGH, 2, v::BALORGH),
            computed(
                "Sharpened (1H)",
                pen,
                ComputedRule::PerWeapon {
                    weapon: WeaponMatch::OneHandedTrait(gear_trait::WEAPON_SHARPENED),
                    value: v::SHARPENED_1H_PER_WEAPON,
                },
            ),
            computed(
                "Sharpened (2H)",
                pen,
                ComputedRule::Wielding {
                    weapon: WeaponMatch::TwoHandedTrait(gear_trait::WEAPON_SHARPENED),
                    value: v::SHARPENED_2H,
                },
            ),
            debuff("Major Breach", pen, MAJOR_BREACH, v::MAJOR_BREACH),
            debuff("Minor Breach", pen, MINOR_BREACH, v::MINOR_BREACH),
            debuff("Crusher", pen, CRUSHER, v::CRUSHER),
            debuff("Runic Sunder", pen, RUNIC_SUNDER, v::RUNIC_SUNDER),
            debuff("Tremorscale", pen, TREMORSCALE, v::TREMORSCALE),
            debuff("Crimson Oath's Rive", pen, CRIMSON_OATH, v::CRIMSON_OATH),
            debuff("Roar of Alkosh", pen, ROAR_OF_ALKOSH, v::ROAR_OF_ALKOSH),
        ],
    )
}

/// Critical damage sources.
///
/// The base critical damage is not a source; it comes from
/// [`EngineConfig::base_critical_damage`](crate::EngineConfig).
///
/// Lucent Echoes counts while the attacker wears the set (its aura is in the
/// snapshot) or while the group buff is active on the attacker, so it is
/// evaluated per event.
pub fn critical_damage_registry() -> Result<SourceRegistry> {
    use critical_damage as v;
    let crit = Channel::CriticalDamage;

    SourceRegistry::new(
        "critical damage",
        vec![
            computed(
                "Fated Fortune",
                crit,
                ComputedRule::PerSlottedAbility {
                    skills: SkillMatch::FrontBarNames(&HERALD_OF_THE_TOME_NAMES),
                    value: v::FATED_FORTUNE_PER_ABILITY,
                    stacks: 1.0,
                    gate: &FATED_FORTUNE_GATE,
                },
            ),
            computed(
                "Dexterity",
                crit,
                ComputedRule::PerArmorPiece {
                    weight: ArmorWeight::Medium,
                    value: v::DEXTERITY_PER_PIECE,
                    gate: None,
                },
            )
            .with_description("2% critical damage per medium armor piece"),
            computed(
                "Fighting Finesse",
                crit,
                ComputedRule::Passive {
                    value: v::FIGHTING_FINESSE,
                },
            ),
            gear("Sul-Xan's Torment", crit, SUL_XAN_TORMENT, 5, v::SUL_XAN_TORMENT),
            gear(
                "Mora Scribe's Thesis",
                crit,
                MORA_SCRIBE_THESIS,
                5,
                v::MORA_SCRIBE_THESIS,
            ),
            gear(
                "Harpooner's Wading Kilt",
                crit,
                HARPOONER_WADING_KILT,
                1,
                v::HARPOONER_WADING_KILT,
            ),
            computed(
                "Animal Companions",
                crit,
                ComputedRule::PerSlottedAbility {
                    skills: SkillMatch::FrontBarNames(&ANIMAL_COMPANIONS_NAMES),
                    value: v::ANIMAL_COMPANIONS_PER_ABILITY,
                    stacks: 1.0,
                    gate: &ADVANCED_SPECIES_GATE,
                },
            )
            .with_description("5% critical damage per Animal Companions ability slotted"),
            computed(
                "Twin Blade and Blunt (Axe)",
                crit,
                ComputedRule::PerWeapon {
                    weapon: WeaponMatch::Kind(WeaponKind::Axe),
                    value: v::DUAL_WIELD_AXE,
                },
            ),
            computed(
                "Heavy Weapons (Battle Axe)",
                crit,
                ComputedRule::Wielding {
                    weapon: WeaponMatch::Kind(WeaponKind::BattleAxe),
                    value: v::TWO_HANDED_BATTLE_AXE,
                },
            ),
            computed(
                "Elemental Catalyst",
                crit,
                ComputedRule::PerActiveDebuff {
                    debuffs: &ELEMENTAL_WEAKNESSES,
                    value: v::ELEMENTAL_CATALYST_PER_WEAKNESS,
                },
            )
            .with_description("5% critical damage per elemental weakness on the target"),
            aura("Hemorrhage", crit, HEMORRHAGE, v::HEMORRHAGE),
            aura("Piercing Spear", crit, PIERCING_SPEAR, v::PIERCING_SPEAR),
            aura("Feline Ambush", crit, FELINE_AMBUSH, v::FELINE_AMBUSH),
            computed(
                "Lucent Echoes",
                crit,
                ComputedRule::AuraOrBuff {
                    aura: LUCENT_ECHOES_WEARER,
                    buff: LUCENT_ECHOES_RECIPIENT,
                    value: v::LUCENT_ECHOES,
                },
            ),
            buff("Minor Force", crit, MINOR_FORCE, v::MINOR_FORCE),
            buff("Major Force", crit, MAJOR_FORCE, v::MAJOR_FORCE),
            debuff("Minor Brittle", crit, MINOR_BRITTLE, v::MINOR_BRITTLE),
            debuff("Major Brittle", crit, MAJOR_BRITTLE, v::MAJOR_BRITTLE),
        ],
    )
}

/// Damage done, damage taken and Empower sources.
pub fn damage_registry() -> Result<SourceRegistry> {
    use damage as v;

    SourceRegistry::new(
        "damage",
        vec![
            buff("Minor Berserk", Channel::DamageDone, MINOR_BERSERK, v::MINOR_BERSERK),
            buff("Major Berserk", Channel::DamageDone, MAJOR_BERSERK, v::MAJOR_BERSERK),
            buff("Minor Slayer", Channel::DamageDone, MINOR_SLAYER, v::MINOR_SLAYER),
            buff("Major Slayer", Channel::DamageDone, MAJOR_SLAYER, v::MAJOR_SLAYER),
            buff("Empower", Channel::Empower, EMPOWER, v::EMPOWER),
            debuff(
                "Minor Vulnerability",
                Channel::DamageTaken,
                MINOR_VULNERABILITY,
                v::MINOR_VULNERABILITY,
            ),
            debuff(
                "Major Vulnerability",
                Channel::DamageTaken,
                MAJOR_VULNERABILITY,
                v::MAJOR_VULNERABILITY,
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{slot, Aura, CombatantSnapshot, GearPiece, Loadout, PlayerData, Talent};

    #[test]
    fn test_default_registries_build() {
        assert!(penetration_registry().is_ok());
        assert!(critical_damage_registry().is_ok());
        assert!(damage_registry().is_ok());
    }

    #[test]
    fn test_lucent_echoes_is_dynamic() {
        let registry = critical_damage_registry().unwrap();
        let lucent = registry
            .sources()
            .iter()
            .find(|s| &**s.name() == "Lucent Echoes")
            .unwrap();
        assert!(lucent.is_time_dependent());
    }

    #[test]
    fn test_penetration_static_loadout() {
        let snapshot = CombatantSnapshot {
            gear: vec![
                GearPiece::new(slot::HEAD, 0, 1),
                GearPiece::new(slot::CHEST, 0, 1),
                GearPiece::new(slot::LEGS, 0, 1),
                GearPiece::new(slot::MAIN_HAND, BALORGH, 6),
                GearPiece::new(slot::SHOULDERS, BALORGH, 2),
            ],
            auras: vec![Aura::new(CONCENTRATION)],
            talents: vec![Talent::new(HERALD_OF_THE_TOME[0], "Cephaliarch's Flail")],
        };
        let player = PlayerData::new(1, "P");
        let registry = penetration_registry().unwrap();
        let totals = registry.static_totals(Loadout::new(Some(&snapshot), Some(&player)));

        // 3 light pieces, maul, Balorgh; Splintered Secrets has no aura
        let expected = 3.0 * penetration::CONCENTRATION_PER_PIECE
            + penetration::HEAVY_WEAPONS
            + penetration::BALORGH;
        assert!((totals.penetration - expected).abs() < 1e-9);
    }

    #[test]
    fn test_front_bar_names_only() {
        let mut talents: Vec<Talent> = (0..6).map(|i| Talent::new(i as u32, "Filler")).collect();
        talents.push(Talent::new(7u32, "Cutting Dive"));
        let snapshot = CombatantSnapshot {
            auras: vec![Aura::new(ADVANCED_SPECIES)],
            talents,
            ..Default::default()
        };
        let player = PlayerData::new(1, "P");
        let registry = critical_damage_registry().unwrap();
        let totals = registry.static_totals(Loadout::new(Some(&snapshot), Some(&player)));
        // Fighting Finesse only; the companion ability is on the back bar
        assert_eq!(totals.critical_damage, critical_damage::FIGHTING_FINESSE);
    }

    #[test]
    fn test_passives_need_player_data() {
        let snapshot = CombatantSnapshot {
            gear: vec![
                GearPiece::new(slot::HEAD, 0, 2),
                GearPiece::new(slot::CHEST, 0, 2),
            ],
            ..Default::default()
        };
        let player = PlayerData::new(1, "P");
        let registry = critical_damage_registry().unwrap();

        assert_eq!(registry.static_totals(Loadout::empty()).critical_damage, 0.0);
        assert_eq!(
            registry
                .static_totals(Loadout::new(Some(&snapshot), None))
                .critical_damage,
            0.0
        );
        let full = registry.static_totals(Loadout::new(Some(&snapshot), Some(&player)));
        let expected =
            critical_damage::FIGHTING_FINESSE + 2.0 * critical_damage::DEXTERITY_PER_PIECE;
        assert!((full.critical_damage - expected).abs() < 1e-9);
    }
}
