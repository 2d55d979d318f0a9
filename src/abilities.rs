//! Known ability and set identifiers.
//!
//! Everything the default source catalog and the buff reconciliation need to
//! recognise in a log. Ids not listed here can still be used through custom
//! [`ModifierSource`](crate::ModifierSource)s.

use crate::ids::{AbilityId, SetId};
use crate::interval::AliasGroup;

// Damage done (attacker buffs)
pub const MINOR_BERSERK: AbilityId = AbilityId::new(61744);
pub const MAJOR_BERSERK: AbilityId = AbilityId::new(61745);
pub const MINOR_SLAYER: AbilityId = AbilityId::new(147226);
pub const MAJOR_SLAYER: AbilityId = AbilityId::new(93109);
pub const EMPOWER: AbilityId = AbilityId::new(61737);

// Damage taken (target debuffs)
pub const MINOR_VULNERABILITY: AbilityId = AbilityId::new(79717);
pub const MAJOR_VULNERABILITY: AbilityId = AbilityId::new(106754);

// Critical damage
pub const MINOR_FORCE: AbilityId = AbilityId::new(61746);
pub const MAJOR_FORCE: AbilityId = AbilityId::new(61747);
pub const MINOR_BRITTLE: AbilityId = AbilityId::new(145975);
pub const MAJOR_BRITTLE: AbilityId = AbilityId::new(145977);
pub const HEMORRHAGE: AbilityId = AbilityId::new(45060);
pub const PIERCING_SPEAR: AbilityId = AbilityId::new(44046);
pub const FELINE_AMBUSH: AbilityId = AbilityId::new(192901);
pub const FATED_FORTUNE_STAGE_ONE: AbilityId = AbilityId::new(184847);
pub const ADVANCED_SPECIES: AbilityId = AbilityId::new(86068);

/// Lucent Echoes as seen on group members who receive the bonus.
pub const LUCENT_ECHOES_RECIPIENT: AbilityId = AbilityId::new(220015);
/// Lucent Echoes as seen on the wearer of the set.
pub const LUCENT_ECHOES_WEARER: AbilityId = AbilityId::new(220016);

pub const FLAME_WEAKNESS: AbilityId = AbilityId::new(142610);
pub const FROST_WEAKNESS: AbilityId = AbilityId::new(142652);
pub const SHOCK_WEAKNESS: AbilityId = AbilityId::new(142653);

/// The three elemental weakness debuffs counted by Elemental Catalyst.
pub const ELEMENTAL_WEAKNESSES: [AbilityId; 3] = [FLAME_WEAKNESS, FROST_WEAKNESS, SHOCK_WEAKNESS];

// Penetration
pub const MAJOR_BREACH: AbilityId = AbilityId::new(61743);
pub const MINOR_BREACH: AbilityId = AbilityId::new(61742);
pub const CRUSHER: AbilityId = AbilityId::new(17906);
pub const RUNIC_SUNDER: AbilityId = AbilityId::new(187742);
pub const TREMORSCALE: AbilityId = AbilityId::new(80866);
pub const CRIMSON_OATH: AbilityId = AbilityId::new(159288);
pub const ROAR_OF_ALKOSH: AbilityId = AbilityId::new(76667);
pub const VELOTHI_UR_MAGE: AbilityId = AbilityId::new(193447);
pub const HUNTERS_EYE: AbilityId = AbilityId::new(45083);
pub const DISMEMBER: AbilityId = AbilityId::new(116192);
pub const CONCENTRATION: AbilityId = AbilityId::new(45562);
pub const CRYSTAL_WEAPON: AbilityId = AbilityId::new(46331);
pub const SPLINTERED_SECRETS: AbilityId = AbilityId::new(184887);
/// Second id Splintered Secrets appears under.
pub const SPLINTERED_SECRETS_ALT: AbilityId = AbilityId::new(184885);

/// Herald of the Tome abilities (base skills and morphs).
pub const HERALD_OF_THE_TOME: [AbilityId; 8] = [
    AbilityId::new(183006), // Cephaliarch's Flail
    AbilityId::new(193398), // Pragmatic Fatecarver
    AbilityId::new(185842), // Inspired Scholarship
    AbilityId::new(189867), // The Languid Eye
    AbilityId::new(188658), // Writhing Runeblades
    AbilityId::new(185823), // Tentacular Dread
    AbilityId::new(182988), // Fulminating Rune
    AbilityId::new(183047), // Recuperative Treatise
];

/// Herald of the Tome abilities by name, for matching slotted talents.
pub const HERALD_OF_THE_TOME_NAMES: [&str; 18] = [
    "Fatecarver",
    "Exhausting Fatecarver",
    "Pragmatic Fatecarver",
    "Abyssal Impact",
    "Cephaliarch's Flail",
    "Tentacular Dread",
    "Tome-Bearer's Inspiration",
    "Inspired Scholarship",
    "Recuperative Treatise",
    "The Imperfect Ring",
    "Fulminating Rune",
    "Rune of Displacement",
    "The Unblinking Eye",
    "The Languid Eye",
    "Writhing Runeblades",
    "Runeblades",
    "Escalating Runeblades",
    "Tide King's Gaze",
];

/// Animal Companions abilities by name (base skills and morphs).
pub const ANIMAL_COMPANIONS_NAMES: [&str; 18] = [
    "Dive",
    "Cutting Dive",
    "Screaming Cliff Racer",
    "Scorch",
    "Deep Fissure",
    "Subterranean Assault",
    "Swarm",
    "Fetcher Infection",
    "Growing Swarm",
    "Betty Netch",
    "Blue Betty",
    "Bull Netch",
    "Falcon's Swiftness",
    "Bird of Prey",
    "Deceptive Predator",
    "Feral Guardian",
    "Eternal Guardian",
    "Wild Guardian",
];

// Gear sets
pub const SUL_XAN_TORMENT: SetId = SetId::new(630);
pub const MORA_SCRIBE_THESIS: SetId = SetId::new(707);
pub const HARPOONER_WADING_KILT: SetId = SetId::new(585);
pub const BALORGH: SetId = SetId::new(398);
pub const RELEQUEN: SetId = SetId::new(381);
pub const RELEQUEN_PERFECTED: SetId = SetId::new(527);
pub const PERFECTED_ANSUULS_TORMENT: SetId = SetId::new(647);
pub const TIDEBORN_WILDSTALKER: SetId = SetId::new(690);
pub const ARCHDRUID_DEVYRIC: SetId = SetId::new(632);
pub const BLACK_GEM_MONSTROSITY: SetId = SetId::new(666);
pub const FLAME_BLOSSOM: SetId = SetId::new(618);
pub const JERENSI: SetId = SetId::new(600);
pub const KAZPIAN: SetId = SetId::new(661);
pub const KAZPIAN_PERFECTED: SetId = SetId::new(663);
pub const KRAGH: SetId = SetId::new(157);
pub const THE_BLIND: SetId = SetId::new(650);
pub const NEW_MOON_ACOLYTE: SetId = SetId::new(387);
pub const PELINALS_WRATH: SetId = SetId::new(597);
pub const PERFECTED_CRUSHING_WALL: SetId = SetId::new(526);
pub const PERFECTED_MERCILESS_CHARGE: SetId = SetId::new(528);

/// Attacker buffs checked when reconciling a damage event's buff snapshot.
pub const KNOWN_DAMAGE_BUFFS: [AbilityId; 5] = [
    MINOR_BERSERK,
    MAJOR_BERSERK,
    MINOR_SLAYER,
    MAJOR_SLAYER,
    EMPOWER,
];

/// Wearer and recipient ids of Lucent Echoes, queried as one buff.
pub fn lucent_echoes_alias() -> AliasGroup {
    AliasGroup::new(
        "Lucent Echoes",
        [LUCENT_ECHOES_RECIPIENT, LUCENT_ECHOES_WEARER],
    )
}

/// Both Splintered Secrets aura ids.
pub fn splintered_secrets_alias() -> AliasGroup {
    AliasGroup::new(
        "Splintered Secrets",
        [SPLINTERED_SECRETS, SPLINTERED_SECRETS_ALT],
    )
}

/// Alias groups every fight index should be built with.
pub fn default_alias_groups() -> Vec<AliasGroup> {
    vec![lucent_echoes_alias(), splintered_secrets_alias()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_groups_are_disjoint() {
        let groups = default_alias_groups();
        for (i, a) in groups.iter().enumerate() {
            for b in groups.iter().skip(i + 1) {
                assert!(a.ids().iter().all(|id| !b.ids().contains(id)));
            }
        }
    }

    #[test]
    fn test_known_damage_buffs() {
        assert!(KNOWN_DAMAGE_BUFFS.contains(&MINOR_BERSERK));
        assert!(KNOWN_DAMAGE_BUFFS.contains(&EMPOWER));
        assert!(!KNOWN_DAMAGE_BUFFS.contains(&MINOR_VULNERABILITY));
    }
}
