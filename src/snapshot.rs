//! Static per-fight loadouts.
//!
//! A [`CombatantSnapshot`] is the gear, aura and slotted-ability information a
//! log records for each player at the start of a fight. It never changes
//! during the fight, so everything derived from it is computed once.

use crate::ids::{AbilityId, ActorId, SetId};
use serde::{Deserialize, Serialize};

/// Equipment slot codes as they appear in the log.
pub mod slot {
    pub const HEAD: u32 = 0;
    pub const NECK: u32 = 1;
    pub const CHEST: u32 = 2;
    pub const SHOULDERS: u32 = 3;
    pub const MAIN_HAND: u32 = 4;
    pub const OFF_HAND: u32 = 5;
    pub const WAIST: u32 = 6;
    pub const LEGS: u32 = 8;
    pub const FEET: u32 = 9;
    pub const RING_1: u32 = 11;
    pub const RING_2: u32 = 12;
    pub const HANDS: u32 = 16;
    pub const BACKUP_MAIN: u32 = 20;
    pub const BACKUP_OFF: u32 = 21;

    /// Slots whose item type is an armor weight.
    pub const ARMOR: [u32; 7] = [HEAD, CHEST, SHOULDERS, WAIST, LEGS, FEET, HANDS];
    /// Slots of the front weapon bar.
    pub const FRONT_BAR: [u32; 2] = [MAIN_HAND, OFF_HAND];
}

/// Weight class of an armor piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorWeight {
    Light,
    Medium,
    Heavy,
}

impl ArmorWeight {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(ArmorWeight::Light),
            2 => Some(ArmorWeight::Medium),
            3 => Some(ArmorWeight::Heavy),
            _ => None,
        }
    }
}

/// Kind of weapon in a weapon slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    Axe,
    Mace,
    Sword,
    Dagger,
    Greatsword,
    BattleAxe,
    Maul,
    Bow,
    RestorationStaff,
    FlameStaff,
    FrostStaff,
    LightningStaff,
    Shield,
}

impl WeaponKind {
    fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(WeaponKind::Axe),
            2 => Some(WeaponKind::Mace),
            3 => Some(WeaponKind::Sword),
            4 => Some(WeaponKind::Greatsword),
            5 => Some(WeaponKind::BattleAxe),
            6 => Some(WeaponKind::Maul),
            8 => Some(WeaponKind::Bow),
            9 => Some(WeaponKind::RestorationStaff),
            11 => Some(WeaponKind::Dagger),
            12 => Some(WeaponKind::FlameStaff),
            13 => Some(WeaponKind::FrostStaff),
            14 => Some(WeaponKind::Shield),
            15 => Some(WeaponKind::LightningStaff),
            _ => None,
        }
    }

    pub fn is_two_handed(self) -> bool {
        matches!(
            self,
            WeaponKind::Greatsword
                | WeaponKind::BattleAxe
                | WeaponKind::Maul
                | WeaponKind::Bow
                | WeaponKind::RestorationStaff
                | WeaponKind::FlameStaff
                | WeaponKind::FrostStaff
                | WeaponKind::LightningStaff
        )
    }

    /// One-handed melee weapons that can be dual wielded.
    pub fn is_one_handed(self) -> bool {
        matches!(
            self,
            WeaponKind::Axe | WeaponKind::Mace | WeaponKind::Sword | WeaponKind::Dagger
        )
    }
}

/// Gear trait codes used by the default catalog.
pub mod gear_trait {
    pub const WEAPON_SHARPENED: u32 = 7;
}

/// One equipped item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GearPiece {
    #[serde(default)]
    pub slot: u32,
    #[serde(rename = "setID", default)]
    pub set_id: SetId,
    #[serde(default)]
    pub quality: u32,
    /// Armor weight code in armor slots, weapon type code in weapon slots.
    #[serde(rename = "type", default)]
    pub item_type: u32,
    #[serde(rename = "trait", default)]
    pub gear_trait: u32,
    #[serde(default)]
    pub enchant_type: u32,
    #[serde(default)]
    pub enchant_quality: u32,
}

impl GearPiece {
    /// An item of `set` in `slot` with the given type code.
    pub fn new(slot: u32, set_id: impl Into<SetId>, item_type: u32) -> Self {
        Self {
            slot,
            set_id: set_id.into(),
            item_type,
            ..Self::default()
        }
    }

    pub fn with_trait(mut self, gear_trait: u32) -> Self {
        self.gear_trait = gear_trait;
        self
    }

    pub fn armor_weight(&self) -> Option<ArmorWeight> {
        if slot::ARMOR.contains(&self.slot) {
            ArmorWeight::from_code(self.item_type)
        } else {
            None
        }
    }

    pub fn weapon_kind(&self) -> Option<WeaponKind> {
        match self.slot {
            slot::MAIN_HAND | slot::OFF_HAND | slot::BACKUP_MAIN | slot::BACKUP_OFF => {
                WeaponKind::from_code(self.item_type)
            }
            _ => None,
        }
    }

    pub fn is_front_bar(&self) -> bool {
        slot::FRONT_BAR.contains(&self.slot)
    }
}

/// A passive or persistent effect present at fight start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aura {
    pub ability: AbilityId,
    #[serde(default = "one")]
    pub stacks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn one() -> u32 {
    1
}

impl Aura {
    pub fn new(ability: impl Into<AbilityId>) -> Self {
        Self {
            ability: ability.into(),
            stacks: 1,
            name: None,
        }
    }
}

/// A slotted ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Talent {
    pub guid: AbilityId,
    #[serde(default)]
    pub name: String,
}

impl Talent {
    pub fn new(guid: impl Into<AbilityId>, name: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            name: name.into(),
        }
    }
}

/// Slotted abilities per bar, including the ultimate.
pub const ABILITIES_PER_BAR: usize = 6;

/// A player's loadout for one fight.
///
/// # Examples
///
/// ```rust
/// use esolens::{ArmorWeight, CombatantSnapshot, GearPiece};
/// use esolens::snapshot::slot;
///
/// let snapshot = CombatantSnapshot {
///     gear: vec![
///         GearPiece::new(slot::HEAD, 381, 1),
///         GearPiece::new(slot::CHEST, 381, 1),
///         GearPiece::new(slot::LEGS, 500, 2),
///     ],
///     ..Default::default()
/// };
///
/// assert_eq!(snapshot.set_count(381.into()), 2);
/// assert_eq!(snapshot.armor_count(ArmorWeight::Light), 2);
/// assert_eq!(snapshot.armor_count(ArmorWeight::Medium), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    #[serde(default)]
    pub gear: Vec<GearPiece>,
    #[serde(default)]
    pub auras: Vec<Aura>,
    #[serde(default)]
    pub talents: Vec<Talent>,
}

impl CombatantSnapshot {
    pub fn has_aura(&self, ability: AbilityId) -> bool {
        self.auras.iter().any(|a| a.ability == ability)
    }

    /// True if any aura has one of `abilities`.
    pub fn has_any_aura(&self, abilities: &[AbilityId]) -> bool {
        self.auras.iter().any(|a| abilities.contains(&a.ability))
    }

    /// Number of equipped pieces of a set.
    pub fn set_count(&self, set: SetId) -> usize {
        self.gear.iter().filter(|g| g.set_id == set).count()
    }

    pub fn armor_count(&self, weight: ArmorWeight) -> usize {
        self.gear
            .iter()
            .filter(|g| g.armor_weight() == Some(weight))
            .count()
    }

    /// Weapons on the front bar.
    pub fn front_bar_weapons(&self) -> impl Iterator<Item = (WeaponKind, &GearPiece)> {
        self.gear
            .iter()
            .filter(|g| g.is_front_bar())
            .filter_map(|g| g.weapon_kind().map(|k| (k, g)))
    }

    /// The first bar's slotted abilities.
    pub fn front_bar_talents(&self) -> &[Talent] {
        let end = self.talents.len().min(ABILITIES_PER_BAR);
        &self.talents[..end]
    }
}

/// Player metadata that accompanies a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerData {
    pub id: ActorId,
    pub name: String,
}

impl PlayerData {
    pub fn new(id: impl Into<ActorId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The static inputs a modifier source can look at.
///
/// Either half may be missing. Sources that need a missing half contribute
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Loadout<'a> {
    pub snapshot: Option<&'a CombatantSnapshot>,
    pub player: Option<&'a PlayerData>,
}

impl<'a> Loadout<'a> {
    pub fn new(snapshot: Option<&'a CombatantSnapshot>, player: Option<&'a PlayerData>) -> Self {
        Self { snapshot, player }
    }

    /// A loadout with neither snapshot nor player data.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The snapshot, but only when player data is present as well.
    pub fn with_player(&self) -> Option<&'a CombatantSnapshot> {
        self.player.and(self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weapon_slots_ignore_armor_codes() {
        let ring = GearPiece::new(slot::RING_1, 1, 1);
        assert_eq!(ring.armor_weight(), None);
        assert_eq!(ring.weapon_kind(), None);

        let axe = GearPiece::new(slot::MAIN_HAND, 1, 1);
        assert_eq!(axe.weapon_kind(), Some(WeaponKind::Axe));
        assert_eq!(axe.armor_weight(), None);
    }

    #[test]
    fn test_front_bar_only() {
        let snapshot = CombatantSnapshot {
            gear: vec![
                GearPiece::new(slot::MAIN_HAND, 1, 2),
                GearPiece::new(slot::BACKUP_MAIN, 1, 6),
            ],
            ..Default::default()
        };
        let kinds: Vec<_> = snapshot.front_bar_weapons().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![WeaponKind::Mace]);
    }

    #[test]
    fn test_front_bar_talents_truncate() {
        let snapshot = CombatantSnapshot {
            talents: (0..12).map(|i| Talent::new(i as u32, "x")).collect(),
            ..Default::default()
        };
        assert_eq!(snapshot.front_bar_talents().len(), 6);
        assert_eq!(CombatantSnapshot::default().front_bar_talents().len(), 0);
    }

    #[test]
    fn test_snapshot_from_log_json() {
        let json = r#"{
            "gear": [{ "slot": 4, "setID": 398, "quality": 5, "type": 6, "trait": 7,
                       "enchantType": 0, "enchantQuality": 5 }],
            "auras": [{ "ability": 45562, "stacks": 1 }],
            "talents": [{ "guid": 183006, "name": "Cephaliarch's Flail" }]
        }"#;
        let snapshot: CombatantSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.set_count(SetId::new(398)), 1);
        assert_eq!(snapshot.gear[0].gear_trait, gear_trait::WEAPON_SHARPENED);
        assert!(snapshot.has_aura(AbilityId::new(45562)));
    }

    #[test]
    fn test_loadout_with_player() {
        let snapshot = CombatantSnapshot::default();
        let player = PlayerData::new(1, "P");
        assert!(Loadout::new(Some(&snapshot), None).with_player().is_none());
        assert!(Loadout::new(Some(&snapshot), Some(&player))
            .with_player()
            .is_some());
    }
}
