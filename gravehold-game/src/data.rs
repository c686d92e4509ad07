//! Static definition data consumed at setup.
//!
//! Weapon, survivor, breed, and skill templates plus the level table and the
//! spawn/item decks. The core never parses files itself; an external loader
//! hands over pre-parsed data (JSON via [`GameData::from_json`]) or the
//! built-in [`GameData::default_config`] is used. Templates are immutable
//! once the game starts.

use serde::{Deserialize, Serialize};

use crate::error::SetupError;

/// Survivor danger level, derived from accumulated experience.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LevelTier {
    #[default]
    Blue,
    Yellow,
    Orange,
    Red,
}

impl LevelTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Blue => 0,
            Self::Yellow => 1,
            Self::Orange => 2,
            Self::Red => 3,
        }
    }
}

impl std::fmt::Display for LevelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Experience thresholds and per-tier action allowances.
///
/// These are configuration data, not rules: scenarios may tune them without
/// touching the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// XP required to reach yellow, orange, and red, in that order.
    pub thresholds: [u32; 3],
    /// Actions per turn at blue, yellow, orange, and red.
    pub actions: [u8; 4],
    /// XP awarded for claiming an objective.
    #[serde(default = "default_objective_xp")]
    pub objective_xp: u32,
}

fn default_objective_xp() -> u32 {
    5
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            thresholds: [7, 19, 43],
            actions: [3, 3, 3, 3],
            objective_xp: default_objective_xp(),
        }
    }
}

impl LevelConfig {
    /// Tier reached with the given experience total.
    #[must_use]
    pub fn tier_for(&self, xp: u32) -> LevelTier {
        let [yellow, orange, red] = self.thresholds;
        if xp >= red {
            LevelTier::Red
        } else if xp >= orange {
            LevelTier::Orange
        } else if xp >= yellow {
            LevelTier::Yellow
        } else {
            LevelTier::Blue
        }
    }

    /// Base actions per turn at a tier, before skill modifiers.
    #[must_use]
    pub fn base_actions(&self, tier: LevelTier) -> u8 {
        self.actions[tier.index()]
    }

    fn validate(&self) -> Result<(), SetupError> {
        let [yellow, orange, red] = self.thresholds;
        if !(yellow < orange && orange < red) {
            return Err(SetupError::LevelThresholds);
        }
        if self.actions.iter().any(|count| *count == 0) {
            return Err(SetupError::LevelActions);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeClass {
    /// Attacker and targets must share a zone.
    Melee,
    /// Requires line of sight and a hop distance within `max_range`.
    Ranged { max_range: u8 },
}

/// Immutable weapon template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDef {
    pub name: String,
    pub range: RangeClass,
    /// Dice rolled per attack.
    pub dice: u8,
    /// Die value that counts as a success (meets or exceeds).
    pub threshold: u8,
    /// Damage per success; must meet a zombie's toughness to eliminate it.
    pub damage: u8,
    #[serde(default)]
    pub min_level: LevelTier,
    /// Spent on use; must be reloaded via an action before reuse.
    #[serde(default)]
    pub reload: bool,
    /// Noise emitted into the attack zone on use.
    #[serde(default)]
    pub noise: u32,
    /// Whether this weapon can force doors open.
    #[serde(default)]
    pub opens_doors: bool,
}

impl WeaponDef {
    fn validate(&self) -> Result<(), SetupError> {
        let reason = if self.dice == 0 {
            Some("dice count must be positive")
        } else if self.threshold == 0 || self.threshold > crate::combat::DIE_FACES {
            Some("success threshold must be a die face")
        } else if self.damage == 0 {
            Some("damage must be positive")
        } else {
            match self.range {
                RangeClass::Ranged { max_range: 0 } => Some("ranged weapon needs a range"),
                _ => None,
            }
        };
        match reason {
            Some(reason) => Err(SetupError::InvalidWeapon {
                name: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Fixed attack profile used by zombies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackProfile {
    pub dice: u8,
    pub threshold: u8,
    pub damage: u8,
}

/// Immutable zombie breed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreedDef {
    pub name: String,
    /// Actions per activation; one action is one zone step or one attack.
    pub actions: u8,
    /// Damage a single success must deal to eliminate this breed.
    pub toughness: u8,
    pub attack: AttackProfile,
    /// XP awarded to the survivor who eliminates one.
    pub xp: u32,
}

impl BreedDef {
    fn validate(&self) -> Result<(), SetupError> {
        let reason = if self.actions == 0 {
            Some("actions must be positive")
        } else if self.toughness == 0 {
            Some("toughness must be positive")
        } else if self.attack.dice == 0 || self.attack.damage == 0 {
            Some("attack profile must roll dice and deal damage")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(SetupError::InvalidBreed {
                name: self.name.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Rule modifier granted by a skill, applied at the point of consumption
/// (action refresh, dice pool build) rather than scattered per-skill logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SkillEffect {
    /// One extra action every turn.
    ExtraAction,
    /// One extra die on every attack.
    ExtraDie,
    /// One extra damage on every attack.
    ExtraDamage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    pub effect: SkillEffect,
}

/// A survivor's skill slot: unlocked once the grant tier is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGrant {
    pub id: String,
    pub tier: LevelTier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivorDef {
    pub name: String,
    /// Weapon names; the first two go to the hands, the rest to the backpack.
    #[serde(default)]
    pub loadout: Vec<String>,
    #[serde(default)]
    pub skills: Vec<SkillGrant>,
}

fn default_weight() -> u32 {
    5
}

/// Spawn directive drawn during the zombie spawn phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnCard {
    pub breed: String,
    pub count: u8,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

/// Equipment card drawn by the search action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCard {
    pub weapon: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

/// Container for all static definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameData {
    #[serde(default)]
    pub weapons: Vec<WeaponDef>,
    #[serde(default)]
    pub breeds: Vec<BreedDef>,
    #[serde(default)]
    pub skills: Vec<SkillDef>,
    #[serde(default)]
    pub survivors: Vec<SurvivorDef>,
    #[serde(default)]
    pub spawn_deck: Vec<SpawnCard>,
    #[serde(default)]
    pub item_deck: Vec<ItemCard>,
    #[serde(default)]
    pub levels: LevelConfig,
}

impl GameData {
    /// Empty data set (useful for tests).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load definitions from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn weapon(&self, name: &str) -> Option<&WeaponDef> {
        self.weapons
            .iter()
            .find(|weapon| weapon.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn breed(&self, name: &str) -> Option<&BreedDef> {
        self.breeds
            .iter()
            .find(|breed| breed.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn skill(&self, id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|skill| skill.id == id)
    }

    #[must_use]
    pub fn survivor(&self, name: &str) -> Option<&SurvivorDef> {
        self.survivors
            .iter()
            .find(|survivor| survivor.name.eq_ignore_ascii_case(name))
    }

    /// Cross-validate all definitions.
    ///
    /// # Errors
    ///
    /// Returns the first [`SetupError`] found: invalid weapon/breed numbers,
    /// dangling weapon, breed, or skill references, or a bad level table.
    pub fn validate(&self) -> Result<(), SetupError> {
        self.levels.validate()?;
        for weapon in &self.weapons {
            weapon.validate()?;
        }
        for breed in &self.breeds {
            breed.validate()?;
        }
        for survivor in &self.survivors {
            for name in &survivor.loadout {
                if self.weapon(name).is_none() {
                    return Err(SetupError::UnknownWeapon(name.clone()));
                }
            }
            for grant in &survivor.skills {
                if self.skill(&grant.id).is_none() {
                    return Err(SetupError::UnknownSkill(grant.id.clone()));
                }
            }
        }
        for card in &self.spawn_deck {
            if self.breed(&card.breed).is_none() {
                return Err(SetupError::UnknownBreed(card.breed.clone()));
            }
        }
        for card in &self.item_deck {
            if self.weapon(&card.weapon).is_none() {
                return Err(SetupError::UnknownWeapon(card.weapon.clone()));
            }
        }
        Ok(())
    }

    /// Built-in definition set used when no external data is supplied.
    #[must_use]
    pub fn default_config() -> Self {
        let weapons = vec![
            WeaponDef {
                name: String::from("Frying Pan"),
                range: RangeClass::Melee,
                dice: 1,
                threshold: 6,
                damage: 1,
                min_level: LevelTier::Blue,
                reload: false,
                noise: 1,
                opens_doors: false,
            },
            WeaponDef {
                name: String::from("Crowbar"),
                range: RangeClass::Melee,
                dice: 1,
                threshold: 4,
                damage: 1,
                min_level: LevelTier::Blue,
                reload: false,
                noise: 1,
                opens_doors: true,
            },
            WeaponDef {
                name: String::from("Fire Axe"),
                range: RangeClass::Melee,
                dice: 1,
                threshold: 4,
                damage: 2,
                min_level: LevelTier::Blue,
                reload: false,
                noise: 1,
                opens_doors: true,
            },
            WeaponDef {
                name: String::from("Pistol"),
                range: RangeClass::Ranged { max_range: 1 },
                dice: 1,
                threshold: 4,
                damage: 1,
                min_level: LevelTier::Blue,
                reload: false,
                noise: 2,
                opens_doors: false,
            },
            WeaponDef {
                name: String::from("Sawed-Off"),
                range: RangeClass::Ranged { max_range: 1 },
                dice: 2,
                threshold: 3,
                damage: 1,
                min_level: LevelTier::Blue,
                reload: true,
                noise: 2,
                opens_doors: false,
            },
            WeaponDef {
                name: String::from("Rifle"),
                range: RangeClass::Ranged { max_range: 3 },
                dice: 1,
                threshold: 3,
                damage: 1,
                min_level: LevelTier::Yellow,
                reload: false,
                noise: 2,
                opens_doors: false,
            },
        ];
        let breeds = vec![
            BreedDef {
                name: String::from("walker"),
                actions: 1,
                toughness: 1,
                attack: AttackProfile {
                    dice: 1,
                    threshold: 1,
                    damage: 1,
                },
                xp: 1,
            },
            BreedDef {
                name: String::from("runner"),
                actions: 2,
                toughness: 1,
                attack: AttackProfile {
                    dice: 1,
                    threshold: 1,
                    damage: 1,
                },
                xp: 1,
            },
            BreedDef {
                name: String::from("brute"),
                actions: 1,
                toughness: 2,
                attack: AttackProfile {
                    dice: 1,
                    threshold: 1,
                    damage: 1,
                },
                xp: 1,
            },
            BreedDef {
                name: String::from("abomination"),
                actions: 1,
                toughness: 3,
                attack: AttackProfile {
                    dice: 1,
                    threshold: 1,
                    damage: 2,
                },
                xp: 5,
            },
        ];
        let skills = vec![
            SkillDef {
                id: String::from("adrenaline"),
                name: String::from("Adrenaline Rush"),
                effect: SkillEffect::ExtraAction,
            },
            SkillDef {
                id: String::from("frenzy"),
                name: String::from("Frenzy"),
                effect: SkillEffect::ExtraDie,
            },
            SkillDef {
                id: String::from("brutal"),
                name: String::from("Brutal Strikes"),
                effect: SkillEffect::ExtraDamage,
            },
        ];
        let default_skills = vec![
            SkillGrant {
                id: String::from("adrenaline"),
                tier: LevelTier::Yellow,
            },
            SkillGrant {
                id: String::from("frenzy"),
                tier: LevelTier::Orange,
            },
            SkillGrant {
                id: String::from("brutal"),
                tier: LevelTier::Red,
            },
        ];
        let survivors = vec![
            SurvivorDef {
                name: String::from("Eva"),
                loadout: vec![String::from("Fire Axe"), String::from("Pistol")],
                skills: default_skills.clone(),
            },
            SurvivorDef {
                name: String::from("Josh"),
                loadout: vec![String::from("Crowbar"), String::from("Sawed-Off")],
                skills: default_skills.clone(),
            },
            SurvivorDef {
                name: String::from("Amara"),
                loadout: vec![String::from("Frying Pan"), String::from("Rifle")],
                skills: default_skills,
            },
        ];
        let spawn_deck = vec![
            SpawnCard {
                breed: String::from("walker"),
                count: 2,
                weight: 50,
            },
            SpawnCard {
                breed: String::from("walker"),
                count: 1,
                weight: 20,
            },
            SpawnCard {
                breed: String::from("runner"),
                count: 1,
                weight: 15,
            },
            SpawnCard {
                breed: String::from("brute"),
                count: 1,
                weight: 12,
            },
            SpawnCard {
                breed: String::from("abomination"),
                count: 1,
                weight: 3,
            },
        ];
        let item_deck = vec![
            ItemCard {
                weapon: String::from("Frying Pan"),
                weight: 20,
            },
            ItemCard {
                weapon: String::from("Crowbar"),
                weight: 20,
            },
            ItemCard {
                weapon: String::from("Pistol"),
                weight: 25,
            },
            ItemCard {
                weapon: String::from("Fire Axe"),
                weight: 15,
            },
            ItemCard {
                weapon: String::from("Sawed-Off"),
                weight: 12,
            },
            ItemCard {
                weapon: String::from("Rifle"),
                weight: 8,
            },
        ];

        Self {
            weapons,
            breeds,
            skills,
            survivors,
            spawn_deck,
            item_deck,
            levels: LevelConfig::default(),
        }
    }
}
