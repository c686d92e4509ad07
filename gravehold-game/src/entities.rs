//! Mutable per-entity state: survivors, zombies, and the actor wrapper that
//! ties either kind to a board position and an action budget.

use serde::{Deserialize, Serialize};

use crate::data::{BreedDef, GameData, LevelTier, SkillEffect, SkillGrant, WeaponDef};
use crate::map::ZoneId;

/// Stable identity of a survivor or zombie, unique for the lifetime of a
/// game. Ids of eliminated entities are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Wounds at which a survivor dies.
pub const WOUND_CAP: u8 = 2;
/// Equipped weapon slots.
pub const HAND_SLOTS: usize = 2;
/// Stowed weapon slots.
pub const BACKPACK_SLOTS: usize = 3;

/// Equipped weapon slot selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Stowed weapon slot selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpackSlot {
    Top,
    Middle,
    Bottom,
}

impl BackpackSlot {
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Top => 0,
            Self::Middle => 1,
            Self::Bottom => 2,
        }
    }
}

/// A weapon in someone's possession. Carries load state on top of the
/// immutable template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponInstance {
    pub def: WeaponDef,
    /// Only meaningful for weapons with `reload: true`.
    pub loaded: bool,
}

impl WeaponInstance {
    #[must_use]
    pub fn new(def: WeaponDef) -> Self {
        Self { def, loaded: true }
    }

    /// Whether the weapon is currently spent.
    #[must_use]
    pub fn needs_reload(&self) -> bool {
        self.def.reload && !self.loaded
    }
}

/// Survivor-specific state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survivor {
    pub name: String,
    pub wounds: u8,
    pub xp: u32,
    pub hands: [Option<WeaponInstance>; HAND_SLOTS],
    pub backpack: [Option<WeaponInstance>; BACKPACK_SLOTS],
    pub skills: Vec<SkillGrant>,
    /// One search per survivor per turn.
    pub searched_this_turn: bool,
}

impl Survivor {
    #[must_use]
    pub fn weapon_in(&self, hand: Hand) -> Option<&WeaponInstance> {
        self.hands[hand.index()].as_ref()
    }

    pub fn weapon_in_mut(&mut self, hand: Hand) -> Option<&mut WeaponInstance> {
        self.hands[hand.index()].as_mut()
    }

    /// Skill effects unlocked at the given tier, in grant order.
    pub fn active_effects<'a>(
        &'a self,
        data: &'a GameData,
        tier: LevelTier,
    ) -> impl Iterator<Item = SkillEffect> + 'a {
        self.skills
            .iter()
            .filter(move |grant| grant.tier <= tier)
            .filter_map(|grant| data.skill(&grant.id))
            .map(|skill| skill.effect)
    }
}

/// Zombie-specific state. Breed templates are copied in at spawn so an
/// actor list serializes as a self-contained document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zombie {
    pub breed: BreedDef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    Survivor(Survivor),
    Zombie(Zombie),
}

/// A survivor or zombie placed on the board.
///
/// Eliminated actors stay in the list with `alive: false` so ids keep
/// resolving; they are skipped by every phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: EntityId,
    pub zone: ZoneId,
    pub alive: bool,
    /// Remaining actions in the current activation.
    pub actions_left: u8,
    pub kind: ActorKind,
}

impl Actor {
    #[must_use]
    pub fn survivor(&self) -> Option<&Survivor> {
        match &self.kind {
            ActorKind::Survivor(survivor) => Some(survivor),
            ActorKind::Zombie(_) => None,
        }
    }

    pub fn survivor_mut(&mut self) -> Option<&mut Survivor> {
        match &mut self.kind {
            ActorKind::Survivor(survivor) => Some(survivor),
            ActorKind::Zombie(_) => None,
        }
    }

    #[must_use]
    pub fn zombie(&self) -> Option<&Zombie> {
        match &self.kind {
            ActorKind::Zombie(zombie) => Some(zombie),
            ActorKind::Survivor(_) => None,
        }
    }

    #[must_use]
    pub fn is_survivor(&self) -> bool {
        matches!(self.kind, ActorKind::Survivor(_))
    }

    #[must_use]
    pub fn is_zombie(&self) -> bool {
        matches!(self.kind, ActorKind::Zombie(_))
    }

    #[must_use]
    pub fn can_act(&self) -> bool {
        self.alive && self.actions_left > 0
    }

    /// Spend one action. Saturates at zero; callers gate on [`Self::can_act`].
    pub fn consume_action(&mut self) {
        self.actions_left = self.actions_left.saturating_sub(1);
    }
}
