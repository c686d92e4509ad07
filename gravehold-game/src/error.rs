//! Error types for the rules core.
//!
//! `RulesError` covers recoverable in-play validation failures: a rejected
//! action or query leaves the game state untouched and the caller may retry.
//! `SetupError` covers malformed static data and is only raised during
//! construction, before the simulation starts.

use thiserror::Error;

use crate::entities::EntityId;
use crate::map::ZoneId;

/// Recoverable validation failure raised while the game is running.
///
/// No variant corrupts state: every failure path returns before the first
/// mutation, so a rejected survivor action leaves the action count and the
/// active pointer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("zones {0} and {1} are not adjacent")]
    NotAdjacent(ZoneId, ZoneId),
    #[error("the connection between {0} and {1} is impassable")]
    Impassable(ZoneId, ZoneId),
    #[error("the connection between {0} and {1} is not a door")]
    NotADoor(ZoneId, ZoneId),
    #[error("target zone {0} is out of range")]
    OutOfRange(ZoneId),
    #[error("no line of sight to zone {0}")]
    NoLineOfSight(ZoneId),
    #[error("weapon is spent and must be reloaded first")]
    WeaponNeedsReload,
    #[error("no actions remaining this turn")]
    InsufficientActions,
    #[error("action is not valid in the current phase")]
    InvalidPhaseForAction,
    #[error("no passable route from {0} to {1}")]
    Unreachable(ZoneId, ZoneId),
    #[error("entity {0} not found or no longer in play")]
    EntityNotFound(EntityId),
    #[error("entity {0} is named more than once as a target")]
    DuplicateTarget(EntityId),
    #[error("the selected hand slot is empty")]
    EmptyHand,
    #[error("survivor level is too low for this weapon")]
    LevelTooLow,
    #[error("no equipped weapon can open doors")]
    CannotOpenDoor,
    #[error("this zone cannot be searched now")]
    CannotSearchHere,
}

/// Construction-time rejection of malformed static data.
///
/// This is the only setup-fatal error class; once `Game::new` succeeds no
/// operation can fail unrecoverably.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("map has no zones")]
    EmptyMap,
    #[error("zone index {zone} out of range ({zones} zones)")]
    ZoneOutOfRange { zone: usize, zones: usize },
    #[error("zone {zone} is linked to itself")]
    SelfLink { zone: usize },
    #[error("duplicate link between zones {a} and {b}")]
    DuplicateLink { a: usize, b: usize },
    #[error("roster is empty")]
    EmptyRoster,
    #[error("unknown survivor '{0}'")]
    UnknownSurvivor(String),
    #[error("unknown weapon '{0}'")]
    UnknownWeapon(String),
    #[error("unknown zombie breed '{0}'")]
    UnknownBreed(String),
    #[error("unknown skill '{0}'")]
    UnknownSkill(String),
    #[error("weapon '{name}': {reason}")]
    InvalidWeapon { name: String, reason: &'static str },
    #[error("breed '{name}': {reason}")]
    InvalidBreed { name: String, reason: &'static str },
    #[error("level experience thresholds must be strictly increasing")]
    LevelThresholds,
    #[error("per-level action counts must be positive")]
    LevelActions,
}
