//! Gravehold Rules Core
//!
//! Platform-agnostic rules engine for the Gravehold zombie-survival board
//! game. This crate provides the full turn simulation without UI or
//! platform-specific dependencies: the zone graph, line of sight and noise,
//! pathfinding, dice combat, zombie decisions, and the phase machine that
//! ties them together.

pub mod ai;
pub mod combat;
pub mod data;
pub mod entities;
pub mod error;
pub mod los;
pub mod map;
pub mod order;
pub mod path;
pub mod turn;

// Re-export commonly used types
pub use ai::{ZombieDecision, decide};
pub use combat::{AttackOutcome, DIE_FACES, allocate_hits, count_successes, roll_dice};
pub use data::{
    AttackProfile, BreedDef, GameData, ItemCard, LevelConfig, LevelTier, RangeClass, SkillDef,
    SkillEffect, SkillGrant, SpawnCard, SurvivorDef, WeaponDef,
};
pub use entities::{
    Actor, ActorKind, BACKPACK_SLOTS, BackpackSlot, EntityId, HAND_SLOTS, Hand, Survivor,
    WOUND_CAP, WeaponInstance, Zombie,
};
pub use error::{RulesError, SetupError};
pub use los::{has_line_of_sight, noisiest_visible_zone, visible_zones};
pub use map::{Link, LinkKind, Map, MapBuilder, Zone, ZoneFeature, ZoneId};
pub use order::TurnOrder;
pub use path::{distances_from, hop_distance, shortest_path};
pub use turn::{
    ActionReport, Ending, Game, GameSnapshot, Phase, PlayerAction, Scenario, SurvivorStatus,
    ZombiePlacement,
};

/// Trait for abstracting definition-data loading.
/// Platform-specific implementations should provide this.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the weapon/breed/skill/deck definitions from the
    /// platform-specific source.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions cannot be loaded or parsed.
    fn load_game_data(&self) -> Result<GameData, Self::Error>;
}

/// Trait for abstracting save/load operations.
/// Platform-specific implementations should provide this.
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a game in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the game cannot be saved.
    fn save_game(&self, save_name: &str, game: &Game) -> Result<(), Self::Error>;

    /// Load a game in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the game cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<Game>, Self::Error>;

    /// Delete a saved game.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Front door for hosts: wires a data source and a save store to the
/// rules core.
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Create a new game on the given board with the loader's definitions.
    ///
    /// # Errors
    ///
    /// Returns an error if the definitions cannot be loaded or the setup
    /// is rejected.
    pub fn create_game(
        &self,
        map: Map,
        scenario: &Scenario,
        seed: u64,
    ) -> Result<Game, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
    {
        let data = self.data_loader.load_game_data().map_err(Into::into)?;
        Game::new(map, data, scenario, Some(seed)).map_err(anyhow::Error::from)
    }

    /// Save a game in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the game cannot be saved.
    pub fn save_game(&self, save_name: &str, game: &Game) -> Result<(), S::Error> {
        self.storage.save_game(save_name, game)
    }

    /// Load a saved game. The dice generator is not persisted; callers
    /// wanting fresh randomness should [`Game::reseed`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be loaded.
    pub fn load_game(&self, save_name: &str) -> Result<Option<Game>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        self.storage.load_game(save_name).map_err(Into::into)
    }

    /// Delete a saved game.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}
