//! Deterministic headless game runner.

use anyhow::{Context, Result};
use serde::Serialize;

use gravehold_game::{
    Ending, Game, GameData, LinkKind, Map, PlayerAction, Scenario, ZoneFeature, ZoneId,
    ZombiePlacement,
};

use crate::policy::GameplayStrategy;

/// Configuration for one automated run.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub max_turns: u32,
}

impl SimConfig {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: u64) -> Self {
        Self {
            seed,
            strategy,
            max_turns: 50,
        }
    }

    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Result of one completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub strategy: String,
    pub turns: u32,
    pub ending: Option<Ending>,
    pub survivors_alive: usize,
    pub zombies_alive: usize,
    pub objectives_claimed: usize,
    pub objectives_total: usize,
    pub actions_submitted: u32,
    pub actions_rejected: u32,
}

impl RunReport {
    #[must_use]
    pub fn won(&self) -> bool {
        self.ending == Some(Ending::Victory)
    }
}

/// Drives one game with a policy until it ends or the turn cap trips.
pub struct SimSession {
    game: Game,
    config: SimConfig,
}

impl SimSession {
    /// Build a session on the built-in demo board.
    ///
    /// # Errors
    ///
    /// Propagates setup failures from the rules core.
    pub fn demo(config: SimConfig) -> Result<Self> {
        let game = Game::new(
            demo_map().context("demo map")?,
            GameData::default_config(),
            &demo_scenario(),
            Some(config.seed),
        )
        .context("game setup")?;
        Ok(Self { game, config })
    }

    #[must_use]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Play the game out.
    pub fn run(&mut self) -> RunReport {
        let mut policy = self.config.strategy.create_policy(self.config.seed);
        let mut submitted = 0u32;
        let mut rejected = 0u32;

        while !self.game.is_over() && self.game.turn() <= self.config.max_turns {
            let Some(actor) = self.game.active_survivor() else {
                break;
            };
            let action = policy.choose(&self.game, actor);
            submitted += 1;
            if let Err(err) = self.game.submit_action(actor, action) {
                rejected += 1;
                log::debug!("seed {}: {} rejected: {err}", self.config.seed, policy.name());
                // Passing always succeeds for the active survivor, so a
                // confused policy still makes progress.
                if self.game.submit_action(actor, PlayerAction::Pass).is_err() {
                    break;
                }
            }
        }

        let snapshot = self.game.snapshot();
        let ending = match self.game.phase() {
            gravehold_game::Phase::GameOver(ending) => Some(ending),
            _ => None,
        };
        RunReport {
            seed: self.config.seed,
            strategy: self.config.strategy.label().to_string(),
            turns: self.game.turn(),
            ending,
            survivors_alive: snapshot
                .survivors
                .iter()
                .filter(|survivor| survivor.alive)
                .count(),
            zombies_alive: snapshot.zombies_alive,
            objectives_claimed: snapshot.objectives_claimed,
            objectives_total: snapshot.objectives_total,
            actions_submitted: submitted,
            actions_rejected: rejected,
        }
    }
}

/// Nine-zone demo board: a street with two buildings behind doors.
///
/// ```text
/// 0 - 1 - 2      street (spawn at 0 and 2)
/// D   |   D
/// 3 - 4 - 5      interiors (searchable), objective in 3
/// |       |
/// 6   7   8      back rooms, objective in 8
/// ```
///
/// # Errors
///
/// Never fails with these literals; kept fallible for builder symmetry.
pub fn demo_map() -> Result<Map, gravehold_game::SetupError> {
    Map::builder(9)
        .link(0, 1, LinkKind::Open)
        .link(1, 2, LinkKind::Open)
        .link(0, 3, LinkKind::Door)
        .link(1, 4, LinkKind::Open)
        .link(2, 5, LinkKind::Door)
        .link(3, 4, LinkKind::Open)
        .link(4, 5, LinkKind::Open)
        .link(3, 6, LinkKind::Open)
        .link(5, 8, LinkKind::Open)
        .feature(0, ZoneFeature::SpawnPoint)
        .feature(2, ZoneFeature::SpawnPoint)
        .feature(3, ZoneFeature::Objective)
        .feature(8, ZoneFeature::Objective)
        .feature(4, ZoneFeature::Searchable)
        .feature(6, ZoneFeature::Searchable)
        .build()
}

#[must_use]
pub fn demo_scenario() -> Scenario {
    Scenario {
        survivor_start: ZoneId(1),
        survivors: vec![
            String::from("Eva"),
            String::from("Josh"),
            String::from("Amara"),
        ],
        initial_zombies: vec![ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(4),
            count: 2,
        }],
    }
}
