//! Automated play strategies.
//!
//! A policy picks the next action for the active survivor from the public
//! game state. Policies never mutate the game; the session submits the
//! action and handles rejection.

use std::fmt;

use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha20Rng;

use gravehold_game::{
    EntityId, Game, Hand, LinkKind, PlayerAction, RangeClass, ZoneFeature, ZoneId, shortest_path,
};

/// Policy interface for automated play strategies.
pub trait SurvivorPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select the next action for the active survivor.
    fn choose(&mut self, game: &Game, actor: EntityId) -> PlayerAction;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum GameplayStrategy {
    /// Head straight for the objectives, fighting only when cornered.
    Rusher,
    /// Clear zombies on sight, then push for the objectives.
    Fighter,
    /// Move at random; a worst-case baseline for the other strategies.
    Wanderer,
}

impl GameplayStrategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Rusher => "Rusher",
            GameplayStrategy::Fighter => "Fighter",
            GameplayStrategy::Wanderer => "Wanderer",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn SurvivorPolicy + Send> {
        match self {
            GameplayStrategy::Rusher => Box::new(RusherPolicy),
            GameplayStrategy::Fighter => Box::new(FighterPolicy),
            GameplayStrategy::Wanderer => Box::new(WandererPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct RusherPolicy;
struct FighterPolicy;

struct WandererPolicy {
    rng: ChaCha20Rng,
}

impl WandererPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl SurvivorPolicy for WandererPolicy {
    fn name(&self) -> &'static str {
        "wanderer"
    }

    fn choose(&mut self, game: &Game, actor: EntityId) -> PlayerAction {
        let here = zone_of(game, actor);
        let exits: Vec<ZoneId> = game
            .map()
            .zone(here)
            .map(|zone| {
                zone.links
                    .iter()
                    .filter(|link| link.passable())
                    .map(|link| link.to)
                    .collect()
            })
            .unwrap_or_default();
        match exits.choose(&mut self.rng) {
            Some(to) => PlayerAction::Move { to: *to },
            None => PlayerAction::Pass,
        }
    }
}

impl SurvivorPolicy for RusherPolicy {
    fn name(&self) -> &'static str {
        "rusher"
    }

    fn choose(&mut self, game: &Game, actor: EntityId) -> PlayerAction {
        // Fight only zombies blocking the current zone.
        if zombies_in_zone(game, zone_of(game, actor)) > 0
            && let Some(hand) = usable_melee_hand(game, actor)
        {
            return PlayerAction::Attack {
                hand,
                target_zone: zone_of(game, actor),
                targets: Vec::new(),
            };
        }
        advance_toward_objective(game, actor).unwrap_or(PlayerAction::Pass)
    }
}

impl SurvivorPolicy for FighterPolicy {
    fn name(&self) -> &'static str {
        "fighter"
    }

    fn choose(&mut self, game: &Game, actor: EntityId) -> PlayerAction {
        let here = zone_of(game, actor);
        if zombies_in_zone(game, here) > 0
            && let Some(hand) = usable_melee_hand(game, actor)
        {
            return PlayerAction::Attack {
                hand,
                target_zone: here,
                targets: Vec::new(),
            };
        }
        // Shoot into an adjacent infested zone before moving through it.
        if let Some((hand, target_zone)) = ranged_shot(game, actor) {
            return PlayerAction::Attack {
                hand,
                target_zone,
                targets: Vec::new(),
            };
        }
        advance_toward_objective(game, actor).unwrap_or(PlayerAction::Pass)
    }
}

fn zone_of(game: &Game, actor: EntityId) -> ZoneId {
    game.actor(actor).map_or(ZoneId(0), |actor| actor.zone)
}

fn zombies_in_zone(game: &Game, zone: ZoneId) -> usize {
    game.map()
        .occupants(zone)
        .iter()
        .filter(|id| {
            game.actor(**id)
                .is_some_and(|actor| actor.alive && actor.is_zombie())
        })
        .count()
}

/// A loaded weapon the survivor can actually swing here.
fn usable_melee_hand(game: &Game, actor: EntityId) -> Option<Hand> {
    let survivor = game.actor(actor)?.survivor()?;
    let tier = game.data().levels.tier_for(survivor.xp);
    [Hand::Left, Hand::Right].into_iter().find(|hand| {
        survivor.weapon_in(*hand).is_some_and(|weapon| {
            weapon.def.range == RangeClass::Melee
                && !weapon.needs_reload()
                && weapon.def.min_level <= tier
        })
    })
}

/// A loaded ranged weapon and an adjacent zone with zombies in it.
fn ranged_shot(game: &Game, actor: EntityId) -> Option<(Hand, ZoneId)> {
    let state = game.actor(actor)?;
    let survivor = state.survivor()?;
    let tier = game.data().levels.tier_for(survivor.xp);
    let hand = [Hand::Left, Hand::Right].into_iter().find(|hand| {
        survivor.weapon_in(*hand).is_some_and(|weapon| {
            matches!(weapon.def.range, RangeClass::Ranged { .. })
                && !weapon.needs_reload()
                && weapon.def.min_level <= tier
        })
    })?;
    let zone = game.map().zone(state.zone)?;
    let target = zone
        .links
        .iter()
        .filter(|link| link.passable())
        .map(|link| link.to)
        .find(|candidate| zombies_in_zone(game, *candidate) > 0)?;
    Some((hand, target))
}

/// Step along the shortest route to the nearest remaining objective,
/// opening doors in the way when possible.
fn advance_toward_objective(game: &Game, actor: EntityId) -> Option<PlayerAction> {
    let here = zone_of(game, actor);
    let map = game.map();
    let mut best: Option<Vec<ZoneId>> = None;
    for objective in map.zones_with_feature(ZoneFeature::Objective) {
        if let Ok(route) = shortest_path(map, here, objective)
            && best.as_ref().is_none_or(|current| route.len() < current.len())
        {
            best = Some(route);
        }
    }
    if let Some(route) = best
        && route.len() > 1
    {
        return Some(PlayerAction::Move { to: route[1] });
    }

    // Objectives unreachable: try a closed door off the current zone.
    let zone = map.zone(here)?;
    let door = zone
        .links
        .iter()
        .find(|link| link.kind == LinkKind::Door && !link.open)?;
    Some(PlayerAction::OpenDoor { to: door.to })
}
