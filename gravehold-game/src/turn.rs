//! Game orchestration: the turn-phase state machine.
//!
//! A turn runs `SurvivorTurn -> ZombieMovement -> ZombieAttack ->
//! ZombieSpawn -> TurnEnd` and wraps back around, or lands in `GameOver`.
//! Survivor activations are driven externally through [`Game::submit_action`];
//! once the last survivor runs out of actions the zombie phases and turn end
//! resolve automatically before control returns.
//!
//! Every action validates completely before its first mutation, so a
//! rejected action leaves the game byte-for-byte unchanged.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::ai::{self, ZombieDecision};
use crate::combat::{self, AttackOutcome};
use crate::data::{GameData, LevelTier, RangeClass, SkillEffect};
use crate::entities::{
    Actor, ActorKind, BackpackSlot, EntityId, Hand, Survivor, WeaponInstance, Zombie, WOUND_CAP,
};
use crate::error::{RulesError, SetupError};
use crate::los;
use crate::map::{Map, ZoneFeature, ZoneId};
use crate::order::TurnOrder;
use crate::path;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// Every objective claimed.
    Victory,
    /// Every survivor eliminated.
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SurvivorTurn,
    ZombieMovement,
    ZombieAttack,
    ZombieSpawn,
    TurnEnd,
    GameOver(Ending),
}

/// One survivor action, submitted for the active survivor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum PlayerAction {
    /// Step into an adjacent passable zone.
    Move { to: ZoneId },
    /// Attack with the weapon in `hand` against zombies in `target_zone`.
    /// `targets` fixes the hit-allocation priority; leave it empty to
    /// allocate in zone occupant order.
    Attack {
        hand: Hand,
        target_zone: ZoneId,
        #[serde(default)]
        targets: Vec<EntityId>,
    },
    /// Force an adjacent closed door with a door-capable weapon.
    OpenDoor { to: ZoneId },
    /// Swap a hand slot with a backpack slot.
    Reorganize { hand: Hand, slot: BackpackSlot },
    /// Restore a spent weapon.
    Reload { hand: Hand },
    /// Draw from the item deck in a searchable zone.
    Search,
    /// Deliberately raise the zone's noise by one.
    MakeNoise,
    /// Forfeit all remaining actions this activation.
    Pass,
}

/// What one accepted action produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActionReport {
    /// Log entries appended while resolving the action and any phases it
    /// triggered.
    pub logs: Vec<String>,
    pub attack: Option<AttackOutcome>,
    /// Weapon name drawn by a search.
    pub found: Option<String>,
}

/// Zombie group placed at setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZombiePlacement {
    pub breed: String,
    pub zone: ZoneId,
    pub count: u8,
}

/// Starting configuration, resolved against [`GameData`] at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub survivor_start: ZoneId,
    /// Names of survivor templates to field, in seat order.
    pub survivors: Vec<String>,
    #[serde(default)]
    pub initial_zombies: Vec<ZombiePlacement>,
}

/// Serializable status view for UIs and harnesses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub turn: u32,
    pub phase: Phase,
    pub active: Option<EntityId>,
    pub first_player: EntityId,
    pub objectives_claimed: usize,
    pub objectives_total: usize,
    pub survivors: Vec<SurvivorStatus>,
    pub zombies_alive: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurvivorStatus {
    pub id: EntityId,
    pub name: String,
    pub zone: ZoneId,
    pub alive: bool,
    pub wounds: u8,
    pub xp: u32,
    pub tier: LevelTier,
    pub actions_left: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    map: Map,
    data: GameData,
    actors: Vec<Actor>,
    order: TurnOrder,
    phase: Phase,
    turn: u32,
    next_id: u32,
    objectives_total: usize,
    objectives_claimed: usize,
    logs: Vec<String>,
    /// Zombies that began the movement phase sharing a zone with a
    /// survivor; only these strike during the attack phase.
    #[serde(default)]
    engaged: Vec<EntityId>,
    #[serde(skip)]
    rng: Option<ChaCha20Rng>,
}

impl Game {
    /// Build a game from a validated map, definition data, and a scenario.
    ///
    /// `seed` fixes the dice; two games built with the same inputs and seed
    /// replay identically. `None` runs without randomness (first card drawn,
    /// dice at their highest face).
    ///
    /// # Errors
    ///
    /// Any [`SetupError`] from data validation or unresolved scenario
    /// references.
    pub fn new(
        map: Map,
        data: GameData,
        scenario: &Scenario,
        seed: Option<u64>,
    ) -> Result<Self, SetupError> {
        data.validate()?;
        if scenario.survivor_start.0 >= map.zone_count() {
            return Err(SetupError::ZoneOutOfRange {
                zone: scenario.survivor_start.0,
                zones: map.zone_count(),
            });
        }
        for placement in &scenario.initial_zombies {
            if placement.zone.0 >= map.zone_count() {
                return Err(SetupError::ZoneOutOfRange {
                    zone: placement.zone.0,
                    zones: map.zone_count(),
                });
            }
            if data.breed(&placement.breed).is_none() {
                return Err(SetupError::UnknownBreed(placement.breed.clone()));
            }
        }

        let objectives_total = map.zones_with_feature(ZoneFeature::Objective).count();
        let mut game = Self {
            map,
            data,
            actors: Vec::new(),
            // replaced below once ids exist
            order: TurnOrder::new(vec![EntityId(0)])?,
            phase: Phase::SurvivorTurn,
            turn: 1,
            next_id: 0,
            objectives_total,
            objectives_claimed: 0,
            logs: Vec::new(),
            engaged: Vec::new(),
            rng: seed.map(ChaCha20Rng::seed_from_u64),
        };

        let mut roster = Vec::with_capacity(scenario.survivors.len());
        for name in &scenario.survivors {
            let def = game
                .data
                .survivor(name)
                .ok_or_else(|| SetupError::UnknownSurvivor(name.clone()))?
                .clone();
            let mut hands: [Option<WeaponInstance>; 2] = [None, None];
            let mut backpack: [Option<WeaponInstance>; 3] = [None, None, None];
            for (slot, weapon_name) in def.loadout.iter().enumerate() {
                let weapon = game
                    .data
                    .weapon(weapon_name)
                    .ok_or_else(|| SetupError::UnknownWeapon(weapon_name.clone()))?
                    .clone();
                let instance = Some(WeaponInstance::new(weapon));
                match slot {
                    0 | 1 => hands[slot] = instance,
                    2..=4 => backpack[slot - 2] = instance,
                    _ => {}
                }
            }
            let survivor = Survivor {
                name: def.name.clone(),
                wounds: 0,
                xp: 0,
                hands,
                backpack,
                skills: def.skills.clone(),
                searched_this_turn: false,
            };
            let id = game.allocate_id();
            let actions = game.survivor_budget(&survivor);
            game.map.insert_occupant(scenario.survivor_start, id);
            game.actors.push(Actor {
                id,
                zone: scenario.survivor_start,
                alive: true,
                actions_left: actions,
                kind: ActorKind::Survivor(survivor),
            });
            roster.push(id);
        }
        game.order = TurnOrder::new(roster)?;

        for placement in &scenario.initial_zombies {
            // References were validated against the data above.
            let Some(breed) = game.data.breed(&placement.breed).cloned() else {
                continue;
            };
            for _ in 0..placement.count {
                game.spawn_zombie(breed.clone(), placement.zone);
            }
        }

        game.log(format!("log.game-start turn=1 survivors={}", scenario.survivors.len()));
        Ok(game)
    }

    /// Replace the dice generator mid-game, e.g. after deserializing.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Some(ChaCha20Rng::seed_from_u64(seed));
    }

    #[must_use]
    pub fn map(&self) -> &Map {
        &self.map
    }

    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }

    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver(_))
    }

    #[must_use]
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    #[must_use]
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    #[must_use]
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    #[must_use]
    pub fn objectives(&self) -> (usize, usize) {
        (self.objectives_claimed, self.objectives_total)
    }

    /// Survivor whose activation is up, or `None` outside the survivor
    /// phase.
    #[must_use]
    pub fn active_survivor(&self) -> Option<EntityId> {
        if self.phase != Phase::SurvivorTurn {
            return None;
        }
        self.order.current()
    }

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let survivors = self
            .actors
            .iter()
            .filter_map(|actor| {
                let survivor = actor.survivor()?;
                Some(SurvivorStatus {
                    id: actor.id,
                    name: survivor.name.clone(),
                    zone: actor.zone,
                    alive: actor.alive,
                    wounds: survivor.wounds,
                    xp: survivor.xp,
                    tier: self.data.levels.tier_for(survivor.xp),
                    actions_left: actor.actions_left,
                })
            })
            .collect();
        GameSnapshot {
            turn: self.turn,
            phase: self.phase,
            active: self.active_survivor(),
            first_player: self.order.first_player(),
            objectives_claimed: self.objectives_claimed,
            objectives_total: self.objectives_total,
            survivors,
            zombies_alive: self
                .actors
                .iter()
                .filter(|actor| actor.alive && actor.is_zombie())
                .count(),
        }
    }

    /// Resolve one action for the active survivor.
    ///
    /// On success the game may have advanced through the zombie phases and
    /// into the next turn; inspect [`Game::phase`] afterwards. On failure
    /// nothing changed.
    ///
    /// # Errors
    ///
    /// Any [`RulesError`]; the state is untouched when one is returned.
    pub fn submit_action(
        &mut self,
        actor_id: EntityId,
        action: PlayerAction,
    ) -> Result<ActionReport, RulesError> {
        if self.phase != Phase::SurvivorTurn {
            return Err(RulesError::InvalidPhaseForAction);
        }
        let index = self
            .index_of(actor_id)
            .ok_or(RulesError::EntityNotFound(actor_id))?;
        if !self.actors[index].alive || !self.actors[index].is_survivor() {
            return Err(RulesError::EntityNotFound(actor_id));
        }
        if self.order.current() != Some(actor_id) {
            return Err(RulesError::InvalidPhaseForAction);
        }
        if !matches!(action, PlayerAction::Pass) && self.actors[index].actions_left == 0 {
            return Err(RulesError::InsufficientActions);
        }

        let log_mark = self.logs.len();
        let mut report = ActionReport::default();
        match action {
            PlayerAction::Move { to } => self.resolve_move(index, to)?,
            PlayerAction::Attack {
                hand,
                target_zone,
                targets,
            } => {
                report.attack = Some(self.resolve_attack(index, hand, target_zone, &targets)?);
            }
            PlayerAction::OpenDoor { to } => self.resolve_open_door(index, to)?,
            PlayerAction::Reorganize { hand, slot } => self.resolve_reorganize(index, hand, slot),
            PlayerAction::Reload { hand } => self.resolve_reload(index, hand)?,
            PlayerAction::Search => report.found = self.resolve_search(index)?,
            PlayerAction::MakeNoise => self.resolve_make_noise(index),
            PlayerAction::Pass => {
                self.actors[index].actions_left = 0;
                self.log(format!("log.pass {actor_id}"));
            }
        }

        self.check_victory();
        if !self.is_over() && self.actors[index].actions_left == 0 {
            self.advance_activation();
        }
        report.logs = self.logs[log_mark..].to_vec();
        Ok(report)
    }

    /// Forfeit every remaining survivor action and run the zombie phases.
    ///
    /// The usual route through a turn is exhausting actions via
    /// [`Game::submit_action`]; this is the explicit early-out.
    ///
    /// # Errors
    ///
    /// [`RulesError::InvalidPhaseForAction`] outside the survivor phase.
    pub fn end_survivor_phase(&mut self) -> Result<(), RulesError> {
        if self.phase != Phase::SurvivorTurn {
            return Err(RulesError::InvalidPhaseForAction);
        }
        for actor in &mut self.actors {
            if actor.is_survivor() {
                actor.actions_left = 0;
            }
        }
        self.log(String::from("log.phase-end"));
        self.run_zombie_turn();
        Ok(())
    }

    fn resolve_move(&mut self, index: usize, to: ZoneId) -> Result<(), RulesError> {
        let from = self.actors[index].zone;
        let id = self.actors[index].id;
        self.map.move_occupant(id, from, to)?;
        self.actors[index].zone = to;
        self.actors[index].consume_action();
        self.log(format!("log.move {id} {from} {to}"));

        if self.map.take_feature(to, ZoneFeature::Objective) {
            self.objectives_claimed += 1;
            let reward = self.data.levels.objective_xp;
            self.log(format!("log.objective {id} {to}"));
            self.award_xp(index, reward);
        }
        Ok(())
    }

    fn resolve_attack(
        &mut self,
        index: usize,
        hand: Hand,
        target_zone: ZoneId,
        priority: &[EntityId],
    ) -> Result<AttackOutcome, RulesError> {
        let attacker_zone = self.actors[index].zone;
        let attacker_id = self.actors[index].id;
        let survivor = self.actors[index]
            .survivor()
            .ok_or(RulesError::EntityNotFound(attacker_id))?;
        let weapon = survivor.weapon_in(hand).ok_or(RulesError::EmptyHand)?;
        let tier = self.data.levels.tier_for(survivor.xp);
        if weapon.def.min_level > tier {
            return Err(RulesError::LevelTooLow);
        }
        if weapon.needs_reload() {
            return Err(RulesError::WeaponNeedsReload);
        }
        match weapon.def.range {
            RangeClass::Melee => {
                if target_zone != attacker_zone {
                    return Err(RulesError::OutOfRange(target_zone));
                }
            }
            RangeClass::Ranged { max_range } => {
                if !los::has_line_of_sight(&self.map, attacker_zone, target_zone) {
                    return Err(RulesError::NoLineOfSight(target_zone));
                }
                let hops = path::hop_distance(&self.map, attacker_zone, target_zone)?;
                if hops > usize::from(max_range) {
                    return Err(RulesError::OutOfRange(target_zone));
                }
            }
        }

        let mut dice = weapon.def.dice;
        let mut damage = weapon.def.damage;
        for effect in survivor.active_effects(&self.data, tier) {
            match effect {
                SkillEffect::ExtraDie => dice = dice.saturating_add(1),
                SkillEffect::ExtraDamage => damage = damage.saturating_add(1),
                SkillEffect::ExtraAction => {}
            }
        }
        let threshold = weapon.def.threshold;
        let spends_ammo = weapon.def.reload;
        let noise = weapon.def.noise;

        // Default allocation is zone occupant order; an explicit priority
        // list reorders (and may restrict) it, and must name each living
        // zombie in the target zone at most once.
        let mut targets = Vec::new();
        for occupant in self.map.occupants(target_zone) {
            if let Some(actor) = self.actor(*occupant)
                && actor.alive
                && let Some(zombie) = actor.zombie()
            {
                targets.push((actor.id, zombie.breed.toughness, zombie.breed.xp));
            }
        }
        if !priority.is_empty() {
            let mut ordered: Vec<(EntityId, u8, u32)> = Vec::with_capacity(priority.len());
            for id in priority {
                if ordered.iter().any(|(target, _, _)| target == id) {
                    return Err(RulesError::DuplicateTarget(*id));
                }
                let entry = targets
                    .iter()
                    .find(|(target, _, _)| target == id)
                    .copied()
                    .ok_or(RulesError::EntityNotFound(*id))?;
                ordered.push(entry);
            }
            targets = ordered;
        }

        // Validation complete; mutations start here.
        let rolls = combat::roll_dice(self.rng.as_mut(), dice);
        let successes = combat::count_successes(&rolls, threshold);
        let allocation: Vec<(EntityId, u8)> = targets
            .iter()
            .map(|(id, toughness, _)| (*id, *toughness))
            .collect();
        let eliminated = combat::allocate_hits(successes, damage, &allocation);

        if spends_ammo
            && let Some(weapon) = self.actors[index]
                .survivor_mut()
                .and_then(|survivor| survivor.weapon_in_mut(hand))
        {
            weapon.loaded = false;
        }
        self.map.add_noise(attacker_zone, noise);

        let mut reward = 0;
        for id in &eliminated {
            if let Some(kill_index) = self.index_of(*id) {
                let zone = self.actors[kill_index].zone;
                self.actors[kill_index].alive = false;
                self.map.remove_occupant(zone, *id);
                self.log(format!("combat.eliminated {id} {zone}"));
            }
            if let Some((_, _, xp)) = targets.iter().find(|(target, _, _)| target == id) {
                reward += xp;
            }
        }
        self.log(format!(
            "combat.attack {attacker_id} {target_zone} dice={dice} hits={successes} kills={}",
            eliminated.len()
        ));

        let mut promotions = Vec::new();
        if reward > 0 && self.award_xp(index, reward) {
            promotions.push(attacker_id);
        }
        self.actors[index].consume_action();

        Ok(AttackOutcome {
            rolls: rolls.to_vec(),
            successes,
            eliminated,
            promotions,
            noise,
        })
    }

    fn resolve_open_door(&mut self, index: usize, to: ZoneId) -> Result<(), RulesError> {
        let from = self.actors[index].zone;
        let id = self.actors[index].id;
        let survivor = self.actors[index]
            .survivor()
            .ok_or(RulesError::EntityNotFound(id))?;
        let opener = [Hand::Left, Hand::Right]
            .into_iter()
            .filter_map(|hand| survivor.weapon_in(hand))
            .find(|weapon| weapon.def.opens_doors)
            .ok_or(RulesError::CannotOpenDoor)?;
        let noise = opener.def.noise;

        self.map.open_door(from, to)?;
        self.map.add_noise(from, noise);
        self.actors[index].consume_action();
        self.log(format!("log.door-open {id} {from} {to}"));
        Ok(())
    }

    fn resolve_reorganize(&mut self, index: usize, hand: Hand, slot: BackpackSlot) {
        let id = self.actors[index].id;
        if let Some(survivor) = self.actors[index].survivor_mut() {
            let carried = survivor.hands[hand.index()].take();
            let stowed = survivor.backpack[slot.index()].take();
            survivor.hands[hand.index()] = stowed;
            survivor.backpack[slot.index()] = carried;
        }
        self.actors[index].consume_action();
        self.log(format!("log.reorganize {id}"));
    }

    fn resolve_reload(&mut self, index: usize, hand: Hand) -> Result<(), RulesError> {
        let id = self.actors[index].id;
        let survivor = self.actors[index]
            .survivor_mut()
            .ok_or(RulesError::EntityNotFound(id))?;
        let weapon = survivor.weapon_in_mut(hand).ok_or(RulesError::EmptyHand)?;
        weapon.loaded = true;
        self.actors[index].consume_action();
        self.log(format!("log.reload {id}"));
        Ok(())
    }

    fn resolve_search(&mut self, index: usize) -> Result<Option<String>, RulesError> {
        let id = self.actors[index].id;
        let zone = self.actors[index].zone;
        let searched = self.actors[index]
            .survivor()
            .is_some_and(|survivor| survivor.searched_this_turn);
        let searchable = self
            .map
            .zone(zone)
            .is_some_and(|zone| zone.has_feature(ZoneFeature::Searchable));
        if searched || !searchable {
            return Err(RulesError::CannotSearchHere);
        }
        let zombies_present = self.map.occupants(zone).iter().any(|occupant| {
            self.actor(*occupant)
                .is_some_and(|actor| actor.alive && actor.is_zombie())
        });
        if zombies_present {
            return Err(RulesError::CannotSearchHere);
        }

        let card = weighted_pick(&mut self.rng, &self.data.item_deck, |card| card.weight);
        let weapon = card
            .and_then(|card| self.data.weapon(&card.weapon))
            .cloned();
        let found = weapon.as_ref().map(|weapon| weapon.name.clone());

        if let Some(survivor) = self.actors[index].survivor_mut() {
            survivor.searched_this_turn = true;
            if let Some(weapon) = weapon {
                let instance = WeaponInstance::new(weapon);
                let empty_hand = survivor.hands.iter_mut().find(|slot| slot.is_none());
                if let Some(slot) = empty_hand {
                    *slot = Some(instance);
                } else if let Some(slot) =
                    survivor.backpack.iter_mut().find(|slot| slot.is_none())
                {
                    *slot = Some(instance);
                }
                // Full hands and backpack: the find is discarded.
            }
        }
        self.actors[index].consume_action();
        match &found {
            Some(name) => self.log(format!("log.search {id} {zone} found={name}")),
            None => self.log(format!("log.search {id} {zone} found=nothing")),
        }
        Ok(found)
    }

    fn resolve_make_noise(&mut self, index: usize) {
        let id = self.actors[index].id;
        let zone = self.actors[index].zone;
        self.map.add_noise(zone, 1);
        self.actors[index].consume_action();
        self.log(format!("log.noise {id} {zone}"));
    }

    /// Move to the next living survivor, or run the zombie phases when the
    /// round is exhausted.
    fn advance_activation(&mut self) {
        loop {
            match self.order.advance() {
                Some(id) => {
                    if self.actor(id).is_some_and(|actor| actor.alive) {
                        return;
                    }
                }
                None => {
                    self.run_zombie_turn();
                    return;
                }
            }
        }
    }

    fn run_zombie_turn(&mut self) {
        self.phase = Phase::ZombieMovement;
        let survivor_zones = self.live_survivor_zones();

        // Zombies already sharing a zone with a survivor stand their
        // ground; only they strike this turn. Movers strike next turn.
        self.engaged = self
            .actors
            .iter()
            .filter(|actor| {
                actor.alive && actor.is_zombie() && survivor_zones.contains(&actor.zone)
            })
            .map(|actor| actor.id)
            .collect();

        let movers: Vec<EntityId> = self
            .actors
            .iter()
            .filter(|actor| {
                actor.alive && actor.is_zombie() && !self.engaged.contains(&actor.id)
            })
            .map(|actor| actor.id)
            .collect();
        for id in movers {
            while let Some(index) = self.index_of(id) {
                if !self.actors[index].can_act() {
                    break;
                }
                let zone = self.actors[index].zone;
                match ai::decide(&self.map, zone, &survivor_zones) {
                    ZombieDecision::Step(to) => {
                        self.actors[index].consume_action();
                        self.map.remove_occupant(zone, id);
                        self.map.insert_occupant(to, id);
                        self.actors[index].zone = to;
                        self.log(format!("zombie.move {id} {zone} {to}"));
                    }
                    // Arrived among survivors: it spent its turn closing in
                    // and strikes only next turn.
                    ZombieDecision::Attack | ZombieDecision::Hold => break,
                }
            }
        }

        self.phase = Phase::ZombieAttack;
        let strikers = std::mem::take(&mut self.engaged);
        for id in strikers {
            let Some(zombie_index) = self.index_of(id) else { continue };
            if !self.actors[zombie_index].alive {
                continue;
            }
            let zone = self.actors[zombie_index].zone;
            let Some(profile) = self.actors[zombie_index]
                .zombie()
                .map(|zombie| zombie.breed.attack)
            else {
                continue;
            };
            let target = self.map.occupants(zone).iter().copied().find(|occ| {
                self.actor(*occ)
                    .is_some_and(|actor| actor.alive && actor.is_survivor())
            });
            let Some(target) = target else { continue };

            let rolls = combat::roll_dice(self.rng.as_mut(), profile.dice);
            let successes = combat::count_successes(&rolls, profile.threshold);
            if successes == 0 {
                self.log(format!("zombie.attack {id} {target} missed"));
                continue;
            }
            let wounds_dealt = successes.saturating_mul(profile.damage);
            self.log(format!("zombie.attack {id} {target} wounds={wounds_dealt}"));
            if let Some(target_index) = self.index_of(target)
                && let Some(survivor) = self.actors[target_index].survivor_mut()
            {
                survivor.wounds = survivor.wounds.saturating_add(wounds_dealt).min(WOUND_CAP);
                if survivor.wounds >= WOUND_CAP {
                    self.actors[target_index].alive = false;
                    self.map.remove_occupant(zone, target);
                    self.log(format!("log.survivor-down {target} {zone}"));
                }
            }
            if self.check_defeat() {
                return;
            }
        }

        self.phase = Phase::ZombieSpawn;
        let spawn_zones: Vec<ZoneId> = self
            .map
            .zones_with_feature(ZoneFeature::SpawnPoint)
            .collect();
        for spawn_zone in spawn_zones {
            let Some(card) =
                weighted_pick(&mut self.rng, &self.data.spawn_deck, |card| card.weight)
                    .cloned()
            else {
                continue;
            };
            let Some(breed) = self.data.breed(&card.breed).cloned() else {
                continue;
            };
            for _ in 0..card.count {
                let id = self.spawn_zombie(breed.clone(), spawn_zone);
                self.log(format!("zombie.spawn {id} {} {spawn_zone}", breed.name));
            }
        }

        self.phase = Phase::TurnEnd;
        self.map.reset_noise();
        let refreshed: Vec<(usize, u8)> = self
            .actors
            .iter()
            .enumerate()
            .filter(|(_, actor)| actor.alive)
            .map(|(index, actor)| {
                let budget = match &actor.kind {
                    ActorKind::Survivor(survivor) => self.survivor_budget(survivor),
                    ActorKind::Zombie(zombie) => zombie.breed.actions,
                };
                (index, budget)
            })
            .collect();
        for (index, budget) in refreshed {
            self.actors[index].actions_left = budget;
            if let Some(survivor) = self.actors[index].survivor_mut() {
                survivor.searched_this_turn = false;
            }
        }
        self.order.close_round();
        self.turn += 1;
        self.log(format!("log.turn-end turn={}", self.turn));
        self.phase = Phase::SurvivorTurn;

        // The new first player may be dead; settle on a living survivor.
        while let Some(id) = self.order.current() {
            if self.actor(id).is_some_and(|actor| actor.alive) {
                break;
            }
            self.order.advance();
        }
    }

    /// Add experience and report whether the survivor's tier rose.
    fn award_xp(&mut self, index: usize, amount: u32) -> bool {
        let id = self.actors[index].id;
        let Some(survivor) = self.actors[index].survivor_mut() else {
            return false;
        };
        let before = self.data.levels.tier_for(survivor.xp);
        survivor.xp = survivor.xp.saturating_add(amount);
        let after = self.data.levels.tier_for(survivor.xp);
        if after > before {
            self.log(format!("log.level-up {id} {after}"));
            true
        } else {
            false
        }
    }

    /// Actions per turn for a survivor at their current tier, including
    /// skill bonuses.
    fn survivor_budget(&self, survivor: &Survivor) -> u8 {
        let tier = self.data.levels.tier_for(survivor.xp);
        let extra = survivor
            .active_effects(&self.data, tier)
            .filter(|effect| matches!(effect, SkillEffect::ExtraAction))
            .count();
        self.data
            .levels
            .base_actions(tier)
            .saturating_add(u8::try_from(extra).unwrap_or(u8::MAX))
    }

    fn live_survivor_zones(&self) -> Vec<ZoneId> {
        let mut zones: Vec<ZoneId> = self
            .actors
            .iter()
            .filter(|actor| actor.alive && actor.is_survivor())
            .map(|actor| actor.zone)
            .collect();
        zones.sort_unstable();
        zones.dedup();
        zones
    }

    fn check_victory(&mut self) {
        if self.objectives_total > 0
            && self.objectives_claimed >= self.objectives_total
            && !self.is_over()
        {
            self.phase = Phase::GameOver(Ending::Victory);
            self.log(format!("log.victory turn={}", self.turn));
        }
    }

    fn check_defeat(&mut self) -> bool {
        let any_alive = self
            .actors
            .iter()
            .any(|actor| actor.alive && actor.is_survivor());
        if !any_alive {
            self.phase = Phase::GameOver(Ending::Defeat);
            self.log(format!("log.defeat turn={}", self.turn));
            return true;
        }
        false
    }

    fn spawn_zombie(&mut self, breed: crate::data::BreedDef, zone: ZoneId) -> EntityId {
        let id = self.allocate_id();
        let actions = breed.actions;
        self.map.insert_occupant(zone, id);
        self.actors.push(Actor {
            id,
            zone,
            alive: true,
            actions_left: actions,
            kind: ActorKind::Zombie(Zombie { breed }),
        });
        id
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.actors.iter().position(|actor| actor.id == id)
    }

    fn log(&mut self, entry: String) {
        self.logs.push(entry);
    }
}

/// Weighted draw from a deck; `None` rng falls back to the first entry.
fn weighted_pick<'a, T>(
    rng: &mut Option<ChaCha20Rng>,
    items: &'a [T],
    weight: impl Fn(&T) -> u32,
) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let Some(rng) = rng.as_mut() else {
        return items.first();
    };
    let total: u32 = items.iter().map(&weight).sum();
    if total == 0 {
        return items.first();
    }
    let mut roll = rng.random_range(0..total);
    for item in items {
        let w = weight(item);
        if roll < w {
            return Some(item);
        }
        roll -= w;
    }
    items.last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::LinkKind;

    fn small_map() -> Map {
        // 0 - 1 - 2 open corridor, door from 2 to 3, objective in 3,
        // spawn point in 0, searchable zone 1.
        Map::builder(4)
            .link(0, 1, LinkKind::Open)
            .link(1, 2, LinkKind::Open)
            .link(2, 3, LinkKind::Door)
            .feature(0, ZoneFeature::SpawnPoint)
            .feature(1, ZoneFeature::Searchable)
            .feature(3, ZoneFeature::Objective)
            .build()
            .unwrap()
    }

    fn scenario(survivors: &[&str]) -> Scenario {
        Scenario {
            survivor_start: ZoneId(1),
            survivors: survivors.iter().map(ToString::to_string).collect(),
            initial_zombies: Vec::new(),
        }
    }

    fn solo_game() -> Game {
        Game::new(
            small_map(),
            GameData::default_config(),
            &scenario(&["Eva"]),
            Some(7),
        )
        .unwrap()
    }

    #[test]
    fn setup_rejects_unknown_survivor() {
        let result = Game::new(
            small_map(),
            GameData::default_config(),
            &scenario(&["Nobody"]),
            None,
        );
        assert_eq!(
            result.err(),
            Some(SetupError::UnknownSurvivor(String::from("Nobody")))
        );
    }

    #[test]
    fn setup_rejects_out_of_range_zombie_zone() {
        let mut bad = scenario(&["Eva"]);
        bad.initial_zombies.push(ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(9),
            count: 1,
        });
        let result = Game::new(small_map(), GameData::default_config(), &bad, None);
        assert_eq!(
            result.err(),
            Some(SetupError::ZoneOutOfRange { zone: 9, zones: 4 })
        );
    }

    #[test]
    fn rejected_action_changes_nothing() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        let before = game.snapshot();
        // Zone 3 is two hops away; single moves only reach adjacent zones.
        let result = game.submit_action(id, PlayerAction::Move { to: ZoneId(3) });
        assert_eq!(result, Err(RulesError::NotAdjacent(ZoneId(1), ZoneId(3))));
        assert_eq!(game.snapshot(), before);
        assert_eq!(game.logs().len(), 1); // only game-start
    }

    #[test]
    fn wrong_survivor_cannot_act() {
        let mut game = Game::new(
            small_map(),
            GameData::default_config(),
            &scenario(&["Eva", "Josh"]),
            Some(3),
        )
        .unwrap();
        let second = game.order.seat_order()[1];
        assert_eq!(
            game.submit_action(second, PlayerAction::Pass),
            Err(RulesError::InvalidPhaseForAction)
        );
    }

    #[test]
    fn exhausting_actions_runs_the_zombie_phases() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        for _ in 0..3 {
            assert_eq!(game.phase(), Phase::SurvivorTurn);
            game.submit_action(id, PlayerAction::MakeNoise).unwrap();
        }
        // The solo survivor spent all actions; a full turn elapsed.
        assert_eq!(game.turn(), 2);
        assert_eq!(game.phase(), Phase::SurvivorTurn);
        assert_eq!(game.actor(id).unwrap().actions_left, 3);
        // Noise resets at turn end.
        assert_eq!(game.map().noise(ZoneId(1)), 0);
        // The spawn point produced zombies.
        assert!(game.snapshot().zombies_alive > 0);
    }

    #[test]
    fn ending_the_phase_early_skips_everyone() {
        let mut game = Game::new(
            small_map(),
            GameData::default_config(),
            &scenario(&["Eva", "Josh"]),
            Some(11),
        )
        .unwrap();
        game.end_survivor_phase().unwrap();
        assert_eq!(game.turn(), 2);
        assert_eq!(game.phase(), Phase::SurvivorTurn);
        assert_eq!(
            game.end_survivor_phase().err(),
            None,
            "a fresh turn accepts the signal again"
        );
        assert_eq!(game.turn(), 3);
    }

    #[test]
    fn melee_attack_requires_the_shared_zone() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        // Eva's left hand holds a melee axe.
        assert_eq!(
            game.submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Left,
                    target_zone: ZoneId(2),
                    targets: Vec::new(),
                }
            ),
            Err(RulesError::OutOfRange(ZoneId(2)))
        );
    }

    #[test]
    fn ranged_attack_needs_sight() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        // Eva's right hand holds a pistol; zone 3 is behind a closed door.
        assert_eq!(
            game.submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Right,
                    target_zone: ZoneId(3),
                    targets: Vec::new(),
                }
            ),
            Err(RulesError::NoLineOfSight(ZoneId(3)))
        );
    }

    #[test]
    fn attack_eliminates_and_awards_xp() {
        let mut base = scenario(&["Eva"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(1),
            count: 1,
        });
        // No rng: every die shows its highest face, so the axe hits.
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let id = game.active_survivor().unwrap();
        let report = game
            .submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Left,
                    target_zone: ZoneId(1),
                    targets: Vec::new(),
                },
            )
            .unwrap();
        let outcome = report.attack.unwrap();
        assert_eq!(outcome.successes, 1);
        assert_eq!(outcome.eliminated.len(), 1);
        let survivor = game.actor(id).unwrap().survivor().unwrap();
        assert_eq!(survivor.xp, 1);
        assert_eq!(game.snapshot().zombies_alive, 0);
    }

    #[test]
    fn explicit_target_priority_directs_hits() {
        let mut base = scenario(&["Eva"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(1),
            count: 1,
        });
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("brute"),
            zone: ZoneId(1),
            count: 1,
        });
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let id = game.active_survivor().unwrap();
        let walker = EntityId(1);
        let brute = EntityId(2);

        assert_eq!(
            game.submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Left,
                    target_zone: ZoneId(1),
                    targets: vec![EntityId(99)],
                }
            ),
            Err(RulesError::EntityNotFound(EntityId(99)))
        );

        // One success by default would fall on the walker, the oldest
        // occupant; the priority list points it at the brute instead.
        let report = game
            .submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Left,
                    target_zone: ZoneId(1),
                    targets: vec![brute],
                },
            )
            .unwrap();
        assert_eq!(report.attack.unwrap().eliminated, vec![brute]);
        assert!(game.actor(walker).unwrap().alive);
    }

    #[test]
    fn zombie_action_budgets_are_spent_and_refreshed() {
        let map = Map::builder(4)
            .link(0, 1, LinkKind::Open)
            .link(1, 2, LinkKind::Open)
            .link(2, 3, LinkKind::Open)
            .build()
            .unwrap();
        let mut game = Game::new(
            map,
            GameData::default_config(),
            &Scenario {
                survivor_start: ZoneId(3),
                survivors: vec![String::from("Eva")],
                initial_zombies: vec![ZombiePlacement {
                    breed: String::from("runner"),
                    zone: ZoneId(0),
                    count: 1,
                }],
            },
            None,
        )
        .unwrap();
        let eva = game.active_survivor().unwrap();
        let runner = EntityId(1);

        // Two actions buy exactly two hops down the corridor.
        game.submit_action(eva, PlayerAction::Pass).unwrap();
        assert_eq!(game.actor(runner).unwrap().zone, ZoneId(2));
        assert_eq!(game.actor(runner).unwrap().actions_left, 2);

        // A fresh budget lets it close the last hop; it strikes only
        // on the following turn.
        game.submit_action(eva, PlayerAction::Pass).unwrap();
        assert_eq!(game.actor(runner).unwrap().zone, ZoneId(3));
        assert_eq!(game.actor(eva).unwrap().survivor().unwrap().wounds, 0);
    }

    #[test]
    fn naming_the_same_target_twice_is_rejected() {
        let mut base = scenario(&["Josh"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(1),
            count: 1,
        });
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let id = game.active_survivor().unwrap();
        let walker = EntityId(1);

        // The Sawed-Off lands two no-seed successes; pointing both at the
        // one walker may not double its elimination or its XP payout.
        assert_eq!(
            game.submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Right,
                    target_zone: ZoneId(1),
                    targets: vec![walker, walker],
                }
            ),
            Err(RulesError::DuplicateTarget(walker))
        );
        assert_eq!(game.actor(id).unwrap().actions_left, 3);

        let report = game
            .submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Right,
                    target_zone: ZoneId(1),
                    targets: vec![walker],
                },
            )
            .unwrap();
        let outcome = report.attack.unwrap();
        assert_eq!(outcome.successes, 2);
        assert_eq!(outcome.eliminated, vec![walker]);
        assert_eq!(game.actor(id).unwrap().survivor().unwrap().xp, 1);
    }

    #[test]
    fn opening_a_door_needs_a_capable_weapon() {
        let data = GameData::default_config();
        // Amara carries a frying pan and a rifle; neither opens doors.
        let mut game = Game::new(small_map(), data, &scenario(&["Amara"]), Some(1)).unwrap();
        let id = game.active_survivor().unwrap();
        game.submit_action(id, PlayerAction::Move { to: ZoneId(2) })
            .unwrap();
        assert_eq!(
            game.submit_action(id, PlayerAction::OpenDoor { to: ZoneId(3) }),
            Err(RulesError::CannotOpenDoor)
        );
    }

    #[test]
    fn door_then_objective_wins_the_game() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        game.submit_action(id, PlayerAction::Move { to: ZoneId(2) })
            .unwrap();
        game.submit_action(id, PlayerAction::OpenDoor { to: ZoneId(3) })
            .unwrap();
        game.submit_action(id, PlayerAction::Move { to: ZoneId(3) })
            .unwrap();
        assert_eq!(game.phase(), Phase::GameOver(Ending::Victory));
        let survivor = game.actor(id).unwrap().survivor().unwrap();
        assert_eq!(survivor.xp, game.data().levels.objective_xp);
        // Finished games refuse further actions.
        assert_eq!(
            game.submit_action(id, PlayerAction::Pass),
            Err(RulesError::InvalidPhaseForAction)
        );
    }

    #[test]
    fn search_draws_once_per_turn() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        let report = game.submit_action(id, PlayerAction::Search).unwrap();
        assert!(report.found.is_some());
        assert_eq!(
            game.submit_action(id, PlayerAction::Search),
            Err(RulesError::CannotSearchHere)
        );
    }

    #[test]
    fn search_requires_a_searchable_zone() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        game.submit_action(id, PlayerAction::Move { to: ZoneId(2) })
            .unwrap();
        assert_eq!(
            game.submit_action(id, PlayerAction::Search),
            Err(RulesError::CannotSearchHere)
        );
    }

    #[test]
    fn fresh_zombies_close_in_but_strike_a_turn_late() {
        let mut base = scenario(&["Eva"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(0),
            count: 1,
        });
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let id = game.active_survivor().unwrap();
        game.submit_action(id, PlayerAction::Pass).unwrap();
        // The walker stepped from 0 into the survivor's zone but did not
        // attack the same turn.
        let survivor = game.actor(id).unwrap().survivor().unwrap();
        assert_eq!(survivor.wounds, 0);
        let walker = game
            .actors()
            .iter()
            .find(|actor| actor.is_zombie() && actor.id == EntityId(1))
            .unwrap();
        assert_eq!(walker.zone, ZoneId(1));

        // Next turn it is engaged and strikes.
        let id = game.active_survivor().unwrap();
        game.submit_action(id, PlayerAction::Pass).unwrap();
        let survivor = game.actor(id).unwrap().survivor().unwrap();
        assert!(survivor.wounds >= 1);
    }

    #[test]
    fn two_wounds_put_a_survivor_down() {
        let mut base = scenario(&["Eva", "Josh"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("abomination"),
            zone: ZoneId(1),
            count: 1,
        });
        // Abominations deal two damage; no rng means an automatic hit.
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let first = game.active_survivor().unwrap();
        game.submit_action(first, PlayerAction::Pass).unwrap();
        let second = game.active_survivor().unwrap();
        game.submit_action(second, PlayerAction::Pass).unwrap();
        let down = game
            .actors()
            .iter()
            .filter(|actor| actor.is_survivor() && !actor.alive)
            .count();
        assert_eq!(down, 1);
        assert_ne!(game.phase(), Phase::GameOver(Ending::Defeat));
    }

    #[test]
    fn losing_every_survivor_ends_in_defeat() {
        let mut base = scenario(&["Eva"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("abomination"),
            zone: ZoneId(1),
            count: 1,
        });
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let id = game.active_survivor().unwrap();
        game.submit_action(id, PlayerAction::Pass).unwrap();
        assert_eq!(game.phase(), Phase::GameOver(Ending::Defeat));
        assert_eq!(
            game.submit_action(id, PlayerAction::MakeNoise),
            Err(RulesError::InvalidPhaseForAction)
        );
    }

    #[test]
    fn first_player_rotates_between_turns() {
        let mut game = Game::new(
            small_map(),
            GameData::default_config(),
            &scenario(&["Eva", "Josh"]),
            Some(5),
        )
        .unwrap();
        let seats = game.order.seat_order();
        assert_eq!(game.active_survivor(), Some(seats[0]));
        game.submit_action(seats[0], PlayerAction::Pass).unwrap();
        assert_eq!(game.active_survivor(), Some(seats[1]));
        game.submit_action(seats[1], PlayerAction::Pass).unwrap();
        assert_eq!(game.turn(), 2);
        assert_eq!(game.active_survivor(), Some(seats[1]));
    }

    #[test]
    fn reorganize_swaps_hand_and_backpack() {
        let mut game = solo_game();
        let id = game.active_survivor().unwrap();
        game.submit_action(
            id,
            PlayerAction::Reorganize {
                hand: Hand::Left,
                slot: BackpackSlot::Top,
            },
        )
        .unwrap();
        let survivor = game.actor(id).unwrap().survivor().unwrap();
        assert!(survivor.hands[0].is_none());
        assert_eq!(survivor.backpack[0].as_ref().unwrap().def.name, "Fire Axe");
    }

    #[test]
    fn spent_weapons_must_reload_before_firing() {
        let mut base = scenario(&["Josh"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(2),
            count: 2,
        });
        // Josh's right hand holds the sawed-off, a reload weapon.
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let id = game.active_survivor().unwrap();
        game.submit_action(
            id,
            PlayerAction::Attack {
                hand: Hand::Right,
                target_zone: ZoneId(2),
                targets: Vec::new(),
            },
        )
        .unwrap();
        assert_eq!(
            game.submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Right,
                    target_zone: ZoneId(2),
                    targets: Vec::new(),
                }
            ),
            Err(RulesError::WeaponNeedsReload)
        );
        game.submit_action(id, PlayerAction::Reload { hand: Hand::Right })
            .unwrap();
        assert!(
            !game
                .actor(id)
                .unwrap()
                .survivor()
                .unwrap()
                .weapon_in(Hand::Right)
                .unwrap()
                .needs_reload()
        );
    }

    #[test]
    fn level_gated_weapons_are_refused_at_blue() {
        let mut base = scenario(&["Amara"]);
        base.initial_zombies.push(ZombiePlacement {
            breed: String::from("walker"),
            zone: ZoneId(2),
            count: 1,
        });
        // Amara's rifle needs yellow.
        let mut game =
            Game::new(small_map(), GameData::default_config(), &base, None).unwrap();
        let id = game.active_survivor().unwrap();
        assert_eq!(
            game.submit_action(
                id,
                PlayerAction::Attack {
                    hand: Hand::Right,
                    target_zone: ZoneId(2),
                    targets: Vec::new(),
                }
            ),
            Err(RulesError::LevelTooLow)
        );
    }
}
