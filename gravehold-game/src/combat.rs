//! Dice resolution for attacks.
//!
//! The pipeline is the same for survivors and zombies: roll a pool, count
//! faces meeting the success threshold, then allocate eliminations against
//! target toughness. Randomness comes from the game's seeded generator; with
//! no generator attached every die shows its highest face, which keeps
//! replays and serialized games deterministic.

use rand::Rng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::entities::EntityId;

/// Faces on a combat die.
pub const DIE_FACES: u8 = 6;

/// Rolled faces for one attack. Pools rarely exceed six dice.
pub type DicePool = SmallVec<[u8; 6]>;

/// Roll `count` dice. Without a generator every die shows [`DIE_FACES`].
#[must_use]
pub fn roll_dice(rng: Option<&mut ChaCha20Rng>, count: u8) -> DicePool {
    match rng {
        Some(rng) => (0..count)
            .map(|_| rng.random_range(1..=DIE_FACES))
            .collect(),
        None => (0..count).map(|_| DIE_FACES).collect(),
    }
}

/// Faces meeting or exceeding the threshold.
#[must_use]
pub fn count_successes(rolls: &[u8], threshold: u8) -> u8 {
    let hits = rolls.iter().filter(|face| **face >= threshold).count();
    u8::try_from(hits).unwrap_or(u8::MAX)
}

/// Allocate successes against targets in the given order.
///
/// Each success eliminates one target whose toughness the damage value
/// meets; tougher targets are skipped untouched, and leftover successes are
/// wasted. There is no partial damage.
#[must_use]
pub fn allocate_hits(
    successes: u8,
    damage: u8,
    targets: &[(EntityId, u8)],
) -> Vec<EntityId> {
    let mut remaining = successes;
    let mut eliminated = Vec::new();
    for (id, toughness) in targets {
        if remaining == 0 {
            break;
        }
        if *toughness <= damage {
            eliminated.push(*id);
            remaining -= 1;
        }
    }
    eliminated
}

/// Everything a resolved attack produced, for reporting and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub rolls: Vec<u8>,
    pub successes: u8,
    pub eliminated: Vec<EntityId>,
    /// Survivors whose level rose from the kills, in award order.
    pub promotions: Vec<EntityId>,
    /// Noise added to the attack zone.
    pub noise: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn rolls_stay_on_die_faces() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        for _ in 0..50 {
            let pool = roll_dice(Some(&mut rng), 4);
            assert_eq!(pool.len(), 4);
            assert!(pool.iter().all(|face| (1..=DIE_FACES).contains(face)));
        }
    }

    #[test]
    fn rolling_without_a_generator_maxes_every_die() {
        assert_eq!(roll_dice(None, 3).as_slice(), &[6, 6, 6]);
        assert!(roll_dice(None, 0).is_empty());
    }

    #[test]
    fn same_seed_same_pool() {
        let mut a = ChaCha20Rng::seed_from_u64(99);
        let mut b = ChaCha20Rng::seed_from_u64(99);
        assert_eq!(roll_dice(Some(&mut a), 6), roll_dice(Some(&mut b), 6));
    }

    #[test]
    fn successes_meet_or_exceed_the_threshold() {
        assert_eq!(count_successes(&[1, 3, 4, 4, 6], 4), 3);
        assert_eq!(count_successes(&[1, 2, 3], 4), 0);
        assert_eq!(count_successes(&[], 4), 0);
        assert_eq!(count_successes(&[6, 6], 6), 2);
    }

    #[test]
    fn hits_skip_targets_too_tough_to_kill() {
        let targets = [
            (EntityId(10), 2),
            (EntityId(11), 1),
            (EntityId(12), 1),
        ];
        // Damage 1 cannot touch the first target.
        assert_eq!(
            allocate_hits(2, 1, &targets),
            vec![EntityId(11), EntityId(12)]
        );
        // Damage 2 kills in order.
        assert_eq!(
            allocate_hits(2, 2, &targets),
            vec![EntityId(10), EntityId(11)]
        );
    }

    #[test]
    fn excess_successes_are_wasted() {
        let targets = [(EntityId(4), 1)];
        assert_eq!(allocate_hits(5, 1, &targets), vec![EntityId(4)]);
        assert_eq!(allocate_hits(0, 3, &targets), Vec::<EntityId>::new());
    }
}
