//! Zombie decision rules.
//!
//! Zombies follow a fixed priority with no randomness:
//!
//! 1. a survivor shares the zone: attack, never move away;
//! 2. any survivor is visible: step toward the loudest survivor-held
//!    zone, nearest first on equal noise;
//! 3. otherwise: step toward the noisiest audible zone, or hold still
//!    in silence.
//!
//! Both rules rank zones the same way (noise, then hop distance, then
//! zone id), so two runs of the same state make identical decisions.

use crate::los::noisiest_visible_zone;
use crate::map::{Map, ZoneId};
use crate::path::{distances_from, shortest_path};

/// What a zombie chose to do with one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZombieDecision {
    /// Survivors share the zone; spend the action attacking.
    Attack,
    /// Step into the adjacent zone.
    Step(ZoneId),
    /// Nothing to chase and nothing to hear.
    Hold,
}

/// Decide one zombie action given the zones currently holding live
/// survivors.
#[must_use]
pub fn decide(map: &Map, zombie_zone: ZoneId, survivor_zones: &[ZoneId]) -> ZombieDecision {
    if survivor_zones.contains(&zombie_zone) {
        return ZombieDecision::Attack;
    }

    // Rank visible survivor zones louder-first, then nearer, then by id.
    // Noise of zero still qualifies; sight alone is enough under rule 2.
    let distances = distances_from(map, zombie_zone);
    let mut chased: Option<(u32, usize, ZoneId)> = None;
    for zone in survivor_zones {
        let Some(hops) = distances.get(zone.0).copied().flatten() else {
            continue;
        };
        let candidate = (map.noise(*zone), hops, *zone);
        let better = chased.is_none_or(|(noise, best_hops, best_zone)| {
            candidate.0 > noise
                || (candidate.0 == noise && hops < best_hops)
                || (candidate.0 == noise && hops == best_hops && *zone < best_zone)
        });
        if better {
            chased = Some(candidate);
        }
    }
    let target = match chased {
        Some((_, _, zone)) => zone,
        None => match noisiest_visible_zone(map, zombie_zone) {
            Some(zone) if zone != zombie_zone => zone,
            _ => return ZombieDecision::Hold,
        },
    };

    match shortest_path(map, zombie_zone, target) {
        Ok(route) if route.len() > 1 => ZombieDecision::Step(route[1]),
        _ => ZombieDecision::Hold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{LinkKind, Map};

    /// 0 - 1 - 2 - 3 open corridor with a closed door to a side room 4
    /// off zone 1.
    fn corridor_with_room() -> Map {
        Map::builder(5)
            .link(0, 1, LinkKind::Open)
            .link(1, 2, LinkKind::Open)
            .link(2, 3, LinkKind::Open)
            .link(1, 4, LinkKind::Door)
            .build()
            .unwrap()
    }

    #[test]
    fn shared_zone_means_attack() {
        let map = corridor_with_room();
        assert_eq!(
            decide(&map, ZoneId(2), &[ZoneId(2), ZoneId(0)]),
            ZombieDecision::Attack
        );
    }

    #[test]
    fn steps_toward_the_nearest_visible_survivor() {
        let map = corridor_with_room();
        assert_eq!(
            decide(&map, ZoneId(0), &[ZoneId(3)]),
            ZombieDecision::Step(ZoneId(1))
        );
        // Zone 2 is nearer than zone 3 from zone 0.
        assert_eq!(
            decide(&map, ZoneId(0), &[ZoneId(3), ZoneId(2)]),
            ZombieDecision::Step(ZoneId(1))
        );
    }

    #[test]
    fn equal_distance_prefers_the_lower_zone_id() {
        let map = corridor_with_room();
        // From zone 1, zones 0 and 2 are both one hop away.
        assert_eq!(
            decide(&map, ZoneId(1), &[ZoneId(2), ZoneId(0)]),
            ZombieDecision::Step(ZoneId(0))
        );
    }

    #[test]
    fn louder_survivor_zones_outrank_lower_ids() {
        let mut map = corridor_with_room();
        // Zones 0 and 2 are both one hop from zone 1; without noise the
        // lower id wins, with noise the louder zone does.
        map.add_noise(ZoneId(2), 2);
        assert_eq!(
            decide(&map, ZoneId(1), &[ZoneId(0), ZoneId(2)]),
            ZombieDecision::Step(ZoneId(2))
        );
    }

    #[test]
    fn hidden_survivors_fall_through_to_noise() {
        let mut map = corridor_with_room();
        map.add_noise(ZoneId(3), 2);
        // The survivor hides behind the closed door; the zombie follows
        // the noise instead.
        assert_eq!(
            decide(&map, ZoneId(0), &[ZoneId(4)]),
            ZombieDecision::Step(ZoneId(1))
        );
    }

    #[test]
    fn noise_in_the_own_zone_means_hold() {
        let mut map = corridor_with_room();
        map.add_noise(ZoneId(0), 5);
        assert_eq!(decide(&map, ZoneId(0), &[ZoneId(4)]), ZombieDecision::Hold);
    }

    #[test]
    fn silence_and_no_targets_means_hold() {
        let map = corridor_with_room();
        assert_eq!(decide(&map, ZoneId(3), &[]), ZombieDecision::Hold);
        assert_eq!(decide(&map, ZoneId(3), &[ZoneId(4)]), ZombieDecision::Hold);
    }
}
