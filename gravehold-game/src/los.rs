//! Line-of-sight and noise-tracking queries.
//!
//! Sight propagates through the same connections movement does: open
//! connections and opened doors carry sight, walls and closed doors block
//! it. Keeping sight-passability equal to movement-passability means a
//! zombie that can see a survivor always has a route to them, which the AI
//! relies on.

use crate::map::{Map, ZoneId};
use crate::path::distances_from;

/// Whether `to` is visible from `from`. A zone always sees itself.
#[must_use]
pub fn has_line_of_sight(map: &Map, from: ZoneId, to: ZoneId) -> bool {
    if from == to {
        return from.0 < map.zone_count();
    }
    distances_from(map, from)
        .get(to.0)
        .is_some_and(Option::is_some)
}

/// All zones visible from `from`, in ascending id order.
#[must_use]
pub fn visible_zones(map: &Map, from: ZoneId) -> Vec<ZoneId> {
    distances_from(map, from)
        .iter()
        .enumerate()
        .filter(|(_, distance)| distance.is_some())
        .map(|(zone, _)| ZoneId(zone))
        .collect()
}

/// The visible zone carrying the most noise, or `None` when every visible
/// zone is silent.
///
/// Ties break deterministically: loudest first, then fewest hops from
/// `from`, then lowest zone id.
#[must_use]
pub fn noisiest_visible_zone(map: &Map, from: ZoneId) -> Option<ZoneId> {
    let distances = distances_from(map, from);
    let mut best: Option<(u32, usize, ZoneId)> = None;
    for (zone, distance) in distances.iter().enumerate() {
        let Some(hops) = distance else { continue };
        let zone = ZoneId(zone);
        let noise = map.noise(zone);
        if noise == 0 {
            continue;
        }
        let candidate = (noise, *hops, zone);
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let (best_noise, best_hops, best_zone) = current;
                // louder wins; on equal noise nearer wins; on equal
                // distance the lower id wins
                if noise > best_noise
                    || (noise == best_noise && *hops < best_hops)
                    || (noise == best_noise && *hops == best_hops && zone < best_zone)
                {
                    Some(candidate)
                } else {
                    Some(current)
                }
            }
        };
    }
    best.map(|(_, _, zone)| zone)
}
