//! Shortest-route queries over the zone graph.
//!
//! Breadth-first search over passable connections only: walls and closed
//! doors do not exist as far as routing is concerned. Ties between
//! equal-length routes resolve by link insertion order, so results are
//! deterministic for a given map.

use crate::error::RulesError;
use crate::map::{Map, ZoneId};

/// Shortest passable route from `from` to `to`, inclusive of both endpoints.
///
/// `from == to` yields the single-element route `[from]`.
///
/// # Errors
///
/// [`RulesError::Unreachable`] when no passable route exists.
pub fn shortest_path(map: &Map, from: ZoneId, to: ZoneId) -> Result<Vec<ZoneId>, RulesError> {
    if from == to {
        return Ok(vec![from]);
    }
    let parents = bfs_parents(map, from, Some(to));
    let Some(_) = parents[to.0] else {
        return Err(RulesError::Unreachable(from, to));
    };

    let mut route = vec![to];
    let mut cursor = to;
    while cursor != from {
        // parents form a chain back to the origin by construction
        let parent = parents[cursor.0].unwrap_or(from);
        route.push(parent);
        cursor = parent;
    }
    route.reverse();
    Ok(route)
}

/// Passable hop count between two zones.
///
/// # Errors
///
/// [`RulesError::Unreachable`] when no passable route exists.
pub fn hop_distance(map: &Map, from: ZoneId, to: ZoneId) -> Result<usize, RulesError> {
    shortest_path(map, from, to).map(|route| route.len() - 1)
}

/// Hop counts from `from` to every zone; `None` for unreachable zones.
#[must_use]
pub fn distances_from(map: &Map, from: ZoneId) -> Vec<Option<usize>> {
    let mut distances = vec![None; map.zone_count()];
    if from.0 >= map.zone_count() {
        return distances;
    }
    distances[from.0] = Some(0);
    let mut frontier = std::collections::VecDeque::from([from]);
    while let Some(current) = frontier.pop_front() {
        let next_hop = distances[current.0].unwrap_or(0) + 1;
        let Some(zone) = map.zone(current) else {
            continue;
        };
        for link in &zone.links {
            if link.passable() && distances[link.to.0].is_none() {
                distances[link.to.0] = Some(next_hop);
                frontier.push_back(link.to);
            }
        }
    }
    distances
}

fn bfs_parents(map: &Map, from: ZoneId, stop_at: Option<ZoneId>) -> Vec<Option<ZoneId>> {
    let mut parents: Vec<Option<ZoneId>> = vec![None; map.zone_count()];
    let mut visited = vec![false; map.zone_count()];
    if from.0 >= map.zone_count() {
        return parents;
    }
    visited[from.0] = true;
    let mut frontier = std::collections::VecDeque::from([from]);
    while let Some(current) = frontier.pop_front() {
        let Some(zone) = map.zone(current) else {
            continue;
        };
        for link in &zone.links {
            if link.passable() && !visited[link.to.0] {
                visited[link.to.0] = true;
                parents[link.to.0] = Some(current);
                if stop_at == Some(link.to) {
                    return parents;
                }
                frontier.push_back(link.to);
            }
        }
    }
    parents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{LinkKind, Map};

    /// A 2x3 grid with a closed door splitting the middle:
    ///
    /// ```text
    /// 0 - 1 - 2
    /// |   D   |
    /// 3 - 4 - 5
    /// ```
    fn grid_with_door() -> Map {
        Map::builder(6)
            .link(0, 1, LinkKind::Open)
            .link(1, 2, LinkKind::Open)
            .link(3, 4, LinkKind::Open)
            .link(4, 5, LinkKind::Open)
            .link(0, 3, LinkKind::Open)
            .link(1, 4, LinkKind::Door)
            .link(2, 5, LinkKind::Open)
            .build()
            .unwrap()
    }

    #[test]
    fn trivial_route_is_the_origin() {
        let map = grid_with_door();
        assert_eq!(
            shortest_path(&map, ZoneId(2), ZoneId(2)).unwrap(),
            vec![ZoneId(2)]
        );
        assert_eq!(hop_distance(&map, ZoneId(2), ZoneId(2)).unwrap(), 0);
    }

    #[test]
    fn routes_around_closed_doors() {
        let map = grid_with_door();
        // 1 -> 4 directly is a closed door; the detour goes through a corner.
        let route = shortest_path(&map, ZoneId(1), ZoneId(4)).unwrap();
        assert_eq!(route.len(), 4);
        assert_eq!(route[0], ZoneId(1));
        assert_eq!(route[3], ZoneId(4));
    }

    #[test]
    fn open_door_shortens_the_route() {
        let mut map = grid_with_door();
        map.open_door(ZoneId(1), ZoneId(4)).unwrap();
        assert_eq!(
            shortest_path(&map, ZoneId(1), ZoneId(4)).unwrap(),
            vec![ZoneId(1), ZoneId(4)]
        );
    }

    #[test]
    fn unreachable_zone_is_an_error() {
        let map = Map::builder(3)
            .link(0, 1, LinkKind::Open)
            .link(1, 2, LinkKind::Wall)
            .build()
            .unwrap();
        assert_eq!(
            shortest_path(&map, ZoneId(0), ZoneId(2)),
            Err(RulesError::Unreachable(ZoneId(0), ZoneId(2)))
        );
        assert_eq!(
            hop_distance(&map, ZoneId(2), ZoneId(0)),
            Err(RulesError::Unreachable(ZoneId(2), ZoneId(0)))
        );
    }

    #[test]
    fn route_ties_follow_link_order() {
        // Two equal-length routes from 0 to 3; the one through the
        // earlier-inserted link wins.
        let map = Map::builder(4)
            .link(0, 1, LinkKind::Open)
            .link(0, 2, LinkKind::Open)
            .link(1, 3, LinkKind::Open)
            .link(2, 3, LinkKind::Open)
            .build()
            .unwrap();
        assert_eq!(
            shortest_path(&map, ZoneId(0), ZoneId(3)).unwrap(),
            vec![ZoneId(0), ZoneId(1), ZoneId(3)]
        );
    }

    #[test]
    fn distances_match_pairwise_queries() {
        let map = grid_with_door();
        let distances = distances_from(&map, ZoneId(0));
        for zone in 0..map.zone_count() {
            let expected = hop_distance(&map, ZoneId(0), ZoneId(zone)).ok();
            assert_eq!(distances[zone], expected, "zone {zone}");
        }
    }
}
