//! Zone graph: zones, their connections, doors, noise, and occupancy.
//!
//! The map is a finite graph of zones. Every connection is stored on both
//! endpoints and kept symmetric by the builder and by [`Map::open_door`], so
//! `link_kind(a, b)` and `link_kind(b, a)` always agree.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::entities::EntityId;
use crate::error::{RulesError, SetupError};

/// Stable zone identity; also the index into the zone arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ZoneId(pub usize);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Z{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Open,
    Wall,
    Door,
}

/// Map features a zone can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneFeature {
    /// Mission objective; claimed by a survivor ending a move here.
    Objective,
    /// Zombies spawn here during the spawn phase.
    SpawnPoint,
    /// Survivors may leave the board here.
    Exit,
    /// Survivors may search for equipment here.
    Searchable,
}

/// One side of a symmetric connection between two adjacent zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub to: ZoneId,
    pub kind: LinkKind,
    /// Door-open flag; meaningful only when `kind` is [`LinkKind::Door`].
    #[serde(default)]
    pub open: bool,
}

impl Link {
    /// Whether an entity can cross this link right now.
    #[must_use]
    pub const fn passable(&self) -> bool {
        match self.kind {
            LinkKind::Open => true,
            LinkKind::Wall => false,
            LinkKind::Door => self.open,
        }
    }
}

pub type LinkList = SmallVec<[Link; 4]>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    #[serde(default)]
    pub features: Vec<ZoneFeature>,
    #[serde(default)]
    pub links: LinkList,
    /// Per-turn noise accumulator, reset at turn closure. Never negative.
    #[serde(default)]
    pub noise: u32,
    /// Entities currently in this zone, in arrival order.
    #[serde(default)]
    pub occupants: Vec<EntityId>,
}

impl Zone {
    fn new(id: ZoneId) -> Self {
        Self {
            id,
            features: Vec::new(),
            links: LinkList::new(),
            noise: 0,
            occupants: Vec::new(),
        }
    }

    #[must_use]
    pub fn has_feature(&self, feature: ZoneFeature) -> bool {
        self.features.contains(&feature)
    }

    fn link_to(&self, other: ZoneId) -> Option<&Link> {
        self.links.iter().find(|link| link.to == other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    zones: Vec<Zone>,
}

impl Map {
    /// Start building a map with `zones` zones, identified `0..zones`.
    #[must_use]
    pub fn builder(zones: usize) -> MapBuilder {
        MapBuilder::new(zones)
    }

    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id.0)
    }

    pub(crate) fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(id.0)
    }

    pub fn zones(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Connection kind between two directly linked zones.
    ///
    /// # Errors
    ///
    /// Returns [`RulesError::NotAdjacent`] when the zones are not directly
    /// linked (or either id is unknown).
    pub fn link_kind(&self, a: ZoneId, b: ZoneId) -> Result<LinkKind, RulesError> {
        self.link(a, b)
            .map(|link| link.kind)
            .ok_or(RulesError::NotAdjacent(a, b))
    }

    fn link(&self, a: ZoneId, b: ZoneId) -> Option<&Link> {
        self.zone(a).and_then(|zone| zone.link_to(b))
    }

    /// True iff the connection is open, or a door whose door-open flag is set.
    /// Walls are never passable; unknown or non-adjacent pairs are not either.
    #[must_use]
    pub fn is_passable(&self, a: ZoneId, b: ZoneId) -> bool {
        self.link(a, b).is_some_and(Link::passable)
    }

    /// Open the door between two zones. Idempotent; both sides are updated.
    ///
    /// # Errors
    ///
    /// [`RulesError::NotAdjacent`] when the zones are not linked,
    /// [`RulesError::NotADoor`] when the connection is not a door.
    pub fn open_door(&mut self, a: ZoneId, b: ZoneId) -> Result<(), RulesError> {
        match self.link_kind(a, b)? {
            LinkKind::Door => {}
            LinkKind::Open | LinkKind::Wall => return Err(RulesError::NotADoor(a, b)),
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(zone) = self.zone_mut(from)
                && let Some(link) = zone.links.iter_mut().find(|link| link.to == to)
            {
                link.open = true;
            }
        }
        Ok(())
    }

    /// Add to the zone's running noise total for the current turn.
    pub fn add_noise(&mut self, zone: ZoneId, amount: u32) {
        if let Some(zone) = self.zone_mut(zone) {
            zone.noise = zone.noise.saturating_add(amount);
        }
    }

    #[must_use]
    pub fn noise(&self, zone: ZoneId) -> u32 {
        self.zone(zone).map_or(0, |zone| zone.noise)
    }

    /// Reset every zone's noise to zero. Called at turn closure.
    pub fn reset_noise(&mut self) {
        for zone in &mut self.zones {
            zone.noise = 0;
        }
    }

    /// Read-only snapshot of a zone's occupants.
    #[must_use]
    pub fn occupants(&self, zone: ZoneId) -> &[EntityId] {
        self.zone(zone).map_or(&[], |zone| zone.occupants.as_slice())
    }

    pub(crate) fn insert_occupant(&mut self, zone: ZoneId, entity: EntityId) {
        if let Some(zone) = self.zone_mut(zone)
            && !zone.occupants.contains(&entity)
        {
            zone.occupants.push(entity);
        }
    }

    pub(crate) fn remove_occupant(&mut self, zone: ZoneId, entity: EntityId) {
        if let Some(zone) = self.zone_mut(zone) {
            zone.occupants.retain(|occupant| *occupant != entity);
        }
    }

    /// Move an entity between two adjacent zones, updating both occupant
    /// sets atomically. The caller owns the entity's own zone reference.
    ///
    /// # Errors
    ///
    /// [`RulesError::NotAdjacent`] when there is no direct link,
    /// [`RulesError::Impassable`] when the link cannot be crossed.
    pub fn move_occupant(
        &mut self,
        entity: EntityId,
        from: ZoneId,
        to: ZoneId,
    ) -> Result<(), RulesError> {
        let link = self.link(from, to).ok_or(RulesError::NotAdjacent(from, to))?;
        if !link.passable() {
            return Err(RulesError::Impassable(from, to));
        }
        self.remove_occupant(from, entity);
        self.insert_occupant(to, entity);
        Ok(())
    }

    /// Remove a feature from a zone, returning whether it was present.
    pub(crate) fn take_feature(&mut self, zone: ZoneId, feature: ZoneFeature) -> bool {
        self.zone_mut(zone).is_some_and(|zone| {
            let before = zone.features.len();
            zone.features.retain(|entry| *entry != feature);
            zone.features.len() != before
        })
    }

    /// Zones carrying a feature, in id order.
    pub fn zones_with_feature(&self, feature: ZoneFeature) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones
            .iter()
            .filter(move |zone| zone.has_feature(feature))
            .map(|zone| zone.id)
    }
}

/// Construction-time map assembly with static-data validation.
///
/// Links are declared once per pair and materialized on both endpoints, which
/// is what keeps the symmetry invariant structural rather than policed.
#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    zone_count: usize,
    features: Vec<(usize, ZoneFeature)>,
    links: Vec<(usize, usize, LinkKind)>,
}

impl MapBuilder {
    #[must_use]
    pub fn new(zone_count: usize) -> Self {
        Self {
            zone_count,
            features: Vec::new(),
            links: Vec::new(),
        }
    }

    #[must_use]
    pub fn feature(mut self, zone: usize, feature: ZoneFeature) -> Self {
        self.features.push((zone, feature));
        self
    }

    /// Declare a symmetric connection between two zones.
    #[must_use]
    pub fn link(mut self, a: usize, b: usize, kind: LinkKind) -> Self {
        self.links.push((a, b, kind));
        self
    }

    /// Validate and build the map.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] for an empty map, out-of-range zone indices,
    /// self-links, or duplicate link declarations.
    pub fn build(self) -> Result<Map, SetupError> {
        if self.zone_count == 0 {
            return Err(SetupError::EmptyMap);
        }
        let check = |zone: usize| {
            if zone >= self.zone_count {
                Err(SetupError::ZoneOutOfRange {
                    zone,
                    zones: self.zone_count,
                })
            } else {
                Ok(())
            }
        };

        let mut zones: Vec<Zone> = (0..self.zone_count).map(|id| Zone::new(ZoneId(id))).collect();

        for (zone, feature) in self.features {
            check(zone)?;
            if !zones[zone].features.contains(&feature) {
                zones[zone].features.push(feature);
            }
        }

        for (a, b, kind) in self.links {
            check(a)?;
            check(b)?;
            if a == b {
                return Err(SetupError::SelfLink { zone: a });
            }
            if zones[a].link_to(ZoneId(b)).is_some() {
                return Err(SetupError::DuplicateLink { a, b });
            }
            for (from, to) in [(a, b), (b, a)] {
                zones[from].links.push(Link {
                    to: ZoneId(to),
                    kind,
                    open: false,
                });
            }
        }

        Ok(Map { zones })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_zone_map() -> Map {
        // 0 -wall- 1, 0 -door- 2, 1 -open- 2
        Map::builder(3)
            .link(0, 1, LinkKind::Wall)
            .link(0, 2, LinkKind::Door)
            .link(1, 2, LinkKind::Open)
            .build()
            .unwrap()
    }

    #[test]
    fn links_are_symmetric() {
        let map = three_zone_map();
        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            let forward = map.link_kind(ZoneId(a), ZoneId(b)).unwrap();
            let back = map.link_kind(ZoneId(b), ZoneId(a)).unwrap();
            assert_eq!(forward, back);
        }
    }

    #[test]
    fn walls_and_closed_doors_block_passage() {
        let mut map = three_zone_map();
        assert!(!map.is_passable(ZoneId(0), ZoneId(1)));
        assert!(!map.is_passable(ZoneId(0), ZoneId(2)));
        assert!(map.is_passable(ZoneId(1), ZoneId(2)));

        map.open_door(ZoneId(0), ZoneId(2)).unwrap();
        assert!(map.is_passable(ZoneId(0), ZoneId(2)));
        assert!(map.is_passable(ZoneId(2), ZoneId(0)), "door opens on both sides");
    }

    #[test]
    fn open_door_is_idempotent_and_door_only() {
        let mut map = three_zone_map();
        map.open_door(ZoneId(0), ZoneId(2)).unwrap();
        map.open_door(ZoneId(2), ZoneId(0)).unwrap();
        assert!(map.is_passable(ZoneId(0), ZoneId(2)));

        assert_eq!(
            map.open_door(ZoneId(0), ZoneId(1)),
            Err(RulesError::NotADoor(ZoneId(0), ZoneId(1)))
        );
        assert_eq!(
            map.open_door(ZoneId(1), ZoneId(2)),
            Err(RulesError::NotADoor(ZoneId(1), ZoneId(2)))
        );
    }

    #[test]
    fn unknown_pairs_are_not_adjacent() {
        let map = three_zone_map();
        assert_eq!(
            map.link_kind(ZoneId(0), ZoneId(9)),
            Err(RulesError::NotAdjacent(ZoneId(0), ZoneId(9)))
        );
        assert!(!map.is_passable(ZoneId(0), ZoneId(9)));
    }

    #[test]
    fn move_occupant_updates_both_zones() {
        let mut map = three_zone_map();
        let entity = EntityId(7);
        map.insert_occupant(ZoneId(1), entity);

        map.move_occupant(entity, ZoneId(1), ZoneId(2)).unwrap();
        assert!(map.occupants(ZoneId(1)).is_empty());
        assert_eq!(map.occupants(ZoneId(2)), &[entity]);

        assert_eq!(
            map.move_occupant(entity, ZoneId(2), ZoneId(0)),
            Err(RulesError::Impassable(ZoneId(2), ZoneId(0)))
        );
        assert_eq!(map.occupants(ZoneId(2)), &[entity], "failed move mutates nothing");
    }

    #[test]
    fn noise_accumulates_and_resets() {
        let mut map = three_zone_map();
        map.add_noise(ZoneId(1), 2);
        map.add_noise(ZoneId(1), 1);
        assert_eq!(map.noise(ZoneId(1)), 3);
        assert_eq!(map.noise(ZoneId(0)), 0);

        map.reset_noise();
        assert_eq!(map.noise(ZoneId(1)), 0);
    }

    #[test]
    fn builder_rejects_bad_topology() {
        assert_eq!(Map::builder(0).build(), Err(SetupError::EmptyMap));
        assert_eq!(
            Map::builder(2).link(0, 5, LinkKind::Open).build(),
            Err(SetupError::ZoneOutOfRange { zone: 5, zones: 2 })
        );
        assert_eq!(
            Map::builder(2).link(1, 1, LinkKind::Open).build(),
            Err(SetupError::SelfLink { zone: 1 })
        );
        assert_eq!(
            Map::builder(2)
                .link(0, 1, LinkKind::Open)
                .link(1, 0, LinkKind::Wall)
                .build(),
            Err(SetupError::DuplicateLink { a: 1, b: 0 })
        );
    }
}
