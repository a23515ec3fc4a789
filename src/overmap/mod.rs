//! The overmap aggregate
//!
//! An [`Overmap`] is one 180x180 region of the world with every z-level
//! stacked on top of each other. Accessors take signed coordinates and
//! never fail: out-of-range reads yield [`Terrain::Border`] or `false`, and
//! out-of-range writes are dropped.

mod layer;
mod query;

pub use layer::{rl_dist, trig_dist, MapLayer, Note};

use tracing::error;

use crate::monsters::MonsterGroup;
use crate::terrain::{LinkFamily, Terrain};

pub const OMAPX: i32 = 180;
pub const OMAPY: i32 = 180;
/// Levels below the surface.
pub const OVERMAP_DEPTH: i32 = 10;
/// Levels above the surface.
pub const OVERMAP_HEIGHT: i32 = 10;
pub const OVERMAP_LAYERS: usize = (OVERMAP_DEPTH + 1 + OVERMAP_HEIGHT) as usize;

/// A city seed, or a road stub leaving the map when `size` is zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct City {
    pub x: i32,
    pub y: i32,
    pub size: i32,
}

impl City {
    pub fn new(x: i32, y: i32, size: i32) -> Self {
        Self { x, y, size }
    }

    pub fn pos(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RadioKind {
    Broadcast,
    Weather,
}

impl RadioKind {
    pub fn code(self) -> u32 {
        match self {
            RadioKind::Broadcast => 0,
            RadioKind::Weather => 1,
        }
    }

    pub fn from_code(code: u32) -> Option<RadioKind> {
        match code {
            0 => Some(RadioKind::Broadcast),
            1 => Some(RadioKind::Weather),
            _ => None,
        }
    }
}

/// A transmitter at a surface tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RadioTower {
    pub x: i32,
    pub y: i32,
    pub strength: i32,
    pub kind: RadioKind,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct Overmap {
    loc: (i32, i32),
    layers: Vec<MapLayer>,
    pub cities: Vec<City>,
    pub roads_out: Vec<City>,
    pub monster_groups: Vec<MonsterGroup>,
    pub radios: Vec<RadioTower>,
    /// Serialized NPC records, passed through untouched.
    pub npcs: Vec<String>,
}

/// Layer index of a z-level, if it exists.
fn layer_index(z: i32) -> Option<usize> {
    if (-OVERMAP_DEPTH..=OVERMAP_HEIGHT).contains(&z) {
        Some((z + OVERMAP_DEPTH) as usize)
    } else {
        None
    }
}

impl Overmap {
    /// Empty region at grid coordinate `(x, y)` with default-filled layers.
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            loc: (x, y),
            layers: (-OVERMAP_DEPTH..=OVERMAP_HEIGHT).map(MapLayer::new).collect(),
            cities: Vec::new(),
            roads_out: Vec::new(),
            monster_groups: Vec::new(),
            radios: Vec::new(),
            npcs: Vec::new(),
        }
    }

    pub fn loc(&self) -> (i32, i32) {
        self.loc
    }

    pub fn layer(&self, z: i32) -> Option<&MapLayer> {
        layer_index(z).map(|i| &self.layers[i])
    }

    pub fn layer_mut(&mut self, z: i32) -> Option<&mut MapLayer> {
        layer_index(z).map(move |i| &mut self.layers[i])
    }

    pub fn layers(&self) -> impl Iterator<Item = &MapLayer> {
        self.layers.iter()
    }

    pub fn in_bounds(x: i32, y: i32) -> bool {
        (0..OMAPX).contains(&x) && (0..OMAPY).contains(&y)
    }

    /// Terrain at a tile, or [`Terrain::Border`] outside the region.
    pub fn ter(&self, x: i32, y: i32, z: i32) -> Terrain {
        self.layer(z)
            .and_then(|layer| layer.terrain.get(x, y))
            .copied()
            .unwrap_or(Terrain::Border)
    }

    /// Store terrain at a tile; writes outside the region are dropped.
    pub fn set_ter(&mut self, x: i32, y: i32, z: i32, terrain: Terrain) -> bool {
        if terrain == Terrain::Border {
            debug_assert!(false, "border written at ({}, {}, {})", x, y, z);
            error!(x, y, z, "refusing to store the border sentinel");
            return false;
        }
        match self.layer_mut(z) {
            Some(layer) => layer.terrain.set(x, y, terrain),
            None => false,
        }
    }

    pub fn seen(&self, x: i32, y: i32, z: i32) -> bool {
        self.layer(z)
            .and_then(|layer| layer.visible.get(x, y))
            .copied()
            .unwrap_or(false)
    }

    pub fn set_seen(&mut self, x: i32, y: i32, z: i32, seen: bool) -> bool {
        match self.layer_mut(z) {
            Some(layer) => layer.visible.set(x, y, seen),
            None => false,
        }
    }

    /// Every monster group whose radius covers the tile.
    pub fn monsters_at(&self, x: i32, y: i32, z: i32) -> Vec<&MonsterGroup> {
        if !Self::in_bounds(x, y) {
            return Vec::new();
        }
        self.monster_groups
            .iter()
            .filter(|g| g.covers(x, y, z))
            .collect()
    }

    pub fn is_river(&self, x: i32, y: i32, z: i32) -> bool {
        self.ter(x, y, z).is_river()
    }

    /// Off-map tiles adjacent to a road stub count as connected.
    fn touches_road_out(&self, x: i32, y: i32) -> bool {
        !Self::in_bounds(x, y)
            && self
                .roads_out
                .iter()
                .any(|r| (r.x - x).abs() + (r.y - y).abs() <= 1)
    }

    /// Whether `(x, y)` joins the given connectivity family.
    pub fn is_road(&self, family: LinkFamily, x: i32, y: i32, z: i32) -> bool {
        if family == LinkFamily::Road && self.touches_road_out(x, y) {
            return true;
        }
        family.contains(self.ter(x, y, z))
    }

    /// Any passable linear structure: roads, subways, sewers, and the rifts
    /// that cut through them.
    pub fn is_any_road(&self, x: i32, y: i32, z: i32) -> bool {
        let ter = self.ter(x, y, z);
        if matches!(ter, Terrain::Rift | Terrain::Hellmouth) {
            return true;
        }
        if self.touches_road_out(x, y) {
            return true;
        }
        matches!(
            ter.link_family(),
            Some(LinkFamily::Road | LinkFamily::Subway | LinkFamily::Sewer)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monsters::MonsterCategory;
    use crate::terrain::Link;

    #[test]
    fn test_out_of_range_reads_are_border() {
        let om = Overmap::new(0, 0);
        for &(x, y, z) in &[
            (-1, 0, 0),
            (0, -1, 0),
            (OMAPX, 0, 0),
            (0, OMAPY, 0),
            (0, 0, OVERMAP_HEIGHT + 1),
            (0, 0, -OVERMAP_DEPTH - 1),
        ] {
            assert_eq!(om.ter(x, y, z), Terrain::Border);
            assert!(!om.seen(x, y, z));
        }
        assert_eq!(om.ter(0, 0, 0), Terrain::Field);
        assert_eq!(om.ter(0, 0, -OVERMAP_DEPTH), Terrain::Rock);
        assert_eq!(om.ter(0, 0, OVERMAP_HEIGHT), Terrain::OpenAir);
    }

    #[test]
    fn test_out_of_range_writes_are_dropped() {
        let mut om = Overmap::new(0, 0);
        assert!(!om.set_ter(-1, 5, 0, Terrain::Forest));
        assert!(!om.set_seen(5, 5, 99, true));
        assert!(om.set_ter(5, 5, 0, Terrain::Forest));
        assert!(om.set_seen(5, 5, 0, true));
        assert!(om.seen(5, 5, 0));
    }

    #[test]
    fn test_road_stub_connects_off_map() {
        let mut om = Overmap::new(0, 0);
        om.roads_out.push(City::new(50, 0, 0));
        om.set_ter(50, 0, 0, Terrain::Road(Link::Unset));
        assert!(om.is_road(LinkFamily::Road, 50, -1, 0));
        assert!(!om.is_road(LinkFamily::Road, 60, -1, 0));
        assert!(!om.is_road(LinkFamily::Sewer, 50, -1, 0));
        assert!(om.is_road(LinkFamily::Road, 50, 0, 0));
    }

    #[test]
    fn test_monsters_at_filters_by_radius() {
        let mut om = Overmap::new(0, 0);
        om.monster_groups
            .push(MonsterGroup::new(MonsterCategory::Zombie, 20, 20, 0, 4, 50));
        om.monster_groups
            .push(MonsterGroup::new(MonsterCategory::Ant, 100, 100, 0, 4, 50));
        assert_eq!(om.monsters_at(22, 22, 0).len(), 1);
        assert!(om.monsters_at(-5, 20, 0).is_empty());
    }
}
