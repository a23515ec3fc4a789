//! Points of interest ("specials") and the sector-based placer that scatters
//! them over the surface.
//!
//! The surface is split into square sectors visited in random order. Each
//! sector samples a handful of points; the first point where some special is
//! eligible gets one, preferring specials still short of their minimum count.
//! Nothing is guaranteed globally: a sector without an eligible point is
//! simply skipped.

use std::ops::BitOr;

use rand_chacha::ChaCha8Rng;
use tracing::{debug, error};

use crate::config::Span;
use crate::dice::Dice;
use crate::monsters::{MonsterCategory, MonsterGroup};
use crate::overmap::{rl_dist, Overmap, OMAPX, OMAPY};
use crate::terrain::{Axis, Facing, Link, LinkFamily, RiverShape, ShopKind, Terrain};

use super::highways::make_hiway;
use super::GenerationContext;

/// Shape and attachment flags of a special.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpecialFlags(u16);

impl SpecialFlags {
    pub const NONE: SpecialFlags = SpecialFlags(0);
    /// Turn the building to face an adjacent road.
    pub const ROTATE_ROAD: SpecialFlags = SpecialFlags(1);
    /// Random facing when no road is adjacent.
    pub const ROTATE_RANDOM: SpecialFlags = SpecialFlags(1 << 1);
    /// Fill the surrounding 3x3 block with the same terrain.
    pub const THREE_BY_THREE: SpecialFlags = SpecialFlags(1 << 2);
    /// Entrance tile plus a 3x3 body of the secondary terrain, set back from the road.
    pub const THREE_BY_THREE_SECOND: SpecialFlags = SpecialFlags(1 << 3);
    /// Scatter copies around the centre, thinning with distance.
    pub const BLOB: SpecialFlags = SpecialFlags(1 << 4);
    /// Cover every eligible tile of the surrounding 7x7 block.
    pub const BIG: SpecialFlags = SpecialFlags(1 << 5);
    /// Connect to the nearest city with a road.
    pub const ROAD: SpecialFlags = SpecialFlags(1 << 6);
    /// Parking lot to the north, connected to the nearest city.
    pub const PARKING_LOT: SpecialFlags = SpecialFlags(1 << 7);

    pub fn contains(self, other: SpecialFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for SpecialFlags {
    type Output = SpecialFlags;

    fn bitor(self, rhs: SpecialFlags) -> SpecialFlags {
        SpecialFlags(self.0 | rhs.0)
    }
}

/// Where a special may sit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Open ground: fields, woods and craters.
    Land,
    /// Inside a forest.
    Forest,
    /// Fields and woods.
    Wilderness,
    /// Open ground fronting a straight road or highway.
    ByHighway,
}

impl Placement {
    pub fn allows(self, om: &Overmap, x: i32, y: i32) -> bool {
        let t = om.ter(x, y, 0);
        match self {
            Placement::Land => is_land(t),
            Placement::Forest => matches!(t, Terrain::Forest | Terrain::ForestThick),
            Placement::Wilderness => matches!(t, Terrain::Field | Terrain::Forest | Terrain::ForestThick),
            Placement::ByHighway => is_land(t) && fronts_highway(om, x, y),
        }
    }
}

fn is_land(t: Terrain) -> bool {
    matches!(t, Terrain::Field | Terrain::Forest | Terrain::ForestThick | Terrain::Crater)
}

fn fronts_highway(om: &Overmap, x: i32, y: i32) -> bool {
    let east_west = |t: Terrain| {
        matches!(t, Terrain::Road(Link::Ew) | Terrain::Highway(Axis::EastWest) | Terrain::Road(Link::Unset))
    };
    let north_south = |t: Terrain| {
        matches!(t, Terrain::Road(Link::Ns) | Terrain::Highway(Axis::NorthSouth) | Terrain::Road(Link::Unset))
    };
    east_west(om.ter(x, y - 1, 0))
        || east_west(om.ter(x, y + 1, 0))
        || north_south(om.ter(x - 1, y, 0))
        || north_south(om.ter(x + 1, y, 0))
}

/// Monster population placed with a special.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpecialMonsters {
    pub category: MonsterCategory,
    pub population: Span,
    pub radius: Span,
}

/// A curated point of interest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OvermapSpecial {
    pub terrain: Terrain,
    pub min_appearances: u32,
    /// Zero means unlimited.
    pub max_appearances: u32,
    pub min_dist_from_city: Option<i32>,
    pub max_dist_from_city: Option<i32>,
    pub placement: Placement,
    pub flags: SpecialFlags,
    pub monsters: Option<SpecialMonsters>,
}

impl OvermapSpecial {
    pub fn new(terrain: Terrain, min_appearances: u32, max_appearances: u32, placement: Placement) -> Self {
        Self {
            terrain,
            min_appearances,
            max_appearances,
            min_dist_from_city: None,
            max_dist_from_city: None,
            placement,
            flags: SpecialFlags::NONE,
            monsters: None,
        }
    }

    pub fn city_distance(mut self, min: Option<i32>, max: Option<i32>) -> Self {
        self.min_dist_from_city = min;
        self.max_dist_from_city = max;
        self
    }

    pub fn with_flags(mut self, flags: SpecialFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_monsters(mut self, category: MonsterCategory, population: Span, radius: Span) -> Self {
        self.monsters = Some(SpecialMonsters {
            category,
            population,
            radius,
        });
        self
    }

    fn has_room(&self, placed: u32) -> bool {
        self.max_appearances == 0 || placed < self.max_appearances
    }

    fn eligible(&self, om: &Overmap, p: (i32, i32)) -> bool {
        let dist = om.dist_from_city(p);
        self.min_dist_from_city.map_or(true, |min| dist >= min)
            && self.max_dist_from_city.map_or(true, |max| dist <= max)
            && self.placement.allows(om, p.0, p.1)
    }
}

/// The built-in special catalogue.
pub fn default_specials() -> Vec<OvermapSpecial> {
    use MonsterCategory as M;
    use Placement::*;
    use SpecialFlags as F;

    vec![
        OvermapSpecial::new(Terrain::Crater, 0, 10, Land).with_flags(F::BLOB),
        OvermapSpecial::new(Terrain::Hive, 0, 50, Forest)
            .city_distance(Some(10), None)
            .with_flags(F::BLOB)
            .with_monsters(M::Bee, Span::new(20, 60), Span::new(2, 4)),
        OvermapSpecial::new(Terrain::House(Facing::North), 0, 100, Land)
            .city_distance(Some(0), Some(20))
            .with_flags(F::ROTATE_ROAD | F::ROTATE_RANDOM),
        OvermapSpecial::new(Terrain::Shop(ShopKind::GasStation, Facing::North), 0, 100, ByHighway)
            .city_distance(Some(0), Some(30))
            .with_flags(F::ROTATE_ROAD),
        OvermapSpecial::new(Terrain::Cabin, 0, 30, Forest).city_distance(Some(20), None),
        OvermapSpecial::new(Terrain::LabStairs, 0, 30, Land)
            .city_distance(Some(8), None)
            .with_flags(F::ROAD),
        OvermapSpecial::new(Terrain::Bunker, 2, 10, Land)
            .city_distance(Some(4), None)
            .with_flags(F::ROAD),
        OvermapSpecial::new(Terrain::Outpost, 0, 10, Wilderness)
            .city_distance(Some(4), None)
            .with_monsters(M::Military, Span::new(10, 20), Span::new(2, 3)),
        OvermapSpecial::new(Terrain::Silo, 0, 1, Wilderness)
            .city_distance(Some(30), None)
            .with_flags(F::ROAD),
        OvermapSpecial::new(Terrain::RadioTower, 1, 5, Land).city_distance(None, Some(20)),
        OvermapSpecial::new(Terrain::MansionEntrance, 0, 8, Land)
            .city_distance(Some(10), None)
            .with_flags(F::THREE_BY_THREE_SECOND),
        OvermapSpecial::new(Terrain::MegastoreEntrance, 0, 5, Land)
            .city_distance(Some(0), Some(10))
            .with_flags(F::THREE_BY_THREE_SECOND),
        OvermapSpecial::new(Terrain::HospitalEntrance, 1, 5, Land)
            .city_distance(Some(3), Some(15))
            .with_flags(F::THREE_BY_THREE_SECOND),
        OvermapSpecial::new(Terrain::SewageTreatment, 1, 5, Land)
            .city_distance(Some(10), Some(20))
            .with_flags(F::PARKING_LOT),
        OvermapSpecial::new(Terrain::MineEntrance, 0, 5, Wilderness)
            .city_distance(Some(15), None)
            .with_flags(F::PARKING_LOT),
        OvermapSpecial::new(Terrain::Anthill, 0, 30, Land)
            .city_distance(Some(10), None)
            .with_monsters(M::Ant, Span::new(1000, 2000), Span::new(5, 15)),
        OvermapSpecial::new(Terrain::SpiderPit, 0, 500, Forest),
        OvermapSpecial::new(Terrain::SlimepitDown, 0, 4, Land)
            .city_distance(Some(0), None)
            .with_monsters(M::Goo, Span::new(100, 200), Span::new(1, 5)),
        OvermapSpecial::new(Terrain::FungalBloom, 0, 3, Wilderness)
            .city_distance(Some(5), None)
            .with_flags(F::BIG)
            .with_monsters(M::Fungi, Span::new(600, 1200), Span::new(10, 15)),
        OvermapSpecial::new(Terrain::TriffidGrove, 0, 4, Forest)
            .city_distance(Some(0), None)
            .with_monsters(M::Triffid, Span::new(800, 1300), Span::new(6, 10)),
        OvermapSpecial::new(Terrain::TempleStairs, 0, 3, Forest).city_distance(Some(20), None),
        OvermapSpecial::new(Terrain::River(RiverShape::Center), 0, 1, Land)
            .city_distance(Some(10), None)
            .with_flags(F::BLOB),
        OvermapSpecial::new(Terrain::Shelter, 5, 10, Land)
            .city_distance(Some(5), Some(10))
            .with_flags(F::ROAD),
        OvermapSpecial::new(Terrain::Cave, 0, 30, Wilderness),
        OvermapSpecial::new(Terrain::ToxicDump, 0, 5, Wilderness)
            .city_distance(Some(15), None)
            .with_flags(F::THREE_BY_THREE),
    ]
}

/// Run the sector placer over the surface.
pub fn place_specials(om: &mut Overmap, ctx: &GenerationContext, rng: &mut ChaCha8Rng) {
    let specials = ctx.specials;
    let sector = ctx.config.special_sector;
    let mut placed = vec![0u32; specials.len()];

    let mut sectors: Vec<(i32, i32)> = (0..OMAPX)
        .step_by(sector as usize)
        .flat_map(|x| (0..OMAPY).step_by(sector as usize).map(move |y| (x, y)))
        .collect();

    while let Some(pick) = rng.index(sectors.len()) {
        let (sx, sy) = sectors.swap_remove(pick);

        let mut found = None;
        for _ in 0..ctx.config.special_tries {
            let p = (
                rng.roll(sx, sx + sector - 1).clamp(1, OMAPX - 2),
                rng.roll(sy, sy + sector - 1).clamp(1, OMAPY - 2),
            );
            let valid: Vec<usize> = specials
                .iter()
                .enumerate()
                .filter(|(i, s)| s.has_room(placed[*i]) && s.eligible(om, p))
                .map(|(i, _)| i)
                .collect();
            if !valid.is_empty() {
                found = Some((p, valid));
                break;
            }
        }
        let Some((p, valid)) = found else {
            debug!(sx, sy, "no special fits this sector");
            continue;
        };

        let must_place: Vec<usize> = valid
            .iter()
            .copied()
            .filter(|&i| placed[i] < specials[i].min_appearances)
            .collect();
        let pool = if must_place.is_empty() { &valid } else { &must_place };
        let Some(choice) = rng.index(pool.len()).map(|i| pool[i]) else {
            continue;
        };
        placed[choice] += 1;
        place_special(om, &specials[choice], p, ctx, rng);
    }

    debug!(total = placed.iter().sum::<u32>(), "placed specials");
}

/// Road-family tile adjacent to `p`, searched north, east, south, west.
fn road_side(om: &Overmap, p: (i32, i32)) -> Option<Facing> {
    Facing::ALL.into_iter().find(|f| {
        let (dx, dy) = f.delta();
        om.is_road(LinkFamily::Road, p.0 + dx, p.1 + dy, 0)
    })
}

/// Set a tile unless it is part of the road network.
fn stamp(om: &mut Overmap, x: i32, y: i32, terrain: Terrain) {
    if !om.ter(x, y, 0).is_road() {
        om.set_ter(x, y, 0, terrain);
    }
}

/// Stamp one special at `p`, apply its shape flags and spawn its monsters.
pub fn place_special(
    om: &mut Overmap,
    special: &OvermapSpecial,
    p: (i32, i32),
    ctx: &GenerationContext,
    rng: &mut ChaCha8Rng,
) {
    let (px, py) = p;
    let flags = special.flags;
    let mut terrain = special.terrain;

    if terrain.is_rotatable() {
        let facing = if flags.contains(SpecialFlags::ROTATE_ROAD) {
            road_side(om, p)
        } else {
            None
        };
        let facing = facing.or_else(|| {
            flags
                .contains(SpecialFlags::ROTATE_RANDOM)
                .then(|| Facing::from_turns(rng.roll(0, 3)))
        });
        if let Some(facing) = facing {
            terrain = terrain.rotated(facing);
        }
    }
    stamp(om, px, py, terrain);

    if flags.contains(SpecialFlags::THREE_BY_THREE) {
        for y in py - 1..=py + 1 {
            for x in px - 1..=px + 1 {
                stamp(om, x, y, terrain);
            }
        }
    }

    if flags.contains(SpecialFlags::THREE_BY_THREE_SECOND) {
        let body = terrain.secondary().unwrap_or(terrain);
        // The body sits on the far side of the entrance from the road.
        let (startx, starty) = match road_side(om, p) {
            Some(Facing::North) | None => (px - 1, py),
            Some(Facing::East) => (px - 2, py - 1),
            Some(Facing::South) => (px - 1, py - 2),
            Some(Facing::West) => (px, py - 1),
        };
        for y in starty..starty + 3 {
            for x in startx..startx + 3 {
                stamp(om, x, y, body);
            }
        }
        stamp(om, px, py, terrain);
    }

    if flags.contains(SpecialFlags::BLOB) {
        for dy in -2..=2 {
            for dx in -2i32..=2 {
                if (dx, dy) == (0, 0) {
                    continue;
                }
                let (x, y) = (px + dx, py + dy);
                if rng.one_in(1 + dx.abs() + dy.abs()) && special.placement.allows(om, x, y) {
                    stamp(om, x, y, terrain);
                }
            }
        }
    }

    if flags.contains(SpecialFlags::BIG) {
        for dy in -3..=3 {
            for dx in -3..=3 {
                let (x, y) = (px + dx, py + dy);
                if (dx, dy) != (0, 0) && special.placement.allows(om, x, y) {
                    stamp(om, x, y, terrain);
                }
            }
        }
    }

    if flags.contains(SpecialFlags::ROAD) {
        connect_to_city(om, p, rng);
    }

    if flags.contains(SpecialFlags::PARKING_LOT) && Overmap::in_bounds(px, py - 1) {
        stamp(om, px, py - 1, Terrain::ParkingLot);
        connect_to_city(om, (px, py - 1), rng);
    }

    if let Some(spec) = special.monsters {
        if spec.population.min <= 0 || spec.radius.min <= 0 || spec.population.max <= 0 || spec.radius.max <= 0 {
            debug_assert!(false, "special {:?} has a bad spawn {:?}", special.terrain, spec);
            error!(terrain = %special.terrain.name(), ?spec, "special has a bad spawn, skipping monsters");
            return;
        }
        let population = rng.roll(spec.population.min, spec.population.max);
        let radius = rng.roll(spec.radius.min, spec.radius.max);
        ctx.spawn(om, MonsterGroup::new(spec.category, px, py, 0, radius, population));
    }
}

fn connect_to_city(om: &mut Overmap, from: (i32, i32), rng: &mut ChaCha8Rng) {
    let nearest = om.cities.iter().min_by_key(|c| rl_dist(from, c.pos())).map(|c| c.pos());
    match nearest {
        Some(city) => make_hiway(om, from, city, 0, LinkFamily::Road, rng),
        None => debug!(?from, "no city to connect special to"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationConfig;
    use crate::monsters::MonsterRegistry;
    use crate::overmap::City;
    use rand::SeedableRng;

    fn count(om: &Overmap, terrain: Terrain) -> usize {
        om.layer(0)
            .unwrap()
            .terrain
            .iter()
            .filter(|(_, _, &t)| t == terrain)
            .count()
    }

    #[test]
    fn test_minimum_appearances_are_met() {
        let config = GenerationConfig::default();
        let monsters = MonsterRegistry::builtin();
        let specials = vec![
            OvermapSpecial::new(Terrain::Cabin, 2, 0, Placement::Wilderness),
            OvermapSpecial::new(Terrain::Crater, 0, 0, Placement::Land),
        ];
        let ctx = GenerationContext::new(&config, &specials, &monsters);
        let mut successes = 0;
        for seed in 0..40 {
            let mut om = Overmap::new(0, 0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            place_specials(&mut om, &ctx, &mut rng);
            if count(&om, Terrain::Cabin) >= 2 {
                successes += 1;
            }
        }
        assert!(successes >= 38, "only {} of 40 seeds placed two cabins", successes);
    }

    #[test]
    fn test_max_appearances_is_respected() {
        let config = GenerationConfig::default();
        let monsters = MonsterRegistry::builtin();
        let specials = vec![OvermapSpecial::new(Terrain::Bunker, 0, 3, Placement::Land)];
        let ctx = GenerationContext::new(&config, &specials, &monsters);
        let mut om = Overmap::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        place_specials(&mut om, &ctx, &mut rng);
        assert_eq!(count(&om, Terrain::Bunker), 3);
    }

    #[test]
    fn test_city_distance_window() {
        let config = GenerationConfig::default();
        let monsters = MonsterRegistry::builtin();
        let specials = vec![OvermapSpecial::new(Terrain::Cabin, 0, 0, Placement::Land).city_distance(None, Some(5))];
        let ctx = GenerationContext::new(&config, &specials, &monsters);
        let mut om = Overmap::new(0, 0);
        om.cities.push(City::new(90, 90, 5));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        place_specials(&mut om, &ctx, &mut rng);
        for (x, y, &t) in om.layer(0).unwrap().terrain.iter() {
            if t == Terrain::Cabin {
                assert!(om.dist_from_city((x, y)) <= 5);
            }
        }
        assert!(count(&om, Terrain::Cabin) > 0);
    }

    #[test]
    fn test_entrance_faces_road_with_body_behind() {
        let config = GenerationConfig::default();
        let monsters = MonsterRegistry::builtin();
        let ctx = GenerationContext::new(&config, &[], &monsters);
        let mut om = Overmap::new(0, 0);
        for x in 0..OMAPX {
            om.set_ter(x, 49, 0, Terrain::Road(Link::Ew));
        }
        let special = OvermapSpecial::new(Terrain::HospitalEntrance, 0, 0, Placement::Land)
            .with_flags(SpecialFlags::THREE_BY_THREE_SECOND);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        place_special(&mut om, &special, (60, 50), &ctx, &mut rng);
        assert_eq!(om.ter(60, 50, 0), Terrain::HospitalEntrance);
        assert_eq!(om.ter(60, 52, 0), Terrain::Hospital);
        assert_eq!(om.ter(59, 51, 0), Terrain::Hospital);
        assert_eq!(om.ter(60, 49, 0), Terrain::Road(Link::Ew));
    }

    #[test]
    fn test_house_turns_toward_road_and_spawns_monsters() {
        let config = GenerationConfig::default();
        let monsters = MonsterRegistry::builtin();
        let ctx = GenerationContext::new(&config, &[], &monsters);
        let mut om = Overmap::new(0, 0);
        om.set_ter(21, 20, 0, Terrain::Road(Link::Ns));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let house = OvermapSpecial::new(Terrain::House(Facing::North), 0, 0, Placement::Land)
            .with_flags(SpecialFlags::ROTATE_ROAD | SpecialFlags::ROTATE_RANDOM);
        place_special(&mut om, &house, (20, 20), &ctx, &mut rng);
        assert_eq!(om.ter(20, 20, 0), Terrain::House(Facing::East));

        let anthill = OvermapSpecial::new(Terrain::Anthill, 0, 0, Placement::Land).with_monsters(
            MonsterCategory::Ant,
            Span::new(100, 200),
            Span::new(3, 5),
        );
        place_special(&mut om, &anthill, (80, 80), &ctx, &mut rng);
        let group = &om.monster_groups[0];
        assert_eq!((group.x, group.y, group.category), (80, 80, MonsterCategory::Ant));
        assert!((100..=200).contains(&group.population));
    }

    #[test]
    fn test_default_catalogue_spawns_are_valid() {
        for special in default_specials() {
            if let Some(spec) = special.monsters {
                assert!(spec.population.min > 0 && spec.population.min <= spec.population.max);
                assert!(spec.radius.min > 0 && spec.radius.min <= spec.radius.max);
            }
        }
    }
}
