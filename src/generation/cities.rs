//! Cities: seed placement, branching street trees and frontage buildings.

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::dice::Dice;
use crate::overmap::{rl_dist, City, Overmap, OMAPX, OMAPY};
use crate::terrain::{Facing, Family, Link, LinkFamily, ShopKind, Terrain};

/// Keep sampling city seeds until `city_dice`d`city_sides` cities exist or the
/// attempt budget runs out.
pub fn place_cities(om: &mut Overmap, config: &GenerationConfig, rng: &mut ChaCha8Rng) {
    let target = rng.dice(config.city_dice, config.city_sides).max(1) as usize;
    let mut attempts = 0;
    while om.cities.len() < target && attempts < config.city_attempts {
        attempts += 1;
        let cx = rng.roll(20, OMAPX - 41);
        let cy = rng.roll(20, OMAPY - 41);
        let size = rng.roll(config.city_size.min, config.city_size.max);
        if om.ter(cx, cy, 0) != Terrain::Field {
            continue;
        }
        om.set_ter(cx, cy, 0, Terrain::Road(Link::Nesw));
        let town = City::new(cx, cy, size);
        om.cities.push(town);
        let start = rng.roll(0, 3);
        for turn in 0..4 {
            make_road(om, town, (cx, cy), size, Facing::from_turns(start + turn), config, rng);
        }
    }
    debug!(cities = om.cities.len(), target, attempts, "placed cities");
}

fn straight(dir: Facing) -> Terrain {
    match dir {
        Facing::North | Facing::South => Terrain::Road(Link::Ns),
        Facing::East | Facing::West => Terrain::Road(Link::Ew),
    }
}

fn is_street(t: Terrain) -> bool {
    matches!(t, Terrain::Road(Link::Ns) | Terrain::Road(Link::Ew))
}

/// Grow one street from `origin` heading `dir` with `budget` tiles.
///
/// Every branch and every turn at the end of a street gets a strictly smaller
/// budget, and a budget of one or less places nothing, so recursion depth is
/// bounded by the city size.
pub fn make_road(
    om: &mut Overmap,
    town: City,
    origin: (i32, i32),
    budget: i32,
    dir: Facing,
    config: &GenerationConfig,
    rng: &mut ChaCha8Rng,
) {
    if budget <= 1 {
        return;
    }
    let (dx, dy) = dir.delta();
    let (sx, sy) = (dy.abs(), dx.abs());
    let (mut x, mut y) = origin;
    let mut remaining = budget;
    let mut last_branch = budget;

    loop {
        if remaining <= 0 || !Overmap::in_bounds(x + dx, y + dy) {
            break;
        }
        let next = om.ter(x + dx, y + dy, 0);
        let forced = remaining == budget;
        if next != Terrain::Field && !(forced && can_pave(next)) {
            break;
        }
        x += dx;
        y += dy;
        remaining -= 1;

        if next.is_river() {
            om.set_ter(x, y, 0, Terrain::Bridge(dir.axis()));
        } else {
            om.set_ter(x, y, 0, straight(dir));
        }

        // Running alongside or straight into another street ends this one.
        let collides = [(sx, sy), (-sx, -sy), (dx, dy)]
            .iter()
            .any(|&(ox, oy)| is_street(om.ter(x + ox, y + oy, 0)));
        if collides {
            if !next.is_river() {
                om.set_ter(x, y, 0, Terrain::Road(Link::Unset));
            }
            remaining = -1;
        }

        put_buildings(om, town, (x, y), dir, config, rng);

        if remaining < last_branch - 2
            && remaining >= 2
            && om.ter(x - sx, y - sy, 0) == Terrain::Field
            && om.ter(x + sx, y + sy, 0) == Terrain::Field
        {
            last_branch = remaining;
            let left = Facing::from_turns(dir.turns() - 1);
            let right = Facing::from_turns(dir.turns() + 1);
            make_road(om, town, (x, y), budget - rng.roll(1, 3), left, config, rng);
            make_road(om, town, (x, y), budget - rng.roll(1, 3), right, config, rng);
        }
    }

    // Close a one-tile gap to a street just beyond the end.
    if om.is_road(LinkFamily::Road, x + 2 * dx, y + 2 * dy, 0) {
        let gap = om.ter(x + dx, y + dy, 0);
        if gap.is_river() {
            om.set_ter(x + dx, y + dy, 0, Terrain::Bridge(dir.axis()));
        } else if can_pave(gap) {
            om.set_ter(x + dx, y + dy, 0, straight(dir));
        }
    }

    let shrunk = budget - rng.roll(1, 3);
    if shrunk >= 2 && remaining == 0 {
        let turn = Facing::from_turns(dir.turns() + if rng.roll(0, 1) == 0 { 1 } else { -1 });
        make_road(om, town, (x, y), shrunk, turn, config, rng);
        if rng.one_in(5) {
            make_road(om, town, (x, y), shrunk, turn.opposite(), config, rng);
        }
    }
}

/// Tiles a street may be forced onto when it starts or closes a gap.
fn can_pave(t: Terrain) -> bool {
    !matches!(t.family(), Family::Border | Family::Road | Family::Special)
}

/// Fill the lots on either side of a street tile.
fn put_buildings(
    om: &mut Overmap,
    town: City,
    at: (i32, i32),
    dir: Facing,
    config: &GenerationConfig,
    rng: &mut ChaCha8Rng,
) {
    let (dx, dy) = dir.delta();
    let (sx, sy) = (dy.abs(), dx.abs());
    let dist = rl_dist(at, town.pos());
    let size = town.size.max(1);
    for side in [-1, 1] {
        let (bx, by) = (at.0 + side * sx, at.1 + side * sy);
        if om.ter(bx, by, 0) != Terrain::Field || rng.one_in(config.street_chance) {
            continue;
        }
        let facing = Facing::from_turns(dir.turns() % 2 - side);
        let building = if rng.roll(0, 99) > 80 * dist / size {
            shop(facing, rng)
        } else if rng.roll(0, 99) > 130 * dist / size {
            Terrain::Park
        } else if rng.one_in(30) {
            Terrain::HouseBase(facing)
        } else {
            Terrain::House(facing)
        };
        om.set_ter(bx, by, 0, building);
    }
}

/// Storefront table; parking lots have no facing.
fn shop(facing: Facing, rng: &mut ChaCha8Rng) -> Terrain {
    let roll = if rng.one_in(20) { 18 } else { rng.roll(0, 17) };
    match roll {
        0 => Terrain::ParkingLot,
        1..=10 => Terrain::Shop(ShopKind::ALL[(roll - 1) as usize], facing),
        11 => Terrain::SubwayStation(facing),
        12..=17 => Terrain::Shop(ShopKind::ALL[(roll - 2) as usize], facing),
        _ => Terrain::Shop(ShopKind::Police, facing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{Axis, RiverShape};
    use rand::SeedableRng;

    #[test]
    fn test_cities_grow_streets_and_buildings() {
        for seed in 0..5 {
            let mut om = Overmap::new(0, 0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            place_cities(&mut om, &GenerationConfig::default(), &mut rng);
            assert!(om.cities.len() >= 3, "seed {}", seed);
            let surface = om.layer(0).unwrap();
            let roads = surface.terrain.iter().filter(|(_, _, t)| t.is_road()).count();
            let buildings = surface
                .terrain
                .iter()
                .filter(|(_, _, t)| t.family() == Family::Building)
                .count();
            assert!(roads > om.cities.len() * 4);
            assert!(buildings > 0);
        }
    }

    #[test]
    fn test_buildings_face_their_street() {
        let mut om = Overmap::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = GenerationConfig {
            street_chance: 1000,
            ..GenerationConfig::default()
        };
        let town = City::new(50, 50, 10);
        om.set_ter(50, 50, 0, Terrain::Road(Link::Nesw));
        make_road(&mut om, town, (50, 50), 10, Facing::North, &config, &mut rng);
        // rows 39 and 41 may hold lots of the street turning at the end
        for y in 42..50 {
            if let Terrain::House(f) = om.ter(49, y, 0) {
                assert_eq!(f, Facing::East);
            }
            if let Terrain::House(f) = om.ter(51, y, 0) {
                assert_eq!(f, Facing::West);
            }
        }
        assert!(om.ter(50, 49, 0).is_road());
    }

    #[test]
    fn test_street_bridges_river_on_first_step() {
        let mut om = Overmap::new(0, 0);
        for x in 0..OMAPX {
            om.set_ter(x, 49, 0, Terrain::River(RiverShape::Center));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let town = City::new(50, 50, 6);
        make_road(&mut om, town, (50, 50), 6, Facing::North, &GenerationConfig::default(), &mut rng);
        assert_eq!(om.ter(50, 49, 0), Terrain::Bridge(Axis::NorthSouth));
        assert!(om.is_river(51, 49, 0));
    }

    #[test]
    fn test_tiny_budget_places_nothing() {
        let mut om = Overmap::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let town = City::new(50, 50, 1);
        make_road(&mut om, town, (50, 50), 1, Facing::East, &GenerationConfig::default(), &mut rng);
        assert_eq!(om.ter(51, 50, 0), Terrain::Field);
    }
}
