//! Polishing: orient linear tiles by their neighbours, shape river banks and
//! fuse parallel street pairs into divided highways.

use rand_chacha::ChaCha8Rng;

use crate::dice::Dice;
use crate::overmap::{Overmap, OMAPX, OMAPY};
use crate::terrain::{Axis, Link, LinkFamily, RiverShape, Terrain};

/// Polish one level. With `only` set, just that connectivity family is
/// touched; otherwise every family plus rivers and highways.
pub fn polish(om: &mut Overmap, z: i32, only: Option<LinkFamily>, rng: &mut ChaCha8Rng) {
    let wants = |family: LinkFamily| only.map_or(true, |f| f == family);

    for x in 0..OMAPX {
        for y in 0..OMAPY {
            let t = om.ter(x, y, z);
            match t {
                Terrain::Road(_) if wants(LinkFamily::Road) => good_road(om, LinkFamily::Road, x, y, z, rng),
                Terrain::Bridge(_) if wants(LinkFamily::Road) && bridged_all_round(om, x, y, z) => {
                    om.set_ter(x, y, z, Terrain::Road(Link::Nesw));
                }
                Terrain::Subway(_) if wants(LinkFamily::Subway) => good_road(om, LinkFamily::Subway, x, y, z, rng),
                Terrain::Sewer(_) if wants(LinkFamily::Sewer) => good_road(om, LinkFamily::Sewer, x, y, z, rng),
                Terrain::Ants(_) if wants(LinkFamily::Ants) => good_road(om, LinkFamily::Ants, x, y, z, rng),
                Terrain::River(_) if only.is_none() => good_river(om, x, y, z),
                // A bridge that starts on the bank is just road.
                Terrain::Bridge(Axis::NorthSouth)
                    if wants(LinkFamily::Road) && !(wet(om, x - 1, y, z) && wet(om, x + 1, y, z)) =>
                {
                    om.set_ter(x, y, z, Terrain::Road(Link::Ns));
                }
                Terrain::Bridge(Axis::EastWest)
                    if wants(LinkFamily::Road) && !(wet(om, x, y - 1, z) && wet(om, x, y + 1, z)) =>
                {
                    om.set_ter(x, y, z, Terrain::Road(Link::Ew));
                }
                _ => {}
            }
        }
    }

    if wants(LinkFamily::Road) {
        fuse_highways(om, z);
    }
}

fn bridged_all_round(om: &Overmap, x: i32, y: i32, z: i32) -> bool {
    [(-1, 0), (1, 0), (0, -1), (0, 1)]
        .iter()
        .all(|&(dx, dy)| matches!(om.ter(x + dx, y + dy, z), Terrain::Bridge(_)))
}

/// Pick the oriented shape of a linear tile from its cardinal neighbours.
pub fn good_road(om: &mut Overmap, family: LinkFamily, x: i32, y: i32, z: i32, rng: &mut ChaCha8Rng) {
    let link = Link::from_neighbors(
        om.is_road(family, x, y - 1, z),
        om.is_road(family, x + 1, y, z),
        om.is_road(family, x, y + 1, z),
        om.is_road(family, x - 1, y, z),
    );
    let terrain = if family == LinkFamily::Road && link == Link::Nesw && rng.one_in(4) {
        Terrain::RoadManhole
    } else {
        family.with(link)
    };
    om.set_ter(x, y, z, terrain);
}

/// Water for bank-shaping purposes; the region edge counts as water so
/// rivers run cleanly off the map.
fn wet(om: &Overmap, x: i32, y: i32, z: i32) -> bool {
    !Overmap::in_bounds(x, y) || om.is_river(x, y, z)
}

/// Shape a river tile by which neighbours are water. Four-way water takes a
/// bite out of the first dry diagonal; configurations no bank shape can
/// draw become swamp.
pub fn good_river(om: &mut Overmap, x: i32, y: i32, z: i32) {
    let n = wet(om, x, y - 1, z);
    let e = wet(om, x + 1, y, z);
    let s = wet(om, x, y + 1, z);
    let w = wet(om, x - 1, y, z);

    let shape = match (n, e, s, w) {
        (true, true, true, true) => {
            if !wet(om, x - 1, y - 1, z) {
                Some(RiverShape::NotNw)
            } else if !wet(om, x + 1, y - 1, z) {
                Some(RiverShape::NotNe)
            } else if !wet(om, x - 1, y + 1, z) {
                Some(RiverShape::NotSw)
            } else if !wet(om, x + 1, y + 1, z) {
                Some(RiverShape::NotSe)
            } else {
                Some(RiverShape::Center)
            }
        }
        (true, false, true, true) => Some(RiverShape::East),
        (true, true, false, true) => Some(RiverShape::South),
        (true, false, false, true) => Some(RiverShape::Se),
        (false, true, true, true) => Some(RiverShape::North),
        (false, false, true, true) => Some(RiverShape::Ne),
        // water only to the west: left as it is
        (false, false, false, true) => return,
        (true, true, true, false) => Some(RiverShape::West),
        (true, true, false, false) => Some(RiverShape::Sw),
        (false, true, true, false) => Some(RiverShape::Nw),
        _ => None,
    };
    let terrain = shape.map_or(Terrain::ForestWater, Terrain::River);
    om.set_ter(x, y, z, terrain);
}

/// Fuse 2x2 blocks of back-to-back tees into divided highway.
fn fuse_highways(om: &mut Overmap, z: i32) {
    use Terrain::Road;
    for y in 0..OMAPY - 1 {
        for x in 0..OMAPX - 1 {
            let block = [
                om.ter(x, y, z),
                om.ter(x + 1, y, z),
                om.ter(x, y + 1, z),
                om.ter(x + 1, y + 1, z),
            ];
            let axis = match block {
                [Road(Link::Nes), Road(Link::Nsw), Road(Link::Nes), Road(Link::Nsw)] => Axis::NorthSouth,
                [Road(Link::Esw), Road(Link::Esw), Road(Link::New), Road(Link::New)] => Axis::EastWest,
                _ => continue,
            };
            for (bx, by) in [(x, y), (x + 1, y), (x, y + 1), (x + 1, y + 1)] {
                om.set_ter(bx, by, z, Terrain::Highway(axis));
            }
        }
    }
}
