//! Highways between cities and the road exits that lead off the map.

use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::dice::Dice;
use crate::overmap::{rl_dist, trig_dist, City, Overmap, OMAPX, OMAPY};
use crate::terrain::{Axis, Link, LinkFamily, Terrain};

use super::Neighbors;

/// Make sure the region has at least two road exits, adding one per side
/// that has no neighbour and keeping clear of river mouths.
pub fn place_roads_out(om: &mut Overmap, neighbors: &Neighbors, config: &GenerationConfig, rng: &mut ChaCha8Rng) {
    if om.roads_out.len() >= 2 {
        return;
    }

    let mut viable = Vec::new();
    let sides = [
        (neighbors.north.is_none(), false, 0),
        (neighbors.east.is_none(), true, OMAPX - 1),
        (neighbors.south.is_none(), false, OMAPY - 1),
        (neighbors.west.is_none(), true, 0),
    ];
    for (open, vertical_edge, fixed) in sides {
        if !open {
            continue;
        }
        let at = |t: i32| if vertical_edge { (fixed, t) } else { (t, fixed) };
        let len = if vertical_edge { OMAPY } else { OMAPX };
        let found = (0..config.road_out_tries).find_map(|_| {
            let t = rng.roll(10, len - 11);
            let dry = (t - 1..=t + 1).all(|i| {
                let (x, y) = at(i);
                !om.is_river(x, y, 0)
            });
            dry.then(|| at(t))
        });
        match found {
            Some((x, y)) => viable.push(City::new(x, y, 0)),
            None => debug!(fixed, vertical_edge, "no dry road exit on this side"),
        }
    }

    while om.roads_out.len() < 2 {
        let Some(i) = rng.index(viable.len()) else {
            break;
        };
        om.roads_out.push(viable.remove(i));
    }
}

/// Link every point to each later point within the highway distance, or to
/// the nearest later point when none is close enough.
pub fn place_hiways(
    om: &mut Overmap,
    points: &[City],
    z: i32,
    family: LinkFamily,
    config: &GenerationConfig,
    rng: &mut ChaCha8Rng,
) {
    if points.len() <= 1 {
        return;
    }
    for (i, a) in points.iter().enumerate() {
        let mut closest: Option<(i32, City)> = None;
        let mut linked = false;
        for b in &points[i + 1..] {
            let distance = trig_dist(a.pos(), b.pos()) as i32;
            if closest.map_or(true, |(d, _)| distance < d) {
                closest = Some((distance, *b));
            }
            if distance < config.highway_distance {
                linked = true;
                make_hiway(om, a.pos(), b.pos(), z, family, rng);
            }
        }
        if let Some((distance, best)) = closest {
            if !linked && distance > 0 {
                make_hiway(om, a.pos(), best.pos(), z, family, rng);
            }
        }
    }
}

/// A finished tile of the family the walker can attach to.
fn joins_network(om: &Overmap, family: LinkFamily, x: i32, y: i32, z: i32) -> bool {
    let t = om.ter(x, y, z);
    family.contains(t) && t.link().map_or(false, Link::is_oriented)
}

/// Lay a road of `family` from `from` toward `to`, one orthogonal step at a
/// time. Existing roads are followed, rivers are bridged when the crossing
/// does not run alongside another bridge, and the walk stops early once it
/// meets the network on the far half of the route.
pub fn make_hiway(om: &mut Overmap, from: (i32, i32), to: (i32, i32), z: i32, family: LinkFamily, rng: &mut ChaCha8Rng) {
    let base = family.with(Link::Unset);
    let (mut x, mut y) = from;
    let mut vertical = false;
    let budget = 4 * (OMAPX + OMAPY);
    let mut steps = 0;

    while (x, y) != to {
        steps += 1;
        if steps > budget {
            warn!(?from, ?to, z, "highway walk ran out of steps");
            return;
        }

        let step_x = match to.0.cmp(&x) {
            std::cmp::Ordering::Greater => Some((x + 1, y)),
            std::cmp::Ordering::Less => Some((x - 1, y)),
            std::cmp::Ordering::Equal => None,
        };
        let step_y = match to.1.cmp(&y) {
            std::cmp::Ordering::Greater => Some((x, y + 1)),
            std::cmp::Ordering::Less => Some((x, y - 1)),
            std::cmp::Ordering::Equal => None,
        };

        let existing = [(step_x, false), (step_y, true)]
            .into_iter()
            .find_map(|(step, v)| step.filter(|&(sx, sy)| om.is_road(family, sx, sy, z)).map(|p| (p, v)));
        if let Some(((nx, ny), v)) = existing {
            (x, y, vertical) = (nx, ny, v);
            if rl_dist((x, y), from) > rl_dist((x, y), to) {
                return;
            }
            continue;
        }

        match (step_x, step_y) {
            (None, Some(p)) => {
                vertical = true;
                (x, y) = p;
                pave(om, p, z, Axis::NorthSouth, base, family);
            }
            (Some(p), None) => {
                vertical = false;
                (x, y) = p;
                pave(om, p, z, Axis::EastWest, base, family);
            }
            (Some(px), Some(py)) => {
                let other = if vertical { px } else { py };
                if rng.one_in(12) && !om.is_river(other.0, other.1, z) {
                    vertical = !vertical;
                }
                let (p, alt, axis) = if vertical {
                    (py, px, Axis::NorthSouth)
                } else {
                    (px, py, Axis::EastWest)
                };
                if om.is_river(p.0, p.1, z) {
                    let (dx, dy) = (p.0 - x, p.1 - y);
                    if bridge_is_clear(om, p, (dx, dy), z) {
                        (x, y) = p;
                        while om.is_river(x, y, z) {
                            om.set_ter(x, y, z, Terrain::Bridge(axis));
                            x += dx;
                            y += dy;
                        }
                        if !om.is_road(family, x, y, z) {
                            om.set_ter(x, y, z, base);
                        }
                    } else if !om.is_river(alt.0, alt.1, z) {
                        vertical = !vertical;
                        (x, y) = alt;
                        if !om.is_road(family, x, y, z) {
                            om.set_ter(x, y, z, base);
                        }
                    } else {
                        (x, y) = p;
                    }
                } else {
                    (x, y) = p;
                    if !om.is_road(family, x, y, z) {
                        om.set_ter(x, y, z, base);
                    }
                }
            }
            (None, None) => break,
        }

        let beside_network = [(0, -1), (0, 1), (-1, 0), (1, 0)]
            .iter()
            .any(|&(dx, dy)| joins_network(om, family, x + dx, y + dy, z));
        if beside_network && rl_dist((x, y), from) > rl_dist((x, y), to) {
            return;
        }
    }
}

fn pave(om: &mut Overmap, p: (i32, i32), z: i32, axis: Axis, base: Terrain, family: LinkFamily) {
    if om.is_river(p.0, p.1, z) {
        om.set_ter(p.0, p.1, z, Terrain::Bridge(axis));
    } else if !om.is_road(family, p.0, p.1, z) {
        om.set_ter(p.0, p.1, z, base);
    }
}

/// The river run starting at `start` ends on the map and no tile of it has a
/// bridge running alongside.
fn bridge_is_clear(om: &Overmap, start: (i32, i32), dir: (i32, i32), z: i32) -> bool {
    let (dx, dy) = dir;
    let (sx, sy) = (dy.abs(), dx.abs());
    let (mut x, mut y) = start;
    while om.is_river(x, y, z) {
        let beside = [om.ter(x + sx, y + sy, z), om.ter(x - sx, y - sy, z)];
        if beside.iter().any(|t| matches!(t, Terrain::Bridge(_))) {
            return false;
        }
        x += dx;
        y += dy;
    }
    Overmap::in_bounds(x, y)
}
