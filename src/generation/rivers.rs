//! River placement: endpoint pairing and the biased random walk that carves
//! each river.

use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::dice::Dice;
use crate::overmap::{Overmap, OMAPX, OMAPY};
use crate::terrain::{RiverShape, Terrain};

use super::stitch::RiverEnds;
use super::Neighbors;

/// Walk steps before a river stops wandering and heads straight for its mouth.
const WALK_BUDGET: u32 = 50_000;

/// Even up river starts and ends, then carve one river per pairing.
pub fn place_rivers(
    om: &mut Overmap,
    ends: RiverEnds,
    neighbors: &Neighbors,
    config: &GenerationConfig,
    rng: &mut ChaCha8Rng,
) {
    let RiverEnds { mut start, mut end } = ends;

    // A difference of one is fine; each side needs at least one mouth.
    if neighbors.north.is_none() || neighbors.west.is_none() {
        while start.is_empty() || start.len() + 1 < end.len() {
            let mut options = Vec::new();
            if neighbors.north.is_none() {
                options.push((rng.roll(10, OMAPX - 11), 0));
            }
            if neighbors.west.is_none() {
                options.push((0, rng.roll(10, OMAPY - 11)));
            }
            match rng.index(options.len()) {
                Some(i) => start.push(options[i]),
                None => break,
            }
        }
    }
    if neighbors.south.is_none() || neighbors.east.is_none() {
        while end.is_empty() || end.len() + 1 < start.len() {
            let mut options = Vec::new();
            if neighbors.south.is_none() {
                options.push((rng.roll(10, OMAPX - 11), OMAPY - 1));
            }
            if neighbors.east.is_none() {
                options.push((OMAPX - 1, rng.roll(10, OMAPY - 11)));
            }
            match rng.index(options.len()) {
                Some(i) => end.push(options[i]),
                None => break,
            }
        }
    }

    let meander = config.river_meander;
    let mut placed = 0;
    if start.len() > end.len() && !end.is_empty() {
        let fallback = end.clone();
        while let Some(i) = rng.index(start.len()) {
            let from = start.remove(i);
            let to = if end.is_empty() {
                fallback[rng.index(fallback.len()).unwrap_or(0)]
            } else {
                end.remove(0)
            };
            place_river(om, from, to, meander, rng);
            placed += 1;
        }
    } else if end.len() > start.len() && !start.is_empty() {
        let fallback = start.clone();
        while let Some(i) = rng.index(end.len()) {
            let to = end.remove(i);
            let from = if start.is_empty() {
                fallback[rng.index(fallback.len()).unwrap_or(0)]
            } else {
                start.remove(0)
            };
            place_river(om, from, to, meander, rng);
            placed += 1;
        }
    } else if !end.is_empty() {
        if start.len() != end.len() {
            start.push((
                rng.roll(OMAPX / 4, OMAPX * 3 / 4),
                rng.roll(OMAPY / 4, OMAPY * 3 / 4),
            ));
        }
        for (&from, &to) in start.iter().zip(end.iter()) {
            place_river(om, from, to, meander, rng);
            placed += 1;
        }
    }
    debug!(rivers = placed, "placed rivers");
}

/// Bounding box the walk may not leave.
struct WalkBounds {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
}

impl WalkBounds {
    fn new(a: (i32, i32), b: (i32, i32), meander: i32) -> Self {
        Self {
            min_x: (a.0.min(b.0) - meander).max(0),
            max_x: (a.0.max(b.0) + meander).min(OMAPX - 1),
            min_y: (a.1.min(b.1) - meander).max(0),
            max_y: (a.1.max(b.1) + meander).min(OMAPY - 1),
        }
    }

    fn clamp(&self, x: i32, y: i32) -> (i32, i32) {
        (x.clamp(self.min_x, self.max_x), y.clamp(self.min_y, self.max_y))
    }
}

/// Pull a walker one step toward the target along one axis. Far from the
/// target the pull is proportional to the remaining distance; close to it,
/// the walker homes in once it is also near on the other axis.
fn drift(rng: &mut ChaCha8Rng, delta: i32, other: i32, span: i32, other_span: i32) -> bool {
    let far = span * 6 / 5;
    let near = span / 5;
    let other_near = other_span / 5;
    rng.roll(0, far - 1) < delta || (rng.roll(0, near - 1) > delta && rng.roll(0, other_near - 1) > other)
}

/// Carve a river from `from` to `to` with a 3x3 brush.
///
/// Each step jitters the walker, stamps a block, drifts toward the target,
/// jitters again and stamps a second block, so consecutive blocks always
/// touch. Only the second block keeps one tile off the map edge away from
/// the mouth.
pub fn place_river(om: &mut Overmap, from: (i32, i32), to: (i32, i32), meander: i32, rng: &mut ChaCha8Rng) {
    let water = Terrain::River(RiverShape::Center);
    let bounds = WalkBounds::new(from, to, meander);
    let (mut x, mut y) = bounds.clamp(from.0, from.1);
    let (tx, ty) = bounds.clamp(to.0, to.1);
    let mut steps = 0;

    loop {
        if steps >= WALK_BUDGET {
            warn!(?from, ?to, "river walk ran out of steps, finishing straight");
            x += (tx - x).signum();
            y += (ty - y).signum();
        } else {
            x += rng.roll(-1, 1);
            y += rng.roll(-1, 1);
            (x, y) = bounds.clamp(x, y);
        }
        // unfiltered: this block can touch the edge beside a dry neighbour
        stamp(om, x, y, |_, _| true, water);
        if (x, y) == (tx, ty) {
            break;
        }

        if steps < WALK_BUDGET {
            if tx > x && drift(rng, tx - x, (ty - y).abs(), OMAPX, OMAPY) {
                x += 1;
            }
            if tx < x && drift(rng, x - tx, (ty - y).abs(), OMAPX, OMAPY) {
                x -= 1;
            }
            if ty > y && drift(rng, ty - y, (x - tx).abs(), OMAPY, OMAPX) {
                y += 1;
            }
            if ty < y && drift(rng, y - ty, (x - tx).abs(), OMAPY, OMAPX) {
                y -= 1;
            }
            x += rng.roll(-1, 1);
            y += rng.roll(-1, 1);
            (x, y) = bounds.clamp(x, y);
            stamp(
                om,
                x,
                y,
                |bx, by| {
                    let inland = bx >= 1 && bx < OMAPX - 1 && by >= 1 && by < OMAPY - 1;
                    inland || ((tx - bx).abs() < 4 && (ty - by).abs() < 4)
                },
                water,
            );
            if (x, y) == (tx, ty) {
                break;
            }
        }
        steps += 1;
    }
}

fn stamp<F: Fn(i32, i32) -> bool>(om: &mut Overmap, x: i32, y: i32, allowed: F, terrain: Terrain) {
    for by in y - 1..=y + 1 {
        for bx in x - 1..=x + 1 {
            if allowed(bx, by) {
                om.set_ter(bx, by, 0, terrain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::collections::{HashSet, VecDeque};

    fn connected(om: &Overmap, a: (i32, i32), b: (i32, i32)) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([a]);
        seen.insert(a);
        while let Some((x, y)) = queue.pop_front() {
            if (x, y) == b {
                return true;
            }
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let n = (x + dx, y + dy);
                    if om.is_river(n.0, n.1, 0) && seen.insert(n) {
                        queue.push_back(n);
                    }
                }
            }
        }
        false
    }

    #[test]
    fn test_straight_river_covers_midpoint() {
        for seed in 0..20 {
            let mut om = Overmap::new(0, 0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            place_river(&mut om, (10, 0), (10, 179), 1, &mut rng);
            assert!(om.is_river(10, 90, 0), "seed {}", seed);
        }
    }

    #[test]
    fn test_river_is_eight_connected() {
        for seed in 0..20 {
            let mut om = Overmap::new(0, 0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let a = (rng.roll(10, 169), 0);
            let b = (OMAPX - 1, rng.roll(10, 169));
            place_river(&mut om, a, b, 30, &mut rng);
            assert!(om.is_river(a.0, a.1, 0) || om.is_river(a.0, a.1 + 1, 0));
            assert!(om.is_river(b.0, b.1, 0));
            let start = if om.is_river(a.0, a.1, 0) { a } else { (a.0, a.1 + 1) };
            assert!(connected(&om, start, b), "seed {}", seed);
        }
    }

    #[test]
    fn test_fresh_region_gets_rivers() {
        let mut om = Overmap::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        place_rivers(
            &mut om,
            RiverEnds::default(),
            &Neighbors::default(),
            &GenerationConfig::default(),
            &mut rng,
        );
        let wet = om.layer(0).unwrap().terrain.iter().filter(|(_, _, t)| t.is_river()).count();
        assert!(wet > 100);
    }
}
