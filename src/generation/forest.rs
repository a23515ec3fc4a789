//! Forests and swamps grown by random walks over open fields.

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::dice::Dice;
use crate::overmap::{trig_dist, Overmap, OMAPX, OMAPY};
use crate::terrain::Terrain;

/// Epicenter rerolls before a forest is abandoned for crowding a city.
const EPICENTER_TRIES: u32 = 50;

/// One growth step: field becomes forest, forest becomes thick forest.
fn grown(t: Terrain) -> Option<Terrain> {
    match t {
        Terrain::Field => Some(Terrain::Forest),
        Terrain::Forest => Some(Terrain::ForestThick),
        _ => None,
    }
}

fn can_flood(t: Terrain) -> bool {
    matches!(t, Terrain::Field | Terrain::Forest | Terrain::ForestThick)
}

/// Wetness around a walker: five points per swamp or river tile in the 5x5
/// block.
fn wetness(om: &Overmap, x: i32, y: i32) -> i32 {
    let mut wet = 0;
    for dy in -2..=2 {
        for dx in -2..=2 {
            let t = om.ter(x + dx, y + dy, 0);
            if t == Terrain::ForestWater || t.is_river() {
                wet += 5;
            }
        }
    }
    wet
}

fn crowds_city(om: &Overmap, x: i32, y: i32, size: i32) -> bool {
    om.cities
        .iter()
        .any(|c| (trig_dist((x, y), c.pos()) - (size / 2) as f64) < c.size as f64)
}

/// Random epicenter and size that keep clear of every city.
fn pick_epicenter(om: &Overmap, config: &GenerationConfig, rng: &mut ChaCha8Rng) -> Option<(i32, i32, i32)> {
    for _ in 0..EPICENTER_TRIES {
        let x = rng.roll(0, OMAPX - 1);
        let y = rng.roll(0, OMAPY - 1);
        let size = rng.roll(config.forest_size.min, config.forest_size.max);
        if !crowds_city(om, x, y, size) {
            return Some((x, y, size));
        }
    }
    None
}

/// Grow `forest_count` forests on the surface. Growth only ever upgrades
/// field and forest tiles, so rivers, roads and buildings survive intact.
pub fn place_forest(om: &mut Overmap, config: &GenerationConfig, rng: &mut ChaCha8Rng) {
    let mut grown_count = 0;
    for _ in 0..config.forest_count {
        let Some((mut x, mut y, size)) = pick_epicenter(om, config, rng) else {
            debug!("no forest epicenter clear of cities");
            continue;
        };
        let mut swamps = config.swampiness;

        for _ in 0..size {
            let wet = wetness(om, x, y);
            let here = om.ter(x, y, 0);
            // Near water a swamp keeps spreading; on dry land one rarely starts.
            let swampy = swamps > 0
                && can_flood(here)
                && if wet > 0 {
                    !rng.one_in(wet)
                } else {
                    rng.one_in(config.swamp_chance)
                };
            if swampy {
                om.set_ter(x, y, 0, Terrain::ForestWater);
                swamps -= 1;
            } else {
                if wet == 0 {
                    swamps = config.swampiness;
                }
                if let Some(next) = grown(here) {
                    om.set_ter(x, y, 0, next);
                }
            }

            for (nx, ny) in [(x, y - 1), (x, y + 1), (x - 1, y), (x + 1, y)] {
                let t = om.ter(nx, ny, 0);
                if swampy && matches!(t, Terrain::Field | Terrain::Forest) {
                    om.set_ter(nx, ny, 0, Terrain::ForestWater);
                } else if let Some(next) = grown(t) {
                    om.set_ter(nx, ny, 0, next);
                }
            }

            x = (x + rng.roll(-2, 2)).clamp(0, OMAPX - 1);
            y = (y + rng.roll(-2, 2)).clamp(0, OMAPY - 1);
        }
        grown_count += 1;
    }
    debug!(forests = grown_count, "placed forests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overmap::City;
    use crate::terrain::{Link, RiverShape};
    use rand::SeedableRng;

    #[test]
    fn test_forest_never_erases_rivers_or_roads() {
        let mut om = Overmap::new(0, 0);
        for y in 0..OMAPY {
            om.set_ter(90, y, 0, Terrain::River(RiverShape::Center));
            om.set_ter(40, y, 0, Terrain::Road(Link::Ns));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        place_forest(&mut om, &GenerationConfig::default(), &mut rng);
        for y in 0..OMAPY {
            assert!(om.is_river(90, y, 0));
            assert_eq!(om.ter(40, y, 0), Terrain::Road(Link::Ns));
        }
        let trees = om.layer(0).unwrap().terrain.iter().filter(|(_, _, t)| t.is_forest()).count();
        assert!(trees > 1000);
    }

    #[test]
    fn test_forest_keeps_clear_of_city() {
        let mut om = Overmap::new(0, 0);
        om.cities.push(City::new(90, 90, 17));
        let config = GenerationConfig {
            forest_count: 100,
            swampiness: 0,
            ..GenerationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        place_forest(&mut om, &config, &mut rng);
        assert_eq!(om.ter(90, 90, 0), Terrain::Field);
    }

    #[test]
    fn test_epicenter_rejected_near_city() {
        let mut om = Overmap::new(0, 0);
        assert!(!crowds_city(&om, 95, 90, 10));
        om.cities.push(City::new(90, 90, 10));
        // 5 tiles out, less half the forest size, is inside the city
        assert!(crowds_city(&om, 95, 90, 10));
        assert!(crowds_city(&om, 110, 90, 22));
        assert!(!crowds_city(&om, 110, 90, 10));
        assert!(!crowds_city(&om, 150, 150, 40));
    }

    #[test]
    fn test_no_swamps_without_swampiness() {
        let mut om = Overmap::new(0, 0);
        for x in 0..OMAPX {
            om.set_ter(x, 60, 0, Terrain::River(RiverShape::Center));
        }
        let config = GenerationConfig {
            swampiness: 0,
            ..GenerationConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        place_forest(&mut om, &config, &mut rng);
        let swamps = om
            .layer(0)
            .unwrap()
            .terrain
            .iter()
            .filter(|(_, _, &t)| t == Terrain::ForestWater)
            .count();
        assert_eq!(swamps, 0);
    }
}
