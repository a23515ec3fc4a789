//! Overmap generation pipeline
//!
//! Passes run in a fixed order on a blank [`Overmap`]:
//! 1. stitch river and road exits from already-generated neighbours
//! 2. rivers, then forests, then cities with their street networks
//! 3. road exits and the highways linking them to every city
//! 4. specials
//! 5. polishing of roads and rivers into oriented tiles
//! 6. sub-levels, generated downward until no structure needs another level
//! 7. monster groups and radio towers

pub mod cities;
pub mod forest;
pub mod highways;
pub mod polish;
pub mod populate;
pub mod rivers;
pub mod specials;
pub mod stitch;
pub mod sublevels;

use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::monsters::{MonsterGroup, MonsterRegistry};
use crate::overmap::Overmap;
use crate::terrain::{Link, LinkFamily, Terrain};

pub use specials::{default_specials, OvermapSpecial, Placement, SpecialFlags};
pub use sublevels::{generate_sublevels, LevelBuilder, SubLevelGenerator};

/// Everything generation reads besides the overmap itself.
#[derive(Clone, Copy)]
pub struct GenerationContext<'a> {
    pub config: &'a GenerationConfig,
    pub specials: &'a [OvermapSpecial],
    pub monsters: &'a MonsterRegistry,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        config: &'a GenerationConfig,
        specials: &'a [OvermapSpecial],
        monsters: &'a MonsterRegistry,
    ) -> Self {
        Self {
            config,
            specials,
            monsters,
        }
    }

    /// Record a monster group unless its category is disabled.
    pub fn spawn(&self, om: &mut Overmap, group: MonsterGroup) {
        if self.monsters.is_enabled(group.category) {
            om.monster_groups.push(group);
        } else {
            debug!(category = self.monsters.name(group.category), "skipping disabled monster group");
        }
    }
}

/// Already-generated regions around the one being built.
#[derive(Clone, Copy, Default)]
pub struct Neighbors<'a> {
    pub north: Option<&'a Overmap>,
    pub east: Option<&'a Overmap>,
    pub south: Option<&'a Overmap>,
    pub west: Option<&'a Overmap>,
    pub north_west: Option<&'a Overmap>,
}

impl Neighbors<'_> {
    pub fn is_empty(&self) -> bool {
        self.north.is_none()
            && self.east.is_none()
            && self.south.is_none()
            && self.west.is_none()
            && self.north_west.is_none()
    }
}

/// Fill a blank overmap with a complete world region.
pub fn generate(om: &mut Overmap, neighbors: &Neighbors, ctx: &GenerationContext, rng: &mut ChaCha8Rng) {
    let (ox, oy) = om.loc();

    lay_out_surface(om, neighbors, ctx, rng);
    polish::polish(om, 0, None, rng);

    let levels = generate_sublevels(om, &mut SubLevelGenerator::new(*ctx), rng);
    debug!(levels, "sub-levels generated");

    populate::place_mongroups(om, ctx, rng);
    populate::place_radios(om, rng);

    info!(
        x = ox,
        y = oy,
        cities = om.cities.len(),
        roads_out = om.roads_out.len(),
        groups = om.monster_groups.len(),
        radios = om.radios.len(),
        "generated overmap"
    );
}

/// Every surface pass up to polishing, which orients what they laid down.
fn lay_out_surface(om: &mut Overmap, neighbors: &Neighbors, ctx: &GenerationContext, rng: &mut ChaCha8Rng) {
    let config = ctx.config;

    let ends = stitch::stitch_neighbors(om, neighbors);
    rivers::place_rivers(om, ends, neighbors, config, rng);
    forest::place_forest(om, config, rng);
    cities::place_cities(om, config, rng);
    highways::place_roads_out(om, neighbors, config, rng);

    let road_points: Vec<_> = om.roads_out.iter().chain(om.cities.iter()).copied().collect();
    highways::place_hiways(om, &road_points, 0, LinkFamily::Road, config, rng);

    specials::place_specials(om, ctx, rng);

    for stub in om.roads_out.clone() {
        om.set_ter(stub.x, stub.y, 0, Terrain::Road(Link::Nesw));
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rand::SeedableRng;

    pub struct Fixture {
        pub config: GenerationConfig,
        pub specials: Vec<OvermapSpecial>,
        pub monsters: MonsterRegistry,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                config: GenerationConfig::default(),
                specials: default_specials(),
                monsters: MonsterRegistry::builtin(),
            }
        }

        pub fn ctx(&self) -> GenerationContext<'_> {
            GenerationContext::new(&self.config, &self.specials, &self.monsters)
        }
    }

    pub fn generated(seed: u64) -> Overmap {
        let fixture = Fixture::new();
        let mut om = Overmap::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        generate(&mut om, &Neighbors::default(), &fixture.ctx(), &mut rng);
        om
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::terrain::Family;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_fresh_region_has_four_way_city_centers() {
        for seed in 0..4 {
            let om = generated(seed);
            assert!(!om.cities.is_empty(), "seed {} produced no city", seed);
            for city in &om.cities {
                let center = om.ter(city.x, city.y, 0);
                assert!(
                    matches!(center, Terrain::Road(Link::Nesw) | Terrain::RoadManhole),
                    "seed {} city at ({}, {}) has center {:?}",
                    seed,
                    city.x,
                    city.y,
                    center
                );
            }
        }
    }

    #[test]
    fn test_no_unoriented_links_after_generation() {
        let om = generated(11);
        for layer in om.layers() {
            for (x, y, &t) in layer.terrain.iter() {
                if let Some(link) = t.link() {
                    assert!(link.is_oriented(), "{:?} at ({}, {}, {})", t, x, y, layer.z);
                }
            }
        }
    }

    #[test]
    fn test_polished_roads_match_their_neighbors() {
        let fixture = Fixture::new();
        for seed in 0..6 {
            let mut om = Overmap::new(0, 0);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            lay_out_surface(&mut om, &Neighbors::default(), &fixture.ctx(), &mut rng);
            let bridges: HashSet<(i32, i32)> = om
                .layer(0)
                .unwrap()
                .terrain
                .iter()
                .filter(|(_, _, t)| matches!(t, Terrain::Bridge(_)))
                .map(|(x, y, _)| (x, y))
                .collect();
            polish::polish(&mut om, 0, None, &mut rng);

            for (x, y, &t) in om.layer(0).unwrap().terrain.iter() {
                let Terrain::Road(link) = t else { continue };
                if bridges.contains(&(x, y)) {
                    continue;
                }
                let expected = Link::from_neighbors(
                    om.is_road(LinkFamily::Road, x, y - 1, 0),
                    om.is_road(LinkFamily::Road, x + 1, y, 0),
                    om.is_road(LinkFamily::Road, x, y + 1, 0),
                    om.is_road(LinkFamily::Road, x - 1, y, 0),
                );
                assert_eq!(link, expected, "seed {} road at ({}, {})", seed, x, y);
            }
        }
    }

    #[test]
    fn test_generation_is_reproducible_per_seed() {
        let a = generated(5);
        let b = generated(5);
        assert_eq!(a.layer(0), b.layer(0));
        assert_eq!(a.cities, b.cities);
        assert_eq!(a.radios, b.radios);
    }

    #[test]
    fn test_surface_has_roads_and_rivers() {
        let om = generated(3);
        let surface = om.layer(0).unwrap();
        let roads = surface.terrain.iter().filter(|(_, _, t)| t.family() == Family::Road).count();
        let rivers = surface.terrain.iter().filter(|(_, _, t)| t.is_river()).count();
        assert!(roads > 0);
        assert!(rivers > 0);
        assert!(om.roads_out.len() >= 2);
    }
}
