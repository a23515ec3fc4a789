//! Read-mostly queries over a finished overmap.

use rand::Rng;

use crate::dice::Dice;
use crate::monsters::MonsterRegistry;
use crate::terrain::Terrain;

use super::{rl_dist, Overmap, OMAPX};

impl Overmap {
    /// Nearest tile matching `predicate`, scanning square rings outward from
    /// `origin`. A `max_dist` of zero searches half the map.
    pub fn find_closest<F>(
        &self,
        origin: (i32, i32),
        z: i32,
        predicate: F,
        max_dist: i32,
        must_be_seen: bool,
    ) -> Option<(i32, i32)>
    where
        F: Fn(Terrain) -> bool,
    {
        let max = if max_dist == 0 { OMAPX / 2 } else { max_dist };
        for dist in 0..=max {
            for (x, y) in ring(origin, dist) {
                if predicate(self.ter(x, y, z)) && (!must_be_seen || self.seen(x, y, z)) {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Every matching tile within `max_dist`, nearest rings first.
    pub fn find_all<F>(
        &self,
        origin: (i32, i32),
        z: i32,
        predicate: F,
        max_dist: i32,
        must_be_seen: bool,
    ) -> Vec<(i32, i32)>
    where
        F: Fn(Terrain) -> bool,
    {
        let max = if max_dist == 0 { OMAPX / 2 } else { max_dist };
        (0..=max)
            .flat_map(|dist| ring(origin, dist))
            .filter(|&(x, y)| predicate(self.ter(x, y, z)) && (!must_be_seen || self.seen(x, y, z)))
            .collect()
    }

    /// Seen tiles whose terrain name contains `term`.
    pub fn find_terrain(&self, term: &str, z: i32) -> Vec<(i32, i32)> {
        let Some(layer) = self.layer(z) else {
            return Vec::new();
        };
        layer
            .terrain
            .iter()
            .filter(|&(x, y, t)| self.seen(x, y, z) && t.name().contains(term))
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    /// Index of the nearest city; ties go to the smaller city.
    pub fn closest_city(&self, p: (i32, i32)) -> Option<usize> {
        self.cities
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| (rl_dist(p, c.pos()), c.size))
            .map(|(i, _)| i)
    }

    /// Distance from `p` to the edge of the nearest city, or 999 without cities.
    pub fn dist_from_city(&self, p: (i32, i32)) -> i32 {
        self.cities
            .iter()
            .map(|c| rl_dist(p, c.pos()) - c.size)
            .min()
            .unwrap_or(999)
            .min(999)
    }

    /// A random house inside the square covered by a city.
    pub fn random_house_in_city<R: Rng>(&self, city: usize, rng: &mut R) -> Option<(i32, i32)> {
        let Some(town) = self.cities.get(city) else {
            tracing::warn!(city, count = self.cities.len(), "no such city");
            return None;
        };
        let mut valid = Vec::new();
        for x in town.x - town.size..=town.x + town.size {
            for y in town.y - town.size..=town.y + town.size {
                if matches!(self.ter(x, y, 0), Terrain::House(_)) {
                    valid.push((x, y));
                }
            }
        }
        rng.index(valid.len()).map(|i| valid[i])
    }

    /// Surface shelter where a new character starts.
    pub fn first_shelter<R: Rng>(&self, rng: &mut R) -> Option<(i32, i32)> {
        let valid: Vec<(i32, i32)> = self
            .layer(0)
            .into_iter()
            .flat_map(|layer| layer.terrain.iter())
            .filter(|&(_, _, &t)| t == Terrain::Shelter)
            .map(|(x, y, _)| (x, y))
            .collect();
        rng.index(valid.len()).map(|i| valid[i])
    }

    /// True when no hostile group covers the tile.
    pub fn is_safe(&self, x: i32, y: i32, z: i32, registry: &MonsterRegistry) -> bool {
        self.monsters_at(x, y, z)
            .iter()
            .all(|g| registry.is_safe(g.category))
    }

    /// Shrink every dying group.
    pub fn process_monster_groups(&mut self) {
        for group in self.monster_groups.iter_mut().filter(|g| g.dying) {
            group.population = (group.population as f64 * 0.8) as i32;
            group.radius = (group.radius as f64 * 0.9) as i32;
        }
    }
}

/// Tiles at exactly Chebyshev distance `dist` from `origin`, clipped to the map.
fn ring(origin: (i32, i32), dist: i32) -> Vec<(i32, i32)> {
    let (ox, oy) = origin;
    let mut tiles = Vec::new();
    for x in ox - dist..=ox + dist {
        for y in oy - dist..=oy + dist {
            if rl_dist(origin, (x, y)) == dist && Overmap::in_bounds(x, y) {
                tiles.push((x, y));
            }
        }
    }
    tiles
}
