//! Region buffer
//!
//! Owns every loaded overmap. Regions come from the cache, then the save
//! directory, and are generated only when neither has them. Neighbours read
//! during generation are borrowed from the cache or loaded read-only from
//! disk; the buffer never hands ownership of a cached region to the
//! generator.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::{OvermapError, Result};
use crate::generation::{default_specials, generate, GenerationContext, Neighbors, OvermapSpecial};
use crate::monsters::MonsterRegistry;
use crate::overmap::Overmap;
use crate::persistence::SaveDir;
use crate::seeds::WorldSeed;

/// Offsets of the neighbours consulted when generating a region, in the
/// order north, east, south, west, north-west.
const NEIGHBOR_OFFSETS: [(i32, i32); 5] = [(0, -1), (1, 0), (0, 1), (-1, 0), (-1, -1)];

pub struct OvermapBuffer {
    /// Loaded regions by grid coordinate.
    regions: HashMap<(i32, i32), Overmap>,
    /// Least recently used first.
    recency: VecDeque<(i32, i32)>,
    capacity: usize,
    seed: WorldSeed,
    saves: SaveDir,
    player: String,
    config: GenerationConfig,
    specials: Vec<OvermapSpecial>,
    monsters: MonsterRegistry,
}

impl OvermapBuffer {
    pub fn new(seed: WorldSeed, saves: SaveDir, player: &str, config: GenerationConfig) -> Self {
        Self {
            regions: HashMap::new(),
            recency: VecDeque::new(),
            capacity: config.cache_capacity.max(1),
            seed,
            saves,
            player: player.to_string(),
            config,
            specials: default_specials(),
            monsters: MonsterRegistry::builtin(),
        }
    }

    /// Replace the monster registry used for new regions.
    pub fn with_monsters(mut self, monsters: MonsterRegistry) -> Self {
        self.monsters = monsters;
        self
    }

    pub fn seed(&self) -> WorldSeed {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn is_loaded(&self, x: i32, y: i32) -> bool {
        self.regions.contains_key(&(x, y))
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Overmap> {
        self.regions.get(&(x, y))
    }

    /// The region at `(x, y)`, loading or generating it as needed.
    pub fn get_or_create(&mut self, x: i32, y: i32) -> Result<&mut Overmap> {
        if self.regions.contains_key(&(x, y)) {
            self.touch((x, y));
        } else {
            let om = match self.saves.load(x, y, &self.player)? {
                Some(om) => om,
                None => self.create(x, y)?,
            };
            self.insert(om)?;
        }
        self.regions
            .get_mut(&(x, y))
            .ok_or(OvermapError::MissingRegion { x, y })
    }

    /// Generate a fresh region, stitched to whatever neighbours exist, and
    /// save it straight away so it is never generated twice.
    fn create(&self, x: i32, y: i32) -> Result<Overmap> {
        let mut from_disk: HashMap<(i32, i32), Overmap> = HashMap::new();
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let key = (x + dx, y + dy);
            if !self.regions.contains_key(&key) {
                if let Some(om) = self.saves.load(key.0, key.1, &self.player)? {
                    from_disk.insert(key, om);
                }
            }
        }
        let lookup = |(dx, dy): (i32, i32)| {
            let key = (x + dx, y + dy);
            self.regions.get(&key).or_else(|| from_disk.get(&key))
        };
        let neighbors = Neighbors {
            north: lookup(NEIGHBOR_OFFSETS[0]),
            east: lookup(NEIGHBOR_OFFSETS[1]),
            south: lookup(NEIGHBOR_OFFSETS[2]),
            west: lookup(NEIGHBOR_OFFSETS[3]),
            north_west: lookup(NEIGHBOR_OFFSETS[4]),
        };
        debug!(x, y, stitched = !neighbors.is_empty(), "generating region");

        let ctx = GenerationContext::new(&self.config, &self.specials, &self.monsters);
        let mut om = Overmap::new(x, y);
        let mut rng = self.seed.region_rng(x, y);
        generate(&mut om, &neighbors, &ctx, &mut rng);
        self.saves.save(&om, &self.player)?;
        Ok(om)
    }

    fn touch(&mut self, key: (i32, i32)) {
        if let Some(pos) = self.recency.iter().position(|&k| k == key) {
            self.recency.remove(pos);
        }
        self.recency.push_back(key);
    }

    /// Add a region, saving and dropping the least recently used ones once
    /// the buffer is over capacity.
    fn insert(&mut self, om: Overmap) -> Result<()> {
        let key = om.loc();
        self.regions.insert(key, om);
        self.touch(key);

        while self.regions.len() > self.capacity {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            if let Some(evicted) = self.regions.remove(&oldest) {
                // seen tiles and notes may have changed since the last save
                self.saves.save(&evicted, &self.player)?;
                debug!(x = oldest.0, y = oldest.1, "evicted region");
            }
        }
        Ok(())
    }

    /// Save every loaded region.
    pub fn save_all(&self) -> Result<()> {
        for om in self.regions.values() {
            self.saves.save(om, &self.player)?;
        }
        info!(regions = self.regions.len(), "saved all regions");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("overmap_buffer_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn buffer(dir: &PathBuf, capacity: usize) -> OvermapBuffer {
        let config = GenerationConfig {
            cache_capacity: capacity,
            ..GenerationConfig::default()
        };
        OvermapBuffer::new(WorldSeed::new(77), SaveDir::new(dir), "tester", config)
    }

    #[test]
    fn test_created_region_is_saved_and_cached() {
        let dir = scratch("create");
        let mut buf = buffer(&dir, 4);
        assert_eq!(buf.seed(), WorldSeed::new(77));
        assert!(buf.is_empty());
        let cities = buf.get_or_create(0, 0).unwrap().cities.len();
        assert!(cities > 0);
        assert!(buf.is_loaded(0, 0));
        assert!(SaveDir::new(&dir).exists(0, 0));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_eviction_keeps_capacity_and_saves_changes() {
        let dir = scratch("evict");
        let mut buf = buffer(&dir, 1);
        buf.get_or_create(0, 0).unwrap().set_seen(3, 3, 0, true);
        buf.get_or_create(1, 0).unwrap();
        assert_eq!(buf.len(), 1);
        assert!(!buf.is_loaded(0, 0));

        let again = buf.get_or_create(0, 0).unwrap();
        assert!(again.seen(3, 3, 0));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_saved_region_is_not_regenerated() {
        let dir = scratch("reload");
        let first = {
            let mut buf = buffer(&dir, 4);
            let om = buf.get_or_create(2, 3).unwrap().clone();
            buf.save_all().unwrap();
            om
        };
        let mut buf = OvermapBuffer::new(WorldSeed::new(12345), SaveDir::new(&dir), "tester", GenerationConfig::default());
        let reloaded = buf.get_or_create(2, 3).unwrap();
        assert_eq!(reloaded.layer(0), first.layer(0));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_east_neighbor_continues_road_exit() {
        let dir = scratch("stitch");
        let mut buf = buffer(&dir, 4);
        let west = buf.get_or_create(0, 0).unwrap().clone();
        let east = buf.get_or_create(1, 0).unwrap();
        for stub in west.roads_out.iter().filter(|r| r.x == 179) {
            assert!(east.roads_out.iter().any(|r| r.x == 0 && r.y == stub.y));
        }
        fs::remove_dir_all(&dir).unwrap();
    }
}
