//! Tunables for overmap generation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{OvermapError, Result};

/// Inclusive integer range as stored in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub min: i32,
    pub max: i32,
}

impl Span {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    fn normalized(self, floor: i32, name: &str) -> Self {
        let min = self.min.max(floor);
        let max = self.max.max(min);
        if min != self.min || max != self.max {
            warn!(field = name, from = ?self, "clamping configuration range");
        }
        Self { min, max }
    }
}

/// Configuration parameters for overmap generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Forest epicenters attempted per region.
    pub forest_count: u32,

    /// Random-walk length of one forest.
    pub forest_size: Span,

    /// Consecutive swamp tiles a single forest may lay down.
    pub swampiness: i32,

    /// One-in-N chance that a forest step away from water starts a swamp.
    pub swamp_chance: i32,

    /// One-in-N chance that a street frontage lot stays empty.
    pub street_chance: i32,

    /// Cities per region are rolled as `city_dice` d `city_sides`.
    pub city_dice: i32,
    pub city_sides: i32,

    /// Road budget of a freshly placed city.
    pub city_size: Span,

    /// Placement samples before city placement gives up.
    pub city_attempts: u32,

    /// Road points closer than this are all linked by highways.
    pub highway_distance: i32,

    /// Edge length of one special-placement sector.
    pub special_sector: i32,

    /// Candidate points sampled per sector.
    pub special_tries: u32,

    pub ant_size: Span,
    pub slimepit_size: Span,
    pub rift_size: Span,

    /// How far a river may wander outside the box spanned by its endpoints.
    pub river_meander: i32,

    /// Samples per map edge when looking for a road exit clear of rivers.
    pub road_out_tries: u32,

    /// Regions kept in memory by [`crate::buffer::OvermapBuffer`].
    pub cache_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            forest_count: 250,
            forest_size: Span::new(15, 40),
            swampiness: 8,
            swamp_chance: 850,
            street_chance: 2,
            city_dice: 3,
            city_sides: 4,
            city_size: Span::new(4, 17),
            city_attempts: 2000,
            highway_distance: 140,
            special_sector: 15,
            special_tries: 15,
            ant_size: Span::new(8, 20),
            slimepit_size: Span::new(1, 2),
            rift_size: Span::new(6, 16),
            river_meander: 30,
            road_out_tries: 20,
            cache_capacity: 9,
        }
    }
}

impl GenerationConfig {
    /// Read a JSON configuration; absent fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| OvermapError::io(path, e))?;
        let config: GenerationConfig =
            serde_json::from_str(&text).map_err(|source| OvermapError::Config {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(config.validate())
    }

    /// Pretty-printed JSON, in the form [`GenerationConfig::load`] reads.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp values that would stall or break generation.
    pub fn validate(mut self) -> Self {
        self.forest_size = self.forest_size.normalized(1, "forest_size");
        self.city_size = self.city_size.normalized(2, "city_size");
        self.ant_size = self.ant_size.normalized(1, "ant_size");
        self.slimepit_size = self.slimepit_size.normalized(1, "slimepit_size");
        self.rift_size = self.rift_size.normalized(1, "rift_size").clamp_max(40);
        if self.special_sector < 3 {
            warn!(value = self.special_sector, "special sector too small, using 3");
            self.special_sector = 3;
        }
        if self.city_dice < 1 || self.city_sides < 1 {
            warn!("city dice must be positive, using 1d1");
            self.city_dice = self.city_dice.max(1);
            self.city_sides = self.city_sides.max(1);
        }
        self.swampiness = self.swampiness.max(0);
        self.river_meander = self.river_meander.max(1);
        self.cache_capacity = self.cache_capacity.max(1);
        self
    }
}

impl Span {
    fn clamp_max(self, ceiling: i32) -> Self {
        Self {
            min: self.min.min(ceiling),
            max: self.max.min(ceiling),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_classic_tuning() {
        let config = GenerationConfig::default();
        assert_eq!(config.forest_count, 250);
        assert_eq!(config.highway_distance, 140);
        assert_eq!(config.special_sector, 15);
        assert_eq!((config.city_dice, config.city_sides), (3, 4));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let path = std::env::temp_dir().join("overmap_config_partial.json");
        fs::write(&path, r#"{ "forest_count": 3, "ant_size": { "min": 9, "max": 2 } }"#).unwrap();
        let config = GenerationConfig::load(&path).unwrap();
        assert_eq!(config.forest_count, 3);
        assert_eq!(config.ant_size, Span::new(9, 9));
        assert_eq!(config.swamp_chance, 850);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_dumped_config_loads_back() {
        let path = std::env::temp_dir().join(format!("overmap_config_dump_{}.json", std::process::id()));
        let json = GenerationConfig::default().to_json().unwrap();
        assert!(json.contains("\"forest_count\": 250"));
        fs::write(&path, &json).unwrap();
        let config = GenerationConfig::load(&path).unwrap();
        assert_eq!(config.forest_count, 250);
        assert_eq!(config.ant_size, Span::new(8, 20));
        assert_eq!(config.cache_capacity, 9);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bad_json_reports_config_error() {
        let path = std::env::temp_dir().join("overmap_config_bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = GenerationConfig::load(&path).unwrap_err();
        assert!(matches!(err, OvermapError::Config { .. }));
        let _ = fs::remove_file(&path);
    }
}
