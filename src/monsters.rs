//! Monster spawn regions and the category registry.
//!
//! The overmap only records where populations live; what actually spawns is
//! decided by the encounter system. The [`MonsterRegistry`] is constructed by
//! the caller and handed to generation instead of living in global state.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OvermapError, Result};

/// Kind of population a monster group represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonsterCategory {
    Zombie,
    Ant,
    Bee,
    Worm,
    Forest,
    Swamp,
    Sewer,
    Chud,
    Lab,
    Spiral,
    Goo,
    Fungi,
    Triffid,
    Spider,
    Military,
    Cave,
}

impl MonsterCategory {
    pub const ALL: [MonsterCategory; 16] = [
        MonsterCategory::Zombie,
        MonsterCategory::Ant,
        MonsterCategory::Bee,
        MonsterCategory::Worm,
        MonsterCategory::Forest,
        MonsterCategory::Swamp,
        MonsterCategory::Sewer,
        MonsterCategory::Chud,
        MonsterCategory::Lab,
        MonsterCategory::Spiral,
        MonsterCategory::Goo,
        MonsterCategory::Fungi,
        MonsterCategory::Triffid,
        MonsterCategory::Spider,
        MonsterCategory::Military,
        MonsterCategory::Cave,
    ];

    /// Integer written to save files.
    pub fn code(self) -> u32 {
        MonsterCategory::ALL
            .iter()
            .position(|&c| c == self)
            .unwrap_or_default() as u32
    }

    pub fn from_code(code: u32) -> Option<MonsterCategory> {
        MonsterCategory::ALL.get(code as usize).copied()
    }
}

/// A circular spawn region, in overmap-tile coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonsterGroup {
    pub category: MonsterCategory,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub radius: i32,
    pub population: i32,
    /// Density does not fall off toward the edge of the radius.
    pub diffuse: bool,
    /// The group shrinks every time groups are processed.
    pub dying: bool,
}

impl MonsterGroup {
    pub fn new(category: MonsterCategory, x: i32, y: i32, z: i32, radius: i32, population: i32) -> Self {
        Self {
            category,
            x,
            y,
            z,
            radius,
            population,
            diffuse: false,
            dying: false,
        }
    }

    pub fn diffuse(mut self) -> Self {
        self.diffuse = true;
        self
    }

    /// Whether the Euclidean radius covers `(x, y)` on the same level.
    pub fn covers(&self, x: i32, y: i32, z: i32) -> bool {
        if z != self.z {
            return false;
        }
        let dx = (x - self.x) as f64;
        let dy = (y - self.y) as f64;
        (dx * dx + dy * dy).sqrt() <= self.radius as f64
    }
}

/// Per-category metadata consulted by placement and safety queries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub category: MonsterCategory,
    pub name: String,
    /// Travelling through this population is considered safe.
    #[serde(default)]
    pub safe: bool,
    /// Disabled categories are never placed on new overmaps.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Explicitly constructed registry of monster categories.
#[derive(Clone, Debug)]
pub struct MonsterRegistry {
    categories: HashMap<MonsterCategory, CategoryInfo>,
}

impl MonsterRegistry {
    /// Registry with every category defined and none of them safe.
    pub fn builtin() -> Self {
        let infos = MonsterCategory::ALL.iter().map(|&category| CategoryInfo {
            category,
            name: format!("{:?}", category).to_lowercase(),
            safe: false,
            enabled: true,
        });
        Self::from_infos(infos)
    }

    fn from_infos(infos: impl IntoIterator<Item = CategoryInfo>) -> Self {
        Self {
            categories: infos.into_iter().map(|info| (info.category, info)).collect(),
        }
    }

    /// Parse a JSON array of [`CategoryInfo`]; categories it omits keep the
    /// built-in definition.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let infos: Vec<CategoryInfo> = serde_json::from_str(text)?;
        let mut registry = Self::builtin();
        for info in infos {
            registry.categories.insert(info.category, info);
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| OvermapError::io(path, e))?;
        Self::from_json(&text).map_err(|source| OvermapError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_safe(&self, category: MonsterCategory) -> bool {
        self.categories.get(&category).map_or(false, |info| info.safe)
    }

    pub fn is_enabled(&self, category: MonsterCategory) -> bool {
        self.categories.get(&category).map_or(false, |info| info.enabled)
    }

    pub fn name(&self, category: MonsterCategory) -> &str {
        self.categories
            .get(&category)
            .map_or("unknown", |info| info.name.as_str())
    }
}

impl Default for MonsterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for category in MonsterCategory::ALL {
            assert_eq!(MonsterCategory::from_code(category.code()), Some(category));
        }
        assert_eq!(MonsterCategory::from_code(999), None);
    }

    #[test]
    fn test_covers_uses_euclidean_radius() {
        let group = MonsterGroup::new(MonsterCategory::Zombie, 10, 10, 0, 5, 100);
        assert!(group.covers(13, 14, 0));
        assert!(!group.covers(14, 14, 0));
        assert!(!group.covers(10, 10, -1));
    }

    #[test]
    fn test_json_overrides_builtin() {
        let registry =
            MonsterRegistry::from_json(r#"[{ "category": "forest", "name": "wildlife", "safe": true }]"#)
                .unwrap();
        assert!(registry.is_safe(MonsterCategory::Forest));
        assert_eq!(registry.name(MonsterCategory::Forest), "wildlife");
        assert!(!registry.is_safe(MonsterCategory::Zombie));
        assert_eq!(registry.name(MonsterCategory::Zombie), "zombie");
        assert!(registry.is_enabled(MonsterCategory::Forest));

        let registry =
            MonsterRegistry::from_json(r#"[{ "category": "worm", "name": "worm", "enabled": false }]"#)
                .unwrap();
        assert!(!registry.is_enabled(MonsterCategory::Worm));
    }
}
