//! One z-level of an overmap: terrain, visibility and player notes.

use crate::terrain::Terrain;
use crate::tilemap::Tilemap;

use super::{OMAPX, OMAPY};

/// A player annotation on one tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    pub x: i32,
    pub y: i32,
    pub num: usize,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapLayer {
    pub z: i32,
    pub terrain: Tilemap<Terrain>,
    pub visible: Tilemap<bool>,
    pub notes: Vec<Note>,
}

impl MapLayer {
    /// Blank layer filled with the terrain expected at this depth.
    pub fn new(z: i32) -> Self {
        Self {
            z,
            terrain: Tilemap::new_with(OMAPX as usize, OMAPY as usize, Self::default_fill(z)),
            visible: Tilemap::new_with(OMAPX as usize, OMAPY as usize, false),
            notes: Vec::new(),
        }
    }

    /// Rock below the surface, fields on it, open air above.
    pub fn default_fill(z: i32) -> Terrain {
        match z {
            z if z < 0 => Terrain::Rock,
            0 => Terrain::Field,
            _ => Terrain::OpenAir,
        }
    }

    pub fn has_note(&self, x: i32, y: i32) -> bool {
        self.notes.iter().any(|n| n.x == x && n.y == y)
    }

    pub fn note(&self, x: i32, y: i32) -> Option<&str> {
        self.notes
            .iter()
            .find(|n| n.x == x && n.y == y)
            .map(|n| n.text.as_str())
    }

    /// Set the note on a tile. An empty message deletes it.
    pub fn add_note(&mut self, x: i32, y: i32, message: &str) {
        if let Some(idx) = self.notes.iter().position(|n| n.x == x && n.y == y) {
            if message.is_empty() {
                self.notes.remove(idx);
            } else {
                self.notes[idx].text = message.to_string();
            }
            return;
        }
        if !message.is_empty() {
            let num = self.notes.iter().map(|n| n.num + 1).max().unwrap_or(0);
            self.notes.push(Note {
                x,
                y,
                num,
                text: message.to_string(),
            });
        }
    }

    pub fn delete_note(&mut self, x: i32, y: i32) {
        self.notes.retain(|n| n.x != x || n.y != y);
    }

    /// Nearest note whose text contains `text`, by king-move distance.
    pub fn find_note(&self, origin: (i32, i32), text: &str) -> Option<(i32, i32)> {
        self.notes
            .iter()
            .filter(|n| n.text.contains(text))
            .min_by_key(|n| rl_dist(origin, (n.x, n.y)))
            .map(|n| (n.x, n.y))
    }
}

/// Chebyshev ("roguelike") distance.
pub fn rl_dist(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs().max((a.1 - b.1).abs())
}

/// Euclidean distance.
pub fn trig_dist(a: (i32, i32), b: (i32, i32)) -> f64 {
    let dx = (a.0 - b.0) as f64;
    let dy = (a.1 - b.1) as f64;
    (dx * dx + dy * dy).sqrt()
}
