//! Plain-text save files for overmaps.
//!
//! Each region is stored as two files in the save directory:
//! `o.<x>.<y>` holds the terrain of every non-blank level plus cities, road
//! exits, monster groups, radios and NPC blobs, and is shared by all
//! players; `<player>.seen.<x>.<y>` holds one player's visibility and notes.
//!
//! Both files are line-tagged. An `L <z>` header is followed by `OMAPY` rows
//! describing that level. Malformed input never fails a load: bad values
//! are logged and clamped, unknown lines are skipped.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{OvermapError, Result};
use crate::monsters::{MonsterCategory, MonsterGroup};
use crate::overmap::{City, MapLayer, Note, Overmap, RadioKind, RadioTower, OMAPX, OMAPY};
use crate::terrain::Terrain;

/// Directory holding the save files of one world.
#[derive(Clone, Debug)]
pub struct SaveDir {
    root: PathBuf,
}

impl SaveDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn terrain_path(&self, x: i32, y: i32) -> PathBuf {
        self.root.join(format!("o.{}.{}", x, y))
    }

    pub fn seen_path(&self, player: &str, x: i32, y: i32) -> PathBuf {
        self.root.join(format!("{}.seen.{}.{}", player, x, y))
    }

    /// Whether the region has been generated before.
    pub fn exists(&self, x: i32, y: i32) -> bool {
        self.terrain_path(x, y).exists()
    }

    /// Write both files of a region.
    pub fn save(&self, om: &Overmap, player: &str) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| OvermapError::io(&self.root, e))?;
        let (x, y) = om.loc();

        let terrain = self.terrain_path(x, y);
        fs::write(&terrain, write_terrain(om)).map_err(|e| OvermapError::io(&terrain, e))?;

        let seen = self.seen_path(player, x, y);
        fs::write(&seen, write_seen(om)).map_err(|e| OvermapError::io(&seen, e))?;

        info!(x, y, player, "saved overmap");
        Ok(())
    }

    /// Load a region if its terrain file exists. A missing player file just
    /// leaves everything unseen.
    pub fn load(&self, x: i32, y: i32, player: &str) -> Result<Option<Overmap>> {
        let terrain = self.terrain_path(x, y);
        if !terrain.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&terrain).map_err(|e| OvermapError::io(&terrain, e))?;
        let mut om = read_terrain(&text, x, y);

        let seen = self.seen_path(player, x, y);
        if seen.exists() {
            let text = fs::read_to_string(&seen).map_err(|e| OvermapError::io(&seen, e))?;
            read_seen(&mut om, &text);
        }

        info!(x, y, player, "loaded overmap");
        Ok(Some(om))
    }
}

fn is_blank(layer: &MapLayer) -> bool {
    let fill = MapLayer::default_fill(layer.z);
    layer.terrain.iter().all(|(_, _, &t)| t == fill)
}

/// Serialize the shared part of a region.
pub fn write_terrain(om: &Overmap) -> String {
    let mut out = String::new();
    for layer in om.layers().filter(|l| !is_blank(l)) {
        let _ = writeln!(out, "L {}", layer.z);
        for y in 0..OMAPY as usize {
            let row: Vec<String> = layer.terrain.row(y).iter().map(|t| t.id().to_string()).collect();
            let _ = writeln!(out, "{}", row.join(" "));
        }
    }
    for g in &om.monster_groups {
        let _ = writeln!(
            out,
            "Z {} {} {} {} {} {} {}",
            g.category.code(),
            g.x,
            g.y,
            g.z,
            g.radius,
            g.population,
            u8::from(g.diffuse)
        );
    }
    for c in &om.cities {
        let _ = writeln!(out, "t {} {} {}", c.x, c.y, c.size);
    }
    for r in &om.roads_out {
        let _ = writeln!(out, "R {} {}", r.x, r.y);
    }
    for radio in &om.radios {
        let _ = writeln!(out, "T {} {} {} {}", radio.x, radio.y, radio.strength, radio.kind.code());
        let _ = writeln!(out, "{}", radio.message);
    }
    for npc in &om.npcs {
        let _ = writeln!(out, "n {}", npc);
    }
    out
}

/// Serialize one player's visibility and notes.
pub fn write_seen(om: &Overmap) -> String {
    let mut out = String::new();
    for layer in om.layers() {
        let any_seen = layer.visible.iter().any(|(_, _, &v)| v);
        if !any_seen && layer.notes.is_empty() {
            continue;
        }
        let _ = writeln!(out, "L {}", layer.z);
        for y in 0..OMAPY as usize {
            let row: String = layer.visible.row(y).iter().map(|&v| if v { '1' } else { '0' }).collect();
            let _ = writeln!(out, "{}", row);
        }
        for note in &layer.notes {
            let _ = writeln!(out, "N {} {} {}", note.x, note.y, note.num);
            let _ = writeln!(out, "{}", note.text);
        }
    }
    out
}

/// Parse whitespace-separated integers after a line tag, or `None` when
/// there are too few or one does not parse.
fn fields<const N: usize>(rest: &str) -> Option<[i32; N]> {
    let mut values = [0; N];
    let mut parts = rest.split_whitespace();
    for v in values.iter_mut() {
        *v = parts.next()?.parse().ok()?;
    }
    Some(values)
}

/// Row lines hold digits only; anything starting with a letter is a tag.
fn starts_with_tag(line: &str) -> bool {
    line.starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Rebuild a region from its terrain file contents.
pub fn read_terrain(text: &str, x: i32, y: i32) -> Overmap {
    let mut om = Overmap::new(x, y);
    let mut lines = text.lines().enumerate().peekable();

    while let Some((n, line)) = lines.next() {
        let (tag, rest) = line.split_once(' ').unwrap_or((line, ""));
        match tag {
            "L" => {
                let Some([z]) = fields::<1>(rest) else {
                    warn!(line = n + 1, "bad level header");
                    continue;
                };
                if om.layer(z).is_none() {
                    warn!(line = n + 1, z, "level outside the overmap, dropping its rows");
                }
                let fill = MapLayer::default_fill(z);
                for row in 0..OMAPY {
                    let Some((_, text)) = lines.next_if(|(_, l)| !starts_with_tag(l)) else {
                        warn!(z, row, "level ends early");
                        break;
                    };
                    let ids: Vec<&str> = text.split_whitespace().collect();
                    if ids.len() != OMAPX as usize {
                        warn!(z, row, found = ids.len(), "terrain row has the wrong width");
                    }
                    for (col, id) in ids.iter().take(OMAPX as usize).enumerate() {
                        let t = id
                            .parse()
                            .ok()
                            .and_then(Terrain::from_id)
                            .filter(|&t| t != Terrain::Border)
                            .unwrap_or_else(|| {
                                warn!(z, row, col, id, "unknown terrain id");
                                fill
                            });
                        om.set_ter(col as i32, row, z, t);
                    }
                }
            }
            "Z" => match fields::<7>(rest) {
                Some([code, gx, gy, gz, radius, population, diffuse]) => {
                    let Some(category) = MonsterCategory::from_code(code as u32) else {
                        warn!(line = n + 1, code, "unknown monster category");
                        continue;
                    };
                    let mut group = MonsterGroup::new(category, gx, gy, gz, radius.max(0), population.max(0));
                    group.diffuse = diffuse != 0;
                    om.monster_groups.push(group);
                }
                None => warn!(line = n + 1, "bad monster group line"),
            },
            "t" => match fields::<3>(rest) {
                Some([cx, cy, size]) => om.cities.push(City::new(cx, cy, size)),
                None => warn!(line = n + 1, "bad city line"),
            },
            "R" => match fields::<2>(rest) {
                Some([rx, ry]) => om.roads_out.push(City::new(rx, ry, 0)),
                None => warn!(line = n + 1, "bad road exit line"),
            },
            "T" => {
                let message = lines.next().map(|(_, m)| m.to_string()).unwrap_or_default();
                match fields::<4>(rest) {
                    Some([tx, ty, strength, kind]) => {
                        let kind = RadioKind::from_code(kind as u32).unwrap_or_else(|| {
                            warn!(line = n + 1, kind, "unknown radio kind");
                            RadioKind::Broadcast
                        });
                        om.radios.push(RadioTower {
                            x: tx,
                            y: ty,
                            strength,
                            kind,
                            message,
                        });
                    }
                    None => warn!(line = n + 1, "bad radio line"),
                }
            }
            "n" => om.npcs.push(rest.to_string()),
            "" => {}
            other => warn!(line = n + 1, tag = other, "skipping unknown line"),
        }
    }
    om
}

/// Apply a player file to a loaded region.
pub fn read_seen(om: &mut Overmap, text: &str) {
    let mut lines = text.lines().enumerate().peekable();
    let mut z = None;

    while let Some((n, line)) = lines.next() {
        let (tag, rest) = line.split_once(' ').unwrap_or((line, ""));
        match tag {
            "L" => {
                z = fields::<1>(rest).map(|[level]| level);
                let Some(level) = z else {
                    warn!(line = n + 1, "bad level header");
                    continue;
                };
                if om.layer(level).is_none() {
                    warn!(line = n + 1, z = level, "level outside the overmap, dropping its rows");
                }
                for row in 0..OMAPY {
                    let Some((_, bits)) = lines.next_if(|(_, l)| !starts_with_tag(l)) else {
                        warn!(z = level, row, "level ends early");
                        break;
                    };
                    for (col, bit) in bits.chars().take(OMAPX as usize).enumerate() {
                        om.set_seen(col as i32, row, level, bit == '1');
                    }
                }
            }
            "N" => {
                let text = lines.next().map(|(_, t)| t.to_string()).unwrap_or_default();
                let (Some([nx, ny, num]), Some(level)) = (fields::<3>(rest), z) else {
                    warn!(line = n + 1, "bad note line");
                    continue;
                };
                if let Some(layer) = om.layer_mut(level) {
                    layer.notes.push(Note {
                        x: nx,
                        y: ny,
                        num: num.max(0) as usize,
                        text,
                    });
                }
            }
            "" => {}
            other => warn!(line = n + 1, tag = other, "skipping unknown line"),
        }
    }
}
