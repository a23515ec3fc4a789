//! Sub-levels: each level below the surface is derived from the finished
//! level above it.
//!
//! A scan of level `z + 1` maps every tile that continues downward to its
//! counterpart on level `z` and queues the multi-tile structures (labs, ant
//! nests, slime pits, mines) that are dug after the scan. A level reports
//! whether anything it placed needs yet another level below; the driver
//! stops at the first level that does not, or at the depth floor.

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::Span;
use crate::dice::Dice;
use crate::monsters::{MonsterCategory, MonsterGroup};
use crate::overmap::{City, Overmap, OMAPX, OMAPY, OVERMAP_DEPTH};
use crate::terrain::{Facing, Link, LinkFamily, Terrain};

use super::highways::place_hiways;
use super::polish::polish;
use super::GenerationContext;

/// Builds one sub-level from the level directly above it.
pub trait LevelBuilder {
    /// Fill level `z`. Returns true when something on it continues further
    /// down.
    fn build_level(&mut self, om: &mut Overmap, z: i32, rng: &mut ChaCha8Rng) -> bool;
}

/// Build levels from `-1` downward until the builder stops asking for more
/// or the depth floor is reached. Returns the number of levels built.
pub fn generate_sublevels<B>(om: &mut Overmap, builder: &mut B, rng: &mut ChaCha8Rng) -> i32
where
    B: LevelBuilder + ?Sized,
{
    let mut built = 0;
    for z in (-OVERMAP_DEPTH..=-1).rev() {
        built += 1;
        if !builder.build_level(om, z, rng) {
            break;
        }
    }
    built
}

/// Structures found on the level above, waiting to be dug.
#[derive(Default)]
struct Survey {
    subways: Vec<City>,
    sewers: Vec<City>,
    ants: Vec<City>,
    goo: Vec<City>,
    labs: Vec<City>,
    mines: Vec<City>,
    shafts: Vec<(i32, i32)>,
    bunkers: Vec<(i32, i32)>,
    shelters: Vec<(i32, i32)>,
    triffids: Vec<(i32, i32)>,
    temples: Vec<(i32, i32)>,
    basements: Vec<(i32, i32)>,
    deeper: bool,
}

/// The production level builder.
pub struct SubLevelGenerator<'a> {
    ctx: GenerationContext<'a>,
}

impl<'a> SubLevelGenerator<'a> {
    pub fn new(ctx: GenerationContext<'a>) -> Self {
        Self { ctx }
    }

    /// Map every tile of `z + 1` that continues downward.
    fn survey(&self, om: &mut Overmap, z: i32, rng: &mut ChaCha8Rng) -> Survey {
        let config = self.ctx.config;
        let mut found = Survey::default();

        for x in 0..OMAPX {
            for y in 0..OMAPY {
                let here = City::new(x, y, 0);
                match om.ter(x, y, z + 1) {
                    Terrain::SubwayStation(_) => {
                        om.set_ter(x, y, z, Terrain::Subway(Link::Nesw));
                        found.subways.push(here);
                    }
                    Terrain::RoadManhole => {
                        om.set_ter(x, y, z, Terrain::Sewer(Link::Nesw));
                        found.sewers.push(here);
                    }
                    Terrain::SewageTreatment => {
                        for (bx, by) in square(x, y, 1) {
                            om.set_ter(bx, by, z, Terrain::SewageTreatmentUnder);
                        }
                        om.set_ter(x, y, z, Terrain::SewageTreatmentHub);
                        found.sewers.push(here);
                    }
                    Terrain::SpiderPit => {
                        om.set_ter(x, y, z, Terrain::SpiderPitUnder);
                    }
                    Terrain::Cave if z == -1 => {
                        if rng.one_in(3) {
                            om.set_ter(x, y, z, Terrain::CaveRat);
                            found.deeper = true;
                        } else {
                            om.set_ter(x, y, z, Terrain::Cave);
                        }
                    }
                    Terrain::CaveRat if z == -2 => {
                        om.set_ter(x, y, z, Terrain::CaveRat);
                    }
                    Terrain::Anthill | Terrain::AntsDown => {
                        let size = ant_nest_size(config.ant_size, z, rng);
                        found.ants.push(City::new(x, y, size));
                        self.ctx.spawn(
                            om,
                            MonsterGroup::new(MonsterCategory::Ant, x, y, z, size * 3 / 4, rng.roll(6000, 8000)),
                        );
                    }
                    Terrain::SlimepitDown => {
                        let size = rng.roll(config.slimepit_size.min, config.slimepit_size.max) + 1 + z;
                        found.goo.push(City::new(x, y, size));
                    }
                    Terrain::ForestWater => {
                        om.set_ter(x, y, z, Terrain::Cavern);
                    }
                    Terrain::TriffidGrove | Terrain::TriffidRoots => found.triffids.push((x, y)),
                    Terrain::TempleStairs => found.temples.push((x, y)),
                    Terrain::LabStairs if z == -1 => {
                        found.labs.push(City::new(x, y, lab_size(z, rng)));
                    }
                    Terrain::LabCore if lab_continues(om, x, y, z + 1) => {
                        found.labs.push(City::new(x, y, lab_size(z, rng)));
                    }
                    Terrain::LabStairs => {
                        om.set_ter(x, y, z, Terrain::Lab);
                    }
                    Terrain::Bunker if z == -1 => found.bunkers.push((x, y)),
                    Terrain::Shelter => found.shelters.push((x, y)),
                    Terrain::MineEntrance => found.shafts.push((x, y)),
                    Terrain::MineShaft | Terrain::MineDown => {
                        om.set_ter(x, y, z, Terrain::Mine);
                        found.mines.push(City::new(x, y, rng.roll(6 + z, 10 + z)));
                    }
                    Terrain::MineFinale => {
                        for (bx, by) in square(x, y, 1) {
                            om.set_ter(bx, by, z, Terrain::Spiral);
                        }
                        om.set_ter(x, y, z, Terrain::SpiralHub);
                        self.ctx
                            .spawn(om, MonsterGroup::new(MonsterCategory::Spiral, x, y, z, 1, 200));
                    }
                    Terrain::Silo => {
                        let z_abs = z.abs();
                        if rng.roll(2, 7) < z_abs || rng.roll(2, 7) < z_abs {
                            om.set_ter(x, y, z, Terrain::SiloFinale);
                        } else {
                            om.set_ter(x, y, z, Terrain::Silo);
                            found.deeper = true;
                        }
                    }
                    Terrain::HouseBase(_) => found.basements.push((x, y)),
                    _ => {}
                }
            }
        }
        found
    }

    fn spawn_city_dwellers(&self, om: &mut Overmap, z: i32, rng: &mut ChaCha8Rng) {
        for city in om.cities.clone() {
            let s = city.size;
            if rng.one_in(3) {
                let chud = MonsterGroup::new(MonsterCategory::Chud, city.x, city.y, z, (s / 2).max(1), s * 20);
                self.ctx.spawn(om, chud);
            }
            if !rng.one_in(8) {
                let sewer = MonsterGroup::new(MonsterCategory::Sewer, city.x, city.y, z, s * 7 / 4, s * 70);
                self.ctx.spawn(om, sewer);
            }
        }
    }
}

impl LevelBuilder for SubLevelGenerator<'_> {
    fn build_level(&mut self, om: &mut Overmap, z: i32, rng: &mut ChaCha8Rng) -> bool {
        let config = self.ctx.config;
        let found = self.survey(om, z, rng);
        let mut deeper = found.deeper;

        for pit in &found.goo {
            if build_slimepit(om, pit.pos(), z, pit.size, rng) && config.slimepit_size.max + z > 0 {
                deeper = true;
            }
        }

        place_hiways(om, &found.sewers, z, LinkFamily::Sewer, config, rng);
        polish(om, z, Some(LinkFamily::Sewer), rng);
        place_hiways(om, &found.subways, z, LinkFamily::Subway, config, rng);
        for station in &found.subways {
            om.set_ter(station.x, station.y, z, Terrain::SubwayHub);
        }

        for lab in &found.labs {
            deeper |= build_lab(om, lab.pos(), z, lab.size, &self.ctx, rng);
        }
        for nest in &found.ants {
            deeper |= build_anthill(om, nest.pos(), z, nest.size, config.ant_size, rng);
        }
        polish(om, z, Some(LinkFamily::Subway), rng);
        polish(om, z, Some(LinkFamily::Ants), rng);

        if z == -1 {
            self.spawn_city_dwellers(om, z, rng);
        }
        place_rifts(om, z, config.rift_size, rng);

        for mine in &found.mines {
            deeper |= build_mine(om, mine.pos(), z, mine.size, rng);
        }

        // Last, so tunnels and rifts never cover them.
        for &(x, y) in &found.basements {
            om.set_ter(x, y, z, Terrain::Basement);
        }
        for &(x, y) in &found.shafts {
            om.set_ter(x, y, z, Terrain::MineShaft);
            deeper = true;
        }
        for &(x, y) in &found.bunkers {
            om.set_ter(x, y, z, Terrain::Bunker);
        }
        for &(x, y) in &found.shelters {
            om.set_ter(x, y, z, Terrain::ShelterUnder);
        }
        for &(x, y) in &found.triffids {
            if z == -1 {
                om.set_ter(x, y, z, Terrain::TriffidRoots);
                deeper = true;
            } else {
                om.set_ter(x, y, z, Terrain::TriffidFinale);
            }
        }
        for &(x, y) in &found.temples {
            if z == -5 {
                om.set_ter(x, y, z, Terrain::TempleFinale);
            } else {
                om.set_ter(x, y, z, Terrain::TempleStairs);
                deeper = true;
            }
        }

        debug!(
            z,
            labs = found.labs.len(),
            nests = found.ants.len(),
            mines = found.mines.len(),
            deeper,
            "built sub-level"
        );
        deeper
    }
}

fn square(x: i32, y: i32, r: i32) -> impl Iterator<Item = (i32, i32)> {
    (x - r..=x + r).flat_map(move |bx| (y - r..=y + r).map(move |by| (bx, by)))
}

/// Nests shrink by four per level below the first.
fn ant_nest_size(span: Span, z: i32, rng: &mut ChaCha8Rng) -> i32 {
    (rng.roll(span.min, span.max) - 4 * (-z - 1)).max(2)
}

fn lab_size(z: i32, rng: &mut ChaCha8Rng) -> i32 {
    rng.roll(1, (5 + z).max(1))
}

/// A lab core continues downward unless its own level already holds the
/// finale.
fn lab_continues(om: &Overmap, x: i32, y: i32, z: i32) -> bool {
    !square(x, y, 5).any(|(lx, ly)| om.ter(lx, ly, z) == Terrain::LabFinale)
}

fn is_ant(om: &Overmap, x: i32, y: i32, z: i32) -> bool {
    om.ter(x, y, z).link_family() == Some(LinkFamily::Ants)
}

/// Spread a slime pit of radius `s` around `at`. Returns whether any tile
/// leads further down.
fn build_slimepit(om: &mut Overmap, at: (i32, i32), z: i32, s: i32, rng: &mut ChaCha8Rng) -> bool {
    let mut goes_down = false;
    for n in 1..=s {
        for (x, y) in square(at.0, at.1, n) {
            if rng.roll(1, s * 2) >= n {
                let down = rng.one_in(8);
                if om.set_ter(x, y, z, if down { Terrain::SlimepitDown } else { Terrain::Slimepit }) {
                    goes_down |= down;
                }
            }
        }
    }
    goes_down
}

/// Spread a lab of radius `s` around its core, then place stairs down or,
/// when none were placed, the finale. Returns whether stairs were placed.
fn build_lab(
    om: &mut Overmap,
    at: (i32, i32),
    z: i32,
    s: i32,
    ctx: &GenerationContext,
    rng: &mut ChaCha8Rng,
) -> bool {
    let (x, y) = at;
    om.set_ter(x, y, z, Terrain::Lab);
    // two passes so the lab can grow round corners
    for _ in 0..2 {
        for i in 1..=s {
            for (lx, ly) in square(x, y, i) {
                if om.ter(lx, ly, z) != Terrain::Rock {
                    continue;
                }
                let touches = [(-1, 0), (1, 0), (0, -1), (0, 1)]
                    .iter()
                    .any(|&(dx, dy)| om.ter(lx + dx, ly + dy, z) == Terrain::Lab);
                if touches && rng.one_in(i) {
                    om.set_ter(lx, ly, z, Terrain::Lab);
                }
            }
        }
    }
    om.set_ter(x, y, z, Terrain::LabCore);

    let mut stairs = 0;
    if s > 1 {
        while !rng.one_in(6) {
            if let Some((sx, sy)) = sample_lab(om, at, z, s, &[Terrain::Lab], rng) {
                om.set_ter(sx, sy, z, Terrain::LabStairs);
                stairs += 1;
            }
        }
    }
    if stairs == 0 {
        let (fx, fy) = sample_lab(om, at, z, s, &[Terrain::Lab, Terrain::LabCore], rng).unwrap_or(at);
        om.set_ter(fx, fy, z, Terrain::LabFinale);
    }

    ctx.spawn(om, MonsterGroup::new(MonsterCategory::Lab, x, y, z, s.max(1), 400));
    stairs > 0
}

/// Up to 15 samples within `s` of the core for a tile of the wanted kinds.
fn sample_lab(
    om: &Overmap,
    core: (i32, i32),
    z: i32,
    s: i32,
    wanted: &[Terrain],
    rng: &mut ChaCha8Rng,
) -> Option<(i32, i32)> {
    (0..15).find_map(|_| {
        let p = (rng.roll(core.0 - s, core.0 + s), rng.roll(core.1 - s, core.1 + s));
        wanted.contains(&om.ter(p.0, p.1, z)).then_some(p)
    })
}

/// Dig four tunnels out of the nest centre and crown one chamber. Large
/// nests get a way down instead of a queen. Returns whether the nest goes
/// deeper.
fn build_anthill(om: &mut Overmap, at: (i32, i32), z: i32, s: i32, span: Span, rng: &mut ChaCha8Rng) -> bool {
    let (x, y) = at;
    om.set_ter(x, y, z, Terrain::Ants(Link::Unset));
    for dir in Facing::ALL {
        let budget = s - rng.roll(0, 3);
        build_tunnel(om, at, z, budget, dir, rng);
    }

    let chambers: Vec<_> = square(x, y, s)
        .filter(|&(cx, cy)| matches!(om.ter(cx, cy, z), Terrain::Ants(_)))
        .collect();
    let (qx, qy) = rng.index(chambers.len()).map_or(at, |i| chambers[i]);

    let deeper = s >= span.min + 4;
    om.set_ter(qx, qy, z, if deeper { Terrain::AntsDown } else { Terrain::AntsQueen });
    deeper
}

/// Tunnel `s` tiles in `dir`, occasionally storing food or larvae beside the
/// passage or branching off with a smaller budget.
fn build_tunnel(om: &mut Overmap, at: (i32, i32), z: i32, s: i32, dir: Facing, rng: &mut ChaCha8Rng) {
    let (x, y) = at;
    if s <= 0 || !Overmap::in_bounds(x, y) {
        return;
    }
    if !is_ant(om, x, y, z) {
        om.set_ter(x, y, z, Terrain::Ants(Link::Unset));
    }

    let (dx, dy) = dir.delta();
    let next = (s > 1).then_some((x + dx, y + dy));

    for side in Facing::ALL {
        let (sx, sy) = side.delta();
        let p = (x + sx, y + sy);
        if Some(p) == next || !Overmap::in_bounds(p.0, p.1) || is_ant(om, p.0, p.1, z) {
            continue;
        }
        if rng.one_in(s * 2) {
            let room = if rng.one_in(2) { Terrain::AntsFood } else { Terrain::AntsLarvae };
            om.set_ter(p.0, p.1, z, room);
        } else if rng.one_in(5) {
            let budget = s - rng.roll(1, 3);
            build_tunnel(om, p, z, budget, side, rng);
        }
    }

    if let Some(p) = next {
        build_tunnel(om, p, z, s - 1, dir, rng);
    }
}

/// Walk a mine through solid rock for `s` steps and end it with a way down,
/// or with the finale when the roll says the chain stops here. Both endings
/// need a level below.
fn build_mine(om: &mut Overmap, at: (i32, i32), z: i32, s: i32, rng: &mut ChaCha8Rng) -> bool {
    let finale = s <= rng.roll(1, 3);
    let (mut x, mut y) = at;
    for _ in 0..s.max(2) {
        om.set_ter(x, y, z, Terrain::Mine);
        let next: Vec<_> = [(0, -1), (1, 0), (0, 1), (-1, 0)]
            .iter()
            .map(|&(dx, dy)| (x + dx, y + dy))
            .filter(|&(nx, ny)| om.ter(nx, ny, z) == Terrain::Rock)
            .collect();
        match rng.index(next.len()) {
            Some(i) => (x, y) = next[i],
            None => break,
        }
    }
    om.set_ter(x, y, z, if finale { Terrain::MineFinale } else { Terrain::MineDown });
    true
}

/// Cells of a straight line between two points, both ends included.
fn line_to(from: (i32, i32), to: (i32, i32)) -> Vec<(i32, i32)> {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut cells = Vec::new();
    loop {
        cells.push((x, y));
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

/// Cut a few rifts through the level. Each is three parallel lines so it
/// reads as a gash, usually with a hellmouth at its middle.
fn place_rifts(om: &mut Overmap, z: i32, span: Span, rng: &mut ChaCha8Rng) {
    let mut count = rng.roll(0, 2) * rng.roll(0, 2);
    if !rng.one_in(4) {
        count += 1;
    }
    for _ in 0..count {
        let x = rng.roll(span.max, OMAPX - span.max);
        let y = rng.roll(span.max, OMAPY - span.max);
        let xdist = rng.roll(span.min, span.max);
        let ydist = rng.roll(span.min, span.max);
        for o in 0..3 {
            let from = if xdist > ydist {
                (x - xdist, y - ydist + o)
            } else {
                (x - xdist + o, y - ydist)
            };
            let line = line_to(from, (x + xdist, y + ydist));
            let middle = line.len() / 2;
            for (i, &(lx, ly)) in line.iter().enumerate() {
                let t = if i == middle && !rng.one_in(3) {
                    Terrain::Hellmouth
                } else {
                    Terrain::Rift
                };
                om.set_ter(lx, ly, z, t);
            }
        }
    }
}
