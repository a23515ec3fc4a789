//! Continuing rivers and roads across region borders.

use tracing::debug;

use crate::overmap::{City, Overmap, OMAPX, OMAPY};
use crate::terrain::{RiverShape, Terrain};

/// Where rivers must enter (north/west edges) and leave (south/east edges).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RiverEnds {
    pub start: Vec<(i32, i32)>,
    pub end: Vec<(i32, i32)>,
}

/// Minimum spacing between two river mouths on one edge.
const MOUTH_SPACING: i32 = 6;

/// A neighbour's edge tile together with its two edge-wise neighbours is
/// open water, so a full river crosses here.
fn wide_river(om: &Overmap, x: i32, y: i32, along_x: bool) -> bool {
    let (dx, dy) = if along_x { (1, 0) } else { (0, 1) };
    om.is_river(x, y, 0) && om.is_river(x - dx, y - dy, 0) && om.is_river(x + dx, y + dy, 0)
}

fn push_mouth(list: &mut Vec<(i32, i32)>, first: usize, p: (i32, i32), along_x: bool) {
    let spaced = match list.get(first..).and_then(|tail| tail.last()) {
        Some(&(lx, ly)) => {
            if along_x {
                lx < p.0 - MOUTH_SPACING
            } else {
                ly < p.1 - MOUTH_SPACING
            }
        }
        None => true,
    };
    if spaced {
        list.push(p);
    }
}

/// Copy border rivers and road stubs from existing neighbours and collect
/// the river endpoints this region has to honour.
pub fn stitch_neighbors(om: &mut Overmap, neighbors: &super::Neighbors) -> RiverEnds {
    let mut ends = RiverEnds::default();
    let water = Terrain::River(RiverShape::Center);

    if let Some(north) = neighbors.north {
        for i in 2..OMAPX - 2 {
            if north.is_river(i, OMAPY - 1, 0) {
                om.set_ter(i, 0, 0, water);
            }
            if wide_river(north, i, OMAPY - 1, true) {
                push_mouth(&mut ends.start, 0, (i, 0), true);
            }
        }
        for stub in north.roads_out.iter().filter(|r| r.y == OMAPY - 1) {
            om.roads_out.push(City::new(stub.x, 0, 0));
        }
    }

    let from_north = ends.start.len();
    if let Some(west) = neighbors.west {
        for i in 2..OMAPY - 2 {
            if west.is_river(OMAPX - 1, i, 0) {
                om.set_ter(0, i, 0, water);
            }
            if wide_river(west, OMAPX - 1, i, false) {
                push_mouth(&mut ends.start, from_north, (0, i), false);
            }
        }
        for stub in west.roads_out.iter().filter(|r| r.x == OMAPX - 1) {
            om.roads_out.push(City::new(0, stub.y, 0));
        }
    }

    if let Some(corner) = neighbors.north_west {
        if corner.is_river(OMAPX - 1, OMAPY - 1, 0) {
            om.set_ter(0, 0, 0, water);
        }
    }

    if let Some(south) = neighbors.south {
        for i in 2..OMAPX - 2 {
            if south.is_river(i, 0, 0) {
                om.set_ter(i, OMAPY - 1, 0, water);
            }
            if wide_river(south, i, 0, true) {
                push_mouth(&mut ends.end, 0, (i, OMAPY - 1), true);
            }
        }
        for stub in south.roads_out.iter().filter(|r| r.y == 0) {
            om.roads_out.push(City::new(stub.x, OMAPY - 1, 0));
        }
    }

    let from_south = ends.end.len();
    if let Some(east) = neighbors.east {
        for i in 2..OMAPY - 2 {
            if east.is_river(0, i, 0) {
                om.set_ter(OMAPX - 1, i, 0, water);
            }
            if wide_river(east, 0, i, false) {
                push_mouth(&mut ends.end, from_south, (OMAPX - 1, i), false);
            }
        }
        for stub in east.roads_out.iter().filter(|r| r.x == 0) {
            om.roads_out.push(City::new(OMAPX - 1, stub.y, 0));
        }
    }

    debug!(
        starts = ends.start.len(),
        ends = ends.end.len(),
        roads_out = om.roads_out.len(),
        "stitched neighbours"
    );
    ends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Neighbors;

    #[test]
    fn test_north_river_and_road_continue() {
        let mut north = Overmap::new(0, -1);
        for x in 40..=48 {
            north.set_ter(x, OMAPY - 1, 0, Terrain::River(RiverShape::Center));
        }
        north.roads_out.push(City::new(100, OMAPY - 1, 0));
        north.roads_out.push(City::new(0, 50, 0));

        let mut om = Overmap::new(0, 0);
        let neighbors = Neighbors {
            north: Some(&north),
            ..Neighbors::default()
        };
        let ends = stitch_neighbors(&mut om, &neighbors);

        assert!(om.is_river(44, 0, 0));
        assert!(!om.is_river(50, 0, 0));
        assert_eq!(om.roads_out, vec![City::new(100, 0, 0)]);
        // one wide river gives a single mouth
        assert_eq!(ends.start, vec![(41, 0)]);
        assert!(ends.end.is_empty());
    }

    #[test]
    fn test_no_neighbors_leaves_map_untouched() {
        let mut om = Overmap::new(0, 0);
        let ends = stitch_neighbors(&mut om, &Neighbors::default());
        assert_eq!(ends, RiverEnds::default());
        assert!(om.roads_out.is_empty());
    }
}
