//! Overmap terrain catalogue
//!
//! Every overmap tile holds one [`Terrain`]. Families that share connectivity
//! rules (roads, subways, sewers, ant tunnels) carry their orientation as a
//! [`Link`] payload instead of relying on declaration order, and each terrain
//! reports its category through [`Terrain::family`] / [`Terrain::link_family`].
//!
//! The persisted integer id of a terrain is its position in
//! [`Terrain::catalog`], which lists every family as one contiguous block.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Connection shape of a linear tile (road, subway, sewer, ant tunnel).
///
/// `Unset` is the placeholder written during generation; the polishing pass
/// replaces it with one of the eleven oriented shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Link {
    Unset,
    Ns,
    Ew,
    Ne,
    Es,
    Sw,
    Wn,
    Nes,
    New,
    Nsw,
    Esw,
    Nesw,
}

impl Link {
    pub const ALL: [Link; 12] = [
        Link::Unset,
        Link::Ns,
        Link::Ew,
        Link::Ne,
        Link::Es,
        Link::Sw,
        Link::Wn,
        Link::Nes,
        Link::New,
        Link::Nsw,
        Link::Esw,
        Link::Nesw,
    ];

    /// The eleven shapes a polished tile may take.
    pub const ORIENTED: [Link; 11] = [
        Link::Ns,
        Link::Ew,
        Link::Ne,
        Link::Es,
        Link::Sw,
        Link::Wn,
        Link::Nes,
        Link::New,
        Link::Nsw,
        Link::Esw,
        Link::Nesw,
    ];

    /// Pick the shape matching which cardinal neighbours belong to the same family.
    ///
    /// Dead ends stretch into straight pieces and an isolated tile becomes a
    /// four-way, so every input maps to an oriented shape.
    pub fn from_neighbors(north: bool, east: bool, south: bool, west: bool) -> Link {
        match (north, east, south, west) {
            (true, true, true, true) => Link::Nesw,
            (true, true, true, false) => Link::Nes,
            (true, true, false, true) => Link::New,
            (true, true, false, false) => Link::Ne,
            (true, false, true, true) => Link::Nsw,
            (true, false, true, false) => Link::Ns,
            (true, false, false, true) => Link::Wn,
            (true, false, false, false) => Link::Ns,
            (false, true, true, true) => Link::Esw,
            (false, true, true, false) => Link::Es,
            (false, true, false, _) => Link::Ew,
            (false, false, true, true) => Link::Sw,
            (false, false, true, false) => Link::Ns,
            (false, false, false, true) => Link::Ew,
            (false, false, false, false) => Link::Nesw,
        }
    }

    pub fn is_oriented(self) -> bool {
        self != Link::Unset
    }

    fn suffix(self) -> &'static str {
        match self {
            Link::Unset => "?",
            Link::Ns => "ns",
            Link::Ew => "ew",
            Link::Ne => "ne",
            Link::Es => "es",
            Link::Sw => "sw",
            Link::Wn => "wn",
            Link::Nes => "nes",
            Link::New => "new",
            Link::Nsw => "nsw",
            Link::Esw => "esw",
            Link::Nesw => "nesw",
        }
    }

    fn symbol(self) -> char {
        match self {
            Link::Ns => '|',
            Link::Ew => '-',
            Link::Unset => '?',
            _ => '+',
        }
    }
}

/// Orientation of a two-lane bridge or divided highway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::NorthSouth, Axis::EastWest];
}

/// Which side of a building faces its street.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Facing from a quarter-turn count; negative and oversized values wrap.
    pub fn from_turns(turns: i32) -> Facing {
        Facing::ALL[turns.rem_euclid(4) as usize]
    }

    /// Quarter turns clockwise from north.
    pub fn turns(self) -> i32 {
        match self {
            Facing::North => 0,
            Facing::East => 1,
            Facing::South => 2,
            Facing::West => 3,
        }
    }

    /// One step in this direction on the map (y grows southward).
    pub fn delta(self) -> (i32, i32) {
        match self {
            Facing::North => (0, -1),
            Facing::East => (1, 0),
            Facing::South => (0, 1),
            Facing::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Facing {
        Facing::from_turns(self.turns() + 2)
    }

    /// Axis a road heading this way runs along.
    pub fn axis(self) -> Axis {
        match self {
            Facing::North | Facing::South => Axis::NorthSouth,
            Facing::East | Facing::West => Axis::EastWest,
        }
    }

    fn symbol(self) -> char {
        match self {
            Facing::North => '^',
            Facing::East => '>',
            Facing::South => 'v',
            Facing::West => '<',
        }
    }
}

/// River tile shapes. Edge variants name the side where the bank is; the
/// `Not*` variants are open water with one dry corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiverShape {
    Center,
    NotNe,
    NotNw,
    NotSe,
    NotSw,
    North,
    East,
    South,
    West,
    Ne,
    Se,
    Sw,
    Nw,
}

impl RiverShape {
    pub const ALL: [RiverShape; 13] = [
        RiverShape::Center,
        RiverShape::NotNe,
        RiverShape::NotNw,
        RiverShape::NotSe,
        RiverShape::NotSw,
        RiverShape::North,
        RiverShape::East,
        RiverShape::South,
        RiverShape::West,
        RiverShape::Ne,
        RiverShape::Se,
        RiverShape::Sw,
        RiverShape::Nw,
    ];
}

/// Storefronts placed along city streets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShopKind {
    GasStation,
    Pharmacy,
    Grocery,
    Hardware,
    Sports,
    Liquor,
    Gun,
    Clothes,
    Library,
    Restaurant,
    Bank,
    Bar,
    Electronics,
    Pawn,
    MilitarySurplus,
    Garage,
    Police,
}

impl ShopKind {
    pub const ALL: [ShopKind; 17] = [
        ShopKind::GasStation,
        ShopKind::Pharmacy,
        ShopKind::Grocery,
        ShopKind::Hardware,
        ShopKind::Sports,
        ShopKind::Liquor,
        ShopKind::Gun,
        ShopKind::Clothes,
        ShopKind::Library,
        ShopKind::Restaurant,
        ShopKind::Bank,
        ShopKind::Bar,
        ShopKind::Electronics,
        ShopKind::Pawn,
        ShopKind::MilitarySurplus,
        ShopKind::Garage,
        ShopKind::Police,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShopKind::GasStation => "gas station",
            ShopKind::Pharmacy => "pharmacy",
            ShopKind::Grocery => "grocery store",
            ShopKind::Hardware => "hardware store",
            ShopKind::Sports => "sporting goods store",
            ShopKind::Liquor => "liquor store",
            ShopKind::Gun => "gun store",
            ShopKind::Clothes => "clothing store",
            ShopKind::Library => "library",
            ShopKind::Restaurant => "restaurant",
            ShopKind::Bank => "bank",
            ShopKind::Bar => "bar",
            ShopKind::Electronics => "electronics store",
            ShopKind::Pawn => "pawn shop",
            ShopKind::MilitarySurplus => "mil. surplus",
            ShopKind::Garage => "garage",
            ShopKind::Police => "police station",
        }
    }
}

/// Broad category of a terrain, used by placement predicates and exporters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Border,
    Sky,
    Rock,
    Field,
    Forest,
    Road,
    River,
    Building,
    Sewer,
    Subway,
    Ants,
    Lab,
    Mine,
    Cave,
    Special,
    Rift,
}

/// Families whose tiles join up with their cardinal neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkFamily {
    Road,
    Subway,
    Sewer,
    Ants,
}

impl LinkFamily {
    /// The linear tile of this family with the given shape.
    pub fn with(self, link: Link) -> Terrain {
        match self {
            LinkFamily::Road => Terrain::Road(link),
            LinkFamily::Subway => Terrain::Subway(link),
            LinkFamily::Sewer => Terrain::Sewer(link),
            LinkFamily::Ants => Terrain::Ants(link),
        }
    }

    /// Whether `terrain` counts as a connection for this family.
    pub fn contains(self, terrain: Terrain) -> bool {
        terrain.link_family() == Some(self)
    }
}

/// One overmap tile kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terrain {
    /// Returned for coordinates outside the map; never stored.
    Border,
    OpenAir,
    Rock,
    Field,
    Crater,
    Forest,
    ForestThick,
    ForestWater,
    Hive,
    SpiderPit,
    FungalBloom,
    TriffidGrove,
    Cabin,
    ToxicDump,
    Cave,
    Road(Link),
    RoadManhole,
    Bridge(Axis),
    Highway(Axis),
    River(RiverShape),
    House(Facing),
    HouseBase(Facing),
    Shop(ShopKind, Facing),
    SubwayStation(Facing),
    Park,
    ParkingLot,
    RadioTower,
    Shelter,
    MansionEntrance,
    Mansion,
    MegastoreEntrance,
    Megastore,
    HospitalEntrance,
    Hospital,
    SewageTreatment,
    MineEntrance,
    Anthill,
    SlimepitDown,
    LabStairs,
    LabCore,
    Lab,
    LabFinale,
    Bunker,
    Outpost,
    Silo,
    SiloFinale,
    TempleStairs,
    TempleFinale,
    Basement,
    ShelterUnder,
    Sewer(Link),
    SewageTreatmentHub,
    SewageTreatmentUnder,
    Subway(Link),
    SubwayHub,
    Ants(Link),
    AntsFood,
    AntsLarvae,
    AntsQueen,
    AntsDown,
    Slimepit,
    SpiderPitUnder,
    CaveRat,
    Cavern,
    TriffidRoots,
    TriffidFinale,
    MineShaft,
    Mine,
    MineDown,
    MineFinale,
    Spiral,
    SpiralHub,
    Rift,
    Hellmouth,
}

fn build_catalog() -> Vec<Terrain> {
    use Terrain::*;

    let mut all = vec![
        Border, OpenAir, Rock, Field, Crater, Forest, ForestThick, ForestWater, Hive, SpiderPit,
        FungalBloom, TriffidGrove, Cabin, ToxicDump, Cave,
    ];
    all.extend(Link::ALL.iter().map(|&l| Road(l)));
    all.push(RoadManhole);
    all.extend(Axis::ALL.iter().map(|&a| Bridge(a)));
    all.extend(Axis::ALL.iter().map(|&a| Highway(a)));
    all.extend(RiverShape::ALL.iter().map(|&s| River(s)));
    all.extend(Facing::ALL.iter().map(|&f| House(f)));
    all.extend(Facing::ALL.iter().map(|&f| HouseBase(f)));
    for kind in ShopKind::ALL {
        all.extend(Facing::ALL.iter().map(|&f| Shop(kind, f)));
    }
    all.extend(Facing::ALL.iter().map(|&f| SubwayStation(f)));
    all.extend([
        Park, ParkingLot, RadioTower, Shelter, MansionEntrance, Mansion, MegastoreEntrance,
        Megastore, HospitalEntrance, Hospital, SewageTreatment, MineEntrance, Anthill,
        SlimepitDown, LabStairs, LabCore, Lab, LabFinale, Bunker, Outpost, Silo, SiloFinale,
        TempleStairs, TempleFinale, Basement, ShelterUnder,
    ]);
    all.extend(Link::ALL.iter().map(|&l| Sewer(l)));
    all.extend([SewageTreatmentHub, SewageTreatmentUnder]);
    all.extend(Link::ALL.iter().map(|&l| Subway(l)));
    all.push(SubwayHub);
    all.extend(Link::ALL.iter().map(|&l| Ants(l)));
    all.extend([
        AntsFood, AntsLarvae, AntsQueen, AntsDown, Slimepit, SpiderPitUnder, CaveRat, Cavern,
        TriffidRoots, TriffidFinale, MineShaft, Mine, MineDown, MineFinale, Spiral, SpiralHub,
        Rift, Hellmouth,
    ]);
    all
}

struct Catalog {
    terrains: Vec<Terrain>,
    ids: HashMap<Terrain, u16>,
}

fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let terrains = build_catalog();
        let ids = terrains
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, i as u16))
            .collect();
        Catalog { terrains, ids }
    })
}

impl Terrain {
    /// Every terrain, in persisted-id order.
    pub fn catalog() -> &'static [Terrain] {
        &catalog().terrains
    }

    /// Number of distinct terrains.
    pub fn count() -> usize {
        catalog().terrains.len()
    }

    /// Persisted integer id.
    pub fn id(self) -> u16 {
        match catalog().ids.get(&self) {
            Some(&id) => id,
            None => {
                debug_assert!(false, "terrain {:?} missing from catalogue", self);
                tracing::error!(?self, "terrain missing from catalogue, saving as border");
                0
            }
        }
    }

    pub fn from_id(id: u16) -> Option<Terrain> {
        catalog().terrains.get(id as usize).copied()
    }

    pub fn family(self) -> Family {
        use Terrain::*;
        match self {
            Border => Family::Border,
            OpenAir => Family::Sky,
            Rock => Family::Rock,
            Field | Crater | Park | ParkingLot => Family::Field,
            Forest | ForestThick | ForestWater => Family::Forest,
            Road(_) | RoadManhole | Bridge(_) | Highway(_) => Family::Road,
            River(_) => Family::River,
            House(_) | HouseBase(_) | Shop(..) | SubwayStation(_) | Cabin | Basement
            | Mansion | MansionEntrance | Megastore | MegastoreEntrance | Hospital
            | HospitalEntrance | Shelter | ShelterUnder | RadioTower | SewageTreatment => {
                Family::Building
            }
            Sewer(_) | SewageTreatmentHub | SewageTreatmentUnder => Family::Sewer,
            Subway(_) | SubwayHub => Family::Subway,
            Ants(_) | AntsFood | AntsLarvae | AntsQueen | AntsDown | Anthill => Family::Ants,
            LabStairs | LabCore | Lab | LabFinale => Family::Lab,
            MineEntrance | MineShaft | Mine | MineDown | MineFinale | Spiral | SpiralHub => {
                Family::Mine
            }
            Cave | CaveRat | Cavern => Family::Cave,
            Rift | Hellmouth => Family::Rift,
            Hive | SpiderPit | SpiderPitUnder | FungalBloom | TriffidGrove | TriffidRoots
            | TriffidFinale | ToxicDump | SlimepitDown | Slimepit | Bunker | Outpost | Silo
            | SiloFinale | TempleStairs | TempleFinale => Family::Special,
        }
    }

    /// The connectivity family this tile joins, if any.
    pub fn link_family(self) -> Option<LinkFamily> {
        use Terrain::*;
        match self {
            Road(_) | RoadManhole | Bridge(_) | Highway(_) => Some(LinkFamily::Road),
            Subway(_) | SubwayHub => Some(LinkFamily::Subway),
            Sewer(_) | SewageTreatmentHub | SewageTreatmentUnder => Some(LinkFamily::Sewer),
            Ants(_) | AntsFood | AntsLarvae | AntsQueen | AntsDown => Some(LinkFamily::Ants),
            _ => None,
        }
    }

    /// The shape payload of a linear tile.
    pub fn link(self) -> Option<Link> {
        match self {
            Terrain::Road(l) | Terrain::Subway(l) | Terrain::Sewer(l) | Terrain::Ants(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_river(self) -> bool {
        matches!(self, Terrain::River(_))
    }

    /// Surface road network membership (roads, manholes, bridges, highways).
    pub fn is_road(self) -> bool {
        self.link_family() == Some(LinkFamily::Road)
    }

    pub fn is_forest(self) -> bool {
        matches!(self, Terrain::Forest | Terrain::ForestThick | Terrain::ForestWater)
    }

    /// Same building turned to face another street.
    pub fn rotated(self, facing: Facing) -> Terrain {
        match self {
            Terrain::House(_) => Terrain::House(facing),
            Terrain::HouseBase(_) => Terrain::HouseBase(facing),
            Terrain::Shop(kind, _) => Terrain::Shop(kind, facing),
            Terrain::SubwayStation(_) => Terrain::SubwayStation(facing),
            other => other,
        }
    }

    /// Whether [`Terrain::rotated`] can change this terrain.
    pub fn is_rotatable(self) -> bool {
        matches!(
            self,
            Terrain::House(_) | Terrain::HouseBase(_) | Terrain::Shop(..) | Terrain::SubwayStation(_)
        )
    }

    /// Body of a multi-tile building whose entrance is `self`.
    pub fn secondary(self) -> Option<Terrain> {
        match self {
            Terrain::MansionEntrance => Some(Terrain::Mansion),
            Terrain::MegastoreEntrance => Some(Terrain::Megastore),
            Terrain::HospitalEntrance => Some(Terrain::Hospital),
            _ => None,
        }
    }

    pub fn name(self) -> String {
        use Terrain::*;
        let base = match self {
            Border => "nothing",
            OpenAir => "open air",
            Rock => "solid rock",
            Field => "field",
            Crater => "crater",
            Forest => "forest",
            ForestThick => "forest",
            ForestWater => "swamp",
            Hive => "bee hive",
            SpiderPit => "forest",
            FungalBloom => "fungal bloom",
            TriffidGrove => "triffid grove",
            Cabin => "cabin",
            ToxicDump => "toxic waste dump",
            Cave => "cave",
            Road(l) => return format!("road {}", l.suffix()),
            RoadManhole => "road, manhole",
            Bridge(_) => "bridge",
            Highway(_) => "highway",
            River(_) => "river",
            House(_) => "house",
            HouseBase(_) => "house",
            Shop(kind, _) => kind.name(),
            SubwayStation(_) => "subway station",
            Park => "park",
            ParkingLot => "parking lot",
            RadioTower => "radio tower",
            Shelter => "evac shelter",
            MansionEntrance | Mansion => "mansion",
            MegastoreEntrance | Megastore => "megastore",
            HospitalEntrance | Hospital => "hospital",
            SewageTreatment => "sewage treatment plant",
            MineEntrance => "mine entrance",
            Anthill => "anthill",
            SlimepitDown => "slime pit",
            LabStairs | LabCore | Lab | LabFinale => "science lab",
            Bunker => "military bunker",
            Outpost => "military outpost",
            Silo | SiloFinale => "missile silo",
            TempleStairs | TempleFinale => "strange temple",
            Basement => "basement",
            ShelterUnder => "evac shelter",
            Sewer(l) => return format!("sewer {}", l.suffix()),
            SewageTreatmentHub | SewageTreatmentUnder => "sewage treatment plant",
            Subway(l) => return format!("subway {}", l.suffix()),
            SubwayHub => "subway station",
            Ants(l) => return format!("ant tunnel {}", l.suffix()),
            AntsFood => "ant food storage",
            AntsLarvae => "ant larva chamber",
            AntsQueen => "ant queen chamber",
            AntsDown => "ant tunnel down",
            Slimepit => "slime pit",
            SpiderPitUnder => "cave",
            CaveRat => "rat cave",
            Cavern => "cavern",
            TriffidRoots => "triffid roots",
            TriffidFinale => "triffid heart",
            MineShaft => "mine shaft",
            Mine | MineDown => "mine",
            MineFinale => "mine",
            Spiral | SpiralHub => "spiral cavern",
            Rift => "rift",
            Hellmouth => "hellmouth",
        };
        base.to_string()
    }

    /// Single-character map symbol.
    pub fn symbol(self) -> char {
        use Terrain::*;
        match self {
            Border | OpenAir => ' ',
            Rock => '%',
            Field => '.',
            Crater => 'O',
            Forest | ForestThick | ForestWater | SpiderPit => 'F',
            Hive => '8',
            FungalBloom => 'T',
            TriffidGrove | TriffidRoots | TriffidFinale => 'T',
            Cabin => 'C',
            ToxicDump => 'D',
            Cave | CaveRat | Cavern | SpiderPitUnder => 'C',
            Road(l) | Sewer(l) | Subway(l) | Ants(l) => l.symbol(),
            RoadManhole => '+',
            Bridge(Axis::NorthSouth) | Highway(Axis::NorthSouth) => 'H',
            Bridge(Axis::EastWest) | Highway(Axis::EastWest) => '=',
            River(_) => '~',
            House(f) | HouseBase(f) | Shop(_, f) | SubwayStation(f) => f.symbol(),
            Park => 'P',
            ParkingLot => 'O',
            RadioTower => 'X',
            Shelter | ShelterUnder => '+',
            MansionEntrance | Mansion => 'M',
            MegastoreEntrance | Megastore => 'M',
            HospitalEntrance | Hospital => 'H',
            SewageTreatment | SewageTreatmentHub | SewageTreatmentUnder => 'P',
            MineEntrance | MineShaft | Mine | MineDown | MineFinale => 'M',
            Anthill | AntsFood | AntsLarvae | AntsQueen | AntsDown => 'A',
            SlimepitDown | Slimepit => '0',
            LabStairs | LabCore | Lab | LabFinale => 'L',
            Bunker => 'B',
            Outpost => 'M',
            Silo | SiloFinale => '0',
            TempleStairs | TempleFinale => 'T',
            Basement => 'O',
            SubwayHub => 'S',
            Spiral | SpiralHub => '@',
            Rift => '^',
            Hellmouth => '^',
        }
    }

    /// Export colour.
    pub fn rgb(self) -> [u8; 3] {
        match self.family() {
            Family::Border | Family::Sky => [0, 0, 0],
            Family::Rock => [60, 60, 60],
            Family::Field => [150, 130, 70],
            Family::Forest if self == Terrain::ForestWater => [40, 90, 80],
            Family::Forest if self == Terrain::ForestThick => [20, 90, 20],
            Family::Forest => [40, 130, 40],
            Family::Road => [170, 170, 170],
            Family::River => [40, 80, 200],
            Family::Building => [200, 120, 60],
            Family::Sewer => [110, 90, 40],
            Family::Subway => [150, 150, 190],
            Family::Ants => [140, 60, 30],
            Family::Lab => [230, 230, 250],
            Family::Mine => [120, 100, 80],
            Family::Cave => [90, 70, 60],
            Family::Special => [200, 60, 160],
            Family::Rift => [220, 30, 30],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_ids_round_trip() {
        let all = Terrain::catalog();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
        for &t in all {
            assert_eq!(Terrain::from_id(t.id()), Some(t));
        }
        assert_eq!(Terrain::from_id(Terrain::count() as u16), None);
    }

    #[test]
    fn test_families_are_contiguous_id_ranges() {
        let all = Terrain::catalog();
        for family in [LinkFamily::Road, LinkFamily::Sewer, LinkFamily::Subway, LinkFamily::Ants] {
            let ids: Vec<u16> = all
                .iter()
                .filter(|t| t.link_family() == Some(family))
                .map(|t| t.id())
                .collect();
            let (min, max) = (ids[0], ids[ids.len() - 1]);
            assert_eq!((max - min) as usize + 1, ids.len(), "{:?} not contiguous", family);
        }
    }

    #[test]
    fn test_link_selection_matches_neighbors() {
        assert_eq!(Link::from_neighbors(true, true, true, true), Link::Nesw);
        assert_eq!(Link::from_neighbors(true, true, true, false), Link::Nes);
        assert_eq!(Link::from_neighbors(false, true, false, true), Link::Ew);
        assert_eq!(Link::from_neighbors(true, false, false, true), Link::Wn);
        assert_eq!(Link::from_neighbors(false, false, false, false), Link::Nesw);
        for n in [false, true] {
            for e in [false, true] {
                for s in [false, true] {
                    for w in [false, true] {
                        assert!(Link::from_neighbors(n, e, s, w).is_oriented());
                    }
                }
            }
        }
    }

    #[test]
    fn test_border_is_outside_every_family() {
        assert_eq!(Terrain::Border.link_family(), None);
        assert!(!Terrain::Border.is_river());
        assert!(!Terrain::Border.is_road());
        assert_eq!(Terrain::Border.family(), Family::Border);
    }

    #[test]
    fn test_rotation_only_touches_buildings() {
        let shop = Terrain::Shop(ShopKind::Bank, Facing::North);
        assert_eq!(shop.rotated(Facing::West), Terrain::Shop(ShopKind::Bank, Facing::West));
        assert_eq!(Terrain::Lab.rotated(Facing::East), Terrain::Lab);
        assert_eq!(Facing::from_turns(-1), Facing::West);
        assert_eq!(Facing::from_turns(5), Facing::East);
    }

    #[test]
    fn test_facing_steps_and_turns() {
        for facing in Facing::ALL {
            let (dx, dy) = facing.delta();
            let (ox, oy) = facing.opposite().delta();
            assert_eq!((dx + ox, dy + oy), (0, 0));
            assert_eq!(Facing::from_turns(facing.turns() + 4), facing);
        }
        assert_eq!(Facing::from_turns(-1), Facing::West);
        assert_eq!(Facing::East.axis(), Axis::EastWest);
    }
}
