//! Final passes over finished terrain: monster populations and radio towers.

use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::dice::Dice;
use crate::monsters::{MonsterCategory, MonsterGroup};
use crate::overmap::{Overmap, RadioKind, RadioTower, OMAPX, OMAPY};
use crate::terrain::Terrain;

use super::GenerationContext;

const BROADCASTS: [&str; 2] = [
    "This is the emergency broadcast system. Please proceed quickly and calmly to your designated evacuation point.",
    "Head West. All survivors, head West. Help is waiting.",
];

/// Spawn the surface populations: zombies scaled to each city, swamp
/// dwellers wherever the land is wet enough, a few roaming worm colonies
/// and diffuse forest wildlife covering the whole region.
pub fn place_mongroups(om: &mut Overmap, ctx: &GenerationContext, rng: &mut ChaCha8Rng) {
    for city in om.cities.clone() {
        // the odd small town escapes
        if rng.one_in(16) && city.size <= 5 {
            continue;
        }
        let zombies = MonsterGroup::new(
            MonsterCategory::Zombie,
            city.x,
            city.y,
            0,
            city.size * 5 / 4,
            city.size * 80,
        );
        ctx.spawn(om, zombies);
    }

    for x in (3..OMAPX - 3).step_by(7) {
        for y in (3..OMAPY - 3).step_by(7) {
            let wetness = swamp_count(om, x, y);
            if wetness >= 25 {
                let population = rng.roll(wetness * 8, wetness * 25);
                ctx.spawn(om, MonsterGroup::new(MonsterCategory::Swamp, x, y, 0, 2, population));
            }
        }
    }

    for _ in 0..rng.roll(0, 3) {
        let worms = MonsterGroup::new(
            MonsterCategory::Worm,
            rng.roll(0, OMAPX - 1),
            rng.roll(0, OMAPY - 1),
            0,
            rng.roll(10, 20),
            rng.roll(500, 1000),
        );
        ctx.spawn(om, worms);
    }

    let forest_centers = [(0, OMAPY / 2), (0, OMAPY - 1), (OMAPX / 2, 0), (OMAPX - 1, 0)];
    for (x, y) in forest_centers {
        let radius = if x == 0 { OMAPY / 2 } else { OMAPX / 2 };
        let wildlife = MonsterGroup::new(MonsterCategory::Forest, x, y, 0, radius, rng.roll(2000, 12000));
        ctx.spawn(om, wildlife.diffuse());
    }

    debug!(groups = om.monster_groups.len(), "placed monster groups");
}

/// Two points per swamp tile and one per river tile in the 7x7 window.
fn swamp_count(om: &Overmap, x: i32, y: i32) -> i32 {
    let mut count = 0;
    for sx in x - 3..=x + 3 {
        for sy in y - 3..=y + 3 {
            match om.ter(sx, sy, 0) {
                Terrain::ForestWater => count += 2,
                t if t.is_river() => count += 1,
                _ => {}
            }
        }
    }
    count
}

/// Put a transmitter on every radio tower and emergency shelter.
pub fn place_radios(om: &mut Overmap, rng: &mut ChaCha8Rng) {
    for x in 0..OMAPX {
        for y in 0..OMAPY {
            let radio = match om.ter(x, y, 0) {
                Terrain::RadioTower if rng.one_in(3) => RadioTower {
                    x,
                    y,
                    strength: rng.roll(80, 200),
                    kind: RadioKind::Weather,
                    message: String::new(),
                },
                Terrain::RadioTower => {
                    let message = BROADCASTS[rng.roll(0, 1) as usize].to_string();
                    RadioTower {
                        x,
                        y,
                        strength: rng.roll(80, 200),
                        kind: RadioKind::Broadcast,
                        message,
                    }
                }
                Terrain::Shelter => RadioTower {
                    x,
                    y,
                    strength: rng.roll(80, 200) / 2,
                    kind: RadioKind::Broadcast,
                    message: format!(
                        "This is emergency broadcast station {}{}. Please proceed quickly and calmly to your designated evacuation point.",
                        x, y
                    ),
                },
                _ => continue,
            };
            om.radios.push(radio);
        }
    }
    debug!(radios = om.radios.len(), "placed radios");
}

#[cfg(test)]
mod tests {
    use super::super::test_support::Fixture;
    use super::*;
    use crate::overmap::City;
    use crate::terrain::RiverShape;
    use rand::SeedableRng;

    #[test]
    fn test_big_cities_always_get_zombies() {
        let fixture = Fixture::new();
        let mut om = Overmap::new(0, 0);
        om.cities.push(City::new(50, 50, 12));
        om.cities.push(City::new(120, 120, 8));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        place_mongroups(&mut om, &fixture.ctx(), &mut rng);
        let zombies: Vec<_> = om
            .monster_groups
            .iter()
            .filter(|g| g.category == MonsterCategory::Zombie)
            .collect();
        assert_eq!(zombies.len(), 2);
        assert_eq!(zombies[0].radius, 15);
        assert_eq!(zombies[0].population, 960);
    }

    #[test]
    fn test_forest_wildlife_is_diffuse() {
        let fixture = Fixture::new();
        let mut om = Overmap::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        place_mongroups(&mut om, &fixture.ctx(), &mut rng);
        let forest: Vec<_> = om
            .monster_groups
            .iter()
            .filter(|g| g.category == MonsterCategory::Forest)
            .collect();
        assert_eq!(forest.len(), 4);
        assert!(forest.iter().all(|g| g.diffuse && g.radius == 90));
        assert!(!om.monsters_at(90, 90, 0).is_empty());
    }

    #[test]
    fn test_swamps_attract_swamp_dwellers() {
        let fixture = Fixture::new();
        let mut om = Overmap::new(0, 0);
        for x in 0..20 {
            for y in 0..20 {
                om.set_ter(x, y, 0, Terrain::ForestWater);
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        place_mongroups(&mut om, &fixture.ctx(), &mut rng);
        assert!(om
            .monster_groups
            .iter()
            .any(|g| g.category == MonsterCategory::Swamp && g.x < 20 && g.y < 20));
        assert!(om
            .monster_groups
            .iter()
            .filter(|g| g.category == MonsterCategory::Swamp)
            .all(|g| g.x < 24 && g.y < 24));
    }

    #[test]
    fn test_river_alone_is_not_a_swamp() {
        assert_eq!(swamp_count(&Overmap::new(0, 0), 10, 10), 0);
        let mut om = Overmap::new(0, 0);
        for y in 0..OMAPY {
            om.set_ter(10, y, 0, Terrain::River(RiverShape::Center));
        }
        assert_eq!(swamp_count(&om, 10, 10), 7);
    }

    #[test]
    fn test_disabled_category_is_not_spawned() {
        let mut fixture = Fixture::new();
        fixture.monsters =
            crate::monsters::MonsterRegistry::from_json(r#"[{"category": "forest", "name": "forest", "enabled": false}]"#)
                .unwrap();
        let mut om = Overmap::new(0, 0);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        place_mongroups(&mut om, &fixture.ctx(), &mut rng);
        assert!(om.monster_groups.iter().all(|g| g.category != MonsterCategory::Forest));
    }

    #[test]
    fn test_radios_on_towers_and_shelters() {
        let mut om = Overmap::new(0, 0);
        om.set_ter(10, 20, 0, Terrain::RadioTower);
        om.set_ter(30, 40, 0, Terrain::Shelter);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        place_radios(&mut om, &mut rng);
        assert_eq!(om.radios.len(), 2);

        let tower = &om.radios[0];
        assert_eq!((tower.x, tower.y), (10, 20));
        assert!((80..=200).contains(&tower.strength));
        match tower.kind {
            RadioKind::Weather => assert!(tower.message.is_empty()),
            RadioKind::Broadcast => assert!(BROADCASTS.contains(&tower.message.as_str())),
        }

        let shelter = &om.radios[1];
        assert_eq!(shelter.kind, RadioKind::Broadcast);
        assert!(shelter.message.contains("station 3040"));
        assert!((40..=100).contains(&shelter.strength));
    }
}
