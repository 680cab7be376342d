//! Whole-turn scenarios driven through `SimulationWorld`.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use simulation::geography::{Geography, Terrain};
use simulation::occupation::{self, Occupation};
use simulation::resource_map::Point;
use simulation::resources::{ProductionKind, Resource, ResourceBag};
use simulation::systems::movement::{move_person, step_allowance};
use simulation::{SimulationConfig, SimulationError, SimulationWorld};

fn uniform_map(terrain: Terrain) -> Geography {
    Geography::from_terrain(vec![vec![terrain; 20]; 20])
}

fn empty_world(terrain: Terrain) -> SimulationWorld {
    SimulationWorld::with_geography(SimulationConfig::default(), uniform_map(terrain)).unwrap()
}

#[test]
fn test_lone_gatherer_harvests_everything_it_produces() {
    let mut sim = empty_world(Terrain::Forest);
    let id = sim.spawn_person(Point::new(10, 10), Occupation::Gatherer, 25);

    let summary = sim.advance_turn().unwrap();
    assert_eq!(summary.turn, 0);
    assert_eq!(summary.deaths, 0);
    assert_eq!(sim.turn(), 1);

    let person = sim.person(id).unwrap();
    let at_home = sim.production_map().resource_type_at(person.position, Resource::Food);
    let expected_yield = ProductionKind::Gathering.yield_for(0.2, Terrain::Forest, None);
    assert!((at_home - expected_yield).abs() < 1e-9);
    let drafted = sim.draft_map().resource_type_at(person.position, id);
    assert!(drafted > 0.0);

    let produced = sim.production_map().total(Resource::Food);
    assert!(produced > 0.0);
    assert!((person.income[Resource::Food] - produced).abs() < 1e-9);

    // Every worked tile is drafted by the only person on the map.
    for (_, claims) in sim.draft_map().tiles() {
        assert_eq!(claims.keys().collect::<Vec<_>>(), vec![&id]);
    }

    let need = occupation::consumption(person.occupation, 25)[Resource::Food];
    assert!(person.income[Resource::Food] > need);
    let expected = (person.income[Resource::Food] - need) * 0.9;
    assert!((person.store[Resource::Food] - expected).abs() < 1e-9);
    assert_eq!(person.age, 26);
}

#[test]
fn test_hunger_widens_the_search() {
    // A strip of water along the western edge makes column 1 coastal.
    let mut terrain = vec![vec![Terrain::Grassland; 20]; 20];
    terrain[0] = vec![Terrain::Water; 20];
    let geography = Geography::from_terrain(terrain);
    let start = Point::new(1, 10);
    assert!(geography.is_coast(start));

    let buildings = BTreeMap::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut hungry = ResourceBag::new();
    hungry.set(Resource::Food, 0.3);
    let fed = ResourceBag::new();

    let mut wanderer = start;
    let steps = step_allowance(Occupation::Gatherer, &hungry);
    assert_eq!(steps, 4);
    let taken = move_person(&mut wanderer, Occupation::Gatherer, steps, &geography, &buildings, 100, &mut rng);
    assert_eq!(taken, 4);
    assert!(geography.is_land(wanderer));

    let mut settler = start;
    let steps = step_allowance(Occupation::Gatherer, &fed);
    assert_eq!(steps, 1);
    let taken = move_person(&mut settler, Occupation::Gatherer, steps, &geography, &buildings, 100, &mut rng);
    assert_eq!(taken, 1);
    assert_eq!(settler.manhattan(start), 1);
    assert!(settler.x >= 1);
}

#[test]
fn test_total_food_deficit_is_fatal() {
    let mut sim = empty_world(Terrain::Grassland);
    let id = sim.spawn_person(Point::new(5, 5), Occupation::Gatherer, 25);
    sim.holdings_mut(id).unwrap().deficit.set(Resource::Food, 0.5);

    let summary = sim.advance_turn().unwrap();
    assert_eq!(summary.deaths, 1);
    let person = sim.person(id).unwrap();
    assert_eq!(person.occupation, Occupation::Deceased);
    assert_eq!(person.log, "They died of hunger.");
    assert_eq!(sim.population(), 0);
    assert_eq!(sim.genealogy().get(id).unwrap().death_turn, Some(0));

    let summary = sim.advance_turn().unwrap();
    assert_eq!(summary.removed, 1);
    assert!(sim.people().is_empty());
}

#[test]
fn test_starving_child_dies_the_following_turn() {
    // Nothing grows on mountains, so the child lacks all of their food.
    for seed in 0..50 {
        let config = SimulationConfig {
            seed,
            ..SimulationConfig::default()
        };
        let mut sim = SimulationWorld::with_geography(config, uniform_map(Terrain::Mountain)).unwrap();
        let id = sim.spawn_person(Point::new(10, 10), Occupation::Gatherer, 4);

        sim.advance_turn().unwrap();
        let child = sim.person(id).unwrap();
        assert_eq!(child.occupation, Occupation::Gatherer);
        let need = occupation::consumption(Occupation::Gatherer, 4)[Resource::Food];
        assert!((child.deficit[Resource::Food] - need).abs() < 1e-12);
        assert_eq!(child.age, 5);

        let summary = sim.advance_turn().unwrap();
        assert_eq!(summary.deaths, 1, "seed {seed}");
        assert_eq!(sim.person(id).unwrap().log, "They died of hunger.");
    }
}

#[test]
fn test_non_finite_store_aborts_the_turn() {
    let mut sim = empty_world(Terrain::Grassland);
    let id = sim.spawn_person(Point::new(5, 5), Occupation::Gatherer, 25);
    sim.holdings_mut(id).unwrap().store.set(Resource::Food, f64::NAN);

    let result = sim.advance_turn();
    assert!(matches!(
        result,
        Err(SimulationError::NonFiniteResource { resource: Resource::Food, .. })
    ));
    assert_eq!(sim.turn(), 0);
}

#[test]
fn test_harvest_never_exceeds_production() {
    let mut sim = SimulationWorld::new(SimulationConfig {
        initial_population: 30,
        ..SimulationConfig::default()
    })
    .unwrap();
    for _ in 0..5 {
        sim.advance_turn().unwrap();
        let people = sim.people();
        for resource in Resource::ALL {
            let earned: f64 = people.values().map(|p| p.income[resource]).sum();
            // Craftwork adds at most one tool per person outside the tiles.
            let slack = if resource == Resource::Tool {
                people.len() as f64
            } else {
                0.0
            };
            assert!(earned <= sim.production_map().total(resource) + slack + 1e-6);
        }
    }
}

#[test]
fn test_gold_is_never_overspent() {
    let mut sim = SimulationWorld::new(SimulationConfig {
        initial_population: 25,
        seed: 99,
        ..SimulationConfig::default()
    })
    .unwrap();
    for _ in 0..30 {
        let summary = sim.advance_turn().unwrap();
        for person in sim.people().values() {
            assert!(person.store[Resource::Gold] >= -1e-9, "{} overspent", person.name);
        }
        if summary.population == 0 {
            break;
        }
    }
}

#[test]
fn test_same_seed_same_world() {
    let config = SimulationConfig {
        seed: 1234,
        ..SimulationConfig::default()
    };
    let a = SimulationWorld::new(config.clone()).unwrap();
    let b = SimulationWorld::new(config.clone()).unwrap();
    assert_eq!(a.geography().codes(), b.geography().codes());

    let positions = |sim: &SimulationWorld| {
        sim.people()
            .values()
            .map(|p| (p.position, p.age))
            .collect::<Vec<_>>()
    };
    assert_eq!(positions(&a), positions(&b));
    assert_eq!(a.population(), config.initial_population);

    let mut c = SimulationWorld::new(SimulationConfig::default()).unwrap();
    c.regenerate_with_seed(1234).unwrap();
    assert_eq!(c.geography().codes(), a.geography().codes());
    assert_eq!(positions(&c), positions(&a));
    assert_eq!(c.turn(), 0);
}

#[test]
fn test_runs_stay_in_lockstep() {
    let config = SimulationConfig {
        seed: 77,
        initial_population: 12,
        ..SimulationConfig::default()
    };
    let mut a = SimulationWorld::new(config.clone()).unwrap();
    let mut b = SimulationWorld::new(config).unwrap();
    for _ in 0..10 {
        assert_eq!(a.advance_turn().unwrap(), b.advance_turn().unwrap());
    }
    assert_eq!(a.buildings().len(), b.buildings().len());
    assert_eq!(
        serde_json::to_string(a.statistics()).unwrap(),
        serde_json::to_string(b.statistics()).unwrap()
    );
}

#[test]
fn test_founders_stand_on_land() {
    let sim = SimulationWorld::new(SimulationConfig::default()).unwrap();
    for (point, people) in sim.people_by_location() {
        assert!(sim.geography().is_land(point));
        for person in people {
            assert_eq!(person.occupation, Occupation::Gatherer);
            assert!((16..=30).contains(&person.age));
        }
    }
    assert!(sim.geography().land_tiles().len() >= sim.config().min_land_tiles());
}
