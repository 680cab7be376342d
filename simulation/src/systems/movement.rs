//! Movement System
//!
//! People short of anything wander up to their travel allowance; everyone
//! else drifts up to their home allowance.

use std::collections::BTreeMap;

use hecs::World;
use rand::Rng;

use crate::buildings::{Building, BuildingType};
use crate::components::Holdings;
use crate::geography::Geography;
use crate::occupation::Occupation;
use crate::resource_map::Point;
use crate::resources::ResourceBag;

/// Steps a person may take this turn.
pub fn step_allowance(occupation: Occupation, deficit: &ResourceBag) -> u32 {
    let profile = occupation.profile();
    if deficit.entries().any(|(_, v)| v > 0.0) {
        profile.travel
    } else {
        profile.home
    }
}

fn may_enter(occupation: Occupation, building: Option<BuildingType>) -> bool {
    // Gatherers trample crops.
    !(occupation == Occupation::Gatherer && building == Some(BuildingType::Farm))
}

/// Takes up to `steps` steps, each trying at most `retries` random
/// neighbours. Returns the number of steps actually taken.
pub fn move_person<R: Rng + ?Sized>(
    position: &mut Point,
    occupation: Occupation,
    steps: u32,
    geography: &Geography,
    buildings: &BTreeMap<Point, Building>,
    retries: u32,
    rng: &mut R,
) -> u32 {
    let mut taken = 0;
    for _ in 0..steps {
        for _ in 0..retries {
            let candidate = position.neighbours()[rng.gen_range(0..4)];
            if !geography.is_land(candidate) {
                continue;
            }
            if !may_enter(occupation, buildings.get(&candidate).map(|b| b.kind)) {
                continue;
            }
            *position = candidate;
            taken += 1;
            break;
        }
    }
    taken
}

pub fn movement_system<R: Rng + ?Sized>(
    world: &mut World,
    geography: &Geography,
    buildings: &BTreeMap<Point, Building>,
    retries: u32,
    rng: &mut R,
) {
    for (_, (position, occupation, holdings)) in
        world.query_mut::<(&mut Point, &Occupation, &Holdings)>()
    {
        if !occupation.is_alive() {
            continue;
        }
        let steps = step_allowance(*occupation, &holdings.deficit);
        move_person(position, *occupation, steps, geography, buildings, retries, rng);
    }
}
