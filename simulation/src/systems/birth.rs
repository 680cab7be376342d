//! Birth System
//!
//! Handles reproduction for every living agent.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    Age, EventLog, FamilySupport, Holdings, MarketPack, Person, PersonId,
};
use crate::genealogy::Genealogy;
use crate::names;
use crate::occupation::{self, Occupation};
use crate::resource_map::Point;
use crate::resources::{Resource, ResourceBag};

/// Paid by the parent for every child.
const BIRTH_COST: &[(Resource, f64)] = &[(Resource::Food, 0.5)];

/// Charges the birth cost. What the parent keeps of each charged resource
/// is halved and the other half goes to the child. Returns the child's
/// starting store and whether the charge killed the parent.
pub fn charge_birth(store: &mut ResourceBag) -> (ResourceBag, bool) {
    let mut child = ResourceBag::new();
    let mut fatal = false;
    for &(resource, cost) in BIRTH_COST {
        store.add(resource, -cost);
        if store[resource] < 0.0 {
            fatal = true;
        } else {
            store[resource] /= 2.0;
            child.set(resource, store[resource]);
        }
    }
    (child, fatal)
}

struct Parent {
    entity: Entity,
    id: PersonId,
    surname: String,
    position: Point,
    occupation: Occupation,
}

/// Process births for all living agents.
/// Returns the number of births and the number of parents lost to them.
pub fn birth_system<R: Rng + ?Sized>(
    world: &mut World,
    genealogy: &mut Genealogy,
    turn: i64,
    next_person_id: &mut u64,
    rng: &mut R,
) -> (u32, u32) {
    let mut parents: Vec<Parent> = Vec::new();
    for (entity, (person, position, occupation, age, holdings)) in world
        .query::<(&Person, &Point, &Occupation, &Age, &Holdings)>()
        .iter()
    {
        let children = genealogy.child_count(person.id);
        if occupation::decide_reproduction(*occupation, age.years, children, &holdings.store, rng) {
            parents.push(Parent {
                entity,
                id: person.id,
                surname: person.last_name.clone(),
                position: *position,
                occupation: *occupation,
            });
        }
    }

    let births = parents.len() as u32;
    let mut parent_deaths = 0;
    for parent in parents {
        let child_id = PersonId(*next_person_id);
        *next_person_id += 1;
        let first_name = names::random_first_name(rng).to_string();

        let mut child_store = ResourceBag::new();
        if let Ok((holdings, occupation, log)) =
            world.query_one_mut::<(&mut Holdings, &mut Occupation, &mut EventLog)>(parent.entity)
        {
            let (store, fatal) = charge_birth(&mut holdings.store);
            child_store = store;
            if fatal {
                *occupation = Occupation::Deceased;
                log.replace("They died in childbirth.");
                genealogy.record_death(parent.id, turn);
                parent_deaths += 1;
            } else {
                log.push(format!("They had a child, {}.", first_name));
            }
        }

        let child = Person {
            id: child_id,
            first_name,
            last_name: parent.surname,
        };
        genealogy.record_birth(child_id, child.full_name(), parent.id, turn);
        world.spawn((
            child,
            parent.position,
            parent.occupation.birth_occupation(),
            Age::new(0),
            Holdings {
                store: child_store,
                ..Holdings::default()
            },
            MarketPack::default(),
            FamilySupport::default(),
            EventLog("They were born.".to_string()),
        ));
    }

    (births, parent_deaths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_birth_cost_splits_remaining_food() {
        let mut store = ResourceBag::from_pairs(&[(Resource::Food, 4.5)]);
        let (child, fatal) = charge_birth(&mut store);
        assert!(!fatal);
        assert!((store[Resource::Food] - 2.0).abs() < 1e-12);
        assert!((child[Resource::Food] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_birth_cost_can_kill() {
        let mut store = ResourceBag::from_pairs(&[(Resource::Food, 0.2)]);
        let (child, fatal) = charge_birth(&mut store);
        assert!(fatal);
        assert!(child.is_empty());
    }

    #[test]
    fn test_well_fed_parents_have_children() {
        let mut world = World::new();
        let mut genealogy = Genealogy::new();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut next_id = 100;
        for id in 1..=20 {
            genealogy.register_founder(PersonId(id), "Ruth Hill".into(), 25, 0);
            world.spawn((
                Person {
                    id: PersonId(id),
                    first_name: "Ruth".into(),
                    last_name: "Hill".into(),
                },
                Point::new(2, 2),
                Occupation::Whaler,
                Age::new(25),
                Holdings {
                    store: ResourceBag::from_pairs(&[(Resource::Food, 50.0)]),
                    ..Holdings::default()
                },
                MarketPack::default(),
                FamilySupport::default(),
                EventLog::default(),
            ));
        }
        let (births, deaths) = birth_system(&mut world, &mut genealogy, 0, &mut next_id, &mut rng);
        assert!(births > 0);
        assert_eq!(deaths, 0);
        assert_eq!(world.len(), 20 + births);
        assert_eq!(next_id, 100 + u64::from(births));

        let newborn = genealogy.get(PersonId(100)).unwrap();
        assert!(newborn.name.ends_with(" Hill"));
        assert_eq!(newborn.birth_turn, 0);
        let mother = newborn.mother.unwrap();
        assert_eq!(genealogy.child_count(mother), 1);

        // Whalers raise fishers.
        let fishers = world
            .query::<(&Occupation, &Age)>()
            .iter()
            .filter(|(_, (o, a))| **o == Occupation::Fisher && a.years == 0)
            .count();
        assert_eq!(fishers as u32, births);
    }
}
