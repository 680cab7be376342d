//! Death System
//!
//! Settles the estates of people who died last turn and removes them.
//! Heirs are living children on the same tile, or failing that everyone
//! living on the tile. Shares are computed for every estate before any is
//! paid out.

use std::collections::BTreeMap;

use hecs::{Entity, World};

use crate::components::{EventLog, Holdings, Person, PersonId};
use crate::genealogy::Genealogy;
use crate::occupation::Occupation;
use crate::resource_map::Point;
use crate::resources::ResourceBag;

struct Estate {
    entity: Entity,
    id: PersonId,
    position: Point,
    store: ResourceBag,
}

/// Distributes estates and despawns the deceased. Returns how many were
/// removed.
pub fn cleanup_deceased(world: &mut World, genealogy: &Genealogy) -> usize {
    let mut estates: Vec<Estate> = Vec::new();
    let mut living: BTreeMap<Point, Vec<(PersonId, Entity)>> = BTreeMap::new();
    for (entity, (person, position, occupation, holdings)) in world
        .query::<(&Person, &Point, &Occupation, &Holdings)>()
        .iter()
    {
        if occupation.is_alive() {
            living.entry(*position).or_default().push((person.id, entity));
        } else {
            estates.push(Estate {
                entity,
                id: person.id,
                position: *position,
                store: holdings.store,
            });
        }
    }
    if estates.is_empty() {
        return 0;
    }

    let mut shares: Vec<(Entity, ResourceBag)> = Vec::new();
    for estate in &estates {
        let Some(neighbours) = living.get(&estate.position) else {
            continue;
        };
        let children: Vec<PersonId> = genealogy.children(estate.id).iter().map(|r| r.id).collect();
        let mut heirs: Vec<Entity> = neighbours
            .iter()
            .filter(|(id, _)| children.contains(id))
            .map(|(_, entity)| *entity)
            .collect();
        if heirs.is_empty() {
            heirs = neighbours.iter().map(|(_, entity)| *entity).collect();
        }
        let mut share = estate.store;
        share.scale(1.0 / heirs.len() as f64);
        shares.extend(heirs.into_iter().map(|heir| (heir, share)));
    }

    for (heir, share) in shares {
        if let Ok((holdings, log)) = world.query_one_mut::<(&mut Holdings, &mut EventLog)>(heir) {
            holdings.store.add_bag(&share);
            log.push("They received an inheritance.");
        }
    }
    let mut removed = 0;
    for estate in &estates {
        if world.despawn(estate.entity).is_err() {
            continue;
        }
        removed += 1;
    }
    removed
}

/// Living people, for callers that only need a head count.
pub fn living_count(world: &World) -> usize {
    world
        .query::<&Occupation>()
        .iter()
        .filter(|(_, occupation)| occupation.is_alive())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Age, FamilySupport, MarketPack};
    use crate::resources::Resource;

    fn spawn(world: &mut World, id: u64, position: Point, occupation: Occupation, food: f64) -> Entity {
        world.spawn((
            Person {
                id: PersonId(id),
                first_name: "Ruth".into(),
                last_name: "Hill".into(),
            },
            position,
            occupation,
            Age::new(40),
            Holdings {
                store: ResourceBag::from_pairs(&[(Resource::Food, food)]),
                ..Holdings::default()
            },
            MarketPack::default(),
            FamilySupport::default(),
            EventLog::default(),
        ))
    }

    fn food(world: &World, entity: Entity) -> f64 {
        world.get::<&Holdings>(entity).map(|h| h.store[Resource::Food]).unwrap_or(-1.0)
    }

    #[test]
    fn test_children_on_tile_inherit() {
        let mut world = World::new();
        let mut genealogy = Genealogy::new();
        let home = Point::new(1, 1);
        let dead = spawn(&mut world, 1, home, Occupation::Deceased, 6.0);
        let child = spawn(&mut world, 2, home, Occupation::Farmer, 0.0);
        let stranger = spawn(&mut world, 3, home, Occupation::Farmer, 0.0);
        genealogy.register_founder(PersonId(1), "Ruth Hill".into(), 60, 0);
        genealogy.record_birth(PersonId(2), "Anna Hill".into(), PersonId(1), -20);

        assert_eq!(cleanup_deceased(&mut world, &genealogy), 1);
        assert!(!world.contains(dead));
        assert!((food(&world, child) - 6.0).abs() < 1e-12);
        assert_eq!(food(&world, stranger), 0.0);
    }

    #[test]
    fn test_tile_shares_without_children() {
        let mut world = World::new();
        let genealogy = Genealogy::new();
        let home = Point::new(1, 1);
        spawn(&mut world, 1, home, Occupation::Deceased, 6.0);
        let a = spawn(&mut world, 2, home, Occupation::Farmer, 1.0);
        let b = spawn(&mut world, 3, home, Occupation::Farmer, 0.0);
        let far = spawn(&mut world, 4, Point::new(3, 3), Occupation::Farmer, 0.0);

        cleanup_deceased(&mut world, &genealogy);
        assert!((food(&world, a) - 4.0).abs() < 1e-12);
        assert!((food(&world, b) - 3.0).abs() < 1e-12);
        assert_eq!(food(&world, far), 0.0);
        assert_eq!(living_count(&world), 3);
    }

    #[test]
    fn test_lonely_estate_is_lost() {
        let mut world = World::new();
        let genealogy = Genealogy::new();
        spawn(&mut world, 1, Point::new(1, 1), Occupation::Deceased, 6.0);
        assert_eq!(cleanup_deceased(&mut world, &genealogy), 1);
        assert_eq!(world.len(), 0);
    }
}
