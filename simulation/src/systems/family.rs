//! Family System
//!
//! Parents hand part of their store to young children living on the same
//! tile. Gifts are computed from a snapshot of every store, then applied,
//! so a teenage parent's own receipts never fund their gifts this turn.

use std::collections::BTreeMap;

use hecs::{Entity, World};

use crate::components::{Age, EventLog, FamilySupport, Holdings, Person, PersonId};
use crate::genealogy::Genealogy;
use crate::occupation::{self, Occupation};
use crate::resource_map::Point;
use crate::resources::{Resource, ResourceBag};

/// Children are supported up to and including this age.
pub const SUPPORT_AGE_LIMIT: u32 = 18;

/// Share of their own need a parent keeps back before giving.
const PARENT_RESERVE: f64 = 0.8;

struct Member {
    entity: Entity,
    position: Point,
    occupation: Occupation,
    age: u32,
    store: ResourceBag,
}

/// Runs childcare. Returns the number of children that received anything.
pub fn childcare_system(world: &mut World, genealogy: &Genealogy) -> usize {
    let mut members: BTreeMap<PersonId, Member> = BTreeMap::new();
    for (entity, (person, position, occupation, age, holdings, support)) in world.query_mut::<(
        &Person,
        &Point,
        &Occupation,
        &Age,
        &Holdings,
        &mut FamilySupport,
    )>() {
        *support = FamilySupport::default();
        if !occupation.is_alive() {
            continue;
        }
        members.insert(
            person.id,
            Member {
                entity,
                position: *position,
                occupation: *occupation,
                age: age.years,
                store: holdings.store,
            },
        );
    }

    let mut given: BTreeMap<PersonId, ResourceBag> = BTreeMap::new();
    let mut received: BTreeMap<PersonId, ResourceBag> = BTreeMap::new();
    for (id, parent) in &members {
        let own_need = occupation::consumption(parent.occupation, parent.age);
        let mut available = parent.store;
        // Youngest first.
        for record in genealogy.children(*id).into_iter().rev() {
            let Some(child) = members.get(&record.id) else {
                continue;
            };
            if child.age > SUPPORT_AGE_LIMIT || child.position != parent.position {
                continue;
            }
            let child_need = occupation::consumption(child.occupation, child.age);
            for (resource, need) in child_need.entries() {
                let spare = available[resource] - own_need[resource] * PARENT_RESERVE;
                let transfer = need.min(spare);
                if transfer <= 0.0 {
                    continue;
                }
                available[resource] -= transfer;
                given.entry(*id).or_default().add(resource, transfer);
                received.entry(record.id).or_default().add(resource, transfer);
            }
        }
    }

    for (id, bag) in &given {
        let Some(entity) = members.get(id).map(|m| m.entity) else {
            continue;
        };
        if let Ok((holdings, support)) =
            world.query_one_mut::<(&mut Holdings, &mut FamilySupport)>(entity)
        {
            for (resource, amount) in bag.entries() {
                holdings.store.add(resource, -amount);
            }
            support.given = *bag;
        }
    }
    for (id, bag) in &received {
        let Some(entity) = members.get(id).map(|m| m.entity) else {
            continue;
        };
        if let Ok((holdings, support, log)) =
            world.query_one_mut::<(&mut Holdings, &mut FamilySupport, &mut EventLog)>(entity)
        {
            holdings.store.add_bag(bag);
            support.received = *bag;
            if bag.has(Resource::Food) {
                log.push("Their parent shared food with them.");
            }
        }
    }
    received.len()
}
