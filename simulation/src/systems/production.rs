//! Production System
//!
//! Effort, production, draft and harvest, in that order. Each stage reads
//! the previous stage's map; only harvest writes back into agents.

use std::collections::BTreeMap;

use hecs::World;

use crate::buildings::Building;
use crate::components::{Age, Holdings, Person, PersonId};
use crate::genealogy::Genealogy;
use crate::geography::Geography;
use crate::occupation::{self, Occupation};
use crate::resource_map::{Point, RadiusCache, ResourceMap};
use crate::resources::{ProductionKind, Resource, ResourceBag};

/// The three per-turn maps, kept for snapshots after the turn.
#[derive(Debug, Clone)]
pub struct ProductionMaps {
    pub effort: ResourceMap<ProductionKind>,
    pub production: ResourceMap<Resource>,
    pub draft: ResourceMap<PersonId>,
}

impl ProductionMaps {
    pub fn empty(boundary: usize) -> Self {
        Self {
            effort: ResourceMap::new(boundary),
            production: ResourceMap::new(boundary),
            draft: ResourceMap::new(boundary),
        }
    }
}

/// Spread each worker's strength over every tile in their work radius.
pub fn effort_map(world: &World, cache: &mut RadiusCache, boundary: usize) -> ResourceMap<ProductionKind> {
    let mut effort = ResourceMap::new(boundary);
    for (_, (position, occupation, age, holdings)) in world
        .query::<(&Point, &Occupation, &Age, &Holdings)>()
        .iter()
    {
        let Some(kind) = occupation.production() else {
            continue;
        };
        let strength = occupation::work_strength(*occupation, age.years, &holdings.deficit);
        if strength == 0.0 {
            continue;
        }
        let radius = occupation::work_radius(*occupation, age.years, &holdings.deficit);
        for point in cache.positions(*position, radius) {
            effort.place(point, kind, strength);
        }
    }
    effort
}

/// Resolve each tile to the single category with the highest yield.
pub fn production_map(
    effort: &ResourceMap<ProductionKind>,
    geography: &Geography,
    buildings: &BTreeMap<Point, Building>,
) -> ResourceMap<Resource> {
    let mut production = ResourceMap::new(effort.boundary());
    for (point, record) in effort.tiles() {
        let Some(terrain) = geography.terrain_at(point) else {
            continue;
        };
        let building = buildings.get(&point).map(|b| b.kind);
        let mut best: Option<(ProductionKind, f64)> = None;
        for (&kind, &strength) in record {
            let amount = kind.yield_for(strength, terrain, building);
            if amount > best.map_or(0.0, |(_, a)| a) {
                best = Some((kind, amount));
            }
        }
        if let Some((kind, amount)) = best {
            production.place(point, kind.output(), amount);
        }
    }
    production
}

/// The resource a produced tile yields. A tile never holds two.
fn tile_output(production: &ResourceMap<Resource>, point: Point) -> Option<Resource> {
    production.resource_at(point).next().map(|(resource, _)| resource)
}

/// Mark each agent's claim on every matching tile within their draft radii.
pub fn draft_map(
    world: &World,
    production: &ResourceMap<Resource>,
    genealogy: &Genealogy,
    turn: i64,
    cache: &mut RadiusCache,
) -> ResourceMap<PersonId> {
    let mut draft = ResourceMap::new(production.boundary());
    for (_, (person, position, occupation, age, holdings)) in world
        .query::<(&Person, &Point, &Occupation, &Age, &Holdings)>()
        .iter()
    {
        if !occupation.is_alive() {
            continue;
        }
        let child_ages = genealogy.child_ages(person.id, turn);
        for stat in occupation::drafts(*occupation, age.years, &holdings.deficit, &child_ages) {
            if stat.strength <= 0.0 {
                continue;
            }
            for point in cache.positions(*position, stat.radius) {
                if tile_output(production, point) == Some(stat.resource) {
                    draft.place(point, person.id, stat.strength);
                }
            }
        }
    }
    draft
}

/// Split each tile's output among its drafters by drafted strength.
pub fn harvest(
    production: &ResourceMap<Resource>,
    draft: &ResourceMap<PersonId>,
) -> BTreeMap<PersonId, ResourceBag> {
    let mut incomes: BTreeMap<PersonId, ResourceBag> = BTreeMap::new();
    for (point, claims) in draft.tiles() {
        let Some((resource, amount)) = production.resource_at(point).next() else {
            continue;
        };
        let total: f64 = claims.values().sum();
        if total <= 0.0 {
            continue;
        }
        for (id, strength) in claims {
            incomes
                .entry(*id)
                .or_default()
                .add(resource, amount * strength / total);
        }
    }
    incomes
}

/// Runs the whole pipeline, then credits harvest and private enterprise as
/// this turn's income and adds it to each store.
pub fn production_system(
    world: &mut World,
    geography: &Geography,
    buildings: &BTreeMap<Point, Building>,
    genealogy: &Genealogy,
    turn: i64,
    cache: &mut RadiusCache,
) -> ProductionMaps {
    let boundary = geography.size();
    let effort = effort_map(world, cache, boundary);
    let production = production_map(&effort, geography, buildings);
    let draft = draft_map(world, &production, genealogy, turn, cache);
    let mut incomes = harvest(&production, &draft);

    for (_, (person, occupation, age, holdings)) in
        world.query_mut::<(&Person, &Occupation, &Age, &mut Holdings)>()
    {
        holdings.income = incomes.remove(&person.id).unwrap_or_default();
        if let Some((resource, amount)) =
            occupation::enterprise_output(*occupation, age.years, &holdings.deficit)
        {
            holdings.income.add(resource, amount);
        }
        let income = holdings.income;
        holdings.store.add_bag(&income);
    }

    ProductionMaps {
        effort,
        production,
        draft,
    }
}
