//! Consumption System
//!
//! Living agents eat from their store, record what they could not cover as
//! this turn's deficit, and everything left over spoils by a tenth.

use hecs::World;

use crate::components::{Age, EventLog, Holdings};
use crate::occupation::{self, Occupation};
use crate::resources::ResourceBag;

/// Share of every store that survives the year.
pub const STORE_DECAY: f64 = 0.9;

pub fn consume(occupation: Occupation, age: u32, holdings: &mut Holdings, log: &mut EventLog) {
    let needs = occupation::consumption(occupation, age);
    let mut deficit = ResourceBag::new();
    for (resource, need) in needs.entries() {
        let held = holdings.store[resource];
        if !holdings.store.has(resource) {
            deficit.set(resource, need);
            log.push(format!("They lack {}.", resource));
        } else if need <= held {
            holdings.store.add(resource, -need);
        } else {
            deficit.set(resource, need - held);
            holdings.store.set(resource, 0.0);
            log.push(format!("They need more {}.", resource));
        }
    }
    holdings.deficit = deficit;
    holdings.store.scale(STORE_DECAY);
}

pub fn consumption_system(world: &mut World) {
    for (_, (occupation, age, holdings, log)) in
        world.query_mut::<(&Occupation, &Age, &mut Holdings, &mut EventLog)>()
    {
        if !occupation.is_alive() {
            continue;
        }
        consume(*occupation, age.years, holdings, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Resource;

    #[test]
    fn test_consumption_and_decay() {
        let mut holdings = Holdings {
            store: ResourceBag::from_pairs(&[(Resource::Food, 1.5), (Resource::Gold, 2.0)]),
            ..Holdings::default()
        };
        let mut log = EventLog::default();
        consume(Occupation::Gatherer, 30, &mut holdings, &mut log);
        assert!((holdings.store[Resource::Food] - 0.9).abs() < 1e-12);
        assert!((holdings.store[Resource::Gold] - 1.8).abs() < 1e-12);
        assert!(holdings.deficit.is_empty());
        assert!(log.0.is_empty());
    }

    #[test]
    fn test_shortfall_becomes_deficit() {
        let mut holdings = Holdings {
            store: ResourceBag::from_pairs(&[(Resource::Food, 0.1)]),
            ..Holdings::default()
        };
        let mut log = EventLog::default();
        consume(Occupation::Farmer, 30, &mut holdings, &mut log);
        assert!((holdings.deficit[Resource::Food] - 0.3).abs() < 1e-12);
        assert!((holdings.deficit[Resource::Tool] - 0.1).abs() < 1e-12);
        assert_eq!(holdings.store[Resource::Food], 0.0);
        assert!(log.0.contains("They need more food."));
        assert!(log.0.contains("They lack tooling."));
    }
}
