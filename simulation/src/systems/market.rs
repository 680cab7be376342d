//! Market System
//!
//! Builds every agent's orders, clears one price per traded resource, then
//! settles: all purchases first, then all sales scaled by how much of the
//! supply was actually bought.

use std::collections::BTreeMap;

use hecs::World;

use crate::components::{Age, FamilySupport, Holdings, MarketPack, Person, TradeSide, Transaction};
use crate::genealogy::Genealogy;
use crate::market::{self, MarketConditions, EPSILON};
use crate::occupation::Occupation;
use crate::resources::Resource;

/// Children up to this age raise a parent's demand.
const DEPENDENT_AGE: i64 = 16;

pub fn market_system(world: &mut World, genealogy: &Genealogy, turn: i64) -> MarketConditions {
    for (_, (person, occupation, age, holdings, support, pack)) in world.query_mut::<(
        &Person,
        &Occupation,
        &Age,
        &Holdings,
        &FamilySupport,
        &mut MarketPack,
    )>() {
        *pack = MarketPack::default();
        if !occupation.is_alive() {
            continue;
        }
        let young = genealogy
            .child_ages(person.id, turn)
            .into_iter()
            .filter(|a| *a <= DEPENDENT_AGE)
            .count();
        pack.surplus = market::surplus(*occupation, age.years, holdings, &support.given);
        pack.demand = market::demand(*occupation, age.years, holdings, young);
        pack.budget = market::budget(*occupation, age.years, holdings, &pack.demand);
    }

    let mut conditions = market::clear(
        world
            .query::<&MarketPack>()
            .iter()
            .map(|(_, pack)| (&pack.surplus, &pack.demand, &pack.budget)),
    );

    // Buy up to demand, bounded by budget and wallet.
    let mut bought: BTreeMap<Resource, f64> = BTreeMap::new();
    for (_, (holdings, pack)) in world.query_mut::<(&mut Holdings, &mut MarketPack)>() {
        for resource in Resource::TRADED {
            let wanted = pack.demand[resource];
            if wanted <= 0.0 || conditions.get(resource).supply <= 0.0 {
                continue;
            }
            let spend_mark = holdings.store[Resource::Gold].min(pack.budget[resource]);
            if spend_mark <= 0.0 {
                continue;
            }
            let price = conditions.price(resource);
            if price <= 0.0 {
                continue;
            }
            let quantity = (spend_mark / price).min(wanted);
            let spent = quantity * price;
            holdings.store.add(Resource::Gold, -spent);
            holdings.store.add(resource, quantity);
            *bought.entry(resource).or_insert(0.0) += quantity;
            pack.transactions.push(Transaction {
                side: TradeSide::Buy,
                resource,
                quantity,
                gold: spent,
            });
        }
    }

    // Sell surplus, scaled by the share of supply that found a buyer.
    let mut scale: BTreeMap<Resource, f64> = BTreeMap::new();
    for resource in Resource::TRADED {
        let total = bought.get(&resource).copied().unwrap_or(0.0);
        let factor = total / (conditions.get(resource).supply + EPSILON);
        scale.insert(resource, factor.min(1.0));
    }
    for (_, (holdings, pack)) in world.query_mut::<(&mut Holdings, &mut MarketPack)>() {
        for resource in Resource::TRADED {
            let offered = pack.surplus[resource];
            let price = conditions.price(resource);
            if offered <= 0.0 || price <= 0.0 {
                continue;
            }
            let factor = scale.get(&resource).copied().unwrap_or(0.0);
            let quantity = (offered * factor).min(holdings.store[resource].max(0.0));
            if quantity <= 0.0 {
                continue;
            }
            let earned = quantity * price;
            holdings.store.add(resource, -quantity);
            holdings.store.add(Resource::Gold, earned);
            pack.transactions.push(Transaction {
                side: TradeSide::Sell,
                resource,
                quantity,
                gold: earned,
            });
        }
    }

    for (resource, market) in conditions.resources.iter_mut() {
        market.activity = bought.get(resource).copied().unwrap_or(0.0);
    }
    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{EventLog, PersonId};
    use crate::resource_map::Point;
    use crate::resources::ResourceBag;
    use hecs::Entity;

    fn trader(world: &mut World, id: u64, occupation: Occupation, store: &[(Resource, f64)]) -> Entity {
        world.spawn((
            Person {
                id: PersonId(id),
                first_name: "Joan".into(),
                last_name: "Reed".into(),
            },
            Point::new(0, 0),
            occupation,
            Age::new(30),
            Holdings {
                store: ResourceBag::from_pairs(store),
                ..Holdings::default()
            },
            MarketPack::default(),
            FamilySupport::default(),
            EventLog::default(),
        ))
    }

    fn store(world: &World, entity: Entity) -> ResourceBag {
        world.get::<&Holdings>(entity).map(|h| h.store).unwrap_or_default()
    }

    #[test]
    fn test_trade_moves_goods_and_gold() {
        let mut world = World::new();
        let genealogy = Genealogy::new();
        // Ten years of food is five; the rest is for sale.
        let seller = trader(&mut world, 1, Occupation::Gatherer, &[(Resource::Food, 25.0)]);
        let buyer = trader(&mut world, 2, Occupation::Gatherer, &[(Resource::Gold, 10.0)]);
        let before = store(&world, seller)[Resource::Food] + store(&world, buyer)[Resource::Food];

        let conditions = market_system(&mut world, &genealogy, 0);
        assert!(conditions.price(Resource::Food) > 0.0);
        assert!(conditions.get(Resource::Food).activity > 0.0);

        let s = store(&world, seller);
        let b = store(&world, buyer);
        assert!(b[Resource::Food] > 0.0);
        assert!(s[Resource::Gold] > 0.0);
        assert!(b[Resource::Gold] >= 0.0);
        // Sales are scaled to purchases, so food is conserved up to the epsilon.
        let after = s[Resource::Food] + b[Resource::Food];
        assert!(after >= before - 1e-9);
        assert!(after - before < 0.01);
    }

    #[test]
    fn test_wallets_never_go_negative() {
        let mut world = World::new();
        let genealogy = Genealogy::new();
        let mut buyers = Vec::new();
        trader(&mut world, 1, Occupation::Farmer, &[(Resource::Food, 80.0), (Resource::Tool, 30.0)]);
        for id in 2..8 {
            buyers.push(trader(&mut world, id, Occupation::Farmer, &[(Resource::Gold, 0.5 * id as f64)]));
        }
        market_system(&mut world, &genealogy, 0);
        for entity in buyers {
            let s = store(&world, entity);
            assert!(s[Resource::Gold] >= -1e-12);
            let pack = world.get::<&MarketPack>(entity).map(|p| (*p).clone()).unwrap_or_default();
            let spent: f64 = pack
                .transactions
                .iter()
                .filter(|t| t.side == TradeSide::Buy)
                .map(|t| t.gold)
                .sum();
            assert!(spent <= 0.5 * 7.0 + 1e-9);
        }
    }

    #[test]
    fn test_gold_is_never_offered() {
        let mut world = World::new();
        let genealogy = Genealogy::new();
        let rich = trader(&mut world, 1, Occupation::Gatherer, &[(Resource::Gold, 100.0)]);
        let conditions = market_system(&mut world, &genealogy, 0);
        assert!(conditions.resources.get(&Resource::Gold).is_none());
        let pack = world.get::<&MarketPack>(rich).map(|p| p.surplus).unwrap_or_default();
        assert_eq!(pack[Resource::Gold], 0.0);
    }
}
