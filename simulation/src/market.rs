//! Market orders and clearing-price search
//!
//! Every traded resource gets one price per turn. The search starts from a
//! price that cannot oversell demand and halves it until most of the
//! cheaper side would clear.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::components::Holdings;
use crate::occupation::{self, Occupation};
use crate::resources::{Resource, ResourceBag};

/// Added to denominators that may be zero.
pub const EPSILON: f64 = 0.01;

const MAX_PRICE_ITERATIONS: usize = 10;
/// Percent of either side that must clear before a price is accepted.
const SATISFIED_PCT: f64 = 70.0;
/// Percent improvement below which halving the price is not worth it.
const MIN_IMPROVEMENT_PCT: f64 = 5.0;

/// One buyer's demand and what they are willing to pay for all of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetDemand {
    pub demand: f64,
    pub budget: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceMarket {
    pub supply: f64,
    pub demand: f64,
    pub liquidity: f64,
    pub price: f64,
    /// Quantity actually bought this turn.
    pub activity: f64,
}

/// Per-resource aggregates, rebuilt every turn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketConditions {
    pub resources: BTreeMap<Resource, ResourceMarket>,
}

impl MarketConditions {
    pub fn get(&self, resource: Resource) -> ResourceMarket {
        self.resources.get(&resource).copied().unwrap_or_default()
    }

    pub fn price(&self, resource: Resource) -> f64 {
        self.get(resource).price
    }
}

/// Conservative opening price: liquidity over supply, scaled down when
/// demand is short of supply.
pub fn start_price(supply: f64, demand: f64, budget: f64) -> f64 {
    let scale = if demand > supply {
        1.0
    } else {
        demand / (supply + EPSILON)
    };
    budget / (supply + EPSILON) * scale
}

fn sold_at(price: f64, pairs: &[BudgetDemand]) -> f64 {
    pairs
        .iter()
        .map(|pair| {
            if pair.demand * price > pair.budget {
                pair.budget / price
            } else {
                pair.demand
            }
        })
        .sum()
}

/// Halving search for the clearing price. Accepts a price once either side
/// clears past 70% without overselling supply; backs off toward the last
/// higher price when oversold; stops and keeps the last higher price when a
/// halving improved neither side by 5 points.
pub fn determine_pricing(start: f64, supply: f64, demand: f64, pairs: &[BudgetDemand]) -> f64 {
    let mut price = start;
    let mut prev_price = start * 2.0;
    let mut prev_pct_sup = 0.0;
    let mut prev_pct_dem = 0.0;
    for _ in 0..MAX_PRICE_ITERATIONS {
        let sold = sold_at(price, pairs);
        let pct_sup = sold / (supply + EPSILON) * 100.0;
        let pct_dem = sold / (demand + EPSILON) * 100.0;
        if pct_sup > SATISFIED_PCT || pct_dem > SATISFIED_PCT {
            if pct_sup > 100.0 {
                price = (price + prev_price) / 2.0;
            } else {
                return price;
            }
        } else {
            if pct_sup - prev_pct_sup < MIN_IMPROVEMENT_PCT && pct_dem - prev_pct_dem < MIN_IMPROVEMENT_PCT {
                return prev_price;
            }
            prev_price = price;
            price /= 2.0;
        }
        prev_pct_sup = pct_sup;
        prev_pct_dem = pct_dem;
    }
    price
}

// ============================================================================
// Orders
// ============================================================================

/// Years of need kept in store before the rest is offered for sale.
const STORE_YEARS: f64 = 10.0;

/// Store beyond ten years of need, everything unneeded, and income beyond
/// one and a half times need plus childcare given.
pub fn surplus(occupation: Occupation, age: u32, holdings: &Holdings, support_given: &ResourceBag) -> ResourceBag {
    let needs = occupation::consumption(occupation, age);
    let mut surplus = ResourceBag::new();
    for resource in Resource::TRADED {
        // This turn's income is counted separately below.
        let held = holdings.store[resource] - holdings.income[resource];
        let need = needs[resource];
        let spare = if need > 0.0 { held - need * STORE_YEARS } else { held };
        if spare > 0.0 {
            surplus.add(resource, spare);
        }

        let spare_income = holdings.income[resource] - (need + support_given[resource]) * 1.5;
        if spare_income > 0.0 {
            surplus.add(resource, spare_income);
        }
        let cap = holdings.store[resource].max(0.0);
        if surplus[resource] > cap {
            surplus.set(resource, cap);
        }
    }
    surplus
}

/// Quantity an agent would like to buy. `young_children` counts living
/// children aged 16 or less.
pub fn demand(occupation: Occupation, age: u32, holdings: &Holdings, young_children: usize) -> ResourceBag {
    let needs = occupation::consumption(occupation, age);
    let child = 0.5 * young_children as f64;
    let mut demand = ResourceBag::new();
    for resource in Resource::TRADED {
        let need = needs[resource];
        if need <= 0.0 {
            continue;
        }
        if holdings.store.has(resource) {
            let multiplier = (2.0 - holdings.store[resource] / (need * 6.0)).max(0.0);
            let raw = (need * (1.5 + child) - holdings.income[resource]).max(0.0);
            demand.set(resource, raw * multiplier);
        } else {
            demand.set(resource, need * (3.0 + child * 2.0));
        }
    }
    demand
}

/// Gold set aside per resource. A food deficit puts every coin on food.
/// Budgets may sum past the wallet; spending is capped by the wallet.
pub fn budget(occupation: Occupation, age: u32, holdings: &Holdings, demand: &ResourceBag) -> ResourceBag {
    let mut budget = ResourceBag::new();
    let gold = holdings.store[Resource::Gold];
    if gold <= 0.0 {
        return budget;
    }
    if holdings.deficit.has(Resource::Food) {
        budget.set(Resource::Food, gold);
        return budget;
    }
    let needs = occupation::consumption(occupation, age);
    for resource in Resource::TRADED {
        let wanted = demand[resource];
        if wanted <= 0.0 {
            continue;
        }
        let spend = wanted / (needs[resource] + 0.1) * 0.5 * gold;
        budget.set(resource, spend.min(gold));
    }
    budget
}

/// Aggregate every agent's orders into per-resource prices.
pub fn clear<'a>(orders: impl IntoIterator<Item = (&'a ResourceBag, &'a ResourceBag, &'a ResourceBag)>) -> MarketConditions {
    let mut totals: BTreeMap<Resource, ResourceMarket> = BTreeMap::new();
    let mut pairs: BTreeMap<Resource, Vec<BudgetDemand>> = BTreeMap::new();
    for (surplus, demand, budget) in orders {
        for resource in Resource::TRADED {
            let entry = totals.entry(resource).or_default();
            entry.supply += surplus[resource];
            entry.demand += demand[resource];
            entry.liquidity += budget[resource];
            if demand[resource] > 0.0 && budget[resource] > 0.0 {
                pairs.entry(resource).or_default().push(BudgetDemand {
                    demand: demand[resource],
                    budget: budget[resource],
                });
            }
        }
    }

    let mut conditions = MarketConditions::default();
    for resource in Resource::TRADED {
        let mut market = totals.get(&resource).copied().unwrap_or_default();
        if market.supply > 0.0 {
            let start = start_price(market.supply, market.demand, market.liquidity);
            let pairs = pairs.get(&resource).map(Vec::as_slice).unwrap_or_default();
            market.price = determine_pricing(start, market.supply, market.demand, pairs);
        }
        conditions.resources.insert(resource, market);
    }
    conditions
}
