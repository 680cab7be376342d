//! Population and economy summary

use std::collections::BTreeMap;

use hecs::World;
use serde::Serialize;

use crate::components::{Age, Holdings};
use crate::occupation::{self, Occupation};
use crate::resources::{Resource, ResourceBag};

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatisticsReport {
    pub turn: i64,
    pub population: usize,
    pub average_age: f64,
    pub composition: BTreeMap<Occupation, usize>,
    pub total_income: ResourceBag,
    /// Need actually met this turn.
    pub total_consumption: ResourceBag,
    pub total_wealth: ResourceBag,
}

/// Summarises every living agent.
pub fn generate_report(world: &World, turn: i64) -> StatisticsReport {
    let mut report = StatisticsReport {
        turn,
        ..StatisticsReport::default()
    };
    let mut age_sum = 0u64;
    for (_, (occupation, age, holdings)) in world.query::<(&Occupation, &Age, &Holdings)>().iter() {
        if !occupation.is_alive() {
            continue;
        }
        report.population += 1;
        age_sum += u64::from(age.years);
        *report.composition.entry(*occupation).or_insert(0) += 1;
        report.total_income.add_bag(&holdings.income);
        report.total_wealth.add_bag(&holdings.store);
        let needs = occupation::consumption(*occupation, age.years);
        for resource in Resource::ALL {
            let met = needs[resource] - holdings.deficit[resource];
            if needs[resource] > 0.0 {
                report.total_consumption.add(resource, met.max(0.0));
            }
        }
    }
    if report.population > 0 {
        report.average_age = age_sum as f64 / report.population as f64;
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_living_only() {
        let mut world = World::new();
        world.spawn((
            Occupation::Farmer,
            Age::new(20),
            Holdings {
                store: ResourceBag::from_pairs(&[(Resource::Gold, 2.0)]),
                income: ResourceBag::from_pairs(&[(Resource::Food, 1.0)]),
                deficit: ResourceBag::from_pairs(&[(Resource::Tool, 0.1)]),
            },
        ));
        world.spawn((Occupation::Gatherer, Age::new(40), Holdings::default()));
        world.spawn((Occupation::Deceased, Age::new(90), Holdings::default()));

        let report = generate_report(&world, 3);
        assert_eq!(report.population, 2);
        assert!((report.average_age - 30.0).abs() < 1e-12);
        assert_eq!(report.composition.get(&Occupation::Farmer), Some(&1));
        assert!(report.composition.get(&Occupation::Deceased).is_none());
        assert_eq!(report.total_wealth[Resource::Gold], 2.0);
        assert!((report.total_consumption[Resource::Food] - 0.9).abs() < 1e-12);
        assert_eq!(report.total_consumption[Resource::Tool], 0.0);
    }

    #[test]
    fn test_empty_world_report() {
        let report = generate_report(&World::new(), 0);
        assert_eq!(report.population, 0);
        assert_eq!(report.average_age, 0.0);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"population\":0"));
    }
}
