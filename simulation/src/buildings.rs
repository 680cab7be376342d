//! Settlement buildings and their maintenance rules
//!
//! A building's maintenance score accrues from the people living on its tile
//! and pays a fixed upkeep each turn. Dropping under the low threshold
//! downgrades (or removes) it; climbing past the high threshold upgrades it.

use serde::Serialize;

use crate::occupation::Occupation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingType {
    Farm,
    Town,
    City,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Building {
    pub kind: BuildingType,
    /// Turns since the building was created or last changed type.
    pub age: u32,
    pub maintenance: f64,
}

impl Building {
    pub fn new(kind: BuildingType) -> Self {
        Self {
            kind,
            age: 0,
            maintenance: kind.rules().start_point,
        }
    }
}

/// Static per-type parameters.
#[derive(Debug, Clone, Copy)]
pub struct BuildingRules {
    pub upkeep: f64,
    pub low_threshold: f64,
    pub start_point: f64,
    pub high_threshold: f64,
    pub upgrade: BuildingType,
    /// `None` removes the building.
    pub downgrade: Option<BuildingType>,
}

const FARM_RULES: BuildingRules = BuildingRules {
    upkeep: 2.0,
    low_threshold: 30.0,
    start_point: 50.0,
    high_threshold: 200.0,
    upgrade: BuildingType::Farm,
    downgrade: None,
};

const TOWN_RULES: BuildingRules = BuildingRules {
    upkeep: 8.0,
    low_threshold: 30.0,
    start_point: 100.0,
    high_threshold: 400.0,
    upgrade: BuildingType::City,
    downgrade: None,
};

const CITY_RULES: BuildingRules = BuildingRules {
    upkeep: 8.0,
    low_threshold: 50.0,
    start_point: 100.0,
    high_threshold: 400.0,
    upgrade: BuildingType::City,
    downgrade: Some(BuildingType::Town),
};

/// Residents needed before a town may become a city.
const CITY_MIN_RESIDENTS: usize = 21;
/// Residents needed to found a town.
const TOWN_MIN_RESIDENTS: usize = 10;
/// Farmers needed to found a farm.
const FARM_MIN_FARMERS: usize = 4;

impl BuildingType {
    pub fn rules(self) -> &'static BuildingRules {
        match self {
            BuildingType::Farm => &FARM_RULES,
            BuildingType::Town => &TOWN_RULES,
            BuildingType::City => &CITY_RULES,
        }
    }

    /// Maintenance earned this turn from the tile's residents, before upkeep.
    pub fn maintenance_gain(self, residents: &[Occupation]) -> f64 {
        let n = residents.len() as f64;
        match self {
            BuildingType::Farm => {
                let farmers = residents.iter().filter(|o| **o == Occupation::Farmer).count() as f64;
                let others = n - farmers;
                farmers - others - n / 2.0
            }
            BuildingType::Town => n * n / 8.0,
            BuildingType::City => n * n / 32.0,
        }
    }

    /// Extra condition a tile must meet before upgrading into this type.
    fn upgrade_allowed(self, residents: &[Occupation]) -> bool {
        match self {
            BuildingType::City => residents.len() >= CITY_MIN_RESIDENTS,
            _ => true,
        }
    }
}

/// Outcome of one turn of maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingChange {
    Unchanged,
    Upgraded(BuildingType),
    Downgraded(BuildingType),
    Removed,
}

/// Picks the building a bare tile should get, checking towns before farms.
pub fn found_building(residents: &[Occupation]) -> Option<Building> {
    if residents.len() >= TOWN_MIN_RESIDENTS {
        return Some(Building::new(BuildingType::Town));
    }
    let farmers = residents.iter().filter(|o| **o == Occupation::Farmer).count();
    if farmers >= FARM_MIN_FARMERS {
        return Some(Building::new(BuildingType::Farm));
    }
    None
}

/// Ages the building, applies gain and upkeep, then resolves thresholds.
/// Any change of type resets maintenance to the new type's start point.
pub fn run_maintenance(building: &mut Building, residents: &[Occupation]) -> BuildingChange {
    building.age += 1;
    let rules = building.kind.rules();
    building.maintenance += building.kind.maintenance_gain(residents) - rules.upkeep;

    if building.maintenance < rules.low_threshold {
        return match rules.downgrade {
            Some(lower) => {
                *building = Building::new(lower);
                BuildingChange::Downgraded(lower)
            }
            None => BuildingChange::Removed,
        };
    }

    if building.maintenance > rules.high_threshold {
        building.maintenance = rules.high_threshold;
        let target = rules.upgrade;
        if target != building.kind && target.upgrade_allowed(residents) {
            *building = Building::new(target);
            return BuildingChange::Upgraded(target);
        }
    }
    BuildingChange::Unchanged
}
