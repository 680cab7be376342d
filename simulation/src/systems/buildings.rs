//! Building System
//!
//! Maintains existing buildings from the people living on their tile, then
//! founds new ones on tiles that had none.

use std::collections::BTreeMap;

use hecs::World;
use tracing::info;

use crate::buildings::{found_building, run_maintenance, Building, BuildingChange};
use crate::occupation::Occupation;
use crate::resource_map::Point;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildingReport {
    pub founded: u32,
    pub upgraded: u32,
    pub downgraded: u32,
    pub removed: u32,
}

/// Occupations of the living, grouped by tile.
pub fn residents_by_tile(world: &World) -> BTreeMap<Point, Vec<Occupation>> {
    let mut residents: BTreeMap<Point, Vec<Occupation>> = BTreeMap::new();
    for (_, (position, occupation)) in world.query::<(&Point, &Occupation)>().iter() {
        if occupation.is_alive() {
            residents.entry(*position).or_default().push(*occupation);
        }
    }
    residents
}

pub fn building_system(world: &World, buildings: &mut BTreeMap<Point, Building>) -> BuildingReport {
    let residents = residents_by_tile(world);
    let mut report = BuildingReport::default();

    let mut removed = Vec::new();
    for (point, building) in buildings.iter_mut() {
        let here = residents.get(point).map(Vec::as_slice).unwrap_or_default();
        match run_maintenance(building, here) {
            BuildingChange::Unchanged => {}
            BuildingChange::Upgraded(kind) => {
                info!(tile = %point, ?kind, "Building upgraded");
                report.upgraded += 1;
            }
            BuildingChange::Downgraded(kind) => {
                info!(tile = %point, ?kind, "Building downgraded");
                report.downgraded += 1;
            }
            BuildingChange::Removed => {
                info!(tile = %point, kind = ?building.kind, "Building abandoned");
                removed.push(*point);
            }
        }
    }
    report.removed = removed.len() as u32;

    for (point, here) in &residents {
        if buildings.contains_key(point) || removed.contains(point) {
            continue;
        }
        if let Some(building) = found_building(here) {
            info!(tile = %point, kind = ?building.kind, residents = here.len(), "Building founded");
            buildings.insert(*point, building);
            report.founded += 1;
        }
    }
    for point in removed {
        buildings.remove(&point);
    }
    report
}
