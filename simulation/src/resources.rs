//! Resources, resource bags and per-category yield functions

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Serialize, Serializer};

use crate::buildings::BuildingType;
use crate::geography::Terrain;

// ============================================================================
// Resource types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Food,
    Wood,
    Tool,
    /// Currency. Drafted and spent, never traded on the market.
    Gold,
}

impl Resource {
    pub const COUNT: usize = 4;
    pub const ALL: [Resource; Resource::COUNT] =
        [Resource::Food, Resource::Wood, Resource::Tool, Resource::Gold];
    /// Goods that clear on the market each turn.
    pub const TRADED: [Resource; 3] = [Resource::Food, Resource::Wood, Resource::Tool];

    fn index(self) -> usize {
        self as usize
    }

    /// Word used in narrative logs ("They lack food.").
    pub fn complaint(self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Wood => "wood",
            Resource::Tool => "tooling",
            Resource::Gold => "gold",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.complaint())
    }
}

/// Fixed-size record of quantities, one slot per [`Resource`].
///
/// A zero slot is equivalent to the resource being absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceBag([f64; Resource::COUNT]);

impl ResourceBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(Resource, f64)]) -> Self {
        let mut bag = Self::default();
        for &(resource, amount) in pairs {
            bag.add(resource, amount);
        }
        bag
    }

    pub fn get(&self, resource: Resource) -> f64 {
        self.0[resource.index()]
    }

    pub fn set(&mut self, resource: Resource, amount: f64) {
        self.0[resource.index()] = amount;
    }

    pub fn add(&mut self, resource: Resource, amount: f64) {
        self.0[resource.index()] += amount;
    }

    /// Positive quantity held.
    pub fn has(&self, resource: Resource) -> bool {
        self.get(resource) > 0.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, f64)> + '_ {
        Resource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    /// Entries with a nonzero quantity.
    pub fn entries(&self) -> impl Iterator<Item = (Resource, f64)> + '_ {
        self.iter().filter(|(_, v)| *v != 0.0)
    }

    pub fn add_bag(&mut self, other: &ResourceBag) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for v in self.0.iter_mut() {
            *v *= factor;
        }
    }

    pub fn clear(&mut self) {
        self.0 = [0.0; Resource::COUNT];
    }

    pub fn first_non_finite(&self) -> Option<(Resource, f64)> {
        self.iter().find(|(_, v)| !v.is_finite())
    }
}

impl Index<Resource> for ResourceBag {
    type Output = f64;

    fn index(&self, resource: Resource) -> &f64 {
        &self.0[resource.index()]
    }
}

impl IndexMut<Resource> for ResourceBag {
    fn index_mut(&mut self, resource: Resource) -> &mut f64 {
        &mut self.0[resource.index()]
    }
}

impl Serialize for ResourceBag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries())
    }
}

// ============================================================================
// Production categories
// ============================================================================

/// Tag carried by effort on a tile. One category wins each tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionKind {
    Gathering,
    Farming,
    Fishing,
    Whaling,
    Logging,
    Commerce,
}

impl ProductionKind {
    pub fn output(self) -> Resource {
        match self {
            ProductionKind::Gathering
            | ProductionKind::Farming
            | ProductionKind::Fishing
            | ProductionKind::Whaling => Resource::Food,
            ProductionKind::Logging => Resource::Wood,
            ProductionKind::Commerce => Resource::Gold,
        }
    }

    /// Quantity produced on one tile by `strength` units of effort.
    pub fn yield_for(self, strength: f64, terrain: Terrain, building: Option<BuildingType>) -> f64 {
        let produce = match self {
            ProductionKind::Gathering => gathering_yield(strength, terrain),
            ProductionKind::Farming => farming_yield(strength, terrain, building),
            ProductionKind::Fishing => fishing_yield(strength, terrain),
            ProductionKind::Whaling => whaling_yield(strength, terrain),
            ProductionKind::Logging => logging_yield(strength, terrain),
            ProductionKind::Commerce => commerce_yield(strength, terrain, building),
        };
        round_to_cent(produce.max(0.0))
    }
}

fn round_to_cent(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

fn sqrt_above_one(strength: f64) -> f64 {
    if strength < 1.0 {
        strength
    } else {
        strength.sqrt()
    }
}

fn gathering_yield(strength: f64, terrain: Terrain) -> f64 {
    let modifier = match terrain {
        Terrain::Barren => 0.2,
        Terrain::Grassland => 0.5,
        Terrain::Forest => 1.0,
        _ => return 0.0,
    };
    // Living off the land caps out quickly.
    strength.min(0.5) * modifier
}

fn farming_yield(strength: f64, terrain: Terrain, building: Option<BuildingType>) -> f64 {
    let modifier = match terrain {
        Terrain::Grassland => 1.0,
        Terrain::Forest => 0.25,
        _ => return 0.0,
    };
    let bonus = match building {
        Some(BuildingType::Farm) => 1.5,
        _ => 1.0,
    };
    sqrt_above_one(strength) * modifier * bonus
}

fn fishing_yield(strength: f64, terrain: Terrain) -> f64 {
    let modifier = match terrain {
        Terrain::Water => 1.0,
        Terrain::Barren => 0.5,
        _ => return 0.0,
    };
    let produce = if strength < 0.7 {
        strength
    } else {
        // Overfishing
        0.7 - (strength - 1.0) / 20.0
    };
    produce * modifier
}

fn whaling_yield(strength: f64, terrain: Terrain) -> f64 {
    let modifier = match terrain {
        Terrain::Deep => 1.0,
        Terrain::Water => 0.4,
        _ => return 0.0,
    };
    let produce = if strength < 1.0 {
        strength
    } else {
        1.0 - (strength - 1.0) / 10.0
    };
    produce * modifier
}

fn logging_yield(strength: f64, terrain: Terrain) -> f64 {
    let modifier = match terrain {
        Terrain::Forest => 1.0,
        Terrain::Grassland => 0.2,
        _ => return 0.0,
    };
    sqrt_above_one(strength) * modifier
}

fn commerce_yield(strength: f64, terrain: Terrain, building: Option<BuildingType>) -> f64 {
    if !terrain.is_land() {
        return 0.0;
    }
    let modifier = match building {
        Some(BuildingType::Town) => 1.0,
        Some(BuildingType::City) => 1.5,
        _ => return 0.0,
    };
    sqrt_above_one(strength) * modifier
}
