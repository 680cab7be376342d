//! Simulation configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

pub const DEFAULT_WORLD_SIZE: usize = 20;
pub const DEFAULT_SEED: u64 = 0x5eed_f00d;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world_size: usize,
    pub initial_population: usize,
    /// Fraction of tiles that must be land for a generated world to be kept.
    pub min_land_fraction: f64,
    pub seed: u64,
    pub founder_age_min: u32,
    pub founder_age_max: u32,
    /// Neighbours tried per movement step before giving up on that step.
    pub movement_retries: u32,
    pub genealogy: GenealogyConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenealogyConfig {
    /// Turns between pruning passes.
    pub prune_interval: u32,
    /// Turns a death must be in the past before its record may be pruned.
    pub grace_turns: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world_size: DEFAULT_WORLD_SIZE,
            initial_population: 5,
            min_land_fraction: 0.25,
            seed: DEFAULT_SEED,
            founder_age_min: 16,
            founder_age_max: 30,
            movement_retries: 3,
            genealogy: GenealogyConfig::default(),
        }
    }
}

impl Default for GenealogyConfig {
    fn default() -> Self {
        Self {
            prune_interval: 10,
            grace_turns: 20,
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.world_size == 0 {
            return Err(SimulationError::InvalidConfig("world_size must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.min_land_fraction) {
            return Err(SimulationError::InvalidConfig(format!(
                "min_land_fraction {} is outside [0, 1]",
                self.min_land_fraction
            )));
        }
        if self.founder_age_min > self.founder_age_max {
            return Err(SimulationError::InvalidConfig(format!(
                "founder ages {}..{} are inverted",
                self.founder_age_min, self.founder_age_max
            )));
        }
        if self.genealogy.prune_interval == 0 {
            return Err(SimulationError::InvalidConfig(
                "genealogy.prune_interval must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Land tiles a generated world needs before it is accepted.
    pub fn min_land_tiles(&self) -> usize {
        let tiles = (self.world_size * self.world_size) as f64;
        (tiles * self.min_land_fraction).ceil() as usize
    }
}
