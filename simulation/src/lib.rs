//! Frontier Simulation Engine
//!
//! Turn-based economic and demographic simulation of settlers on a
//! generated grid world, built on an ECS.

pub mod buildings;
pub mod components;
pub mod config;
pub mod error;
pub mod genealogy;
pub mod geography;
pub mod market;
pub mod names;
pub mod occupation;
pub mod resource_map;
pub mod resources;
pub mod statistics;
pub mod systems;
pub mod world;

pub use components::*;
pub use config::SimulationConfig;
pub use error::{Result, SimulationError};
pub use world::{PersonSnapshot, SimulationWorld, TurnSummary};
