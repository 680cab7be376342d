//! Error types for the simulation engine
//!
//! Most modeling conditions are absorbed by policy (out-of-range writes are
//! dropped, missing entries read as zero). The variants here are the few
//! conditions that must stop a caller.

use thiserror::Error;

use crate::components::PersonId;
use crate::resources::Resource;

#[derive(Debug, Error)]
pub enum SimulationError {
    /// A resource quantity became NaN or infinite. Signals a modeling bug;
    /// the turn that produced it is aborted.
    #[error("person {person:?} holds a non-finite amount of {resource:?}: {value}")]
    NonFiniteResource {
        person: PersonId,
        resource: Resource,
        value: f64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no viable world after {attempts} generation attempts")]
    BarrenWorld { attempts: u32 },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;
