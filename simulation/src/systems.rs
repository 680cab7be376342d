//! ECS Systems - process entities each turn
//!
//! Listed in the order the world runs them.

pub mod death;
pub mod movement;
pub mod production;
pub mod family;
pub mod market;
pub mod transition;
pub mod consumption;
pub mod aging;
pub mod birth;
pub mod buildings;

pub use aging::aging_system;
pub use birth::birth_system;
pub use buildings::{building_system, BuildingReport};
pub use consumption::consumption_system;
pub use death::cleanup_deceased;
pub use family::childcare_system;
pub use market::market_system;
pub use movement::movement_system;
pub use production::{production_system, ProductionMaps};
pub use transition::transition_system;

use hecs::World;

use crate::components::EventLog;

/// Start every narrative afresh.
pub fn refresh_logs(world: &mut World) {
    for (_, log) in world.query_mut::<&mut EventLog>() {
        log.clear();
    }
}
