//! Aging System - one year per turn

use hecs::World;

use crate::components::Age;
use crate::occupation::Occupation;

/// Advance age by one year for everyone still alive.
pub fn aging_system(world: &mut World) {
    for (_, (age, occupation)) in world.query_mut::<(&mut Age, &Occupation)>() {
        if occupation.is_alive() {
            age.years += 1;
        }
    }
}
