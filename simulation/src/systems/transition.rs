//! Transition System
//!
//! Evaluates each living agent's occupation change, sailing and mortality,
//! then applies every outcome after the query.

use std::collections::BTreeMap;

use hecs::{Entity, World};
use rand::Rng;

use crate::buildings::Building;
use crate::components::{Age, EventLog, Holdings, Person};
use crate::genealogy::Genealogy;
use crate::geography::Geography;
use crate::occupation::{evaluate_transition, AgentState, DeathCause, Occupation, Transition, TransitionContext};
use crate::resource_map::Point;

/// Runs every transition. Returns the number of deaths.
pub fn transition_system<R: Rng + ?Sized>(
    world: &mut World,
    geography: &Geography,
    buildings: &BTreeMap<Point, Building>,
    genealogy: &mut Genealogy,
    turn: i64,
    rng: &mut R,
) -> u32 {
    let ctx = TransitionContext {
        geography,
        buildings,
    };
    let mut outcomes: Vec<(Entity, Transition)> = Vec::new();
    for (entity, (position, occupation, age, holdings)) in world
        .query::<(&Point, &Occupation, &Age, &Holdings)>()
        .iter()
    {
        if !occupation.is_alive() {
            continue;
        }
        let agent = AgentState {
            position: *position,
            age: age.years,
            deficit: &holdings.deficit,
            income: &holdings.income,
        };
        let outcome = evaluate_transition(*occupation, &agent, &ctx, rng);
        if outcome != Transition::default() {
            outcomes.push((entity, outcome));
        }
    }

    let mut deaths = 0;
    for (entity, outcome) in outcomes {
        let Ok((person, position, occupation, log)) =
            world.query_one_mut::<(&Person, &mut Point, &mut Occupation, &mut EventLog)>(entity)
        else {
            continue;
        };
        if let Some(target) = outcome.sail_to {
            *position = target;
            log.push(format!("They sailed to {}.", target));
        }
        match outcome.death {
            Some(cause) => {
                log.replace(match cause {
                    DeathCause::Starvation => "They died of hunger.",
                    DeathCause::OldAge => "They died of old age.",
                });
                *occupation = Occupation::Deceased;
                genealogy.record_death(person.id, turn);
                deaths += 1;
            }
            None => {
                if let Some(next) = outcome.next {
                    log.push(format!("They changed from {} to {}.", occupation, next));
                    *occupation = next;
                }
            }
        }
    }
    deaths
}
