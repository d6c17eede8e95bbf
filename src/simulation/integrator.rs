//! Shared physics step for every moving agent.

use ndarray::Array1;
use rand::Rng;

use super::agent::Agent;
use super::geometric_utils::{WorldBounds, limit, magnitude, random_unit};

/// Applies a steering force and advances the agent by one tick.
///
/// The force is clamped to `max_force`, velocity to `max_speed * speed_multiplier`.
/// An agent slower than `min_speed` is kicked in a random direction at
/// `min_speed`. The position is then contained in the world and the
/// acceleration cleared.
///
/// # Arguments
///
/// * `agent` - Agent to move
/// * `force` - Steering force for this tick
/// * `speed_multiplier` - Multiplier on the agent's base speed cap
/// * `min_speed` - Minimum speed floor
/// * `bounds` - World rectangle
/// * `rng` - Random number generator for the stall kick
pub fn integrate(
    agent: &mut Agent,
    force: &Array1<f32>,
    speed_multiplier: f32,
    min_speed: f32,
    bounds: &WorldBounds,
    rng: &mut impl Rng,
) {
    let force = limit(force.clone(), agent.max_force);
    agent.acc += &force;
    agent.vel += &agent.acc;
    agent.vel = limit(agent.vel.clone(), agent.max_speed * speed_multiplier);

    if min_speed > 0.0 && magnitude(&agent.vel) < min_speed {
        agent.vel = random_unit(rng) * min_speed;
    }

    agent.pos += &agent.vel;
    bounds.contain(&mut agent.pos, &mut agent.vel);
    agent.acc.fill(0.0);
}

/// Moves the agent along its current velocity without recomputing behavior.
pub fn dead_reckon(agent: &mut Agent, bounds: &WorldBounds) {
    agent.pos += &agent.vel;
    bounds.contain(&mut agent.pos, &mut agent.vel);
}
