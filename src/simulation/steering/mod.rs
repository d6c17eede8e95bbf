//! Steering behaviors for flocking and foraging agents.
//!
//! Individual behaviors implement [`SteeringBehavior`] and are composed by the
//! [`SteeringEngine`]. The free functions in this module are the primitives
//! shared with the predator state machine.

mod behavior;
mod edges;
mod engine;
mod fear;
mod flocking;
mod forage;
mod wander;

pub use behavior::{
    BehaviorKind, BehaviorSet, Nearby, Neighborhood, SteeringBehavior, SteeringContext,
};
pub use edges::EdgeAvoidance;
pub use engine::{BehaviorStack, SteeringEngine, SteeringOutput, default_stack};
pub use fear::{Fear, FleeResponse};
pub use flocking::{Alignment, Cohesion, Separation};
pub use forage::Forage;
pub use wander::Wander;

use ndarray::Array1;

use super::geometric_utils::{WorldBounds, limit, magnitude, set_magnitude, vec2};

/// Reynolds seek: the force that turns `vel` toward `target` at `speed`.
///
/// # Arguments
///
/// * `pos` - Current position
/// * `vel` - Current velocity
/// * `target` - Point to steer toward
/// * `speed` - Desired speed
/// * `max_force` - Force cap
pub fn seek(
    pos: &Array1<f32>,
    vel: &Array1<f32>,
    target: &Array1<f32>,
    speed: f32,
    max_force: f32,
) -> Array1<f32> {
    let desired = set_magnitude(&(target - pos), speed);
    limit(desired - vel, max_force)
}

/// Full-strength force pointing directly away from `threat`.
pub fn flee_from(pos: &Array1<f32>, threat: &Array1<f32>, max_force: f32) -> Array1<f32> {
    let away = pos - threat;
    if magnitude(&away) <= f32::EPSILON {
        // Sitting on the threat: any direction is away.
        return vec2(max_force, 0.0);
    }
    set_magnitude(&away, max_force)
}

/// Pushes an agent back toward the interior once it comes within `margin` of an edge.
///
/// The push grows linearly from zero at `margin` to `max_force` at the edge.
pub fn edge_avoidance(
    pos: &Array1<f32>,
    bounds: &WorldBounds,
    margin: f32,
    max_force: f32,
) -> Option<Array1<f32>> {
    if margin <= 0.0 {
        return None;
    }
    let extents = [bounds.width, bounds.height];
    let mut force = vec2(0.0, 0.0);
    let mut active = false;
    for axis in 0..2 {
        let near_low = margin - pos[axis];
        let near_high = pos[axis] - (extents[axis] - margin);
        if near_low > 0.0 {
            force[axis] += (near_low / margin).min(1.0);
            active = true;
        } else if near_high > 0.0 {
            force[axis] -= (near_high / margin).min(1.0);
            active = true;
        }
    }
    active.then(|| limit(force * max_force, max_force))
}

/// Gentle vertical pull toward a preferred depth band.
///
/// `band` is given as fractions of the world height.
pub fn depth_preference(
    pos: &Array1<f32>,
    bounds: &WorldBounds,
    band: (f32, f32),
    max_force: f32,
) -> Option<Array1<f32>> {
    let top = band.0 * bounds.height;
    let bottom = band.1 * bounds.height;
    let span = bounds.height.max(1.0);
    if pos[1] < top {
        Some(vec2(0.0, max_force * ((top - pos[1]) / span * 4.0).min(1.0)))
    } else if pos[1] > bottom {
        Some(vec2(0.0, -max_force * ((pos[1] - bottom) / span * 4.0).min(1.0)))
    } else {
        None
    }
}
