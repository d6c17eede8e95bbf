use ndarray::Array1;
use rand::Rng;

use super::super::geometric_utils::{distance_sq, random_unit};
use super::behavior::SteeringContext;
use super::seek;

/// Idle behavior: drift toward a persistent random waypoint.
///
/// The waypoint survives between updates and is only regenerated once the agent
/// comes within `wander_tolerance` of it, which keeps idle paths smooth.
#[derive(Debug, Default)]
pub struct Wander;

impl Wander {
    /// Computes the wander force.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Steering context of the agent
    /// * `current` - Waypoint carried over from the previous update
    /// * `rng` - Random number generator for new waypoints
    ///
    /// # Returns
    ///
    /// The weighted force and the waypoint to keep for the next update.
    pub fn steer(
        &self,
        ctx: &SteeringContext<'_>,
        current: Option<&Array1<f32>>,
        rng: &mut impl Rng,
    ) -> (Array1<f32>, Array1<f32>) {
        let agent = ctx.agent;
        let tolerance_sq = ctx.flock.wander_tolerance * ctx.flock.wander_tolerance;
        let target = match current {
            Some(target) if distance_sq(&agent.pos, target) > tolerance_sq => target.clone(),
            _ => {
                let reach = rng.random_range(0.0..=ctx.flock.wander_distance.max(0.0));
                let mut target = &agent.pos + &(random_unit(rng) * reach);
                ctx.bounds.clamp(&mut target);
                target
            }
        };
        let force = seek(
            &agent.pos,
            &agent.vel,
            &target,
            agent.max_speed,
            agent.max_force,
        );
        (force * ctx.flock.wander_weight, target)
    }
}
