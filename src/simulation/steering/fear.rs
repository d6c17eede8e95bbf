use ndarray::Array1;

use super::super::agent::AgentId;
use super::behavior::{Neighborhood, SteeringContext};
use super::flee_from;

/// Reaction to the nearest threat.
#[derive(Debug, Clone, PartialEq)]
pub struct FleeResponse {
    /// Full-strength force directly away from the threat.
    pub force: Array1<f32>,
    /// Speed multiplier: `flee_speed_multiplier` inside the flee radius, 1 otherwise.
    pub speed_multiplier: f32,
    /// The threat being fled from.
    pub threat: AgentId,
}

/// Fear overrides every other behavior while a threat is inside the fear radius.
///
/// Unlike the summed behaviors it is not part of the stack; the engine checks
/// it first and discards the accumulated force when it fires.
#[derive(Debug, Default)]
pub struct Fear;

impl Fear {
    /// Flee response for the nearest threat, or `None` if no threat is near.
    pub fn respond(&self, ctx: &SteeringContext<'_>) -> Option<FleeResponse> {
        let threat = Neighborhood::nearest(&ctx.neighborhood.threats)?;
        let flee_sq = ctx.flock.flee_radius * ctx.flock.flee_radius;
        let speed_multiplier = if threat.dist_sq <= flee_sq {
            ctx.flock.flee_speed_multiplier
        } else {
            1.0
        };
        Some(FleeResponse {
            force: flee_from(&ctx.agent.pos, &threat.agent.pos, ctx.agent.max_force),
            speed_multiplier,
            threat: threat.agent.id,
        })
    }
}
