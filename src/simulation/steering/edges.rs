use ndarray::Array1;

use super::behavior::{BehaviorKind, SteeringBehavior, SteeringContext};
use super::edge_avoidance;

/// Turns agents back toward the interior as they approach a world edge.
#[derive(Debug, Default)]
pub struct EdgeAvoidance;

impl SteeringBehavior for EdgeAvoidance {
    fn steer(&self, ctx: &SteeringContext<'_>) -> Option<Array1<f32>> {
        edge_avoidance(
            &ctx.agent.pos,
            &ctx.bounds,
            ctx.species.edge_margin,
            ctx.agent.max_force,
        )
        .map(|force| force * ctx.flock.edge_weight)
    }

    fn kind(&self) -> BehaviorKind {
        BehaviorKind::EdgeAvoidance
    }

    fn name(&self) -> &str {
        "EdgeAvoidance"
    }
}
