use ndarray::Array1;

use super::behavior::{BehaviorKind, Nearby, Neighborhood, SteeringBehavior, SteeringContext};
use super::seek;

/// Seeks the nearest food-category agent inside the forage radius.
#[derive(Debug, Default)]
pub struct Forage;

impl Forage {
    /// Nearest food item. Ties keep whichever the query returned first.
    pub fn nearest<'a>(ctx: &SteeringContext<'a>) -> Option<Nearby<'a>> {
        Neighborhood::nearest(&ctx.neighborhood.food)
    }
}

impl SteeringBehavior for Forage {
    fn steer(&self, ctx: &SteeringContext<'_>) -> Option<Array1<f32>> {
        let food = Self::nearest(ctx)?;
        let agent = ctx.agent;
        let force = seek(
            &agent.pos,
            &agent.vel,
            &food.agent.pos,
            agent.max_speed,
            agent.max_force,
        );
        Some(force * ctx.flock.forage_weight)
    }

    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Forage
    }

    fn name(&self) -> &str {
        "Forage"
    }
}
