//! Classic boids rules: separation, alignment and cohesion.

use ndarray::Array1;

use super::super::geometric_utils::{limit, set_magnitude, zero};
use super::behavior::{BehaviorKind, SteeringBehavior, SteeringContext};
use super::seek;

/// Steers away from flockmates closer than the separation radius.
///
/// Each neighbor contributes a unit vector pointing away from it, scaled by the
/// inverse of its distance, so the closest neighbors push hardest.
#[derive(Debug, Default)]
pub struct Separation;

impl SteeringBehavior for Separation {
    fn steer(&self, ctx: &SteeringContext<'_>) -> Option<Array1<f32>> {
        let radius_sq = ctx.flock.separation_radius * ctx.flock.separation_radius;
        let agent = ctx.agent;
        let mut sum = zero();
        let mut count = 0usize;

        for nearby in &ctx.neighborhood.flockmates {
            if nearby.dist_sq >= radius_sq {
                continue;
            }
            let dist = nearby.dist_sq.sqrt().max(1e-3);
            let away = (&agent.pos - &nearby.agent.pos) / dist;
            sum += &(away / dist);
            count += 1;
        }
        if count == 0 {
            return None;
        }

        let desired = set_magnitude(&(sum / count as f32), agent.max_speed);
        let force = limit(desired - &agent.vel, agent.max_force);
        Some(force * ctx.flock.separation_weight)
    }

    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Separation
    }

    fn name(&self) -> &str {
        "Separation"
    }
}

/// Steers toward the average heading of flockmates within the alignment radius.
#[derive(Debug, Default)]
pub struct Alignment;

impl SteeringBehavior for Alignment {
    fn steer(&self, ctx: &SteeringContext<'_>) -> Option<Array1<f32>> {
        let radius_sq = ctx.flock.alignment_radius * ctx.flock.alignment_radius;
        let agent = ctx.agent;
        let mut sum = zero();
        let mut count = 0usize;

        for nearby in &ctx.neighborhood.flockmates {
            if nearby.dist_sq <= radius_sq {
                sum += &nearby.agent.vel;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }

        let desired = set_magnitude(&(sum / count as f32), agent.max_speed);
        let force = limit(desired - &agent.vel, agent.max_force);
        Some(force * ctx.flock.alignment_weight)
    }

    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Alignment
    }

    fn name(&self) -> &str {
        "Alignment"
    }
}

/// Steers toward the centroid of flockmates within the cohesion radius.
#[derive(Debug, Default)]
pub struct Cohesion;

impl SteeringBehavior for Cohesion {
    fn steer(&self, ctx: &SteeringContext<'_>) -> Option<Array1<f32>> {
        let radius_sq = ctx.flock.cohesion_radius * ctx.flock.cohesion_radius;
        let agent = ctx.agent;
        let mut centroid = zero();
        let mut count = 0usize;

        for nearby in &ctx.neighborhood.flockmates {
            if nearby.dist_sq <= radius_sq {
                centroid += &nearby.agent.pos;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }

        let centroid = centroid / count as f32;
        let force = seek(
            &agent.pos,
            &agent.vel,
            &centroid,
            agent.max_speed,
            agent.max_force,
        );
        Some(force * ctx.flock.cohesion_weight)
    }

    fn kind(&self) -> BehaviorKind {
        BehaviorKind::Cohesion
    }

    fn name(&self) -> &str {
        "Cohesion"
    }
}
