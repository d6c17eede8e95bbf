use ndarray::Array1;
use rand::Rng;

use super::super::agent::{Agent, AgentId};
use super::super::geometric_utils::zero;
use super::super::params::Params;
use super::super::population::Population;
use super::super::spatial::SpatialIndex;
use super::behavior::{BehaviorSet, Neighborhood, SteeringBehavior, SteeringContext};
use super::edges::EdgeAvoidance;
use super::fear::Fear;
use super::flocking::{Alignment, Cohesion, Separation};
use super::forage::Forage;
use super::wander::Wander;

/// Ordered collection of summed behaviors, built once per ecosystem.
pub type BehaviorStack = Vec<Box<dyn SteeringBehavior>>;

/// Builds the standard stack: separation, alignment, cohesion, forage, edge avoidance.
pub fn default_stack() -> BehaviorStack {
    vec![
        Box::new(Separation),
        Box::new(Alignment),
        Box::new(Cohesion),
        Box::new(Forage),
        Box::new(EdgeAvoidance),
    ]
}

/// Result of one steering evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringOutput {
    /// Combined steering force, not yet clamped to `max_force`.
    pub force: Array1<f32>,
    /// Multiplier on `max_speed` for this update.
    pub speed_multiplier: f32,
    /// Wander waypoint to persist in the agent's state.
    pub wander_target: Option<Array1<f32>>,
    /// Food item inside the eat radius, to be consumed by the caller. `None` while afraid.
    pub consumed: Option<AgentId>,
    /// Whether fear overrode the other behaviors.
    pub afraid: bool,
}

impl SteeringOutput {
    fn idle(agent: &Agent) -> Self {
        Self {
            force: zero(),
            speed_multiplier: 1.0,
            wander_target: agent.flock_state().and_then(|s| s.wander_target.clone()),
            consumed: None,
            afraid: false,
        }
    }
}

/// Composes steering behaviors for flocking and foraging agents.
///
/// The engine borrows the index, the population and the parameters for the
/// duration of one agent's update; it never mutates them.
pub struct SteeringEngine<'a> {
    index: &'a SpatialIndex,
    population: &'a Population,
    params: &'a Params,
}

impl<'a> SteeringEngine<'a> {
    /// Creates an engine over the current world state.
    pub fn new(index: &'a SpatialIndex, population: &'a Population, params: &'a Params) -> Self {
        Self {
            index,
            population,
            params,
        }
    }

    /// Computes the steering output for `agent`.
    ///
    /// # Arguments
    ///
    /// * `agent` - The agent to steer
    /// * `behaviors` - Summed behaviors, filtered by `set`
    /// * `set` - Full or reduced behavior set
    /// * `rng` - Random number generator for wander waypoints
    ///
    /// # Returns
    ///
    /// The steering output; a zero force for species without flocking parameters.
    pub fn steer(
        &self,
        agent: &Agent,
        behaviors: &[Box<dyn SteeringBehavior>],
        set: BehaviorSet,
        rng: &mut impl Rng,
    ) -> SteeringOutput {
        let species = self.params.species.get(agent.species);
        let Some(flock) = species.flock.as_ref() else {
            return SteeringOutput::idle(agent);
        };

        let neighborhood = Neighborhood::gather(agent, species, flock, self.index, self.population);
        let ctx = SteeringContext {
            agent,
            species,
            flock,
            neighborhood: &neighborhood,
            bounds: self.params.bounds(),
        };
        let mut output = SteeringOutput::idle(agent);

        // A fleeing agent neither forages nor eats.
        if let Some(flee) = Fear.respond(&ctx) {
            output.force = flee.force;
            output.speed_multiplier = flee.speed_multiplier;
            output.afraid = true;
            return output;
        }

        let eat_sq = flock.eat_radius * flock.eat_radius;
        output.consumed = Forage::nearest(&ctx)
            .filter(|food| food.dist_sq <= eat_sq)
            .map(|food| food.agent.id);

        let mut fired = false;
        for behavior in behaviors.iter().filter(|b| set.includes(b.kind())) {
            if let Some(force) = behavior.steer(&ctx) {
                output.force += &force;
                fired = true;
            }
        }

        if !fired {
            let current = agent.flock_state().and_then(|s| s.wander_target.as_ref());
            let (force, target) = Wander.steer(&ctx, current, rng);
            output.force = force;
            output.wander_target = Some(target);
        }
        output
    }
}
