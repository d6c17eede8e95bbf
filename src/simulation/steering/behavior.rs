//! Abstract steering behavior trait and the shared neighborhood it reads.
//!
//! The engine runs one spatial query per agent and classifies the hits into a
//! [`Neighborhood`]; each behavior then reads only the slice it cares about.

use ndarray::Array1;

use super::super::agent::Agent;
use super::super::geometric_utils::WorldBounds;
use super::super::params::{FlockParams, SpeciesParams};
use super::super::population::Population;
use super::super::spatial::SpatialIndex;

/// Identifies a behavior, used to build the reduced set for low-detail agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorKind {
    /// Keep distance from close flockmates.
    Separation,
    /// Match flockmates' heading.
    Alignment,
    /// Move toward flockmates' centroid.
    Cohesion,
    /// Seek the nearest food.
    Forage,
    /// Stay away from the world edges.
    EdgeAvoidance,
}

/// Which behaviors an update evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorSet {
    /// Every behavior in the stack.
    Full,
    /// Separation, forage and edge avoidance only (fear and wander always run).
    Reduced,
}

impl BehaviorSet {
    /// Returns `true` if `kind` runs under this set.
    pub fn includes(self, kind: BehaviorKind) -> bool {
        match self {
            BehaviorSet::Full => true,
            BehaviorSet::Reduced => !matches!(kind, BehaviorKind::Alignment | BehaviorKind::Cohesion),
        }
    }
}

/// An agent found by the neighborhood query.
#[derive(Debug, Clone, Copy)]
pub struct Nearby<'a> {
    /// The neighbor itself.
    pub agent: &'a Agent,
    /// Squared distance to the querying agent.
    pub dist_sq: f32,
}

/// Query hits classified by their role relative to the querying agent.
#[derive(Debug, Default)]
pub struct Neighborhood<'a> {
    /// Agents of a species this one flocks with.
    pub flockmates: Vec<Nearby<'a>>,
    /// Agents of a species this one eats, within the forage radius.
    pub food: Vec<Nearby<'a>>,
    /// Agents of a species this one fears, within the fear radius.
    pub threats: Vec<Nearby<'a>>,
}

impl<'a> Neighborhood<'a> {
    /// Runs a single radius query around `agent` and sorts the hits by role.
    ///
    /// # Arguments
    ///
    /// * `agent` - The agent doing the sensing
    /// * `species` - Its species parameters
    /// * `flock` - Its flocking radii
    /// * `index` - Spatial index to query
    /// * `population` - Lookup that resolves ids to live agents
    pub fn gather(
        agent: &Agent,
        species: &SpeciesParams,
        flock: &FlockParams,
        index: &SpatialIndex,
        population: &'a Population,
    ) -> Self {
        let radius = flock
            .separation_radius
            .max(flock.alignment_radius)
            .max(flock.cohesion_radius)
            .max(flock.forage_radius)
            .max(flock.fear_radius);
        let forage_sq = flock.forage_radius * flock.forage_radius;
        let fear_sq = flock.fear_radius * flock.fear_radius;

        let mut neighborhood = Self::default();
        for hit in index.query_radius(&agent.pos, radius) {
            if hit.id == agent.id {
                continue;
            }
            let Some(other) = population.get(hit.id) else {
                continue;
            };
            let nearby = Nearby {
                agent: other,
                dist_sq: hit.dist_sq,
            };
            if species.flockmates.contains(&other.species) {
                neighborhood.flockmates.push(nearby);
            }
            if species.food.contains(&other.species) && hit.dist_sq <= forage_sq {
                neighborhood.food.push(nearby);
            }
            if species.threats.contains(&other.species) && hit.dist_sq <= fear_sq {
                neighborhood.threats.push(nearby);
            }
        }
        neighborhood
    }

    /// Nearest agent of `group` by squared distance; the first one found wins ties.
    pub fn nearest(group: &[Nearby<'a>]) -> Option<Nearby<'a>> {
        group.iter().fold(None, |best: Option<Nearby<'a>>, candidate| match best {
            Some(b) if b.dist_sq <= candidate.dist_sq => Some(b),
            _ => Some(*candidate),
        })
    }
}

/// Everything a behavior may read while computing its force.
#[derive(Debug)]
pub struct SteeringContext<'a> {
    /// The agent being steered.
    pub agent: &'a Agent,
    /// Its species parameters.
    pub species: &'a SpeciesParams,
    /// Its flocking radii and weights.
    pub flock: &'a FlockParams,
    /// Classified neighbors.
    pub neighborhood: &'a Neighborhood<'a>,
    /// World rectangle.
    pub bounds: WorldBounds,
}

/// Trait for steering behaviors that the engine sums into one force.
///
/// A behavior returns `None` when it has nothing to contribute, which lets the
/// engine fall back to wandering when every behavior is idle.
pub trait SteeringBehavior: Sync + Send {
    /// Computes this behavior's weighted force.
    fn steer(&self, ctx: &SteeringContext<'_>) -> Option<Array1<f32>>;

    /// Identifies the behavior.
    fn kind(&self) -> BehaviorKind;

    /// Returns a human-readable name for this behavior.
    fn name(&self) -> &str;
}
