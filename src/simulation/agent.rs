//! The universal simulated entity and its per-species behavior state.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::geometric_utils::{self, zero};
use super::locatable::Locatable;
use super::predator::{PredatorMode, PredatorState};

/// Unique agent identifier. Ids start at 1 and are never reused; 0 marks a vacant pool slot.
pub type AgentId = usize;

/// Species tag. The declaration order is the per-tick processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    /// Small schooling plankton eaters.
    Krill,
    /// Schooling prey fish.
    Fish,
    /// Apex predator hunting fish.
    Shark,
    /// Larger apex predator hunting sharks and fish.
    Orca,
    /// Drifting food pellets.
    Food,
    /// Fish eggs that hatch into fish.
    Egg,
}

impl Species {
    /// All species in processing order.
    pub const ALL: [Species; 6] = [
        Species::Krill,
        Species::Fish,
        Species::Shark,
        Species::Orca,
        Species::Food,
        Species::Egg,
    ];

    /// Dense index used for per-species tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Species whose behavior is computed through the update scheduler.
    pub fn is_scheduled(self) -> bool {
        matches!(
            self,
            Species::Krill | Species::Fish | Species::Shark | Species::Orca
        )
    }
}

/// State of a flocking/foraging agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlockState {
    /// Persistent wander waypoint, regenerated on arrival.
    pub wander_target: Option<Array1<f32>>,
    /// Speed multiplier applied while a threat is inside the flee radius.
    pub speed_multiplier: f32,
    /// Whether fear overrode the other behaviors on the last full update.
    pub afraid: bool,
}

/// Variant-specific behavior state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// Krill and fish.
    Flock(FlockState),
    /// Sharks and orcas.
    Predator(PredatorState),
    /// Food pellets, removed once `ttl` reaches zero.
    Consumable {
        /// Remaining lifetime in ticks.
        ttl: u64,
    },
    /// Eggs, transferred to the fish pool once `hatch_in` reaches zero.
    Egg {
        /// Ticks until hatching.
        hatch_in: u64,
    },
}

impl Behavior {
    /// The blank behavior state for a species, with no references to other agents.
    pub fn vacant(species: Species) -> Self {
        match species {
            Species::Krill | Species::Fish => Behavior::Flock(FlockState {
                speed_multiplier: 1.0,
                ..FlockState::default()
            }),
            Species::Shark | Species::Orca => Behavior::Predator(PredatorState::new(0)),
            Species::Food => Behavior::Consumable { ttl: 0 },
            Species::Egg => Behavior::Egg { hatch_in: 0 },
        }
    }
}

/// A simulated agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier (0 while the pool slot is vacant).
    pub id: AgentId,
    /// Species tag.
    pub species: Species,
    /// Position in world units.
    pub pos: Array1<f32>,
    /// Velocity in world units per tick.
    pub vel: Array1<f32>,
    /// Accumulated acceleration for the current tick.
    pub acc: Array1<f32>,
    /// Base speed cap.
    pub max_speed: f32,
    /// Steering force cap.
    pub max_force: f32,
    /// Variant-specific behavior state.
    pub behavior: Behavior,
    /// Liveness flag; dead agents are reclaimed at the end of the tick.
    pub alive: bool,
    /// Ticks since spawn.
    pub age: u64,
    /// Meals eaten since the last egg was laid.
    pub meals: u32,
}

impl Agent {
    /// Creates a vacant agent record of the given species.
    pub fn vacant(species: Species) -> Self {
        Self {
            id: 0,
            species,
            pos: zero(),
            vel: zero(),
            acc: zero(),
            max_speed: 0.0,
            max_force: 0.0,
            behavior: Behavior::vacant(species),
            alive: false,
            age: 0,
            meals: 0,
        }
    }

    /// Returns `true` if position, velocity and acceleration are all finite.
    pub fn is_finite(&self) -> bool {
        geometric_utils::is_finite(&self.pos)
            && geometric_utils::is_finite(&self.vel)
            && geometric_utils::is_finite(&self.acc)
    }

    /// Current predator mode, if this agent is a predator.
    pub fn predator_mode(&self) -> Option<PredatorMode> {
        match &self.behavior {
            Behavior::Predator(state) => Some(state.mode),
            _ => None,
        }
    }

    /// Current predator state, if this agent is a predator.
    pub fn predator_state(&self) -> Option<&PredatorState> {
        match &self.behavior {
            Behavior::Predator(state) => Some(state),
            _ => None,
        }
    }

    /// Current flock state, if this agent flocks.
    pub fn flock_state(&self) -> Option<&FlockState> {
        match &self.behavior {
            Behavior::Flock(state) => Some(state),
            _ => None,
        }
    }
}

impl Locatable for Agent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn pos(&self) -> &Array1<f32> {
        &self.pos
    }
}
