//! Finite-state AI for apex predators.
//!
//! A predator patrols until prey comes within its hunt radius, hunts the
//! nearest prey, feeds for a while after a kill, and flees from larger
//! predators from any state. The state machine produces a steering force that
//! is applied by the shared integrator.

mod machine;
mod state;

pub use machine::{PredatorStateMachine, PredatorUpdate};
pub use state::{PredatorMode, PredatorState, alertness_target};
