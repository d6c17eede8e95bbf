//! # Shoal - Multi-Species Agent Simulation
//!
//! A real-time simulation of an open-water ecosystem: schooling krill and fish,
//! drifting food, eggs that hatch into fish, and apex predators (sharks, orcas)
//! that patrol, hunt, feed and flee.
//!
//! ## Features
//!
//! - Uniform-grid spatial index for radius queries
//! - Composable steering behaviors (separation, alignment, cohesion, forage,
//!   edge avoidance, fear, wander)
//! - Finite-state predator AI with swept capture and alertness
//! - Frame-budget scheduler with per-species batches and distance-based LOD
//! - Fixed-capacity recycling pools for every species
//! - Seeded, reproducible runs
//!
//! ## Core Modules
//!
//! - [`simulation::ecosystem`] - Owns the world and advances it tick by tick
//! - [`simulation::spatial`] - Neighbor queries
//! - [`simulation::steering`] - Flocking and foraging forces
//! - [`simulation::predator`] - Predator state machine
//! - [`simulation::scheduler`] - Batching and LOD
//! - [`simulation::pool`] - Agent storage and recycling

/// Core simulation logic and data structures.
pub mod simulation {
    /// Agents, species tags and per-species behavior state.
    pub mod agent;
    /// Main ecosystem simulation.
    pub mod ecosystem;
    /// Error types.
    pub mod error;
    /// Recent event log.
    pub mod event_log;
    /// Geometric utility functions and world bounds.
    pub mod geometric_utils;
    /// Shared physics step.
    pub mod integrator;
    /// Trait for entities that can be placed in the spatial index.
    ///
    /// The [`locatable::Locatable`] trait is implemented by every agent; the
    /// spatial index only needs an id and a position.
    pub mod locatable;
    /// Simulation parameters.
    pub mod params;
    /// Fixed-capacity agent pools.
    pub mod pool;
    /// Species pools and id lookup.
    pub mod population;
    /// Predator state machine.
    pub mod predator;
    /// Update batching and level of detail.
    pub mod scheduler;
    /// Uniform-grid spatial index.
    pub mod spatial;
    /// Steering behaviors.
    pub mod steering;
}
