//! Error types for the simulation core.
//!
//! [`SimError`] covers runtime failures inside a tick; none of them cross a tick
//! boundary. [`ConfigError`] is only produced while loading or validating
//! [`Params`](super::params::Params) at startup.

use thiserror::Error;

use super::agent::{AgentId, Species};

/// Errors raised by the spatial index, entity pools and the spawn surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// The agent is already present in the spatial index.
    #[error("agent {0} is already indexed")]
    DuplicateInsert(AgentId),

    /// The agent is not present in the spatial index.
    #[error("agent {0} is not indexed")]
    NotFound(AgentId),

    /// The agent's position is NaN or infinite and cannot be bucketed.
    #[error("agent {0} has a non-finite position")]
    InvalidPosition(AgentId),

    /// The species pool has no free slot left.
    #[error("{0:?} pool is exhausted")]
    Exhausted(Species),

    /// A pool handle refers to a slot that has since been released or reused.
    #[error("pool slot {slot} no longer holds generation {generation}")]
    StaleHandle {
        /// Slot index inside the pool.
        slot: usize,
        /// Generation the handle was issued for.
        generation: u32,
    },

    /// No live agent with this id exists.
    #[error("no live agent with id {0}")]
    UnknownAgent(AgentId),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A parameter is outside its allowed range.
    #[error("Invalid parameter: {0}")]
    Invalid(String),
}
