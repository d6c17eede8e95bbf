//! Trait for entities that can be placed in the spatial index.
//!
//! This trait provides the minimal view the [`SpatialIndex`](super::spatial::SpatialIndex)
//! needs: a stable identifier and a position in world space.

use ndarray::Array1;

use super::agent::AgentId;

/// Trait for entities with an identity and a position in 2D space.
///
/// Any type that implements this trait can be inserted into, relocated in and
/// removed from the spatial index.
pub trait Locatable {
    /// Returns the entity's unique identifier.
    fn id(&self) -> AgentId;

    /// Returns a reference to the entity's position.
    ///
    /// # Returns
    ///
    /// A reference to the 2D position vector.
    fn pos(&self) -> &Array1<f32>;
}
