//! Species collections and the id lookup used to resolve query results.
//!
//! Every species lives in its own [`EntityPool`]. The population also owns the
//! `AgentId -> (species, slot)` map, which is how weak references (predator
//! targets, spatial query hits) are turned back into agents. A lookup only
//! succeeds for live agents, so a dead target can never dangle.

use std::collections::HashMap;

use ndarray::Array1;

use super::agent::{Agent, AgentId, Behavior, Species};
use super::error::SimError;
use super::params::Params;
use super::pool::EntityPool;
use super::predator::PredatorState;

/// All agents in the world, grouped by species.
#[derive(Debug, Clone)]
pub struct Population {
    pools: Vec<EntityPool>,
    locations: HashMap<AgentId, (Species, usize)>,
    next_id: AgentId,
}

impl Population {
    /// Creates empty pools sized from the per-species capacities.
    pub fn new(params: &Params) -> Self {
        let pools = Species::ALL
            .iter()
            .map(|&species| EntityPool::new(species, params.species.get(species).capacity))
            .collect();
        Self {
            pools,
            locations: HashMap::new(),
            next_id: 1,
        }
    }

    /// Pool backing `species`.
    pub fn pool(&self, species: Species) -> &EntityPool {
        &self.pools[species.index()]
    }

    /// Number of live agents of `species`.
    pub fn count(&self, species: Species) -> usize {
        self.pool(species).iter_alive().count()
    }

    /// Total number of live agents.
    pub fn total(&self) -> usize {
        Species::ALL.iter().map(|&s| self.count(s)).sum()
    }

    /// Live agents of `species` in slot order.
    pub fn iter(&self, species: Species) -> impl Iterator<Item = &Agent> {
        self.pool(species).iter_alive().map(|(_, agent)| agent)
    }

    /// Looks up a live agent by id.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        let &(species, slot) = self.locations.get(&id)?;
        self.pools[species.index()]
            .get(slot)
            .filter(|agent| agent.alive && agent.id == id)
    }

    /// Mutable lookup of a live agent by id.
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let &(species, slot) = self.locations.get(&id)?;
        self.pools[species.index()]
            .get_mut(slot)
            .filter(|agent| agent.alive && agent.id == id)
    }

    /// Agent stored in a given slot, alive or not.
    pub fn at(&self, species: Species, slot: usize) -> Option<&Agent> {
        self.pools[species.index()].get(slot)
    }

    /// Mutable agent stored in a given slot.
    pub fn at_mut(&mut self, species: Species, slot: usize) -> Option<&mut Agent> {
        self.pools[species.index()].get_mut(slot)
    }

    /// Acquires a slot for `kind` and initialises a fresh agent at `pos`.
    ///
    /// # Arguments
    ///
    /// * `kind` - Species of the new agent
    /// * `pos` - Initial position
    /// * `params` - Simulation parameters (speeds, lifetimes)
    /// * `tick` - Current tick, used as the initial state-entry time
    ///
    /// # Returns
    ///
    /// The new agent's id, or [`SimError::Exhausted`] if the pool is full.
    pub fn spawn(
        &mut self,
        kind: Species,
        pos: &Array1<f32>,
        params: &Params,
        tick: u64,
    ) -> Result<AgentId, SimError> {
        let pool = &mut self.pools[kind.index()];
        let handle = pool.acquire()?;
        let id = self.next_id;
        self.next_id += 1;

        let sp = params.species.get(kind);
        let behavior = match kind {
            Species::Shark | Species::Orca => Behavior::Predator(PredatorState::new(tick)),
            Species::Food => Behavior::Consumable {
                ttl: params.food_lifetime,
            },
            Species::Egg => Behavior::Egg {
                hatch_in: params.egg_hatch_ticks,
            },
            Species::Krill | Species::Fish => Behavior::vacant(kind),
        };

        if let Some(agent) = pool.get_mut(handle.slot) {
            agent.id = id;
            agent.pos = pos.clone();
            agent.max_speed = sp.max_speed;
            agent.max_force = sp.max_force;
            agent.behavior = behavior;
            agent.alive = true;
        }
        self.locations.insert(id, (kind, handle.slot));
        Ok(id)
    }

    /// Marks a live agent dead. The slot is reclaimed by [`Population::reclaim`].
    ///
    /// # Returns
    ///
    /// `true` if a live agent was found.
    pub fn kill(&mut self, id: AgentId) -> bool {
        match self.get_mut(id) {
            Some(agent) => {
                agent.alive = false;
                true
            }
            None => false,
        }
    }

    /// Releases every slot whose agent died, returning the freed ids.
    pub fn reclaim(&mut self) -> Vec<AgentId> {
        let mut freed = Vec::new();
        for pool in &mut self.pools {
            for handle in pool.dead_handles() {
                let id = pool.get(handle.slot).map_or(0, |agent| agent.id);
                if pool.release(handle).is_ok() {
                    self.locations.remove(&id);
                    freed.push(id);
                }
            }
        }
        freed
    }
}
