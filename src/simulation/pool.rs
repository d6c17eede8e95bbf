//! Fixed-capacity recycling pool of agent records.
//!
//! Slots are allocated lazily on the first spawn request that finds the free
//! list empty, never beyond `capacity`. A released slot is reset to a vacant
//! record (id 0, no target) before it goes back on the free list, and its
//! generation is bumped so outstanding handles to it turn stale.

use super::agent::{Agent, Species};
use super::error::SimError;

/// Handle to an acquired pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    /// Slot index inside the pool.
    pub slot: usize,
    /// Generation of the slot when the handle was issued.
    pub generation: u32,
}

#[derive(Debug, Clone)]
struct PoolSlot {
    generation: u32,
    occupied: bool,
    agent: Agent,
}

/// Capacity-bounded pool with a LIFO free list.
#[derive(Debug, Clone)]
pub struct EntityPool {
    species: Species,
    capacity: usize,
    slots: Vec<PoolSlot>,
    free: Vec<usize>,
    acquired: u64,
    released: u64,
}

impl EntityPool {
    /// Creates an empty pool for `species` holding at most `capacity` agents.
    pub fn new(species: Species, capacity: usize) -> Self {
        Self {
            species,
            capacity,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            acquired: 0,
            released: 0,
        }
    }

    /// Species this pool was created for.
    pub fn species(&self) -> Species {
        self.species
    }

    /// Maximum number of simultaneously occupied slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        (self.acquired - self.released) as usize
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total `acquire` successes minus total `release` successes.
    pub fn outstanding(&self) -> u64 {
        self.acquired - self.released
    }

    /// Returns `true` if the next `acquire` would fail.
    pub fn is_exhausted(&self) -> bool {
        self.free.is_empty() && self.slots.len() >= self.capacity
    }

    /// Takes a free slot and resets it to a vacant agent of the pool's species.
    ///
    /// # Returns
    ///
    /// A handle to the slot, or [`SimError::Exhausted`] if every slot is in use.
    /// The pool never grows past its capacity.
    pub fn acquire(&mut self) -> Result<PoolHandle, SimError> {
        let species = self.species;
        let slot = if let Some(slot) = self.free.pop() {
            slot
        } else if self.slots.len() < self.capacity {
            self.slots.push(PoolSlot {
                generation: 0,
                occupied: false,
                agent: Agent::vacant(species),
            });
            self.slots.len() - 1
        } else {
            return Err(SimError::Exhausted(species));
        };

        let entry = &mut self.slots[slot];
        entry.occupied = true;
        entry.agent = Agent::vacant(species);
        self.acquired += 1;
        Ok(PoolHandle {
            slot,
            generation: entry.generation,
        })
    }

    /// Returns a slot to the free list, clearing its identity-bearing fields.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), SimError> {
        let stale = SimError::StaleHandle {
            slot: handle.slot,
            generation: handle.generation,
        };
        let entry = self.slots.get_mut(handle.slot).ok_or_else(|| stale.clone())?;
        if !entry.occupied || entry.generation != handle.generation {
            return Err(stale);
        }
        entry.agent = Agent::vacant(self.species);
        entry.occupied = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(handle.slot);
        self.released += 1;
        Ok(())
    }

    /// Handle for an occupied slot.
    pub fn handle(&self, slot: usize) -> Option<PoolHandle> {
        self.slots
            .get(slot)
            .filter(|entry| entry.occupied)
            .map(|entry| PoolHandle {
                slot,
                generation: entry.generation,
            })
    }

    /// Agent in an occupied slot.
    pub fn get(&self, slot: usize) -> Option<&Agent> {
        self.slots
            .get(slot)
            .filter(|entry| entry.occupied)
            .map(|entry| &entry.agent)
    }

    /// Mutable agent in an occupied slot.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Agent> {
        self.slots
            .get_mut(slot)
            .filter(|entry| entry.occupied)
            .map(|entry| &mut entry.agent)
    }

    /// Agent behind a handle, if the handle is still current.
    pub fn resolve(&self, handle: PoolHandle) -> Option<&Agent> {
        self.slots
            .get(handle.slot)
            .filter(|entry| entry.occupied && entry.generation == handle.generation)
            .map(|entry| &entry.agent)
    }

    /// Occupied slots holding live agents, in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = (usize, &Agent)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.occupied && entry.agent.alive)
            .map(|(slot, entry)| (slot, &entry.agent))
    }

    /// Handles of occupied slots whose agent is no longer alive.
    pub fn dead_handles(&self) -> Vec<PoolHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.occupied && !entry.agent.alive)
            .map(|(slot, entry)| PoolHandle {
                slot,
                generation: entry.generation,
            })
            .collect()
    }
}
