//! Frame-budget scheduling: per-species batches and distance-based LOD tiers.
//!
//! Each tick the scheduler visits one batch of `batch_size` live agents per
//! scheduled species, resuming where the previous tick's batch ended. A visited
//! agent gets a full behavior update if its LOD cadence allows it, otherwise it
//! is dead-reckoned. Agents outside the batch are always dead-reckoned, so
//! every agent still moves every tick.

use std::collections::HashMap;

use ndarray::Array1;
use rayon::prelude::*;

use super::agent::{Agent, AgentId, Species};
use super::geometric_utils::distance_sq;
use super::params::Params;
use super::population::Population;
use super::steering::BehaviorSet;

/// Level-of-detail tier derived from the distance to the viewpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LodTier {
    /// Near the viewpoint: full behavior set every visit.
    High,
    /// Mid range: full behavior set every second tick.
    Medium,
    /// Far away: reduced behavior set every fourth tick.
    Low,
}

impl LodTier {
    /// Minimum number of ticks between two full updates.
    pub fn cadence(self) -> u64 {
        match self {
            LodTier::High => 1,
            LodTier::Medium => 2,
            LodTier::Low => 4,
        }
    }

    /// Behaviors evaluated for agents in this tier.
    pub fn behavior_set(self) -> BehaviorSet {
        match self {
            LodTier::High | LodTier::Medium => BehaviorSet::Full,
            LodTier::Low => BehaviorSet::Reduced,
        }
    }
}

/// Scheduling bookkeeping for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodAssignment {
    /// Tier from the most recent plan.
    pub tier: LodTier,
    /// First tick at which the next full update may run.
    pub next_eligible_tick: u64,
    /// Tick of the last batch visit.
    pub last_visited_tick: Option<u64>,
}

/// How an agent is advanced this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Recompute behavior with the given set, then integrate.
    Full(BehaviorSet),
    /// Visited by the batch but not yet eligible for its tier; dead-reckoned.
    Deferred,
    /// Outside this tick's batch; dead-reckoned.
    DeadReckon,
}

/// One scheduled agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedUpdate {
    /// Species of the agent.
    pub species: Species,
    /// Pool slot of the agent.
    pub slot: usize,
    /// Agent id at planning time.
    pub id: AgentId,
    /// Update mode.
    pub mode: UpdateMode,
}

/// Ordered list of updates for one tick.
#[derive(Debug, Clone, Default)]
pub struct TickPlan {
    /// Tick the plan was made for.
    pub tick: u64,
    /// Entries in species order, then slot order.
    pub entries: Vec<PlannedUpdate>,
}

impl TickPlan {
    /// Number of entries with a full behavior update.
    pub fn full_updates(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.mode, UpdateMode::Full(_)))
            .count()
    }
}

/// Chooses which agents get a full behavior update each tick.
#[derive(Debug, Clone)]
pub struct UpdateScheduler {
    batch_size: usize,
    medium_distance_sq: f32,
    low_distance_sq: f32,
    cursors: [usize; Species::ALL.len()],
    assignments: HashMap<AgentId, LodAssignment>,
}

impl UpdateScheduler {
    /// Creates a scheduler using the batch size and LOD distances from `params`.
    pub fn new(params: &Params) -> Self {
        Self {
            batch_size: params.batch_size.max(1),
            medium_distance_sq: params.lod_medium_distance * params.lod_medium_distance,
            low_distance_sq: params.lod_low_distance * params.lod_low_distance,
            cursors: [0; Species::ALL.len()],
            assignments: HashMap::new(),
        }
    }

    /// Tier for an agent at `pos` given the viewpoint.
    pub fn tier_for(&self, pos: &Array1<f32>, viewpoint: &Array1<f32>) -> LodTier {
        let d = distance_sq(pos, viewpoint);
        if d > self.low_distance_sq {
            LodTier::Low
        } else if d > self.medium_distance_sq {
            LodTier::Medium
        } else {
            LodTier::High
        }
    }

    /// Bookkeeping for `id`, if it has been visited.
    pub fn assignment(&self, id: AgentId) -> Option<&LodAssignment> {
        self.assignments.get(&id)
    }

    /// Pool slot at or after which the next batch of `species` starts.
    pub fn cursor(&self, species: Species) -> usize {
        self.cursors[species.index()]
    }

    /// Drops the bookkeeping of a reclaimed agent.
    pub fn forget(&mut self, id: AgentId) {
        self.assignments.remove(&id);
    }

    /// Plans the updates for `tick`.
    ///
    /// # Arguments
    ///
    /// * `tick` - Tick being planned
    /// * `viewpoint` - Camera center in world coordinates
    /// * `population` - Current agents
    ///
    /// # Returns
    ///
    /// One entry per live scheduled agent, in species order then slot order.
    pub fn plan(&mut self, tick: u64, viewpoint: &Array1<f32>, population: &Population) -> TickPlan {
        let mut plan = TickPlan {
            tick,
            entries: Vec::with_capacity(population.total()),
        };

        for species in Species::ALL.into_iter().filter(|s| s.is_scheduled()) {
            let alive: Vec<(usize, &Agent)> = population.pool(species).iter_alive().collect();
            let n = alive.len();
            if n == 0 {
                self.cursors[species.index()] = 0;
                continue;
            }

            // Tier computation is read-only and order-independent.
            let tiers: Vec<LodTier> = alive
                .par_iter()
                .map(|(_, agent)| self.tier_for(&agent.pos, viewpoint))
                .collect();

            // The cursor is a slot number, so deaths before it do not shift the batch.
            let cursor = self.cursors[species.index()];
            let start = alive.iter().position(|(slot, _)| *slot >= cursor).unwrap_or(0);
            let len = self.batch_size.min(n);
            let end = start + len;
            let last = alive[(end - 1) % n].0;
            self.cursors[species.index()] = last + 1;
            let in_batch = |i: usize| (start..end).contains(&i) || (end > n && i < end - n);

            for (i, ((slot, agent), tier)) in alive.iter().zip(tiers).enumerate() {
                let assignment = self.assignments.entry(agent.id).or_insert(LodAssignment {
                    tier,
                    next_eligible_tick: tick,
                    last_visited_tick: None,
                });
                assignment.tier = tier;
                let mode = if in_batch(i) {
                    visit(assignment, tick)
                } else {
                    UpdateMode::DeadReckon
                };
                plan.entries.push(PlannedUpdate {
                    species,
                    slot: *slot,
                    id: agent.id,
                    mode,
                });
            }
        }
        plan
    }
}

fn visit(assignment: &mut LodAssignment, tick: u64) -> UpdateMode {
    assignment.last_visited_tick = Some(tick);
    if tick >= assignment.next_eligible_tick {
        assignment.next_eligible_tick = tick + assignment.tier.cadence();
        UpdateMode::Full(assignment.tier.behavior_set())
    } else {
        UpdateMode::Deferred
    }
}
