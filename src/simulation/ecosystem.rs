//! Main ecosystem simulation.
//!
//! The ecosystem owns every species pool, the spatial index, the update
//! scheduler and the seeded random number generator. One call to
//! [`Ecosystem::advance_tick`] runs a full simulation step:
//! - the scheduler plans which agents get a full behavior update
//! - flocking agents are steered, predators run their state machine
//! - each moved agent is integrated and re-indexed right away
//! - food sinks and expires, eggs count down to hatching
//! - dead agents are reclaimed, then pending spawns are applied

use ndarray::Array1;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::agent::{Agent, AgentId, Behavior, Species};
use super::error::{ConfigError, SimError};
use super::event_log::{EventKind, EventLog};
use super::geometric_utils::{is_finite, random_unit, vec2};
use super::integrator::{dead_reckon, integrate};
use super::params::Params;
use super::population::Population;
use super::predator::PredatorStateMachine;
use super::scheduler::{PlannedUpdate, UpdateMode, UpdateScheduler};
use super::spatial::{SpatialIndex, SpatialQueryResult};
use super::steering::{BehaviorSet, BehaviorStack, SteeringEngine, default_stack};

/// Summary of one simulation tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick that was advanced.
    pub tick: u64,
    /// Agents that recomputed their behavior.
    pub full_updates: usize,
    /// Agents visited by their batch but held back by their LOD cadence.
    pub deferred: usize,
    /// Agents outside this tick's batches.
    pub dead_reckoned: usize,
    /// Prey captured by predators.
    pub predations: usize,
    /// Food items eaten by flocking agents.
    pub consumptions: usize,
    /// Eggs laid.
    pub eggs_laid: usize,
    /// Eggs hatched into fish.
    pub hatched: usize,
    /// Food items added by replenishment.
    pub food_spawned: usize,
    /// Food items that sank past their lifetime.
    pub food_expired: usize,
    /// Spawn requests dropped because the species pool was full.
    pub skipped_spawns: Vec<Species>,
    /// Agents removed because their state became non-finite.
    pub deactivated: usize,
    /// Pool slots released at the end of the tick.
    pub reclaimed: usize,
    /// Spatial index operations that failed and were skipped.
    pub index_errors: usize,
}

/// Spawn request deferred to the end of the tick.
#[derive(Debug, Clone)]
struct PendingSpawn {
    kind: Species,
    pos: Array1<f32>,
}

/// The simulated world.
pub struct Ecosystem {
    params: Params,
    population: Population,
    index: SpatialIndex,
    scheduler: UpdateScheduler,
    behaviors: BehaviorStack,
    rng: ChaCha8Rng,
    tick: u64,
    event_log: EventLog,
    pending: Vec<PendingSpawn>,
}

impl Ecosystem {
    /// Creates an ecosystem and seeds every species with its initial count.
    ///
    /// # Arguments
    ///
    /// * `params` - Simulation parameters, validated here
    ///
    /// # Returns
    ///
    /// The new ecosystem, or a [`ConfigError`] if the parameters are invalid.
    pub fn new(params: Params) -> Result<Self, ConfigError> {
        params.validate()?;

        let bounds = params.bounds();
        let cell_size = params.effective_cell_size();
        let mut ecosystem = Self {
            population: Population::new(&params),
            index: SpatialIndex::new(bounds.width, bounds.height, cell_size),
            scheduler: UpdateScheduler::new(&params),
            behaviors: default_stack(),
            rng: ChaCha8Rng::seed_from_u64(params.seed),
            tick: 0,
            event_log: EventLog::new(params.event_log_size),
            pending: Vec::new(),
            params,
        };

        for species in Species::ALL {
            let count = ecosystem.params.species.get(species).initial_count;
            let speed = ecosystem.params.species.get(species).max_speed;
            for _ in 0..count {
                let pos = bounds.random_point(&mut ecosystem.rng);
                let id = ecosystem
                    .insert_agent(species, &pos)
                    .map_err(|e| ConfigError::Invalid(format!("initial {species:?}: {e}")))?;
                if species.is_scheduled() {
                    let vel = random_unit(&mut ecosystem.rng) * (speed * 0.5);
                    if let Some(agent) = ecosystem.population.get_mut(id) {
                        agent.vel = vel;
                    }
                }
            }
        }

        info!(
            "ecosystem created: {}x{} world, cell size {}, {} agents",
            bounds.width,
            bounds.height,
            cell_size,
            ecosystem.population.total()
        );
        Ok(ecosystem)
    }

    /// Simulation parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Number of ticks advanced so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// All species pools.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// The spatial index.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// The update scheduler.
    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    /// Recent simulation events, newest first.
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Live agents of `species` in slot order.
    pub fn agents(&self, species: Species) -> impl Iterator<Item = &Agent> {
        self.population.iter(species)
    }

    /// Number of live agents of `species`.
    pub fn count(&self, species: Species) -> usize {
        self.population.count(species)
    }

    /// Looks up a live agent by id.
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.population.get(id)
    }

    /// All indexed agents within `radius` of `point`.
    pub fn query(&self, point: &Array1<f32>, radius: f32) -> SpatialQueryResult {
        self.index.query_radius(point, radius)
    }

    /// Returns whether agent `id` lies within `distance` of `point`.
    pub fn within_distance(
        &self,
        id: AgentId,
        point: &Array1<f32>,
        distance: f32,
    ) -> Result<bool, SimError> {
        if self.population.get(id).is_none() {
            return Err(SimError::UnknownAgent(id));
        }
        Ok(self
            .index
            .query_radius(point, distance)
            .iter()
            .any(|n| n.id == id))
    }

    /// Spawns an agent of `kind` at `position`, clamped into the world.
    ///
    /// # Returns
    ///
    /// The new agent's id, or [`SimError::Exhausted`] if the species is at capacity.
    pub fn spawn(&mut self, kind: Species, position: &Array1<f32>) -> Result<AgentId, SimError> {
        self.insert_agent(kind, position)
    }

    /// Moves an agent to `position` and keeps the spatial index consistent.
    pub fn teleport(&mut self, id: AgentId, position: &Array1<f32>) -> Result<(), SimError> {
        let bounds = self.params.bounds();
        let agent = self
            .population
            .get_mut(id)
            .ok_or(SimError::UnknownAgent(id))?;
        if !is_finite(position) {
            return Err(SimError::InvalidPosition(id));
        }
        agent.pos = position.clone();
        bounds.clamp(&mut agent.pos);
        self.index.relocate(&*agent)?;
        Ok(())
    }

    /// Advances the simulation by one tick.
    ///
    /// # Arguments
    ///
    /// * `viewpoint` - Camera center in world coordinates, drives the LOD tiers
    ///
    /// # Returns
    ///
    /// Counters describing what happened during the tick. Failures inside the
    /// tick are logged and counted, never returned.
    pub fn advance_tick(&mut self, viewpoint: &Array1<f32>) -> TickReport {
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        let plan = self.scheduler.plan(self.tick, viewpoint, &self.population);
        for entry in &plan.entries {
            self.run_planned(entry, &mut report);
        }

        self.age_consumables(&mut report);
        self.reclaim(&mut report);
        self.apply_pending(&mut report);
        self.replenish_food(&mut report);

        self.tick += 1;
        report
    }

    fn run_planned(&mut self, entry: &PlannedUpdate, report: &mut TickReport) {
        let Some(agent) = self.population.at(entry.species, entry.slot) else {
            return;
        };
        // Eaten or deactivated earlier in this tick.
        if !agent.alive || agent.id != entry.id {
            return;
        }

        match entry.mode {
            UpdateMode::Full(set) => {
                report.full_updates += 1;
                if matches!(entry.species, Species::Shark | Species::Orca) {
                    self.update_predator(entry, report);
                } else {
                    self.update_flock(entry, set, report);
                }
            }
            UpdateMode::Deferred | UpdateMode::DeadReckon => {
                if entry.mode == UpdateMode::Deferred {
                    report.deferred += 1;
                } else {
                    report.dead_reckoned += 1;
                }
                let bounds = self.params.bounds();
                if let Some(agent) = self.population.at_mut(entry.species, entry.slot) {
                    dead_reckon(agent, &bounds);
                }
            }
        }
        self.settle(entry.species, entry.slot, report);
    }

    fn update_flock(&mut self, entry: &PlannedUpdate, set: BehaviorSet, report: &mut TickReport) {
        let output = {
            let Some(agent) = self.population.at(entry.species, entry.slot) else {
                return;
            };
            let engine = SteeringEngine::new(&self.index, &self.population, &self.params);
            engine.steer(agent, &self.behaviors, set, &mut self.rng)
        };

        let ate = output
            .consumed
            .is_some_and(|food| self.remove_agent(food, report));
        if let Some(food) = output.consumed.filter(|_| ate) {
            report.consumptions += 1;
            self.event_log.log(
                self.tick,
                EventKind::Consumption,
                format!("{:?} {} ate {}", entry.species, entry.id, food),
            );
        }

        let bounds = self.params.bounds();
        let min_speed = self.params.species.get(entry.species).min_speed;
        let meals_per_egg = self.params.meals_per_egg;
        let Some(agent) = self.population.at_mut(entry.species, entry.slot) else {
            return;
        };
        if let Behavior::Flock(state) = &mut agent.behavior {
            state.wander_target = output.wander_target;
            state.speed_multiplier = output.speed_multiplier;
            state.afraid = output.afraid;
        }
        integrate(
            agent,
            &output.force,
            output.speed_multiplier,
            min_speed,
            &bounds,
            &mut self.rng,
        );

        if ate {
            agent.meals += 1;
            if entry.species == Species::Fish && meals_per_egg > 0 && agent.meals >= meals_per_egg {
                agent.meals = 0;
                let pos = agent.pos.clone();
                self.pending.push(PendingSpawn {
                    kind: Species::Egg,
                    pos,
                });
            }
        }
    }

    fn update_predator(&mut self, entry: &PlannedUpdate, report: &mut TickReport) {
        let update = {
            let Some(agent) = self.population.at(entry.species, entry.slot) else {
                return;
            };
            let machine = PredatorStateMachine::new(&self.index, &self.population, &self.params);
            machine.update(agent, self.tick, &mut self.rng)
        };
        let Some(update) = update else {
            return;
        };

        let captured = update
            .consumed
            .is_some_and(|prey| self.remove_agent(prey, report));
        if let Some(prey) = update.consumed.filter(|_| captured) {
            report.predations += 1;
            self.event_log.log(
                self.tick,
                EventKind::Predation,
                format!("{:?} {} caught {}", entry.species, entry.id, prey),
            );
        }

        let bounds = self.params.bounds();
        let min_speed = self.params.species.get(entry.species).min_speed;
        let Some(agent) = self.population.at_mut(entry.species, entry.slot) else {
            return;
        };
        agent.behavior = Behavior::Predator(update.state);
        if captured {
            agent.meals += 1;
        }
        integrate(
            agent,
            &update.force,
            update.speed_multiplier,
            min_speed,
            &bounds,
            &mut self.rng,
        );
    }

    /// Post-move bookkeeping: age, finiteness check and re-indexing.
    fn settle(&mut self, species: Species, slot: usize, report: &mut TickReport) {
        let Some(agent) = self.population.at_mut(species, slot) else {
            return;
        };
        agent.age += 1;
        if !agent.is_finite() {
            let id = agent.id;
            warn!("{:?} {} has a non-finite state, deactivating", species, id);
            self.remove_agent(id, report);
            report.deactivated += 1;
            self.event_log.log(
                self.tick,
                EventKind::Deactivation,
                format!("{species:?} {id} deactivated"),
            );
            return;
        }
        if let Err(e) = self.index.relocate(&*agent) {
            warn!("relocate failed: {}", e);
            report.index_errors += 1;
        }
    }

    /// Food sinks and expires; eggs count down and hatch.
    fn age_consumables(&mut self, report: &mut TickReport) {
        let bounds = self.params.bounds();
        let sink = self.params.species.food.max_speed;

        let food: Vec<usize> = self
            .population
            .pool(Species::Food)
            .iter_alive()
            .map(|(slot, _)| slot)
            .collect();
        for slot in food {
            let Some(agent) = self.population.at_mut(Species::Food, slot) else {
                continue;
            };
            agent.age += 1;
            agent.vel = vec2(0.0, sink);
            dead_reckon(agent, &bounds);
            let expired = match &mut agent.behavior {
                Behavior::Consumable { ttl } => {
                    *ttl = ttl.saturating_sub(1);
                    *ttl == 0
                }
                _ => false,
            };
            let id = agent.id;
            if expired {
                self.remove_agent(id, report);
                report.food_expired += 1;
            } else if let Err(e) = self.index.relocate(&*agent) {
                warn!("relocate failed: {}", e);
                report.index_errors += 1;
            }
        }

        let eggs: Vec<usize> = self
            .population
            .pool(Species::Egg)
            .iter_alive()
            .map(|(slot, _)| slot)
            .collect();
        for slot in eggs {
            let Some(agent) = self.population.at_mut(Species::Egg, slot) else {
                continue;
            };
            agent.age += 1;
            let hatching = match &mut agent.behavior {
                Behavior::Egg { hatch_in } => {
                    *hatch_in = hatch_in.saturating_sub(1);
                    *hatch_in == 0
                }
                _ => false,
            };
            if hatching {
                let (id, pos) = (agent.id, agent.pos.clone());
                self.remove_agent(id, report);
                self.pending.push(PendingSpawn {
                    kind: Species::Fish,
                    pos,
                });
            }
        }
    }

    fn reclaim(&mut self, report: &mut TickReport) {
        let freed = self.population.reclaim();
        report.reclaimed += freed.len();
        for id in freed {
            self.scheduler.forget(id);
        }
    }

    fn apply_pending(&mut self, report: &mut TickReport) {
        for spawn in std::mem::take(&mut self.pending) {
            match self.insert_agent(spawn.kind, &spawn.pos) {
                Ok(id) => {
                    let (kind, description) = match spawn.kind {
                        Species::Fish => {
                            report.hatched += 1;
                            (EventKind::Hatch, format!("egg hatched into fish {id}"))
                        }
                        _ => {
                            report.eggs_laid += 1;
                            (EventKind::EggLaid, format!("{:?} {id} laid", spawn.kind))
                        }
                    };
                    self.event_log.log(self.tick, kind, description);
                }
                Err(e) => self.record_failed_spawn(spawn.kind, &e, report),
            }
        }
    }

    /// Tops food up toward `food_target` at `food_spawn_per_tick`.
    fn replenish_food(&mut self, report: &mut TickReport) {
        let current = self.population.count(Species::Food);
        let missing = self.params.food_target.saturating_sub(current);
        if missing == 0 {
            return;
        }

        let rate = self.params.food_spawn_per_tick.max(0.0);
        let whole = rate.floor() as usize;
        let extra = usize::from(self.rng.random::<f32>() < rate.fract());
        let bounds = self.params.bounds();

        for _ in 0..(whole + extra).min(missing) {
            let pos = bounds.random_point(&mut self.rng);
            match self.insert_agent(Species::Food, &pos) {
                Ok(_) => report.food_spawned += 1,
                Err(e) => {
                    self.record_failed_spawn(Species::Food, &e, report);
                    break;
                }
            }
        }
    }

    fn record_failed_spawn(&mut self, kind: Species, error: &SimError, report: &mut TickReport) {
        if let SimError::Exhausted(_) = error {
            debug!("spawn of {:?} skipped: {}", kind, error);
        } else {
            warn!("spawn of {:?} failed: {}", kind, error);
        }
        report.skipped_spawns.push(kind);
        self.event_log.log(
            self.tick,
            EventKind::SpawnSkipped,
            format!("{kind:?} spawn skipped: {error}"),
        );
    }

    /// Acquires a pool slot and indexes the new agent.
    fn insert_agent(&mut self, kind: Species, position: &Array1<f32>) -> Result<AgentId, SimError> {
        let mut pos = position.clone();
        self.params.bounds().clamp(&mut pos);
        let id = self.population.spawn(kind, &pos, &self.params, self.tick)?;
        let Some(agent) = self.population.get(id) else {
            return Err(SimError::UnknownAgent(id));
        };
        if let Err(e) = self.index.insert(agent) {
            self.population.kill(id);
            for freed in self.population.reclaim() {
                self.scheduler.forget(freed);
            }
            return Err(e);
        }
        Ok(id)
    }

    /// Marks an agent dead and drops it from the index right away.
    ///
    /// # Returns
    ///
    /// `true` if a live agent was removed.
    fn remove_agent(&mut self, id: AgentId, report: &mut TickReport) -> bool {
        if !self.population.kill(id) {
            return false;
        }
        if let Err(e) = self.index.remove(id) {
            warn!("remove failed: {}", e);
            report.index_errors += 1;
        }
        true
    }
}
