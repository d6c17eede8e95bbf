use ndarray::Array1;
use rand::Rng;
use tracing::debug;

use super::super::agent::{Agent, AgentId};
use super::super::geometric_utils::{WorldBounds, distance_sq, limit, line_circle_distance, zero};
use super::super::params::{Params, PredatorParams, SpeciesParams};
use super::super::population::Population;
use super::super::spatial::SpatialIndex;
use super::super::steering::{depth_preference, edge_avoidance, flee_from, seek};
use super::state::{PredatorMode, PredatorState};

/// Result of one predator evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct PredatorUpdate {
    /// State to store back into the agent.
    pub state: PredatorState,
    /// Steering force, not yet clamped to `max_force`.
    pub force: Array1<f32>,
    /// Multiplier on `max_speed` for this update.
    pub speed_multiplier: f32,
    /// Prey captured this update, to be removed by the caller.
    pub consumed: Option<AgentId>,
}

/// Nearest agent matching a filter, with its squared distance.
#[derive(Debug, Clone, Copy)]
struct Sighting<'a> {
    agent: &'a Agent,
    dist_sq: f32,
}

/// Evaluates predator transitions and movement against the current world.
///
/// Like the steering engine it only borrows the index and population; the
/// caller applies the returned state, force and capture.
pub struct PredatorStateMachine<'a> {
    index: &'a SpatialIndex,
    population: &'a Population,
    params: &'a Params,
}

impl<'a> PredatorStateMachine<'a> {
    /// Creates a state machine over the current world state.
    pub fn new(index: &'a SpatialIndex, population: &'a Population, params: &'a Params) -> Self {
        Self {
            index,
            population,
            params,
        }
    }

    /// Runs one full update for `agent`.
    ///
    /// Rules are checked in a fixed order and at most one mode change happens
    /// per call; capture is only possible for a predator that was already
    /// hunting when the call started.
    ///
    /// # Arguments
    ///
    /// * `agent` - The predator
    /// * `tick` - Current simulation tick
    /// * `rng` - Random number generator for patrol waypoints
    ///
    /// # Returns
    ///
    /// `None` if `agent` is not a predator.
    pub fn update(&self, agent: &Agent, tick: u64, rng: &mut impl Rng) -> Option<PredatorUpdate> {
        let species = self.params.species.get(agent.species);
        let pp = species.predator.as_ref()?;
        let mut state = agent.predator_state()?.clone();

        state.update_alertness(pp, tick);
        state.switch_cooldown = state.switch_cooldown.saturating_sub(1);
        if matches!(state.excluded, Some((_, until)) if tick >= until) {
            state.excluded = None;
        }

        let before = state.mode;
        let threat = self.nearest_threat(agent, species, pp.flee_radius);
        let consumed = self.transition(agent, species, pp, &mut state, threat, tick);
        if state.mode != before {
            debug!(
                "{:?} {} {:?} -> {:?} at tick {}",
                agent.species, agent.id, before, state.mode, tick
            );
        }

        let (force, speed_multiplier) = self.movement(agent, pp, &mut state, threat, rng);
        Some(PredatorUpdate {
            state,
            force,
            speed_multiplier,
            consumed,
        })
    }

    fn transition(
        &self,
        agent: &Agent,
        species: &SpeciesParams,
        pp: &PredatorParams,
        state: &mut PredatorState,
        threat: Option<Sighting<'_>>,
        tick: u64,
    ) -> Option<AgentId> {
        // Threats pre-empt every other rule.
        if threat.is_some() {
            state.calm_ticks = 0;
            if state.mode != PredatorMode::Fleeing {
                state.target = None;
                state.enter(PredatorMode::Fleeing, tick);
            }
            return None;
        }

        match state.mode {
            PredatorMode::Fleeing => {
                state.calm_ticks += 1;
                if state.calm_ticks >= pp.flee_debounce {
                    state.enter(PredatorMode::Patrolling, tick);
                }
                return None;
            }
            PredatorMode::Feeding => {
                if tick.saturating_sub(state.entered_at) >= pp.feeding_duration {
                    state.enter(PredatorMode::Patrolling, tick);
                }
                return None;
            }
            PredatorMode::Patrolling | PredatorMode::Hunting => {}
        }

        let hunt_radius = state.effective_hunt_radius(pp);

        if let Some(id) = state.target {
            let Some(prey) = self.live_prey(id, species) else {
                // Stale target: it died or was removed since the last update.
                state.target = None;
                if state.mode == PredatorMode::Hunting {
                    state.enter(PredatorMode::Patrolling, tick);
                }
                return None;
            };

            if state.mode == PredatorMode::Hunting && captured(agent, prey, pp.attack_radius) {
                state.target = None;
                state.successes += 1.0;
                state.enter(PredatorMode::Feeding, tick);
                return Some(id);
            }

            if distance_sq(&agent.pos, &prey.pos) > hunt_radius * hunt_radius {
                state.target = None;
                state.excluded = Some((id, tick + u64::from(pp.target_switch_cooldown)));
                if state.mode == PredatorMode::Hunting {
                    state.enter(PredatorMode::Patrolling, tick);
                }
                return None;
            }
        }

        if state.target.is_some() && state.switch_cooldown > 0 {
            return None;
        }

        match self.select_prey(agent, species, state, hunt_radius, tick) {
            Some(prey) => {
                if state.target != Some(prey.id) {
                    state.target = Some(prey.id);
                    state.switch_cooldown = pp.target_switch_cooldown;
                }
                if state.mode == PredatorMode::Patrolling {
                    state.enter(PredatorMode::Hunting, tick);
                }
            }
            None => {
                state.target = None;
                if state.mode == PredatorMode::Hunting {
                    state.enter(PredatorMode::Patrolling, tick);
                }
            }
        }
        None
    }

    fn movement(
        &self,
        agent: &Agent,
        pp: &PredatorParams,
        state: &mut PredatorState,
        threat: Option<Sighting<'_>>,
        rng: &mut impl Rng,
    ) -> (Array1<f32>, f32) {
        let bounds = self.params.bounds();
        let margin = self.params.species.get(agent.species).edge_margin;
        let edge = |weight: f32| {
            edge_avoidance(&agent.pos, &bounds, margin, agent.max_force)
                .map_or_else(zero, |f| f * weight)
        };
        let depth = |weight: f32| {
            depth_preference(&agent.pos, &bounds, pp.depth_band, agent.max_force)
                .map_or_else(zero, |f| f * weight)
        };

        match state.mode {
            PredatorMode::Fleeing => {
                let away = threat.map_or_else(zero, |t| {
                    flee_from(&agent.pos, &t.agent.pos, agent.max_force)
                });
                (away + edge(pp.edge_weight), pp.flee_speed_multiplier)
            }
            PredatorMode::Feeding => {
                let brake = limit(-&agent.vel, agent.max_force);
                (brake, pp.feed_speed_multiplier)
            }
            PredatorMode::Hunting => {
                let Some(prey) = state.target.and_then(|id| self.population.get(id)) else {
                    return (edge(pp.edge_weight), 1.0);
                };
                let speed = agent.max_speed * pp.hunt_speed_multiplier;
                let chase = seek(&agent.pos, &agent.vel, &prey.pos, speed, agent.max_force);
                let scale = pp.hunting_edge_weight;
                (
                    chase + edge(pp.edge_weight * scale) + depth(pp.depth_weight * scale),
                    pp.hunt_speed_multiplier,
                )
            }
            PredatorMode::Patrolling => {
                let waypoint = next_waypoint(state.patrol_target.take(), agent, pp, &bounds, rng);
                let cruise = seek(
                    &agent.pos,
                    &agent.vel,
                    &waypoint,
                    agent.max_speed,
                    agent.max_force,
                );
                state.patrol_target = Some(waypoint);
                (
                    cruise + edge(pp.edge_weight) + depth(pp.depth_weight),
                    1.0,
                )
            }
        }
    }

    /// Nearest larger agent of a threatening species inside `radius`.
    fn nearest_threat(
        &self,
        agent: &Agent,
        species: &SpeciesParams,
        radius: f32,
    ) -> Option<Sighting<'a>> {
        if species.threats.is_empty() {
            return None;
        }
        self.nearest_matching(agent, radius, |other| {
            species.threats.contains(&other.species)
                && self.params.species.get(other.species).size > species.size
        })
    }

    /// Nearest prey inside `radius`, skipping a recently escaped target.
    fn select_prey(
        &self,
        agent: &Agent,
        species: &SpeciesParams,
        state: &PredatorState,
        radius: f32,
        tick: u64,
    ) -> Option<&'a Agent> {
        self.nearest_matching(agent, radius, |other| {
            species.prey.contains(&other.species) && !state.is_excluded(other.id, tick)
        })
        .map(|s| s.agent)
    }

    /// Nearest live agent accepted by `accept`; equal distances resolve to the lowest id.
    fn nearest_matching(
        &self,
        agent: &Agent,
        radius: f32,
        accept: impl Fn(&Agent) -> bool,
    ) -> Option<Sighting<'a>> {
        let mut best: Option<Sighting<'a>> = None;
        for hit in self.index.query_radius(&agent.pos, radius) {
            if hit.id == agent.id {
                continue;
            }
            let Some(other) = self.population.get(hit.id) else {
                continue;
            };
            if !accept(other) {
                continue;
            }
            let closer = best.is_none_or(|b| (hit.dist_sq, other.id) < (b.dist_sq, b.agent.id));
            if closer {
                best = Some(Sighting {
                    agent: other,
                    dist_sq: hit.dist_sq,
                });
            }
        }
        best
    }

    /// Resolves a target id to a live agent of a prey species.
    fn live_prey(&self, id: AgentId, species: &SpeciesParams) -> Option<&'a Agent> {
        self.population
            .get(id)
            .filter(|prey| species.prey.contains(&prey.species))
    }
}

/// Capture test: prey inside the attack radius, or passed over by the
/// predator's last movement segment.
fn captured(predator: &Agent, prey: &Agent, attack_radius: f32) -> bool {
    if distance_sq(&predator.pos, &prey.pos) <= attack_radius * attack_radius {
        return true;
    }
    let previous = &predator.pos - &predator.vel;
    line_circle_distance(&previous, &predator.pos, &prey.pos) <= attack_radius
}

/// Keeps the current patrol waypoint until the predator arrives, then draws a new one.
fn next_waypoint(
    current: Option<Array1<f32>>,
    agent: &Agent,
    pp: &PredatorParams,
    bounds: &WorldBounds,
    rng: &mut impl Rng,
) -> Array1<f32> {
    let tolerance_sq = pp.patrol_tolerance * pp.patrol_tolerance;
    match current {
        Some(waypoint) if distance_sq(&agent.pos, &waypoint) > tolerance_sq => waypoint,
        _ => bounds.random_point(rng),
    }
}
