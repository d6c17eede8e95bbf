use std::f32::consts::TAU;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::super::agent::AgentId;
use super::super::params::PredatorParams;

/// Predator behavior mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredatorMode {
    /// Cruising between random waypoints inside the preferred depth band.
    Patrolling,
    /// Chasing the current target.
    Hunting,
    /// Slowing down after a kill.
    Feeding,
    /// Escaping a larger predator.
    Fleeing,
}

/// Per-predator state carried between updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorState {
    /// Current mode.
    pub mode: PredatorMode,
    /// Current target. Only an id: it is resolved against the population on every use.
    pub target: Option<AgentId>,
    /// Updates left before the current target may be swapped for a closer one.
    pub switch_cooldown: u32,
    /// Tick at which the current mode was entered.
    pub entered_at: u64,
    /// Alertness in `[0, 1]`.
    pub alertness: f32,
    /// Decayed count of successful hunts.
    pub successes: f32,
    /// Consecutive threat-free updates while fleeing.
    pub calm_ticks: u32,
    /// Current patrol waypoint.
    pub patrol_target: Option<Array1<f32>>,
    /// Prey that escaped the hunt radius, and the tick until which it is ignored.
    pub excluded: Option<(AgentId, u64)>,
}

impl PredatorState {
    /// Fresh patrolling state entered at `tick`.
    pub fn new(tick: u64) -> Self {
        Self {
            mode: PredatorMode::Patrolling,
            target: None,
            switch_cooldown: 0,
            entered_at: tick,
            alertness: 0.0,
            successes: 0.0,
            calm_ticks: 0,
            patrol_target: None,
            excluded: None,
        }
    }

    /// Switches to `mode`, recording the entry tick.
    pub fn enter(&mut self, mode: PredatorMode, tick: u64) {
        self.mode = mode;
        self.entered_at = tick;
        self.calm_ticks = 0;
    }

    /// Returns `true` if `id` escaped recently and must not be re-selected at `tick`.
    pub fn is_excluded(&self, id: AgentId, tick: u64) -> bool {
        matches!(self.excluded, Some((excluded, until)) if excluded == id && tick < until)
    }

    /// Decays the hunt memory and moves alertness toward its target value.
    pub fn update_alertness(&mut self, params: &PredatorParams, tick: u64) {
        self.successes *= params.hunt_memory_decay;
        let target = alertness_target(self.successes, tick, params);
        let smoothing = params.alertness_smoothing.clamp(0.0, 1.0);
        self.alertness = (self.alertness + smoothing * (target - self.alertness)).clamp(0.0, 1.0);
    }

    /// Hunt radius scaled by the current alertness.
    pub fn effective_hunt_radius(&self, params: &PredatorParams) -> f32 {
        params.hunt_radius * (1.0 + params.alertness_radius_gain * self.alertness)
    }
}

/// Alertness the predator converges toward.
///
/// A saturating function of recent hunt success blended with a slow
/// oscillation over `alertness_wave_period` ticks. Non-decreasing in
/// `successes` for a fixed tick.
pub fn alertness_target(successes: f32, tick: u64, params: &PredatorParams) -> f32 {
    let half = params.alertness_half_saturation.max(f32::EPSILON);
    let amplitude = params.alertness_wave_amplitude.clamp(0.0, 1.0);
    let success_term = successes.max(0.0) / (successes.max(0.0) + half);
    let phase = TAU * (tick as f32) / params.alertness_wave_period.max(1.0);
    let wave_term = 0.5 + 0.5 * phase.sin();
    ((1.0 - amplitude) * success_term + amplitude * wave_term).clamp(0.0, 1.0)
}
