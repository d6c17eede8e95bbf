use std::path::Path;

use serde::{Deserialize, Serialize};

use super::agent::Species;
use super::error::ConfigError;
use super::geometric_utils::WorldBounds;

/// Simulation parameters, fixed for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Simulation area width.
    pub world_width: f32,
    /// Simulation area height.
    pub world_height: f32,
    /// Spatial grid cell side. `None` derives it from the largest behavior radius.
    pub cell_size: Option<f32>,
    /// Seed for the simulation random number generator.
    pub seed: u64,
    /// Agents per scheduler batch.
    pub batch_size: usize,
    /// Distance to the viewpoint beyond which agents drop to the medium LOD tier.
    pub lod_medium_distance: f32,
    /// Distance to the viewpoint beyond which agents drop to the low LOD tier.
    pub lod_low_distance: f32,
    /// Food pellet count the world is replenished towards.
    pub food_target: usize,
    /// Food pellets spawned per tick while below target (fraction spawns probabilistically).
    pub food_spawn_per_tick: f32,
    /// Lifetime of a food pellet in ticks.
    pub food_lifetime: u64,
    /// Ticks from laying to hatching.
    pub egg_hatch_ticks: u64,
    /// Meals a fish needs before it lays an egg. 0 disables egg laying.
    pub meals_per_egg: u32,
    /// Number of recent events kept in the event log.
    pub event_log_size: usize,
    /// Per-species tunables.
    pub species: SpeciesTable,
}

/// Per-species parameter table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesTable {
    /// Krill parameters.
    pub krill: SpeciesParams,
    /// Fish parameters.
    pub fish: SpeciesParams,
    /// Shark parameters.
    pub shark: SpeciesParams,
    /// Orca parameters.
    pub orca: SpeciesParams,
    /// Food pellet parameters.
    pub food: SpeciesParams,
    /// Egg parameters.
    pub egg: SpeciesParams,
}

impl SpeciesTable {
    /// Parameters for `species`.
    pub fn get(&self, species: Species) -> &SpeciesParams {
        match species {
            Species::Krill => &self.krill,
            Species::Fish => &self.fish,
            Species::Shark => &self.shark,
            Species::Orca => &self.orca,
            Species::Food => &self.food,
            Species::Egg => &self.egg,
        }
    }

    /// Mutable parameters for `species`.
    pub fn get_mut(&mut self, species: Species) -> &mut SpeciesParams {
        match species {
            Species::Krill => &mut self.krill,
            Species::Fish => &mut self.fish,
            Species::Shark => &mut self.shark,
            Species::Orca => &mut self.orca,
            Species::Food => &mut self.food,
            Species::Egg => &mut self.egg,
        }
    }
}

/// Tunables shared by every species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesParams {
    /// Hard cap on live agents (pool capacity).
    pub capacity: usize,
    /// Agents placed at random when the ecosystem is created.
    pub initial_count: usize,
    /// Body size; only larger agents count as threats.
    pub size: f32,
    /// Speed cap in world units per tick. Food uses it as sink speed.
    pub max_speed: f32,
    /// Steering force cap.
    pub max_force: f32,
    /// Minimum speed floor; stalled agents are kicked to this speed.
    pub min_speed: f32,
    /// Distance from the world edge at which edge avoidance starts.
    pub edge_margin: f32,
    /// Species this one flocks with.
    pub flockmates: Vec<Species>,
    /// Species this one forages.
    pub food: Vec<Species>,
    /// Species this one hunts.
    pub prey: Vec<Species>,
    /// Species this one avoids.
    pub threats: Vec<Species>,
    /// Flocking tunables, for krill and fish.
    pub flock: Option<FlockParams>,
    /// Predator tunables, for sharks and orcas.
    pub predator: Option<PredatorParams>,
}

/// Steering radii and weights for flocking agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlockParams {
    /// Separation radius.
    pub separation_radius: f32,
    /// Alignment radius.
    pub alignment_radius: f32,
    /// Cohesion radius.
    pub cohesion_radius: f32,
    /// Food detection radius.
    pub forage_radius: f32,
    /// Distance at which food is eaten.
    pub eat_radius: f32,
    /// Threat detection radius; fear overrides flocking inside it.
    pub fear_radius: f32,
    /// Inner radius inside which the flee speed multiplier applies.
    pub flee_radius: f32,
    /// Separation weight.
    pub separation_weight: f32,
    /// Alignment weight.
    pub alignment_weight: f32,
    /// Cohesion weight.
    pub cohesion_weight: f32,
    /// Forage weight.
    pub forage_weight: f32,
    /// Edge avoidance weight.
    pub edge_weight: f32,
    /// Wander weight.
    pub wander_weight: f32,
    /// Speed multiplier (> 1) while a threat is inside `flee_radius`.
    pub flee_speed_multiplier: f32,
    /// Arrival tolerance for wander waypoints.
    pub wander_tolerance: f32,
    /// Maximum distance of a new wander waypoint from the agent.
    pub wander_distance: f32,
}

/// Radii, timers and multipliers for predators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredatorParams {
    /// Prey detection radius.
    pub hunt_radius: f32,
    /// Capture radius.
    pub attack_radius: f32,
    /// Threat detection radius.
    pub flee_radius: f32,
    /// Ticks a freshly chosen target is kept before switching is allowed.
    pub target_switch_cooldown: u32,
    /// Ticks spent feeding after a kill.
    pub feeding_duration: u64,
    /// Consecutive threat-free updates before fleeing ends.
    pub flee_debounce: u32,
    /// Speed multiplier while hunting.
    pub hunt_speed_multiplier: f32,
    /// Speed multiplier while feeding.
    pub feed_speed_multiplier: f32,
    /// Speed multiplier while fleeing.
    pub flee_speed_multiplier: f32,
    /// Full-strength edge avoidance weight.
    pub edge_weight: f32,
    /// Factor applied to edge and depth forces while hunting.
    pub hunting_edge_weight: f32,
    /// Preferred depth band as fractions of the world height.
    pub depth_band: (f32, f32),
    /// Depth preference weight.
    pub depth_weight: f32,
    /// Arrival tolerance for patrol waypoints.
    pub patrol_tolerance: f32,
    /// Per-update decay of the hunt-success score.
    pub hunt_memory_decay: f32,
    /// Hunt-success score at which the success term reaches one half.
    pub alertness_half_saturation: f32,
    /// Amplitude of the oscillating alertness term.
    pub alertness_wave_amplitude: f32,
    /// Period of the oscillating alertness term in ticks.
    pub alertness_wave_period: f32,
    /// Exponential smoothing factor for alertness.
    pub alertness_smoothing: f32,
    /// Relative hunt radius growth at full alertness.
    pub alertness_radius_gain: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            world_width: 4000.0,
            world_height: 2400.0,
            cell_size: None,
            seed: 0x5EED,
            batch_size: 256,
            lod_medium_distance: 900.0,
            lod_low_distance: 1800.0,
            food_target: 300,
            food_spawn_per_tick: 2.0,
            food_lifetime: 3600,
            egg_hatch_ticks: 600,
            meals_per_egg: 4,
            event_log_size: 64,
            species: SpeciesTable::default(),
        }
    }
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self {
            krill: SpeciesParams::krill(),
            fish: SpeciesParams::fish(),
            shark: SpeciesParams::shark(),
            orca: SpeciesParams::orca(),
            food: SpeciesParams::food(),
            egg: SpeciesParams::egg(),
        }
    }
}

impl SpeciesParams {
    fn consumable(capacity: usize, max_speed: f32) -> Self {
        Self {
            capacity,
            initial_count: 0,
            size: 0.5,
            max_speed,
            max_force: 0.0,
            min_speed: 0.0,
            edge_margin: 0.0,
            flockmates: Vec::new(),
            food: Vec::new(),
            prey: Vec::new(),
            threats: Vec::new(),
            flock: None,
            predator: None,
        }
    }

    /// Default krill tunables.
    pub fn krill() -> Self {
        Self {
            capacity: 2000,
            initial_count: 1200,
            size: 0.5,
            max_speed: 1.6,
            max_force: 0.06,
            min_speed: 0.4,
            edge_margin: 60.0,
            flockmates: vec![Species::Krill],
            food: vec![Species::Food],
            prey: Vec::new(),
            threats: vec![Species::Fish],
            flock: Some(FlockParams {
                separation_radius: 10.0,
                alignment_radius: 25.0,
                cohesion_radius: 35.0,
                forage_radius: 60.0,
                eat_radius: 4.0,
                fear_radius: 50.0,
                flee_radius: 25.0,
                separation_weight: 1.6,
                alignment_weight: 1.0,
                cohesion_weight: 0.8,
                forage_weight: 0.6,
                edge_weight: 1.5,
                wander_weight: 0.5,
                flee_speed_multiplier: 1.5,
                wander_tolerance: 10.0,
                wander_distance: 150.0,
            }),
            predator: None,
        }
    }

    /// Default fish tunables.
    pub fn fish() -> Self {
        Self {
            capacity: 1500,
            initial_count: 600,
            size: 1.0,
            max_speed: 3.0,
            max_force: 0.1,
            min_speed: 0.8,
            edge_margin: 80.0,
            flockmates: vec![Species::Fish],
            food: vec![Species::Krill, Species::Food],
            prey: Vec::new(),
            threats: vec![Species::Shark, Species::Orca],
            flock: Some(FlockParams {
                separation_radius: 18.0,
                alignment_radius: 45.0,
                cohesion_radius: 60.0,
                forage_radius: 90.0,
                eat_radius: 6.0,
                fear_radius: 150.0,
                flee_radius: 70.0,
                separation_weight: 1.5,
                alignment_weight: 1.0,
                cohesion_weight: 0.9,
                forage_weight: 0.7,
                edge_weight: 1.5,
                wander_weight: 0.5,
                flee_speed_multiplier: 1.6,
                wander_tolerance: 15.0,
                wander_distance: 250.0,
            }),
            predator: None,
        }
    }

    /// Default shark tunables.
    pub fn shark() -> Self {
        Self {
            capacity: 24,
            initial_count: 8,
            size: 3.0,
            max_speed: 2.5,
            max_force: 0.12,
            min_speed: 0.5,
            edge_margin: 120.0,
            flockmates: Vec::new(),
            food: Vec::new(),
            prey: vec![Species::Fish],
            threats: vec![Species::Orca],
            flock: None,
            predator: Some(PredatorParams {
                hunt_radius: 300.0,
                attack_radius: 40.0,
                flee_radius: 220.0,
                target_switch_cooldown: 90,
                feeding_duration: 180,
                flee_debounce: 60,
                hunt_speed_multiplier: 1.5,
                feed_speed_multiplier: 0.4,
                flee_speed_multiplier: 1.4,
                edge_weight: 1.0,
                hunting_edge_weight: 0.3,
                depth_band: (0.3, 0.7),
                depth_weight: 0.4,
                patrol_tolerance: 40.0,
                hunt_memory_decay: 0.999,
                alertness_half_saturation: 3.0,
                alertness_wave_amplitude: 0.2,
                alertness_wave_period: 1800.0,
                alertness_smoothing: 0.02,
                alertness_radius_gain: 0.0,
            }),
        }
    }

    /// Default orca tunables.
    pub fn orca() -> Self {
        Self {
            capacity: 6,
            initial_count: 2,
            size: 5.0,
            max_speed: 2.8,
            max_force: 0.1,
            min_speed: 0.6,
            edge_margin: 150.0,
            flockmates: Vec::new(),
            food: Vec::new(),
            prey: vec![Species::Shark, Species::Fish],
            threats: Vec::new(),
            flock: None,
            predator: Some(PredatorParams {
                hunt_radius: 350.0,
                attack_radius: 50.0,
                flee_radius: 200.0,
                target_switch_cooldown: 120,
                feeding_duration: 300,
                flee_debounce: 60,
                hunt_speed_multiplier: 1.4,
                feed_speed_multiplier: 0.3,
                flee_speed_multiplier: 1.3,
                edge_weight: 1.0,
                hunting_edge_weight: 0.3,
                depth_band: (0.1, 0.4),
                depth_weight: 0.4,
                patrol_tolerance: 50.0,
                hunt_memory_decay: 0.999,
                alertness_half_saturation: 2.0,
                alertness_wave_amplitude: 0.2,
                alertness_wave_period: 2400.0,
                alertness_smoothing: 0.02,
                alertness_radius_gain: 0.0,
            }),
        }
    }

    /// Default food pellet tunables.
    pub fn food() -> Self {
        Self::consumable(600, 0.15)
    }

    /// Default egg tunables.
    pub fn egg() -> Self {
        Self::consumable(400, 0.0)
    }

    /// Largest behavior radius configured for this species.
    pub fn max_radius(&self) -> f32 {
        let flock = self.flock.as_ref().map_or(0.0, |f| {
            f.separation_radius
                .max(f.alignment_radius)
                .max(f.cohesion_radius)
                .max(f.forage_radius)
                .max(f.fear_radius)
        });
        let predator = self
            .predator
            .as_ref()
            .map_or(0.0, |p| p.hunt_radius.max(p.flee_radius));
        flock.max(predator)
    }
}

impl Params {
    /// World rectangle.
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.world_width, self.world_height)
    }

    /// Grid cell side actually used by the spatial index.
    pub fn effective_cell_size(&self) -> f32 {
        self.cell_size.unwrap_or_else(|| {
            Species::ALL
                .iter()
                .map(|&s| self.species.get(s).max_radius())
                .fold(0.0, f32::max)
                .max(1.0)
        })
    }

    /// Checks value ranges that the simulation relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive(self.world_width) || !is_positive(self.world_height) {
            return Err(ConfigError::Invalid(format!(
                "world size must be positive, got {}x{}",
                self.world_width, self.world_height
            )));
        }
        if let Some(cell) = self.cell_size {
            if !is_positive(cell) {
                return Err(ConfigError::Invalid(format!(
                    "cell_size must be positive, got {cell}"
                )));
            }
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.lod_medium_distance > self.lod_low_distance {
            return Err(ConfigError::Invalid(
                "lod_medium_distance must not exceed lod_low_distance".into(),
            ));
        }
        for species in Species::ALL {
            let sp = self.species.get(species);
            if sp.initial_count > sp.capacity {
                return Err(ConfigError::Invalid(format!(
                    "{species:?}: initial_count {} exceeds capacity {}",
                    sp.initial_count, sp.capacity
                )));
            }
            if let Some(flock) = &sp.flock {
                if flock.flee_radius > flock.fear_radius {
                    return Err(ConfigError::Invalid(format!(
                        "{species:?}: flee_radius must not exceed fear_radius"
                    )));
                }
            }
            if let Some(predator) = &sp.predator {
                if predator.attack_radius > predator.hunt_radius {
                    return Err(ConfigError::Invalid(format!(
                        "{species:?}: attack_radius must not exceed hunt_radius"
                    )));
                }
                if predator.alertness_wave_period <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "{species:?}: alertness_wave_period must be positive"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Saves the parameters to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Loads and validates parameters from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
