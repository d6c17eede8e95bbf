#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal::simulation::agent::{AgentId, Behavior, Species};
use shoal::simulation::geometric_utils::vec2;
use shoal::simulation::params::Params;
use shoal::simulation::population::Population;
use shoal::simulation::predator::{
    PredatorMode, PredatorState, PredatorStateMachine, PredatorUpdate, alertness_target,
};
use shoal::simulation::spatial::SpatialIndex;

fn create_test_params() -> Params {
    let mut params = Params::default();
    params.world_width = 1200.0;
    params.world_height = 800.0;
    for species in Species::ALL {
        params.species.get_mut(species).initial_count = 0;
    }
    params
}

struct World {
    params: Params,
    population: Population,
    index: SpatialIndex,
    rng: ChaCha8Rng,
}

impl World {
    fn new() -> Self {
        let params = create_test_params();
        let population = Population::new(&params);
        let index = SpatialIndex::new(
            params.world_width,
            params.world_height,
            params.effective_cell_size(),
        );
        Self {
            params,
            population,
            index,
            rng: ChaCha8Rng::seed_from_u64(7),
        }
    }

    fn add(&mut self, species: Species, x: f32, y: f32) -> AgentId {
        let id = self
            .population
            .spawn(species, &vec2(x, y), &self.params, 0)
            .unwrap();
        self.index.insert(self.population.get(id).unwrap()).unwrap();
        id
    }

    fn move_to(&mut self, id: AgentId, x: f32, y: f32) {
        let agent = self.population.get_mut(id).unwrap();
        agent.pos = vec2(x, y);
        self.index.relocate(&*agent).unwrap();
    }

    fn set_state(&mut self, id: AgentId, state: PredatorState) {
        self.population.get_mut(id).unwrap().behavior = Behavior::Predator(state);
    }

    fn update(&mut self, id: AgentId, tick: u64) -> PredatorUpdate {
        let machine = PredatorStateMachine::new(&self.index, &self.population, &self.params);
        let agent = self.population.get(id).unwrap();
        let update = machine.update(agent, tick, &mut self.rng).unwrap();
        self.set_state(id, update.state.clone());
        update
    }
}

fn hunting(target: AgentId) -> PredatorState {
    let mut state = PredatorState::new(0);
    state.mode = PredatorMode::Hunting;
    state.target = Some(target);
    state
}

#[test]
fn test_patrolling_predator_starts_hunting() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    let fish = world.add(Species::Fish, 650.0, 400.0);

    let update = world.update(shark, 0);
    assert_eq!(update.state.mode, PredatorMode::Hunting);
    assert_eq!(update.state.target, Some(fish));
    assert_eq!(update.consumed, None);
    assert_eq!(update.speed_multiplier, 1.5);
}

#[test]
fn test_prey_inside_attack_radius_needs_a_hunting_tick_first() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    let fish = world.add(Species::Fish, 620.0, 400.0);

    let first = world.update(shark, 0);
    assert_eq!(first.state.mode, PredatorMode::Hunting);
    assert_eq!(first.consumed, None);

    let second = world.update(shark, 1);
    assert_eq!(second.state.mode, PredatorMode::Feeding);
    assert_eq!(second.consumed, Some(fish));
    assert_eq!(second.state.target, None);
    assert_eq!(second.state.successes, 1.0);
    assert_eq!(second.state.entered_at, 1);
}

#[test]
fn test_nearest_prey_tie_breaks_on_lowest_id() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    let first = world.add(Species::Fish, 700.0, 400.0);
    let second = world.add(Species::Fish, 500.0, 400.0);
    assert!(first < second);

    let update = world.update(shark, 0);
    assert_eq!(update.state.target, Some(first));
}

#[test]
fn test_non_prey_species_are_ignored() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    world.add(Species::Krill, 620.0, 400.0);
    world.add(Species::Food, 610.0, 400.0);

    let update = world.update(shark, 0);
    assert_eq!(update.state.mode, PredatorMode::Patrolling);
    assert_eq!(update.state.target, None);
    assert!(update.state.patrol_target.is_some());
}

#[test]
fn test_stale_target_is_cleared() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    let fish = world.add(Species::Fish, 630.0, 400.0);
    world.set_state(shark, hunting(fish));

    world.population.kill(fish);
    world.index.remove(fish).unwrap();
    world.population.reclaim();

    let update = world.update(shark, 3);
    assert_eq!(update.state.mode, PredatorMode::Patrolling);
    assert_eq!(update.state.target, None);
    assert_eq!(update.consumed, None);
}

#[test]
fn test_escaped_target_is_excluded_for_cooldown() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 300.0, 400.0);
    let fish = world.add(Species::Fish, 660.0, 400.0);
    world.set_state(shark, hunting(fish));

    let update = world.update(shark, 10);
    let cooldown = world
        .params
        .species
        .shark
        .predator
        .as_ref()
        .unwrap()
        .target_switch_cooldown;
    assert_eq!(update.state.mode, PredatorMode::Patrolling);
    assert_eq!(update.state.target, None);
    assert_eq!(update.state.excluded, Some((fish, 10 + u64::from(cooldown))));

    world.move_to(shark, 300.0, 400.0);
    world.move_to(fish, 400.0, 400.0);
    let update = world.update(shark, 11);
    assert_eq!(update.state.mode, PredatorMode::Patrolling);
    assert_eq!(update.state.target, None);

    let other = world.add(Species::Fish, 450.0, 400.0);
    let update = world.update(shark, 12);
    assert_eq!(update.state.mode, PredatorMode::Hunting);
    assert_eq!(update.state.target, Some(other));
}

#[test]
fn test_larger_threat_triggers_flee_from_any_state() {
    for mode in [
        PredatorMode::Patrolling,
        PredatorMode::Hunting,
        PredatorMode::Feeding,
    ] {
        let mut world = World::new();
        let shark = world.add(Species::Shark, 600.0, 400.0);
        let fish = world.add(Species::Fish, 620.0, 400.0);
        world.add(Species::Orca, 700.0, 400.0);

        let mut state = hunting(fish);
        state.mode = mode;
        world.set_state(shark, state);

        let update = world.update(shark, 5);
        assert_eq!(update.state.mode, PredatorMode::Fleeing);
        assert_eq!(update.state.target, None);
        assert_eq!(update.consumed, None);
        assert!(update.force[0] < 0.0);
    }
}

#[test]
fn test_flee_ends_after_debounce() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    let debounce = world
        .params
        .species
        .shark
        .predator
        .as_ref()
        .unwrap()
        .flee_debounce;

    let mut state = PredatorState::new(0);
    state.mode = PredatorMode::Fleeing;
    world.set_state(shark, state);

    for tick in 1..debounce {
        let update = world.update(shark, u64::from(tick));
        assert_eq!(update.state.mode, PredatorMode::Fleeing);
    }
    let update = world.update(shark, u64::from(debounce));
    assert_eq!(update.state.mode, PredatorMode::Patrolling);
}

#[test]
fn test_feeding_times_out() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    world.add(Species::Fish, 640.0, 400.0);
    let duration = world
        .params
        .species
        .shark
        .predator
        .as_ref()
        .unwrap()
        .feeding_duration;

    let mut state = PredatorState::new(100);
    state.mode = PredatorMode::Feeding;
    world.set_state(shark, state);

    let update = world.update(shark, 100 + duration - 1);
    assert_eq!(update.state.mode, PredatorMode::Feeding);
    assert_eq!(update.consumed, None);

    let update = world.update(shark, 100 + duration);
    assert_eq!(update.state.mode, PredatorMode::Patrolling);
    assert_eq!(update.state.target, None);
}

#[test]
fn test_alertness_is_monotonic_in_success() {
    let params = create_test_params();
    let predator = params.species.shark.predator.unwrap();
    for tick in [0, 300, 900, 1500] {
        let mut last = alertness_target(0.0, tick, &predator);
        for successes in 1..10 {
            let next = alertness_target(successes as f32, tick, &predator);
            assert!(next >= last);
            assert!((0.0..=1.0).contains(&next));
            last = next;
        }
    }
}

#[test]
fn test_alertness_stays_in_unit_range() {
    let params = create_test_params();
    let predator = params.species.orca.predator.unwrap();
    let mut state = PredatorState::new(0);
    state.successes = 50.0;
    for tick in 0..5000 {
        state.update_alertness(&predator, tick);
        assert!((0.0..=1.0).contains(&state.alertness));
    }
    assert!(state.alertness > 0.0);
}

#[test]
fn test_mode_set_is_closed() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    for i in 0..6 {
        world.add(Species::Fish, 420.0 + 60.0 * i as f32, 380.0);
    }
    world.add(Species::Orca, 1100.0, 700.0);

    for tick in 0..400 {
        let update = world.update(shark, tick);
        assert!(matches!(
            update.state.mode,
            PredatorMode::Patrolling
                | PredatorMode::Hunting
                | PredatorMode::Feeding
                | PredatorMode::Fleeing
        ));
        if let Some(prey) = update.consumed {
            world.population.kill(prey);
            world.index.remove(prey).unwrap();
        }
        if let Some(target) = update.state.target {
            assert!(world.population.get(target).is_some());
        }
    }
}

#[test]
fn test_switch_cooldown_keeps_current_target() {
    let mut world = World::new();
    let shark = world.add(Species::Shark, 600.0, 400.0);
    let first = world.add(Species::Fish, 700.0, 400.0);

    let update = world.update(shark, 0);
    assert_eq!(update.state.target, Some(first));
    assert!(update.state.switch_cooldown > 1);

    let closer = world.add(Species::Fish, 650.0, 400.0);
    let update = world.update(shark, 1);
    assert_eq!(update.state.mode, PredatorMode::Hunting);
    assert_eq!(update.state.target, Some(first));

    let mut state = update.state;
    state.switch_cooldown = 1;
    world.set_state(shark, state);
    let update = world.update(shark, 2);
    assert_eq!(update.state.target, Some(closer));
    assert_eq!(update.consumed, None);
}
