#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal::simulation::agent::{AgentId, Species};
use shoal::simulation::geometric_utils::{WorldBounds, distance_sq, magnitude, vec2};
use shoal::simulation::params::Params;
use shoal::simulation::population::Population;
use shoal::simulation::spatial::SpatialIndex;
use shoal::simulation::steering::{
    Alignment, BehaviorKind, BehaviorSet, Cohesion, Neighborhood, SteeringBehavior,
    SteeringContext, SteeringEngine, Wander, default_stack, edge_avoidance, flee_from, seek,
};

fn create_test_params() -> Params {
    let mut params = Params::default();
    for species in Species::ALL {
        params.species.get_mut(species).initial_count = 0;
    }
    params
}

struct World {
    params: Params,
    population: Population,
    index: SpatialIndex,
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

    fn neighborhood(&self, id: AgentId) -> Neighborhood<'_> {
        let agent = self.population.get(id).unwrap();
        let species = self.params.species.get(agent.species);
        Neighborhood::gather(
            agent,
            species,
            species.flock.as_ref().unwrap(),
            &self.index,
            &self.population,
        )
    }

    fn context<'a>(
        &'a self,
        id: AgentId,
        neighborhood: &'a Neighborhood<'a>,
    ) -> SteeringContext<'a> {
        let agent = self.population.get(id).unwrap();
        let species = self.params.species.get(agent.species);
        SteeringContext {
            agent,
            species,
            flock: species.flock.as_ref().unwrap(),
            neighborhood,
            bounds: self.params.bounds(),
        }
    }
}

#[test]
fn test_seek_is_limited_by_max_force() {
    let force = seek(&vec2(0.0, 0.0), &vec2(0.0, 0.0), &vec2(100.0, 0.0), 3.0, 0.5);
    assert!((force[0] - 0.5).abs() < 1e-6);
    assert_eq!(force[1], 0.0);
}

#[test]
fn test_flee_from_points_away() {
    let force = flee_from(&vec2(10.0, 10.0), &vec2(10.0, 20.0), 0.2);
    assert!(force[1] < 0.0);
    assert!((magnitude(&force) - 0.2).abs() < 1e-6);
}

#[test]
fn test_edge_avoidance_pushes_inward() {
    let bounds = WorldBounds::new(1000.0, 1000.0);
    let force = edge_avoidance(&vec2(5.0, 500.0), &bounds, 50.0, 1.0).unwrap();
    assert!(force[0] > 0.0);
    assert_eq!(force[1], 0.0);
    assert!(edge_avoidance(&vec2(500.0, 500.0), &bounds, 50.0, 1.0).is_none());
}

#[test]
fn test_reduced_set_skips_alignment_and_cohesion() {
    assert!(BehaviorSet::Full.includes(BehaviorKind::Cohesion));
    assert!(!BehaviorSet::Reduced.includes(BehaviorKind::Cohesion));
    assert!(!BehaviorSet::Reduced.includes(BehaviorKind::Alignment));
    assert!(BehaviorSet::Reduced.includes(BehaviorKind::Separation));
    assert!(BehaviorSet::Reduced.includes(BehaviorKind::Forage));
    assert!(BehaviorSet::Reduced.includes(BehaviorKind::EdgeAvoidance));
}

#[test]
fn test_fear_dominates_flocking() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    world.add(Species::Fish, 1010.0, 1000.0);
    world.add(Species::Fish, 1000.0, 1012.0);
    world.add(Species::Food, 1020.0, 1000.0);
    world.add(Species::Shark, 1060.0, 1000.0);

    let stack = default_stack();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let engine = SteeringEngine::new(&world.index, &world.population, &world.params);
    let agent = world.population.get(fish).unwrap();
    let output = engine.steer(agent, &stack, BehaviorSet::Full, &mut rng);

    let expected = flee_from(&agent.pos, &vec2(1060.0, 1000.0), agent.max_force);
    assert!(output.afraid);
    assert_eq!(output.force, expected);
    assert_eq!(
        output.speed_multiplier,
        world.params.species.fish.flock.as_ref().unwrap().flee_speed_multiplier
    );
}

#[test]
fn test_fear_outside_flee_radius_keeps_base_speed() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    world.add(Species::Shark, 1120.0, 1000.0);

    let stack = default_stack();
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let engine = SteeringEngine::new(&world.index, &world.population, &world.params);
    let output = engine.steer(
        world.population.get(fish).unwrap(),
        &stack,
        BehaviorSet::Full,
        &mut rng,
    );
    assert!(output.afraid);
    assert!(output.force[0] < 0.0);
    assert_eq!(output.speed_multiplier, 1.0);
}

#[test]
fn test_forage_reports_food_in_eat_radius() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    let near = world.add(Species::Food, 1003.0, 1000.0);
    world.add(Species::Food, 1050.0, 1000.0);

    let stack = default_stack();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let engine = SteeringEngine::new(&world.index, &world.population, &world.params);
    let output = engine.steer(
        world.population.get(fish).unwrap(),
        &stack,
        BehaviorSet::Full,
        &mut rng,
    );
    assert_eq!(output.consumed, Some(near));
    assert!(!output.afraid);
    assert!(output.force[0] > 0.0);
}

#[test]
fn test_food_out_of_eat_radius_is_only_sought() {
    let mut world = World::new();
    let krill = world.add(Species::Krill, 1000.0, 1000.0);
    world.add(Species::Food, 1000.0, 1040.0);

    let stack = default_stack();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let engine = SteeringEngine::new(&world.index, &world.population, &world.params);
    let output = engine.steer(
        world.population.get(krill).unwrap(),
        &stack,
        BehaviorSet::Reduced,
        &mut rng,
    );
    assert_eq!(output.consumed, None);
    assert!(output.force[1] > 0.0);
}

#[test]
fn test_separation_pushes_apart() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    world.add(Species::Fish, 1010.0, 1000.0);

    let stack = default_stack();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let engine = SteeringEngine::new(&world.index, &world.population, &world.params);
    let output = engine.steer(
        world.population.get(fish).unwrap(),
        &stack,
        BehaviorSet::Reduced,
        &mut rng,
    );
    assert!(output.force[0] < 0.0);
    assert!(output.force[1].abs() < 1e-6);
}

#[test]
fn test_lone_agent_wanders() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);

    let stack = default_stack();
    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let engine = SteeringEngine::new(&world.index, &world.population, &world.params);
    let agent = world.population.get(fish).unwrap();
    let output = engine.steer(agent, &stack, BehaviorSet::Full, &mut rng);

    let flock = world.params.species.fish.flock.as_ref().unwrap();
    let target = output.wander_target.expect("wander target");
    assert!(distance_sq(&agent.pos, &target) <= flock.wander_distance * flock.wander_distance + 1e-3);
    assert!(!output.afraid);
    assert_eq!(output.consumed, None);
}

#[test]
fn test_frightened_agent_does_not_eat() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    world.add(Species::Food, 1003.0, 1000.0);
    world.add(Species::Shark, 1060.0, 1000.0);

    let stack = default_stack();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let engine = SteeringEngine::new(&world.index, &world.population, &world.params);
    let output = engine.steer(
        world.population.get(fish).unwrap(),
        &stack,
        BehaviorSet::Full,
        &mut rng,
    );
    assert!(output.afraid);
    assert_eq!(output.consumed, None);
}

#[test]
fn test_alignment_matches_neighbor_heading() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    let mate = world.add(Species::Fish, 1030.0, 1000.0);
    world.population.get_mut(mate).unwrap().vel = vec2(0.0, 3.0);

    let neighborhood = world.neighborhood(fish);
    let ctx = world.context(fish, &neighborhood);
    let force = Alignment.steer(&ctx).unwrap();
    assert!(force[1] > 0.0);
    assert!(force[0].abs() < 1e-6);
}

#[test]
fn test_cohesion_pulls_toward_centroid() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    world.add(Species::Fish, 1040.0, 990.0);
    world.add(Species::Fish, 1040.0, 1010.0);

    let neighborhood = world.neighborhood(fish);
    let ctx = world.context(fish, &neighborhood);
    let force = Cohesion.steer(&ctx).unwrap();
    assert!(force[0] > 0.0);
    assert!(force[1].abs() < 1e-6);
}

#[test]
fn test_flocking_rules_idle_without_neighbors() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    world.add(Species::Fish, 1200.0, 1000.0);

    let neighborhood = world.neighborhood(fish);
    let ctx = world.context(fish, &neighborhood);
    assert!(Alignment.steer(&ctx).is_none());
    assert!(Cohesion.steer(&ctx).is_none());
}

#[test]
fn test_wander_keeps_waypoint_until_arrival() {
    let mut world = World::new();
    let fish = world.add(Species::Fish, 1000.0, 1000.0);
    let flock = world.params.species.fish.flock.clone().unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    let neighborhood = world.neighborhood(fish);
    let ctx = world.context(fish, &neighborhood);

    let far = vec2(1100.0, 1000.0);
    let (force, kept) = Wander.steer(&ctx, Some(&far), &mut rng);
    assert_eq!(kept, far);
    assert!(force[0] > 0.0);

    let near = vec2(1000.0 + flock.wander_tolerance / 2.0, 1000.0);
    let (_, fresh) = Wander.steer(&ctx, Some(&near), &mut rng);
    assert_ne!(fresh, near);
    let pos = vec2(1000.0, 1000.0);
    assert!(distance_sq(&pos, &fresh) <= flock.wander_distance * flock.wander_distance + 1e-3);
}
