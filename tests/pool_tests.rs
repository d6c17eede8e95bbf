#![allow(missing_docs)]

use shoal::simulation::agent::{Behavior, Species};
use shoal::simulation::error::SimError;
use shoal::simulation::geometric_utils::vec2;
use shoal::simulation::params::Params;
use shoal::simulation::pool::EntityPool;
use shoal::simulation::population::Population;
use shoal::simulation::predator::PredatorMode;

fn create_test_params() -> Params {
    let mut params = Params::default();
    for species in Species::ALL {
        params.species.get_mut(species).initial_count = 0;
    }
    params.species.shark.capacity = 2;
    params.species.egg.capacity = 1;
    params
}

#[test]
fn test_acquire_until_exhausted() {
    let mut pool = EntityPool::new(Species::Food, 3);
    for _ in 0..3 {
        pool.acquire().unwrap();
    }
    assert!(pool.is_exhausted());
    assert_eq!(pool.acquire(), Err(SimError::Exhausted(Species::Food)));
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.outstanding(), 3);
}

#[test]
fn test_acquired_slot_holds_pool_species() {
    let mut pool = EntityPool::new(Species::Fish, 2);
    let handle = pool.acquire().unwrap();
    let agent = pool.resolve(handle).unwrap();
    assert_eq!(agent.species, Species::Fish);
    assert!(matches!(agent.behavior, Behavior::Flock(_)));
    assert_eq!(agent.id, 0);

    pool.release(handle).unwrap();
    let reused = pool.acquire().unwrap();
    assert_eq!(pool.resolve(reused).unwrap().species, Species::Fish);
}

#[test]
fn test_release_reuses_slot_lifo() {
    let mut pool = EntityPool::new(Species::Fish, 4);
    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    pool.release(a).unwrap();
    pool.release(b).unwrap();

    let c = pool.acquire().unwrap();
    assert_eq!(c.slot, b.slot);
    assert_ne!(c.generation, b.generation);
    assert_eq!(pool.outstanding(), 1);
}

#[test]
fn test_stale_handle_rejected() {
    let mut pool = EntityPool::new(Species::Egg, 2);
    let handle = pool.acquire().unwrap();
    pool.release(handle).unwrap();

    let err = pool.release(handle).unwrap_err();
    assert_eq!(
        err,
        SimError::StaleHandle {
            slot: handle.slot,
            generation: handle.generation,
        }
    );

    let reused = pool.acquire().unwrap();
    assert!(pool.resolve(handle).is_none());
    assert!(pool.resolve(reused).is_some());
}

#[test]
fn test_released_slot_is_vacant() {
    let params = create_test_params();
    let mut population = Population::new(&params);
    let shark = population
        .spawn(Species::Shark, &vec2(10.0, 10.0), &params, 5)
        .unwrap();
    assert!(population.kill(shark));
    assert_eq!(population.reclaim(), vec![shark]);

    let pool = population.pool(Species::Shark);
    assert!(pool.is_empty());
    assert!(pool.get(0).is_none());
    assert!(population.get(shark).is_none());

    let next = population
        .spawn(Species::Shark, &vec2(20.0, 20.0), &params, 9)
        .unwrap();
    assert_ne!(next, shark);
    let agent = population.get(next).unwrap();
    let state = agent.predator_state().unwrap();
    assert_eq!(state.mode, PredatorMode::Patrolling);
    assert_eq!(state.target, None);
    assert_eq!(state.entered_at, 9);
    assert_eq!(agent.meals, 0);
}

#[test]
fn test_population_spawn_sets_behavior() {
    let params = create_test_params();
    let mut population = Population::new(&params);
    let egg = population
        .spawn(Species::Egg, &vec2(1.0, 1.0), &params, 0)
        .unwrap();
    let food = population
        .spawn(Species::Food, &vec2(2.0, 2.0), &params, 0)
        .unwrap();

    assert_eq!(
        population.get(egg).unwrap().behavior,
        Behavior::Egg {
            hatch_in: params.egg_hatch_ticks
        }
    );
    assert_eq!(
        population.get(food).unwrap().behavior,
        Behavior::Consumable {
            ttl: params.food_lifetime
        }
    );
    assert_eq!(
        population.spawn(Species::Egg, &vec2(3.0, 3.0), &params, 0),
        Err(SimError::Exhausted(Species::Egg))
    );
}

#[test]
fn test_ids_are_never_reused() {
    let params = create_test_params();
    let mut population = Population::new(&params);
    let mut seen = Vec::new();
    for _ in 0..5 {
        let id = population
            .spawn(Species::Egg, &vec2(1.0, 1.0), &params, 0)
            .unwrap();
        assert!(!seen.contains(&id));
        seen.push(id);
        population.kill(id);
        population.reclaim();
    }
    assert_eq!(population.pool(Species::Egg).capacity(), 1);
}
