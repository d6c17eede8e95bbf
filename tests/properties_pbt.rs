#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use std::collections::HashMap;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use shoal::simulation::agent::{Agent, AgentId, Species};
use shoal::simulation::ecosystem::Ecosystem;
use shoal::simulation::geometric_utils::{WorldBounds, distance_sq, vec2};
use shoal::simulation::integrator::integrate;
use shoal::simulation::params::Params;
use shoal::simulation::pool::EntityPool;
use shoal::simulation::population::Population;
use shoal::simulation::scheduler::{LodTier, UpdateMode, UpdateScheduler};
use shoal::simulation::spatial::SpatialIndex;

fn create_test_params(seed: u64) -> Params {
    let mut params = Params::default();
    params.world_width = 900.0;
    params.world_height = 600.0;
    params.seed = seed;
    params.batch_size = 16;
    params.food_target = 15;
    for species in Species::ALL {
        params.species.get_mut(species).initial_count = 0;
    }
    params.species.krill.initial_count = 40;
    params.species.fish.initial_count = 20;
    params.species.shark.initial_count = 2;
    params.species.orca.initial_count = 1;
    params
}

prop_compose! {
    fn arb_point()(
        x in -200.0f32..1200.0,
        y in -200.0f32..800.0
    ) -> (f32, f32) {
        (x, y)
    }
}

#[derive(Debug, Clone)]
enum PoolOp {
    Acquire,
    Release(usize),
}

fn arb_pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![Just(PoolOp::Acquire), (0usize..16).prop_map(PoolOp::Release)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_integration_keeps_agents_inside(
        (x, y) in arb_point(),
        vx in -50.0f32..50.0,
        vy in -50.0f32..50.0,
        fx in -5.0f32..5.0,
        fy in -5.0f32..5.0,
        seed in any::<u64>()
    ) {
        let bounds = WorldBounds::new(1000.0, 600.0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut agent = Agent::vacant(Species::Fish);
        agent.pos = vec2(x, y);
        agent.vel = vec2(vx, vy);
        agent.max_speed = 3.0;
        agent.max_force = 0.1;

        integrate(&mut agent, &vec2(fx, fy), 1.5, 0.5, &bounds, &mut rng);

        prop_assert!(bounds.contains(&agent.pos), "escaped to {:?}", agent.pos);
        prop_assert!(agent.acc.iter().all(|&c| c == 0.0));
        let speed_sq = agent.vel.dot(&agent.vel);
        prop_assert!(speed_sq <= 4.5f32.powi(2) + 1e-3);
        prop_assert!(speed_sq >= 0.5f32.powi(2) - 1e-3);
    }

    #[test]
    fn test_index_consistent_after_random_moves(
        moves in prop::collection::vec((0usize..20, arb_point()), 1..60)
    ) {
        let mut index = SpatialIndex::new(1000.0, 600.0, 75.0);
        let mut agents: Vec<Agent> = (0..20)
            .map(|i| {
                let mut agent = Agent::vacant(Species::Krill);
                agent.id = i + 1;
                agent.pos = vec2(10.0 + 40.0 * i as f32, 300.0);
                agent
            })
            .collect();
        for agent in &agents {
            index.insert(agent).unwrap();
        }

        for (which, (x, y)) in moves {
            agents[which].pos = vec2(x, y);
            index.relocate(&agents[which]).unwrap();
        }

        prop_assert_eq!(index.len(), agents.len());
        for agent in &agents {
            prop_assert_eq!(index.cell_of(agent.id), index.cell_key(&agent.pos));
            let hits = index.query_radius(&agent.pos, 0.0);
            prop_assert!(hits.iter().any(|n| n.id == agent.id));
        }

        let center = vec2(500.0, 300.0);
        let found = index.query_radius(&center, 250.0).len();
        let expected = agents
            .iter()
            .filter(|a| distance_sq(&a.pos, &center) <= 250.0 * 250.0)
            .count();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn test_pool_outstanding_never_exceeds_capacity(
        capacity in 1usize..12,
        ops in prop::collection::vec(arb_pool_op(), 0..80)
    ) {
        let mut pool = EntityPool::new(Species::Food, capacity);
        let mut live = Vec::new();

        for op in ops {
            match op {
                PoolOp::Acquire => {
                    if let Ok(handle) = pool.acquire() {
                        live.push(handle);
                    } else {
                        prop_assert_eq!(live.len(), capacity);
                    }
                }
                PoolOp::Release(i) if !live.is_empty() => {
                    let handle = live.swap_remove(i % live.len());
                    prop_assert!(pool.release(handle).is_ok());
                    prop_assert!(pool.release(handle).is_err());
                }
                PoolOp::Release(_) => {}
            }
            prop_assert!(pool.outstanding() <= capacity as u64);
            prop_assert_eq!(pool.len(), live.len());
        }
    }

    #[test]
    fn test_every_agent_gets_a_full_update(
        xs in prop::collection::vec(0.0f32..4000.0, 1..40),
        batch_size in 1usize..9
    ) {
        let mut params = create_test_params(0);
        params.world_width = 4000.0;
        params.batch_size = batch_size;
        let mut population = Population::new(&params);
        let ids: Vec<AgentId> = xs
            .iter()
            .map(|&x| population.spawn(Species::Krill, &vec2(x, 300.0), &params, 0).unwrap())
            .collect();
        let mut scheduler = UpdateScheduler::new(&params);
        let viewpoint = vec2(0.0, 300.0);

        let bound = ids.len().div_ceil(batch_size) as u64 + LodTier::Low.cadence();
        let mut last_full: HashMap<AgentId, u64> = HashMap::new();
        for tick in 0..(4 * bound) {
            let plan = scheduler.plan(tick, &viewpoint, &population);
            for entry in &plan.entries {
                if matches!(entry.mode, UpdateMode::Full(_)) {
                    last_full.insert(entry.id, tick);
                }
            }
            if tick >= bound {
                for id in &ids {
                    let last = last_full.get(id).copied();
                    prop_assert!(last.is_some_and(|last| tick - last <= bound));
                }
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(6))]

    #[test]
    fn test_ecosystem_invariants(seed in any::<u64>(), vx in 0.0f32..900.0) {
        let mut ecosystem = Ecosystem::new(create_test_params(seed)).unwrap();
        let bounds = ecosystem.params().bounds();
        let viewpoint = vec2(vx, 300.0);

        for _ in 0..60 {
            ecosystem.advance_tick(&viewpoint);
        }

        prop_assert_eq!(ecosystem.index().len(), ecosystem.population().total());
        for species in Species::ALL {
            let pool = ecosystem.population().pool(species);
            prop_assert!(pool.outstanding() <= pool.capacity() as u64);
            for agent in ecosystem.agents(species) {
                prop_assert!(bounds.contains(&agent.pos));
                prop_assert_eq!(
                    ecosystem.index().cell_of(agent.id),
                    ecosystem.index().cell_key(&agent.pos)
                );
            }
        }
    }
}
