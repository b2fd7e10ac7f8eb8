//! Integration tests for the spatial Prisoner's Dilemma engine

use cooperation_engine::{NeighborIndexKind, PdSimulation, SimParams, Strategy, Vec2, WrapMode};

fn trajectory(sim: &PdSimulation) -> Vec<(Strategy, u64)> {
    sim.population()
        .unwrap()
        .iter()
        .map(|a| (a.strategy, a.fitness.to_bits()))
        .collect()
}

#[test]
fn reference_scenario_is_reproducible() {
    let params = SimParams::new(0.02, 0.175, 100, 50, false);
    let mut first = PdSimulation::new(params.clone(), 42).unwrap();
    let mut second = PdSimulation::new(params, 42).unwrap();

    assert_eq!(first.run(50).unwrap(), 50);
    assert_eq!(second.run(50).unwrap(), 50);

    assert_eq!(first.epoch().unwrap(), 50);
    let coop = first.count_cooperators().unwrap();
    assert!(coop <= 100);
    assert_eq!(coop, second.count_cooperators().unwrap());
    assert_eq!(first.population_snapshot().unwrap(), second.population_snapshot().unwrap());
    assert_eq!(trajectory(&first), trajectory(&second));
}

#[test]
fn split_runs_match_single_run() {
    let params = SimParams::new(0.06, 0.2, 200, 30, false);
    let mut whole = PdSimulation::new(params.clone(), 7).unwrap();
    let mut pieces = PdSimulation::new(params, 7).unwrap();

    whole.run(30).unwrap();
    for _ in 0..6 {
        pieces.run(5).unwrap();
    }
    assert_eq!(trajectory(&whole), trajectory(&pieces));
}

#[test]
fn different_seeds_give_different_populations() {
    let params = SimParams::new(0.05, 0.175, 100, 1, false);
    let a = PdSimulation::new(params.clone(), 1).unwrap();
    let b = PdSimulation::new(params, 2).unwrap();
    assert_ne!(a.population_snapshot().unwrap(), b.population_snapshot().unwrap());
}

#[test]
fn neighbor_lists_are_symmetric_for_any_seed() {
    for seed in 0..5u64 {
        for wrap in [WrapMode::Independent, WrapMode::Legacy] {
            let params = SimParams::new(0.07, 0.175, 250, 1, false).with_wrap_mode(wrap);
            let sim = PdSimulation::new(params, seed).unwrap();
            let agents = sim.population().unwrap();
            for (i, agent) in agents.iter().enumerate() {
                assert!(!agent.neighbors.contains(&i));
                for &j in &agent.neighbors {
                    assert!(agents[j].neighbors.contains(&i), "seed {} pair ({}, {})", seed, i, j);
                }
            }
        }
    }
}

#[test]
fn wrap_boundary_pair_are_neighbors() {
    let params = SimParams::new(0.05, 0.175, 3, 1, false);
    let layout = [
        (Vec2::new(0.01, 0.5), Strategy::Cooperate),
        (Vec2::new(0.99, 0.5), Strategy::Defect),
        (Vec2::new(0.5, 0.5), Strategy::Cooperate),
    ];
    for kind in [NeighborIndexKind::BruteForce, NeighborIndexKind::Grid] {
        let mut sim = PdSimulation::uninitialized(params.clone(), 0).with_neighbor_index(kind);
        sim.setup_from_layout(params.clone(), &layout).unwrap();
        let agents = sim.population().unwrap();
        assert_eq!(agents[0].neighbors, vec![1]);
        assert_eq!(agents[1].neighbors, vec![0]);
        assert!(agents[2].neighbors.is_empty());
    }
}

#[test]
fn uniform_populations_are_absorbing() {
    for strategy in [Strategy::Cooperate, Strategy::Defect] {
        let params = SimParams::new(0.2, 0.3, 30, 20, false);
        let layout: Vec<(Vec2, Strategy)> = (0..30)
            .map(|i| (Vec2::new((i as f64 * 0.137) % 1.0, (i as f64 * 0.291) % 1.0), strategy))
            .collect();
        let mut sim = PdSimulation::uninitialized(params.clone(), 5);
        sim.setup_from_layout(params, &layout).unwrap();
        sim.run(20).unwrap();
        let expected = if strategy == Strategy::Cooperate { 30 } else { 0 };
        assert_eq!(sim.count_cooperators().unwrap(), expected);
    }
}

#[test]
fn isolated_agents_never_change() {
    let params = SimParams::new(0.0, 0.175, 50, 10, true);
    let mut sim = PdSimulation::new(params, 13).unwrap();
    let before = sim.population_snapshot().unwrap();
    sim.run(10).unwrap();
    assert_eq!(sim.population_snapshot().unwrap(), before);
    assert!(sim.population().unwrap().iter().all(|a| a.fitness == 0.0));
    assert_eq!(sim.neighbor_histogram().unwrap(), vec![50]);
}

#[test]
fn cooperator_count_stays_in_bounds() {
    for (u, seed) in [(0.0, 1u64), (0.175, 2), (0.9, 3)] {
        let mut sim = PdSimulation::new(SimParams::new(0.05, u, 150, 40, false), seed).unwrap();
        for _ in 0..8 {
            sim.run(5).unwrap();
            let coop = sim.count_cooperators().unwrap();
            assert!(coop <= 150);
            assert_eq!(coop + sim.count_defectors().unwrap(), 150);
        }
        assert_eq!(sim.epoch().unwrap(), 40);
    }
}

#[test]
fn temptation_does_not_help_cooperators() {
    let mean_final_cooperators = |u: f64| {
        let seeds = 0..8u64;
        let total: usize = seeds
            .clone()
            .map(|seed| {
                let mut sim = PdSimulation::new(SimParams::new(0.1, u, 200, 30, false), 1000 + seed).unwrap();
                sim.run_to_end().unwrap();
                sim.count_cooperators().unwrap()
            })
            .sum();
        total as f64 / seeds.count() as f64
    };
    let without_temptation = mean_final_cooperators(0.0);
    let strong_temptation = mean_final_cooperators(0.9);
    assert!(
        without_temptation >= strong_temptation,
        "u=0 mean {} below u=0.9 mean {}",
        without_temptation,
        strong_temptation
    );
}

#[test]
fn reset_keeps_parameters_and_average_mode() {
    let params = SimParams::new(0.1, 0.175, 40, 5, true);
    let mut sim = PdSimulation::new(params.clone(), 3).unwrap();
    sim.run(5).unwrap();
    sim.reset().unwrap();
    assert_eq!(sim.epoch().unwrap(), 0);
    assert_eq!(sim.active_params().unwrap(), &params);
    assert_eq!(sim.run(10).unwrap(), 5);
}
