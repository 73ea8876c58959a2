//! Tests for per-vehicle branch exploration and order search.

use fuel_routes::config::Config;
use fuel_routes::distance_index::DistanceIndex;
use fuel_routes::explorer::{selection_index, AlternativePool, BranchExplorer};
use fuel_routes::order_search::OrderSearch;
use fuel_routes::problem::{Problem, Vehicle};
use fuel_routes::route_builder::RouteBuilder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Depot, one supply point and one demand point.
fn create_small_problem(fuel: u64) -> Problem {
    Problem::new(
        "small".to_string(),
        1,
        1,
        vec![vec![0, 5, 10], vec![5, 0, 3], vec![10, 3, 0]],
        vec![fuel],
    )
    .unwrap()
}

/// Three supply points next to the depot, three demand points further out.
fn create_cluster_problem(fuel: u64) -> Problem {
    let size = 7;
    let mut matrix = vec![vec![0; size]; size];
    for i in 0..size {
        for j in 0..size {
            if i == j {
                continue;
            }
            let supply = |p: usize| (1..=3).contains(&p);
            matrix[i][j] = match (i, j) {
                (0, p) | (p, 0) if supply(p) => 1,
                (0, _) | (_, 0) => 10,
                (a, b) if supply(a) && supply(b) => 1,
                _ => 2,
            };
        }
    }
    Problem::new("cluster".to_string(), 3, 3, matrix, vec![fuel]).unwrap()
}

/// Two supply/demand pairs: 1 -> 3 is close to the depot, 2 -> 4 is far.
fn create_two_vehicle_problem() -> Problem {
    let far = 1000;
    Problem::new(
        "two".to_string(),
        2,
        2,
        vec![
            vec![0, 2, 50, far, far],
            vec![2, 0, far, 2, far],
            vec![50, far, 0, 5, 2],
            vec![far, 2, 5, 0, far],
            vec![far, far, 2, far, 0],
        ],
        vec![5, 60],
    )
    .unwrap()
}

fn quick_config() -> Config {
    Config::new()
        .with_exploration_time(Duration::from_secs(2))
        .with_max_explorations(50)
}

#[test]
fn test_selection_index_pattern() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    assert_eq!(selection_index(0, 5, &mut rng), 0);
    assert_eq!(selection_index(2, 5, &mut rng), 4);
    assert_eq!(selection_index(3, 5, &mut rng), 0);
    assert_eq!(selection_index(4, 5, &mut rng), 4);
    for counter in [1, 5, 7] {
        assert!(selection_index(counter, 5, &mut rng) < 5);
    }
}

#[test]
fn test_alternative_pool_deduplicates() {
    let mut pool = AlternativePool::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert!(pool.push(vec![1, 2]));
    assert!(!pool.push(vec![1, 2]));
    assert_eq!(pool.extend(vec![vec![3], vec![1, 2], vec![4]]), 2);
    assert_eq!(pool.len(), 3);

    assert_eq!(pool.take(0, &mut rng), Some(vec![1, 2]));
    assert_eq!(pool.take(2, &mut rng), Some(vec![4]));
    // A consumed alternative is not accepted again
    assert!(!pool.push(vec![4]));
    assert_eq!(pool.take(3, &mut rng), Some(vec![3]));
    assert!(pool.is_empty());
    assert_eq!(pool.take(4, &mut rng), None);
}

#[test]
fn test_explorer_commits_best_route() {
    let problem = create_small_problem(20);
    let config = quick_config();
    let mut index = DistanceIndex::new(&problem, config.closest_range);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let outcome = BranchExplorer::new(&mut index, Vehicle::new(0, 20), &config, &mut rng)
        .explore()
        .unwrap();

    assert_eq!(outcome.route, vec![1, 2]);
    assert_eq!(outcome.score, 1);
    assert_eq!(index.used_points(), vec![1, 2]);
}

#[test]
fn test_explorer_without_feasible_route() {
    let problem = create_small_problem(4);
    let config = quick_config();
    let mut index = DistanceIndex::new(&problem, config.closest_range);
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let outcome = BranchExplorer::new(&mut index, Vehicle::new(0, 4), &config, &mut rng)
        .explore()
        .unwrap();

    assert!(outcome.route.is_empty());
    assert_eq!(outcome.score, 0);
    assert!(index.used_points().is_empty());
}

#[test]
fn test_explorer_history_is_monotonic() {
    let problem = create_cluster_problem(100);
    let config = quick_config();
    let mut index = DistanceIndex::new(&problem, config.closest_range);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let outcome = BranchExplorer::new(&mut index, Vehicle::new(0, 100), &config, &mut rng)
        .explore()
        .unwrap();

    assert_eq!(outcome.score, 3);
    assert_eq!(outcome.route, vec![1, 2, 3, 4, 5, 6]);
    assert!(outcome.explored > 0);
    assert!(!outcome.history.is_empty());
    assert!(outcome.history.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_explorer_respects_exploration_cap() {
    let problem = create_cluster_problem(100);
    let config = Config::new().with_max_explorations(1);
    let mut index = DistanceIndex::new(&problem, config.closest_range);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let outcome = BranchExplorer::new(&mut index, Vehicle::new(0, 100), &config, &mut rng)
        .explore()
        .unwrap();

    assert_eq!(outcome.explored, 1);
    assert_eq!(outcome.score, 3);
}

#[test]
fn test_explorer_stops_on_time_budget() {
    let problem = create_cluster_problem(100);
    let config = Config::new().with_exploration_time(Duration::ZERO);
    let mut index = DistanceIndex::new(&problem, config.closest_range);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    let outcome = BranchExplorer::new(&mut index, Vehicle::new(0, 100), &config, &mut rng)
        .explore()
        .unwrap();

    // The running iteration always completes
    assert!(outcome.explored >= 1);
    assert_eq!(outcome.score, 3);
}

#[test]
fn test_committed_route_replays_identically() {
    let problem = create_cluster_problem(100);
    let config = quick_config();
    let mut index = DistanceIndex::new(&problem, config.closest_range);
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    let outcome = BranchExplorer::new(&mut index, Vehicle::new(0, 100), &config, &mut rng)
        .explore()
        .unwrap();

    let mut replay_index = index.fresh();
    let mut builder = RouteBuilder::new(&mut replay_index, Vehicle::new(0, 100), &config)
        .with_hint(outcome.route.clone());
    builder.calculate().unwrap();

    assert_eq!(builder.route(), outcome.route);
    assert_eq!(builder.index().used_n_points(), outcome.score);
}

#[test]
fn test_order_search_commits_vehicles_in_sequence() {
    let problem = create_two_vehicle_problem();
    let config = quick_config();
    let template = DistanceIndex::new(&problem, config.closest_range);
    let search = OrderSearch::new(&problem, &template, &config);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let outcome = search.run(&[0, 1], 0, &mut rng).unwrap();
    assert_eq!(outcome.score, 2);
    assert_eq!(outcome.route(0), Some(&[1, 3][..]));
    assert_eq!(outcome.route(1), Some(&[2, 4][..]));

    // The template itself is never mutated
    assert!(template.used_points().is_empty());
}

#[test]
fn test_both_orders_reach_same_score_without_contention() {
    let problem = create_two_vehicle_problem();
    let config = quick_config();
    let template = DistanceIndex::new(&problem, config.closest_range);
    let search = OrderSearch::new(&problem, &template, &config);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let forward = search.run(&[0, 1], 0, &mut rng).unwrap();
    let backward = search.run(&[1, 0], 0, &mut rng).unwrap();

    assert_eq!(forward.score, 2);
    assert_eq!(backward.score, forward.score);
    assert_eq!(backward.route(1), Some(&[1, 3, 2, 4][..]));
    assert_eq!(backward.route(0), Some(&[][..]));
}

#[test]
fn test_order_search_rejects_unknown_vehicle() {
    let problem = create_small_problem(20);
    let config = quick_config();
    let template = DistanceIndex::new(&problem, config.closest_range);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let result = OrderSearch::new(&problem, &template, &config).run(&[3], 0, &mut rng);
    assert_eq!(result, Err(fuel_routes::error::SearchError::UnknownVehicle(3)));
}
