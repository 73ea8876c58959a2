//! Unit tests for the distance index and its occupancy tracking.

use fuel_routes::distance_index::{Allowed, DistanceIndex, Nearest};
use fuel_routes::error::SearchError;
use fuel_routes::problem::{PointKind, Problem};

/// Depot, one supply point and one demand point.
fn create_small_problem() -> Problem {
    Problem::new(
        "small".to_string(),
        1,
        1,
        vec![vec![0, 5, 10], vec![5, 0, 3], vec![10, 3, 0]],
        vec![20],
    )
    .unwrap()
}

/// Three supply points next to the depot, three demand points further out.
fn create_cluster_problem() -> Problem {
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
    Problem::new("cluster".to_string(), 3, 3, matrix, vec![100]).unwrap()
}

#[test]
fn test_point_classification() {
    let index = DistanceIndex::new(&create_cluster_problem(), 10);

    assert_eq!(index.kind(0), PointKind::Depot);
    assert_eq!(index.kind(2), PointKind::Supply);
    assert_eq!(index.kind(5), PointKind::Demand);
    assert!(index.is_supply(3));
    assert!(!index.is_supply(4));
    assert!(index.is_demand(6));
    assert!(!index.is_demand(0));
    assert_eq!(index.point_count(), 7);
    assert_eq!(index.n(), 3);
    assert_eq!(index.m(), 3);
    assert_eq!(index.closest_range(), 10);
}

#[test]
fn test_use_and_free_track_supply_count() {
    let mut index = DistanceIndex::new(&create_small_problem(), 10);

    assert!(index.has_free_n_points());
    index.use_point(1).unwrap();
    assert!(index.is_used(1));
    assert_eq!(index.used_n_points(), 1);
    assert!(!index.has_free_n_points());

    // Demand points do not count towards the supply counter
    index.use_point(2).unwrap();
    assert_eq!(index.used_n_points(), 1);

    index.free_point(2).unwrap();
    index.free_point(1).unwrap();
    assert_eq!(index.used_n_points(), 0);
    assert!(index.used_points().is_empty());
}

#[test]
fn test_invalid_reservations_are_rejected() {
    let mut index = DistanceIndex::new(&create_small_problem(), 10);

    index.use_point(1).unwrap();
    assert_eq!(index.use_point(1), Err(SearchError::PointAlreadyUsed(1)));
    assert_eq!(index.free_point(2), Err(SearchError::PointNotUsed(2)));
    assert_eq!(index.use_point(0), Err(SearchError::UnknownPoint(0)));
    assert_eq!(index.use_point(3), Err(SearchError::UnknownPoint(3)));

    // Failed calls leave the occupancy untouched
    assert_eq!(index.used_points(), vec![1]);
    assert_eq!(index.used_n_points(), 1);
}

#[test]
fn test_nearest_returns_all_targets_at_smallest_distance() {
    let index = DistanceIndex::new(&create_cluster_problem(), 10);

    match index.nearest(0, 100, Allowed::Supply, None) {
        Nearest::Found {
            targets,
            distance,
            closest,
        } => {
            assert_eq!(targets, vec![1, 2, 3]);
            assert_eq!(distance, 1);
            assert!(closest);
        }
        Nearest::Exhausted => panic!("expected supply points"),
    }

    match index.nearest(0, 100, Allowed::Demand, None) {
        Nearest::Found { targets, distance, .. } => {
            assert_eq!(targets, vec![4, 5, 6]);
            assert_eq!(distance, 10);
        }
        Nearest::Exhausted => panic!("expected demand points"),
    }
}

#[test]
fn test_nearest_skips_used_points_and_respects_budget() {
    let mut index = DistanceIndex::new(&create_cluster_problem(), 10);

    index.use_point(1).unwrap();
    index.use_point(2).unwrap();
    index.use_point(3).unwrap();

    assert_eq!(index.nearest(0, 100, Allowed::Supply, None), Nearest::Exhausted);
    assert_eq!(index.nearest(0, 9, Allowed::Any, None), Nearest::Exhausted);
    match index.nearest(0, 10, Allowed::Any, None) {
        Nearest::Found { targets, .. } => assert_eq!(targets, vec![4, 5, 6]),
        Nearest::Exhausted => panic!("demand points are within budget"),
    }
}

#[test]
fn test_nearest_with_forced_distance() {
    let index = DistanceIndex::new(&create_small_problem(), 10);

    match index.nearest(0, 20, Allowed::Any, Some(10)) {
        Nearest::Found { targets, distance, .. } => {
            assert_eq!(targets, vec![2]);
            assert_eq!(distance, 10);
        }
        Nearest::Exhausted => panic!("point 2 sits at distance 10"),
    }

    // Point 2 is a demand point, so no supply point exists at that distance
    assert_eq!(index.nearest(0, 20, Allowed::Supply, Some(10)), Nearest::Exhausted);
    // No bucket at this distance at all
    assert_eq!(index.nearest(0, 20, Allowed::Any, Some(7)), Nearest::Exhausted);
}

#[test]
fn test_closest_flag_outside_range() {
    let problem = Problem::new(
        "far".to_string(),
        2,
        0,
        vec![vec![0, 1, 20], vec![1, 0, 20], vec![20, 20, 0]],
        vec![100],
    )
    .unwrap();
    let mut index = DistanceIndex::new(&problem, 10);

    assert_eq!(index.closest_distances(0), &[1]);

    index.use_point(1).unwrap();
    match index.nearest(0, 100, Allowed::Any, None) {
        Nearest::Found {
            targets,
            distance,
            closest,
        } => {
            assert_eq!(targets, vec![2]);
            assert_eq!(distance, 20);
            assert!(!closest);
        }
        Nearest::Exhausted => panic!("point 2 is free"),
    }
}

#[test]
fn test_initial_closest_distances_follow_occupancy() {
    let mut index = DistanceIndex::new(&create_cluster_problem(), 10);

    assert_eq!(index.initial_closest_distances(), vec![1, 10]);

    for point in 1..=3 {
        index.use_point(point).unwrap();
    }
    assert_eq!(index.initial_closest_distances(), vec![10]);

    for point in 4..=6 {
        index.use_point(point).unwrap();
    }
    assert!(index.initial_closest_distances().is_empty());
}

#[test]
fn test_fresh_index_shares_tables_but_not_occupancy() {
    let mut index = DistanceIndex::new(&create_small_problem(), 10);
    index.use_point(1).unwrap();

    let fresh = index.fresh();
    assert!(!fresh.is_used(1));
    assert_eq!(fresh.used_n_points(), 0);
    assert_eq!(fresh.distance(1, 2), 3);
    assert_eq!(fresh.distance(0, 2), 10);
}
