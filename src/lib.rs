//! # fuel_routes
//!
//! Pickup and delivery routing for a fleet with fuel budgets.
//!
//! Every vehicle starts at the depot, loads cargo at supply points and drops
//! it at demand points. A point can be visited by one vehicle only, cargo
//! stays within the shared capacity and must be back at zero when the vehicle
//! stops, and the driven distance never exceeds the vehicle fuel. The goal is
//! to serve as many supply points as possible.
//!
//! The search is a randomized greedy heuristic: for every processing order of
//! the fleet, each vehicle builds nearest-neighbour routes, explores recorded
//! branch alternatives within a time budget and commits its best route before
//! the next vehicle starts.

pub mod config;
pub mod distance_index;
pub mod error;
pub mod explorer;
pub mod order_search;
pub mod problem;
pub mod route_builder;
pub mod solution;
pub mod sweep;
pub mod utils;

use crate::config::Config;
use crate::problem::Problem;
use crate::solution::Solution;
use crate::sweep::PermutationSweep;

use std::time::{Duration, Instant};

/// Runs the route search for one problem instance.
pub struct RouteSolver {
    pub problem: Problem,
    pub config: Config,
    pub best_solution: Option<Solution>,
    pub run_time: Duration,
}

impl RouteSolver {
    /// Create a solver for the given problem and configuration.
    pub fn new(problem: Problem, config: Config) -> Self {
        RouteSolver {
            problem,
            config,
            best_solution: None,
            run_time: Duration::from_secs(0),
        }
    }

    /// Run the sweep over processing orders. `None` when no attempt succeeded.
    pub fn run(&mut self) -> Option<&Solution> {
        let start_time = Instant::now();

        self.best_solution = PermutationSweep::new(&self.problem, &self.config).run();

        self.run_time = start_time.elapsed();
        self.best_solution.as_ref()
    }

    /// Supply points served by the best solution.
    pub fn score(&self) -> usize {
        self.best_solution.as_ref().map_or(0, |solution| solution.score)
    }
}
