//! Solution representation: one route per vehicle.

use crate::config::Config;
use crate::order_search::OrderOutcome;
use crate::problem::Problem;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Routes for the whole fleet, indexed by vehicle.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Route of every vehicle, depot excluded
    pub routes: Vec<Vec<usize>>,
    /// Number of distinct supply points served
    pub score: usize,
    /// Processing order that produced the routes
    pub order: Vec<usize>,
    /// Attempt of that order
    pub attempt: usize,
}

impl Solution {
    /// Create a solution with an empty route for every vehicle.
    pub fn new(vehicle_count: usize) -> Self {
        Solution {
            routes: vec![Vec::new(); vehicle_count],
            score: 0,
            order: Vec::new(),
            attempt: 0,
        }
    }

    /// Arrange the routes of an order attempt by vehicle index.
    pub fn from_outcome(outcome: OrderOutcome, vehicle_count: usize) -> Self {
        let mut solution = Solution::new(vehicle_count);
        for vehicle in outcome.vehicles {
            if let Some(route) = solution.routes.get_mut(vehicle.vehicle) {
                *route = vehicle.route;
            }
        }
        solution.score = outcome.score;
        solution.order = outcome.order;
        solution.attempt = outcome.attempt;
        solution
    }

    /// One line per vehicle: the route length followed by its points.
    pub fn to_output_string(&self) -> String {
        self.routes
            .iter()
            .map(|route| {
                std::iter::once(route.len())
                    .chain(route.iter().copied())
                    .map(|value| value.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Distance driven by a vehicle, starting at the depot.
    pub fn route_distance(&self, problem: &Problem, vehicle: usize) -> u64 {
        let route = match self.routes.get(vehicle) {
            Some(route) => route,
            None => return 0,
        };

        std::iter::once(0)
            .chain(route.iter().copied())
            .zip(route.iter().copied())
            .map(|(from, to)| problem.get_distance(from, to))
            .sum()
    }

    /// Supply points visited over all routes.
    pub fn served_supply_points(&self, problem: &Problem) -> usize {
        self.routes
            .iter()
            .flatten()
            .filter(|&&point| problem.is_supply(point))
            .count()
    }

    /// Check the routes against the problem constraints, returning every
    /// violation found.
    pub fn validate(&self, problem: &Problem, config: &Config) -> Vec<String> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();

        if self.routes.len() != problem.vehicle_count() {
            violations.push(format!(
                "{} routes for {} vehicles",
                self.routes.len(),
                problem.vehicle_count()
            ));
        }

        for (vehicle, route) in self.routes.iter().enumerate() {
            let mut cargo: i64 = 0;
            for &point in route {
                if point == 0 || point >= problem.point_count() {
                    violations.push(format!("vehicle {} visits invalid point {}", vehicle, point));
                    continue;
                }
                if !seen.insert(point) {
                    violations.push(format!("point {} visited more than once", point));
                }

                cargo += if problem.is_supply(point) { 1 } else { -1 };
                if cargo < 0 || cargo > i64::from(config.capacity) {
                    violations.push(format!(
                        "vehicle {} cargo {} out of range at point {}",
                        vehicle, cargo, point
                    ));
                }
            }
            if cargo != 0 {
                violations.push(format!("vehicle {} ends with cargo {}", vehicle, cargo));
            }

            if let Some(&fuel) = problem.fuel.get(vehicle) {
                let distance = self.route_distance(problem, vehicle);
                if distance > fuel {
                    violations.push(format!(
                        "vehicle {} drives {} with fuel {}",
                        vehicle, distance, fuel
                    ));
                }
            }
        }

        let served = self.served_supply_points(problem);
        if served != self.score {
            violations.push(format!("score {} but {} supply points served", self.score, served));
        }

        violations
    }
}

impl fmt::Debug for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution:")?;
        writeln!(f, "  Score: {}", self.score)?;
        writeln!(f, "  Order: {:?} (attempt {})", self.order, self.attempt)?;

        for (i, route) in self.routes.iter().enumerate() {
            writeln!(f, "  Route {}: {:?}", i, route)?;
        }

        Ok(())
    }
}
