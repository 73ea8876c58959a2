//! Route search for one fixed processing order of the fleet.

use crate::config::Config;
use crate::distance_index::DistanceIndex;
use crate::error::SearchError;
use crate::explorer::{BranchExplorer, VehicleOutcome};
use crate::problem::Problem;
use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Result of one attempt at a processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOutcome {
    /// Vehicle indices in the order they were processed
    pub order: Vec<usize>,
    /// Attempt number of this order
    pub attempt: usize,
    /// Supply points occupied after every vehicle committed
    pub score: usize,
    /// Per-vehicle results, in processing order
    pub vehicles: Vec<VehicleOutcome>,
}

impl OrderOutcome {
    /// The committed route of a vehicle, if it was processed.
    pub fn route(&self, vehicle: usize) -> Option<&[usize]> {
        self.vehicles
            .iter()
            .find(|outcome| outcome.vehicle == vehicle)
            .map(|outcome| outcome.route.as_slice())
    }
}

/// Processes vehicles one after another against a single index, each one
/// committing its best route before the next is explored.
pub struct OrderSearch<'a> {
    problem: &'a Problem,
    template: &'a DistanceIndex,
    config: &'a Config,
}

impl<'a> OrderSearch<'a> {
    /// `template` provides the lookup tables; every run starts from a fresh
    /// occupancy over them.
    pub fn new(problem: &'a Problem, template: &'a DistanceIndex, config: &'a Config) -> Self {
        OrderSearch {
            problem,
            template,
            config,
        }
    }

    /// Explore every vehicle of `order` in turn.
    pub fn run<R: Rng + ?Sized>(
        &self,
        order: &[usize],
        attempt: usize,
        rng: &mut R,
    ) -> Result<OrderOutcome, SearchError> {
        let mut index = self.template.fresh();
        let mut vehicles = Vec::with_capacity(order.len());

        for &vehicle_index in order {
            let vehicle = self
                .problem
                .vehicle(vehicle_index)
                .ok_or(SearchError::UnknownVehicle(vehicle_index))?;

            let outcome =
                BranchExplorer::new(&mut index, vehicle, self.config, &mut *rng).explore()?;
            vehicles.push(outcome);
        }

        let score = index.used_n_points();
        info!(
            "Order {:?} attempt {}: {} of {} supply points served",
            order,
            attempt,
            score,
            self.problem.n
        );

        Ok(OrderOutcome {
            order: order.to_vec(),
            attempt,
            score,
            vehicles,
        })
    }
}
