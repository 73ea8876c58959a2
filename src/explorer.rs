//! Branch exploration for a single vehicle.
//!
//! The explorer seeds a few greedy routes with different forced first hops,
//! then replays recorded alternatives until the pool is empty or the time
//! budget runs out. The best route found is committed by replaying it, which
//! leaves its points reserved for the vehicles processed afterwards.

use crate::config::Config;
use crate::distance_index::DistanceIndex;
use crate::error::SearchError;
use crate::problem::Vehicle;
use crate::route_builder::RouteBuilder;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;

/// Result of exploring one vehicle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleOutcome {
    pub vehicle: usize,
    /// Committed route, empty when nothing feasible was found
    pub route: Vec<usize>,
    /// Occupied supply points once the route is committed
    pub score: usize,
    /// Number of alternatives replayed
    pub explored: usize,
    /// Best score after every build, in order
    pub history: Vec<usize>,
}

/// Alternatives waiting to be replayed. Each sequence is accepted once.
#[derive(Debug, Default)]
pub struct AlternativePool {
    pending: Vec<Vec<usize>>,
    seen: HashSet<Vec<usize>>,
}

impl AlternativePool {
    pub fn new() -> Self {
        AlternativePool::default()
    }

    /// Queue an alternative unless it was seen before.
    pub fn push(&mut self, alternative: Vec<usize>) -> bool {
        if self.seen.contains(&alternative) {
            return false;
        }
        self.seen.insert(alternative.clone());
        self.pending.push(alternative);
        true
    }

    /// Queue all new alternatives, returning how many were accepted.
    pub fn extend<I: IntoIterator<Item = Vec<usize>>>(&mut self, alternatives: I) -> usize {
        alternatives
            .into_iter()
            .map(|alternative| self.push(alternative))
            .filter(|&accepted| accepted)
            .count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove the alternative chosen for iteration `counter`.
    pub fn take<R: Rng + ?Sized>(&mut self, counter: usize, rng: &mut R) -> Option<Vec<usize>> {
        if self.pending.is_empty() {
            return None;
        }
        let i = selection_index(counter, self.pending.len(), rng);
        Some(self.pending.remove(i))
    }
}

/// Position to pop on iteration `counter` from a pool of `len > 0` entries:
/// the front every third iteration, otherwise the back on even and a random
/// entry on odd iterations.
pub fn selection_index<R: Rng + ?Sized>(counter: usize, len: usize, rng: &mut R) -> usize {
    if counter % 3 == 0 {
        0
    } else if counter % 2 == 0 {
        len - 1
    } else {
        rng.gen_range(0..len)
    }
}

/// Best route seen so far.
#[derive(Default)]
struct Best {
    score: usize,
    route: Vec<usize>,
    history: Vec<usize>,
}

/// Searches the best route of one vehicle against a shared index.
pub struct BranchExplorer<'a, R: Rng + ?Sized> {
    index: &'a mut DistanceIndex,
    vehicle: Vehicle,
    config: &'a Config,
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> BranchExplorer<'a, R> {
    pub fn new(
        index: &'a mut DistanceIndex,
        vehicle: Vehicle,
        config: &'a Config,
        rng: &'a mut R,
    ) -> Self {
        BranchExplorer {
            index,
            vehicle,
            config,
            rng,
        }
    }

    /// Run the search and commit the best route into the index.
    pub fn explore(self) -> Result<VehicleOutcome, SearchError> {
        let BranchExplorer {
            index,
            vehicle,
            config,
            rng,
        } = self;

        let mut best = Best::default();
        let mut pool = AlternativePool::new();

        let mut seeds: Vec<Option<u64>> = index
            .initial_closest_distances()
            .into_iter()
            .map(Some)
            .collect();
        seeds.push(None);

        for forced in seeds {
            let builder =
                RouteBuilder::new(&mut *index, vehicle, config).with_forced_distance(forced);
            try_build(builder, &mut best, &mut pool)?;
        }

        let start = Instant::now();
        let mut explored = 0;
        while let Some(alternative) = pool.take(explored, &mut *rng) {
            let builder = RouteBuilder::new(&mut *index, vehicle, config).with_hint(alternative);
            try_build(builder, &mut best, &mut pool)?;
            explored += 1;

            if start.elapsed() > config.exploration_time {
                debug!(
                    "Vehicle {} ran out of time with {} alternatives pending",
                    vehicle.index,
                    pool.len()
                );
                break;
            }
            if config.max_explorations.map_or(false, |limit| explored >= limit) {
                break;
            }
        }

        let route = if best.route.is_empty() {
            Vec::new()
        } else {
            let mut builder =
                RouteBuilder::new(&mut *index, vehicle, config).with_hint(best.route.clone());
            builder.calculate()?;
            let committed = builder.route();
            if committed != best.route {
                warn!(
                    "Vehicle {} committed {:?} instead of recorded best {:?}",
                    vehicle.index, committed, best.route
                );
            }
            committed
        };

        info!(
            "Vehicle {} (fuel {}): {} points, {} supply points occupied, {} alternatives explored",
            vehicle.index,
            vehicle.fuel,
            route.len(),
            index.used_n_points(),
            explored
        );

        Ok(VehicleOutcome {
            vehicle: vehicle.index,
            route,
            score: index.used_n_points(),
            explored,
            history: best.history,
        })
    }
}

/// Run a builder to completion, record it if it beats the best, harvest its
/// alternatives and release its points again.
fn try_build(
    mut builder: RouteBuilder<'_>,
    best: &mut Best,
    pool: &mut AlternativePool,
) -> Result<(), SearchError> {
    builder.calculate()?;

    let score = builder.index().used_n_points();
    let route = builder.route();
    if score > best.score && !route.is_empty() {
        debug!(
            "Vehicle {} improved to {} with {:?}",
            builder.vehicle().index,
            score,
            route
        );
        best.score = score;
        best.route = route;
    }
    best.history.push(best.score);

    pool.extend(builder.alternatives());
    builder.unload()
}
