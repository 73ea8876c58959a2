//! Configuration parameters for the route search.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How processing orders of the fleet are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStrategy {
    /// Every permutation of the vehicle indices.
    Permutations,
    /// A single order, largest fuel budget first.
    ByFuel,
    /// A single order, vehicle index ascending.
    ByIndex,
}

/// Which kinds of points a vehicle may target for a given cargo level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadPolicy {
    /// N-points when empty, M-points when full, either kind in between.
    Mixed,
    /// N-points when empty, M-points as soon as anything is loaded.
    Single,
}

/// Configuration settings for the route search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cargo capacity shared by every vehicle
    pub capacity: u32,
    /// Distances up to this multiple of the shortest one count as "closest"
    pub closest_range: u64,
    /// Alternatives must stay under this share of the vehicle fuel
    pub alternative_fuel_ratio: f64,
    /// Wall-clock budget of the alternative exploration for one vehicle
    pub exploration_time: Duration,
    /// Optional cap on explored alternatives per vehicle
    pub max_explorations: Option<usize>,
    /// Independent randomized attempts of every processing order
    pub attempts_per_order: usize,
    /// Run attempts on worker threads
    pub parallel: bool,
    /// Worker count, defaults to the available parallelism minus two
    pub threads: Option<usize>,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
    /// Processing orders to try
    pub order_strategy: OrderStrategy,
    /// Target selection by cargo level
    pub load_policy: LoadPolicy,
    /// Optional cap on the number of processing orders
    pub max_orders: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            capacity: 25,
            closest_range: 10,
            alternative_fuel_ratio: 0.15,
            exploration_time: Duration::from_secs(7),
            max_explorations: None,
            attempts_per_order: 1,
            parallel: false,
            threads: None,
            seed: None,
            order_strategy: OrderStrategy::Permutations,
            load_policy: LoadPolicy::Mixed,
            max_orders: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the cargo capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set the closest-range multiplier.
    pub fn with_closest_range(mut self, range: u64) -> Self {
        self.closest_range = range;
        self
    }

    /// Set the fuel share under which alternatives are kept.
    pub fn with_alternative_fuel_ratio(mut self, ratio: f64) -> Self {
        self.alternative_fuel_ratio = ratio;
        self
    }

    /// Set the per-vehicle exploration budget.
    pub fn with_exploration_time(mut self, duration: Duration) -> Self {
        self.exploration_time = duration;
        self
    }

    /// Cap the number of explored alternatives per vehicle.
    pub fn with_max_explorations(mut self, explorations: usize) -> Self {
        self.max_explorations = Some(explorations);
        self
    }

    /// Set the number of attempts per processing order.
    pub fn with_attempts_per_order(mut self, attempts: usize) -> Self {
        self.attempts_per_order = attempts.max(1);
        self
    }

    /// Enable or disable worker threads.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the number of worker threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the order strategy.
    pub fn with_order_strategy(mut self, strategy: OrderStrategy) -> Self {
        self.order_strategy = strategy;
        self
    }

    /// Set the load policy.
    pub fn with_load_policy(mut self, policy: LoadPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    /// Cap the number of processing orders.
    pub fn with_max_orders(mut self, orders: usize) -> Self {
        self.max_orders = Some(orders);
        self
    }

    /// Number of worker threads to spawn in parallel mode.
    pub fn worker_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(2))
                .unwrap_or(1)
                .max(1)
        })
    }
}
