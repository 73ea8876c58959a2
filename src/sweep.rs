//! Sweep over processing orders of the fleet.
//!
//! Every (order, attempt) pair is an independent job with its own occupancy
//! and random source. Jobs run either in-process or on worker threads that
//! send their outcomes back over a channel; the calling thread keeps the best
//! one. Ties on the score go to the lexicographically smallest order, then the
//! lowest attempt, so the result does not depend on completion order.

use crate::config::{Config, OrderStrategy};
use crate::distance_index::DistanceIndex;
use crate::error::SearchError;
use crate::order_search::{OrderOutcome, OrderSearch};
use crate::problem::{Problem, Vehicle};
use crate::solution::Solution;
use crossbeam_channel::unbounded;
use itertools::Itertools;
use log::{debug, error, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::any::Any;
use std::cmp::Reverse;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub order: Vec<usize>,
    pub attempt: usize,
}

/// Vehicle indices sorted by `key`, stable for equal keys.
pub fn sorted_order<K, F>(mut vehicles: Vec<Vehicle>, key: F) -> Vec<usize>
where
    K: Ord,
    F: FnMut(&Vehicle) -> K,
{
    vehicles.sort_by_key(key);
    vehicles.into_iter().map(|vehicle| vehicle.index).collect()
}

/// Processing orders to try for a problem.
pub fn processing_orders(problem: &Problem, config: &Config) -> Vec<Vec<usize>> {
    let k = problem.vehicle_count();
    match config.order_strategy {
        OrderStrategy::Permutations => {
            let limit = config.max_orders.unwrap_or(usize::MAX);
            (0..k).permutations(k).take(limit).collect()
        }
        OrderStrategy::ByFuel => vec![sorted_order(problem.vehicles(), |v| Reverse(v.fuel))],
        OrderStrategy::ByIndex => vec![sorted_order(problem.vehicles(), |v| v.index)],
    }
}

/// Random source of a job: derived from the configured seed, or from entropy.
pub fn job_rng(seed: Option<u64>, job: usize) -> ChaCha8Rng {
    match seed {
        Some(seed) => {
            ChaCha8Rng::seed_from_u64(seed ^ (job as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        }
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Whether `candidate` should replace `current` as the best outcome.
pub fn is_better(candidate: &OrderOutcome, current: &OrderOutcome) -> bool {
    if candidate.score != current.score {
        return candidate.score > current.score;
    }
    (&candidate.order, candidate.attempt) < (&current.order, current.attempt)
}

/// Keeps the best outcome seen and counts failures.
#[derive(Debug, Default)]
struct Reducer {
    best: Option<OrderOutcome>,
    completed: usize,
    failed: usize,
}

impl Reducer {
    fn accept(&mut self, job: &Job, result: Result<OrderOutcome, SearchError>) {
        match result {
            Ok(outcome) => {
                self.completed += 1;
                let replace = self
                    .best
                    .as_ref()
                    .map_or(true, |current| is_better(&outcome, current));
                if replace {
                    debug!(
                        "New best: order {:?} attempt {} with score {}",
                        outcome.order, outcome.attempt, outcome.score
                    );
                    self.best = Some(outcome);
                }
            }
            Err(err) => {
                self.failed += 1;
                error!(
                    "Order {:?} attempt {} failed: {}",
                    job.order, job.attempt, err
                );
            }
        }
    }
}

/// Merge job results into the best outcome. Failed jobs are logged and left
/// out; `None` when no job succeeded.
pub fn reduce<I>(results: I) -> Option<OrderOutcome>
where
    I: IntoIterator<Item = (Job, Result<OrderOutcome, SearchError>)>,
{
    let mut reducer = Reducer::default();
    for (job, result) in results {
        reducer.accept(&job, result);
    }

    info!(
        "{} jobs completed, {} failed",
        reducer.completed, reducer.failed
    );
    reducer.best
}

/// Run a job body, reporting a panic as [`SearchError::WorkerFailed`].
pub fn guarded<F>(body: F) -> Result<OrderOutcome, SearchError>
where
    F: FnOnce() -> Result<OrderOutcome, SearchError>,
{
    panic::catch_unwind(AssertUnwindSafe(body))
        .unwrap_or_else(|payload| Err(SearchError::WorkerFailed(panic_message(&*payload))))
}

/// Runs every processing order and keeps the best result.
pub struct PermutationSweep<'a> {
    problem: &'a Problem,
    config: &'a Config,
}

impl<'a> PermutationSweep<'a> {
    pub fn new(problem: &'a Problem, config: &'a Config) -> Self {
        PermutationSweep { problem, config }
    }

    /// All jobs of the sweep, in order.
    pub fn jobs(&self) -> Vec<Job> {
        let attempts = self.config.attempts_per_order.max(1);
        processing_orders(self.problem, self.config)
            .into_iter()
            .flat_map(|order| (0..attempts).map(move |attempt| (order.clone(), attempt)))
            .enumerate()
            .map(|(id, (order, attempt))| Job { id, order, attempt })
            .collect()
    }

    /// Run the sweep. `None` when every job failed.
    pub fn run(&self) -> Option<Solution> {
        let k = self.problem.vehicle_count();
        if k == 0 {
            return Some(Solution::new(0));
        }

        let template = DistanceIndex::new(self.problem, self.config.closest_range);
        let jobs = self.jobs();
        info!(
            "Running {} jobs for {} vehicles ({})",
            jobs.len(),
            k,
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        let best = if self.config.parallel {
            self.run_parallel(&template, jobs)
        } else {
            reduce(jobs.into_iter().map(|job| {
                let result = self.run_job(&template, &job);
                (job, result)
            }))
        };

        best.map(|outcome| Solution::from_outcome(outcome, k))
    }

    /// Run a single job against a fresh occupancy.
    pub fn run_job(
        &self,
        template: &DistanceIndex,
        job: &Job,
    ) -> Result<OrderOutcome, SearchError> {
        let mut rng = job_rng(self.config.seed, job.id);
        OrderSearch::new(self.problem, template, self.config).run(
            &job.order,
            job.attempt,
            &mut rng,
        )
    }

    fn run_parallel(&self, template: &DistanceIndex, jobs: Vec<Job>) -> Option<OrderOutcome> {
        let workers = self.config.worker_count().min(jobs.len()).max(1);
        let (job_tx, job_rx) = unbounded::<Job>();
        let (result_tx, result_rx) = unbounded::<(Job, Result<OrderOutcome, SearchError>)>();

        for job in jobs {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        thread::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for job in job_rx.iter() {
                        let result = guarded(|| self.run_job(template, &job));
                        if result_tx.send((job, result)).is_err() {
                            break;
                        }
                    }
                    debug!("Worker {} finished", worker);
                });
            }
            drop(result_tx);

            reduce(result_rx.iter())
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
