//! Command line driver: solves numbered input files in a directory.

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use fuel_routes::config::{Config, LoadPolicy, OrderStrategy};
use fuel_routes::problem::Problem;
use fuel_routes::utils::{save_solution, save_summary_json, BatchSummary, FileSummary};
use fuel_routes::RouteSolver;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Permutations,
    Fuel,
    Index,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LoadArg {
    Mixed,
    Single,
}

#[derive(Debug, Parser)]
#[command(version, about = "Fuel-bounded pickup and delivery routing")]
struct Cli {
    /// Directory holding input1.txt, input2.txt, ...
    #[arg(long, default_value = "input")]
    input_dir: PathBuf,

    /// Directory receiving output1.txt, output2.txt, ...
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Highest input number to look for
    #[arg(long, default_value_t = 30)]
    max_files: usize,

    /// Run attempts on worker threads
    #[arg(
        long,
        env = "ROUTES_PARALLEL",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    parallel: bool,

    /// Worker threads, defaults to the available parallelism minus two
    #[arg(long)]
    threads: Option<usize>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Exploration budget per vehicle, in seconds
    #[arg(long, default_value_t = 7.0)]
    exploration_secs: f64,

    /// Randomized attempts per processing order
    #[arg(long, default_value_t = 1)]
    attempts: usize,

    /// Processing orders to try
    #[arg(long, value_enum, default_value = "permutations")]
    order_strategy: OrderArg,

    /// Target selection by cargo level
    #[arg(long, value_enum, default_value = "mixed")]
    load_policy: LoadArg,

    /// Write a JSON summary of the batch to this file
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new()
            .with_parallel(self.parallel)
            .with_attempts_per_order(self.attempts)
            .with_exploration_time(Duration::from_secs_f64(self.exploration_secs.max(0.0)))
            .with_order_strategy(match self.order_strategy {
                OrderArg::Permutations => OrderStrategy::Permutations,
                OrderArg::Fuel => OrderStrategy::ByFuel,
                OrderArg::Index => OrderStrategy::ByIndex,
            })
            .with_load_policy(match self.load_policy {
                LoadArg::Mixed => LoadPolicy::Mixed,
                LoadArg::Single => LoadPolicy::Single,
            });

        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    debug!("Configuration: {}", serde_json::to_string(&config)?);

    let mut summary = BatchSummary::new();

    for i in 1..=cli.max_files {
        let input_path = cli.input_dir.join(format!("input{}.txt", i));
        if !input_path.exists() {
            break;
        }

        info!("Processing input {}", i);
        let problem = Problem::from_file(&input_path)?;
        let (n, k, name) = (problem.n, problem.vehicle_count(), problem.name.clone());

        let mut solver = RouteSolver::new(problem, config.clone());
        solver.run();
        let solved = match &solver.best_solution {
            Some(solution) => {
                let violations = solution.validate(&solver.problem, &solver.config);
                for violation in &violations {
                    warn!("{}: {}", name, violation);
                }

                save_solution(solution, cli.output_dir.join(format!("output{}.txt", i)))?;
                true
            }
            None => {
                warn!("{}: no processing order produced a solution", name);
                false
            }
        };

        info!("Transferred {} of {}", solver.score(), n);
        summary.push(FileSummary {
            name,
            supply_points: n,
            vehicles: k,
            score: solver.score(),
            solved,
            runtime: solver.run_time,
        });
    }

    info!("Total transferred: {}", summary.total_score());
    debug!("{}", summary.format());

    if let Some(path) = &cli.summary {
        save_summary_json(&summary, path)?;
    }

    Ok(())
}
