use anyhow::Result;
use clap::Parser;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use cooperation_common::SimulationConfig;
use cooperation_engine::queue::RunQueue;
use cooperation_engine::report::save_reports;

/// Runs a batch of spatial Prisoner's Dilemma simulations and writes the results.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the number of queued runs
    #[arg(long)]
    runs: Option<usize>,

    /// Override the base seed; run i uses a seed derived from it
    #[arg(long)]
    seed: Option<u64>,

    /// Execute runs in parallel on the rayon pool
    #[arg(long)]
    parallel: bool,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting spatial Prisoner's Dilemma engine...");

    // --- Load Configuration ---
    let mut config = if args.config.exists() {
        SimulationConfig::load(&args.config)?
    } else {
        warn!("Config file '{}' not found; using built-in defaults.", args.config.display());
        SimulationConfig::default()
    };
    if let Some(runs) = args.runs {
        config.queue.num_runs = runs;
    }
    if let Some(seed) = args.seed {
        config.queue.base_seed = seed;
    }
    if args.parallel {
        config.queue.parallel_runs = true;
    }
    config.validate()?;
    debug!("Configuration: {:#?}", config);

    let params = config.get_sim_params();
    info!(
        "Queueing {} runs: r = {}, u = {}, N = {}, E = {}, average fitness = {}, wrap = {:?}, index = {:?}",
        config.queue.num_runs,
        params.radius,
        params.cost_benefit_ratio,
        params.population_size,
        params.epoch_budget,
        params.use_average_fitness,
        params.wrap_mode,
        config.world.neighbor_index
    );
    if config.queue.parallel_runs {
        info!("Using {} Rayon threads.", rayon::current_num_threads());
    }

    // --- Execute Queue ---
    let mut queue = RunQueue::from_config(&config);
    let start_time = Instant::now();
    let runs = queue.execute_all(config.queue.parallel_runs)?;
    let total_duration = start_time.elapsed();
    info!(
        "{} runs finished in {:.3} seconds.",
        runs.len(),
        total_duration.as_secs_f64()
    );

    for run in runs {
        info!(
            "Run {} (seed {}): epoch {} | cooperators {} | defectors {}",
            run.id, run.seed, run.cur_epoch, run.num_coop, run.num_defect
        );
    }

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    let written = save_reports(&config.output, runs)?;
    debug!("Wrote {} files.", written.len());

    info!("Simulation Complete.");
    Ok(())
}
