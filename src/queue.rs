//! A queue of independently seeded runs sharing one parameter set (or several).

use std::collections::VecDeque;

use anyhow::{Context, Result};
use cooperation_common::{AgentSnapshot, NeighborIndexKind, SimParams, SimulationConfig, Snapshot};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::simulation::PdSimulation;

/// Spacing between the seeds of consecutive runs.
pub const RUN_SEED_STRIDE: u64 = 1_000_003;

/// Seed for run `id`, so every run gets its own random stream.
pub fn derive_run_seed(base_seed: u64, id: usize) -> u64 {
    base_seed.wrapping_add((id as u64).wrapping_mul(RUN_SEED_STRIDE))
}

/// Progress and results of one queued run.
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub id: usize,
    pub params: SimParams,
    pub seed: u64,
    pub cur_epoch: usize,
    pub num_coop: usize,
    pub num_defect: usize,
    /// Aggregate state at epoch 0, every record interval, and at the end.
    pub history: Vec<Snapshot>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub neighbor_histogram: Vec<usize>,
    #[serde(skip)]
    pub final_population: Option<Vec<AgentSnapshot>>,
}

impl RunInfo {
    pub fn new(id: usize, params: SimParams, seed: u64) -> Self {
        RunInfo {
            id,
            params,
            seed,
            cur_epoch: 0,
            num_coop: 0,
            num_defect: 0,
            history: Vec::new(),
            neighbor_histogram: Vec::new(),
            final_population: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cur_epoch >= self.params.epoch_budget
    }
}

/// How queued runs are executed.
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    /// Record a snapshot every this many epochs (0 = start and end only).
    pub record_interval_epochs: usize,
    pub neighbor_index: NeighborIndexKind,
    pub keep_final_population: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        RunSettings {
            record_interval_epochs: 100,
            neighbor_index: NeighborIndexKind::default(),
            keep_final_population: false,
        }
    }
}

/// First-in, first-out list of runs waiting to execute, plus the finished ones.
#[derive(Debug, Clone, Default)]
pub struct RunQueue {
    base_seed: u64,
    next_id: usize,
    settings: RunSettings,
    runs: VecDeque<RunInfo>,
    completed: Vec<RunInfo>,
}

impl RunQueue {
    pub fn new(base_seed: u64, settings: RunSettings) -> Self {
        RunQueue {
            base_seed,
            settings,
            ..Default::default()
        }
    }

    /// Queues `num_runs` runs of the configured world.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let settings = RunSettings {
            record_interval_epochs: config.queue.record_interval_epochs,
            neighbor_index: config.world.neighbor_index,
            keep_final_population: config.output.save_final_population,
        };
        let mut queue = RunQueue::new(config.queue.base_seed, settings);
        queue.add_runs(config.queue.num_runs, &config.get_sim_params());
        queue
    }

    /// Adds a run to the back of the queue and returns its id.
    pub fn add_run(&mut self, params: SimParams) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.runs.push_back(RunInfo::new(id, params, derive_run_seed(self.base_seed, id)));
        id
    }

    pub fn add_runs(&mut self, count: usize, params: &SimParams) {
        for _ in 0..count {
            self.add_run(params.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs_remaining(&self) -> usize {
        self.runs.len()
    }

    pub fn front_run(&self) -> Option<&RunInfo> {
        self.runs.front()
    }

    /// Drops the front run without executing it.
    pub fn remove_run(&mut self) -> Option<RunInfo> {
        self.runs.pop_front()
    }

    pub fn completed(&self) -> &[RunInfo] {
        &self.completed
    }

    /// Executes the front run to its epoch budget. A run that fails stays at the
    /// front of the queue.
    pub fn execute_front(&mut self) -> Result<Option<&RunInfo>> {
        let Some(mut run) = self.runs.pop_front() else {
            return Ok(None);
        };
        if let Err(err) = execute_run(&mut run, &self.settings) {
            self.runs.push_front(run);
            return Err(err);
        }
        self.completed.push(run);
        Ok(self.completed.last())
    }

    /// Executes every queued run, each with its own engine and seed.
    ///
    /// Sequentially, execution stops at the first failing run, which stays queued
    /// along with everything behind it. In parallel every run is attempted; the
    /// failed ones are requeued in order and the first error is returned.
    /// Finished runs are kept in `completed` either way.
    pub fn execute_all(&mut self, parallel: bool) -> Result<&[RunInfo]> {
        info!(
            "Executing {} runs ({}).",
            self.runs.len(),
            if parallel { "parallel" } else { "sequential" }
        );
        if parallel {
            let settings = self.settings;
            let mut pending: Vec<RunInfo> = self.runs.drain(..).collect();
            let outcomes: Vec<Result<()>> = pending
                .par_iter_mut()
                .map(|run| execute_run(run, &settings))
                .collect();

            let mut first_error = None;
            for (run, outcome) in pending.into_iter().zip(outcomes) {
                match outcome {
                    Ok(()) => self.completed.push(run),
                    Err(err) => {
                        warn!("Run {} failed: {:#}", run.id, err);
                        self.runs.push_back(run);
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                }
            }
            if let Some(err) = first_error {
                return Err(err);
            }
        } else {
            while !self.runs.is_empty() {
                self.execute_front()?;
            }
        }
        Ok(&self.completed)
    }
}

/// Sets up a fresh engine for `run` and advances it to the end of its budget,
/// recording snapshots along the way. `run` is only updated once the run has finished.
pub fn execute_run(run: &mut RunInfo, settings: &RunSettings) -> Result<()> {
    let mut sim = PdSimulation::uninitialized(run.params.clone(), run.seed)
        .with_neighbor_index(settings.neighbor_index);
    sim.setup(run.params.clone())
        .with_context(|| format!("Failed to set up run {}", run.id))?;
    let neighbor_histogram = sim.neighbor_histogram()?;
    sim.record_snapshot(false)?;

    let chunk = if settings.record_interval_epochs == 0 {
        run.params.epoch_budget
    } else {
        settings.record_interval_epochs
    };
    while !sim.is_finished()? {
        sim.run(chunk)?;
        sim.record_snapshot(false)?;
        debug!(
            "Run {}: epoch {}/{} | cooperators {}",
            run.id,
            sim.epoch()?,
            run.params.epoch_budget,
            sim.count_cooperators()?
        );
    }

    let final_population = if settings.keep_final_population {
        Some(sim.population_snapshot()?)
    } else {
        None
    };
    run.cur_epoch = sim.epoch()?;
    run.num_coop = sim.count_cooperators()?;
    run.num_defect = sim.count_defectors()?;
    run.history = sim.recorded_snapshots().to_vec();
    run.neighbor_histogram = neighbor_histogram;
    run.final_population = final_population;
    info!(
        "Run {} finished at epoch {}: {} cooperators, {} defectors.",
        run.id, run.cur_epoch, run.num_coop, run.num_defect
    );
    Ok(())
}
