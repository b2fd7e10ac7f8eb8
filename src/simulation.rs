use crate::error::{EngineError, EngineResult};
use crate::fitness::FitnessModel;
use crate::neighbors::{index_for, neighbor_histogram, neighbor_stats};
use crate::payoff::PayoffMatrix;
use crate::population::{count_cooperators, Agent};
use cooperation_common::{AgentSnapshot, NeighborIndexKind, SimParams, Snapshot, Strategy, Vec2, WrapMode};
use log::{debug, info, log_enabled, trace, Level};
use rand::prelude::*;
use rayon::prelude::*;

/// Outcome of a single imitation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImitationEvent {
    /// The agent that was drawn to update.
    pub focal: usize,
    /// The neighbor whose strategy won the weighted draw, if any did.
    pub source: Option<usize>,
    pub previous: Strategy,
    pub current: Strategy,
}

impl ImitationEvent {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Everything that belongs to one populated run. Replaced wholesale by setup.
#[derive(Debug, Clone)]
struct RunState {
    params: SimParams,
    fitness: FitnessModel,
    agents: Vec<Agent>,
    epoch: usize,
}

impl RunState {
    fn imitate<R: Rng>(&mut self, rng: &mut R) -> ImitationEvent {
        let focal = rng.random_range(0..self.agents.len());
        let previous = self.agents[focal].strategy;

        let total_fitness = self.agents[focal]
            .neighbors
            .iter()
            .fold(0.0, |acc, &n| acc + self.agents[n].fitness);

        // Only draw when there is something to choose from.
        let source = if total_fitness > 0.0 {
            weighted_source(&self.agents, focal, total_fitness, rng.random::<f64>())
        } else {
            None
        };

        if let Some(n) = source {
            let adopted = self.agents[n].strategy;
            self.agents[focal].strategy = adopted;
        }
        let current = self.agents[focal].strategy;

        if current != previous {
            self.refresh_fitness_around(focal);
        }

        ImitationEvent { focal, source, previous, current }
    }

    /// Recomputes the fitness of `id` and of every agent that plays against it.
    fn refresh_fitness_around(&mut self, id: usize) {
        let own = self.fitness.evaluate(&self.agents, id);
        self.agents[id].fitness = own;
        for k in 0..self.agents[id].neighbors.len() {
            let n = self.agents[id].neighbors[k];
            let updated = self.fitness.evaluate(&self.agents, n);
            self.agents[n].fitness = updated;
        }
    }

    fn snapshot(&self, include_agents: bool) -> Snapshot {
        let num_coop = count_cooperators(&self.agents);
        Snapshot {
            epoch: self.epoch,
            population_size: self.agents.len(),
            num_coop,
            num_defect: self.agents.len() - num_coop,
            agents: include_agents.then(|| self.agents.iter().map(Agent::to_snapshot).collect()),
        }
    }
}

/// Picks the neighbor whose strategy `focal` adopts. `draw` is uniform in [0, 1) and
/// scales the whole pool, the focal agent's own fitness included; landing in the
/// focal share keeps the current strategy. Neighbors are walked in stored order.
fn weighted_source(agents: &[Agent], focal: usize, total_fitness: f64, draw: f64) -> Option<usize> {
    let mut choice = draw * (total_fitness + agents[focal].fitness);
    if choice >= total_fitness {
        return None;
    }
    for &n in &agents[focal].neighbors {
        let neighbor_fitness = agents[n].fitness;
        if choice < neighbor_fitness {
            return Some(n);
        }
        choice -= neighbor_fitness;
    }
    None
}

/// Spatial Prisoner's Dilemma on the unit torus.
///
/// Agents are scattered once per setup and never move. Each epoch draws N focal agents
/// (with replacement); each one may copy the strategy of a neighbor picked with
/// probability proportional to fitness, with its own fitness counted in the pool.
#[derive(Debug, Clone)]
pub struct PdSimulation {
    /// Parameters the next setup or reset will use.
    params: SimParams,
    neighbor_index: NeighborIndexKind,
    /// One stream for placement and imitation; reset does not reseed it.
    rng: StdRng,
    state: Option<RunState>,
    recorded_snapshots: Vec<Snapshot>,
}

impl PdSimulation {
    /// Creates an engine and immediately sets up a random population.
    pub fn new(params: SimParams, seed: u64) -> EngineResult<Self> {
        let mut sim = Self::uninitialized(params.clone(), seed);
        sim.setup(params)?;
        Ok(sim)
    }

    /// Creates an engine with no population; runs and queries fail until `setup`.
    pub fn uninitialized(params: SimParams, seed: u64) -> Self {
        PdSimulation {
            params,
            neighbor_index: NeighborIndexKind::default(),
            rng: StdRng::seed_from_u64(seed),
            state: None,
            recorded_snapshots: Vec::new(),
        }
    }

    pub fn with_neighbor_index(mut self, kind: NeighborIndexKind) -> Self {
        self.neighbor_index = kind;
        self
    }

    /// Restarts the random stream. Takes effect from the next draw.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Scatters a fresh population uniformly on the torus, each agent cooperating
    /// with probability 0.5, and resets the epoch counter.
    pub fn setup(&mut self, params: SimParams) -> EngineResult<()> {
        let params = validate_params(params)?;

        let mut layout = Vec::with_capacity(params.population_size);
        for _ in 0..params.population_size {
            let x = self.rng.random::<f64>();
            let y = self.rng.random::<f64>();
            let strategy = Strategy::from_cooperate(self.rng.random_bool(0.5));
            layout.push((Vec2::new(x, y), strategy));
        }

        self.install(params, layout);
        Ok(())
    }

    /// Sets up a population with the given positions and strategies, in order.
    /// `params.population_size` must match the layout length.
    pub fn setup_from_layout(&mut self, params: SimParams, layout: &[(Vec2, Strategy)]) -> EngineResult<()> {
        let params = validate_params(params)?;
        if layout.len() != params.population_size {
            return Err(EngineError::InvalidParameter {
                name: "population_size",
                reason: format!("{} agents given for a population of {}", layout.len(), params.population_size),
            });
        }
        if let Some(i) = layout.iter().position(|(p, _)| !p.in_unit_square()) {
            return Err(EngineError::InvalidParameter {
                name: "layout",
                reason: format!("agent {} at ({}, {}) is outside [0, 1)^2", i, layout[i].0.x, layout[i].0.y),
            });
        }

        self.install(params, layout.to_vec());
        Ok(())
    }

    /// Sets up again with the configured parameters. Positions and strategies are redrawn.
    pub fn reset(&mut self) -> EngineResult<()> {
        self.setup(self.params.clone())
    }

    fn install(&mut self, params: SimParams, layout: Vec<(Vec2, Strategy)>) {
        let positions: Vec<Vec2> = layout.iter().map(|(p, _)| *p).collect();
        let neighbor_lists = index_for(self.neighbor_index).build(&positions, params.radius, params.wrap_mode);

        let mut agents: Vec<Agent> = layout
            .into_iter()
            .zip(neighbor_lists)
            .map(|((position, strategy), neighbors)| Agent { neighbors, ..Agent::new(position, strategy) })
            .collect();

        let fitness = FitnessModel::new(
            PayoffMatrix::from_cost_benefit_ratio(params.cost_benefit_ratio),
            params.use_average_fitness,
        );
        let initial: Vec<f64> = (0..agents.len())
            .into_par_iter()
            .map(|id| fitness.evaluate(&agents, id))
            .collect();
        for (agent, f) in agents.iter_mut().zip(initial) {
            agent.fitness = f;
        }

        info!(
            "Population of {} agents set up (r = {}, u = {}, E = {}, average = {}).",
            agents.len(),
            params.radius,
            params.cost_benefit_ratio,
            params.epoch_budget,
            params.use_average_fitness
        );
        if log_enabled!(Level::Debug) {
            let lists: Vec<&[usize]> = agents.iter().map(|a| a.neighbors.as_slice()).collect();
            if let Some(stats) = neighbor_stats(&lists) {
                debug!(
                    "Neighbor stats: min={}, max={}, avg={:.2}, isolated={}",
                    stats.min, stats.max, stats.mean, stats.isolated
                );
            }
            debug!("Initial cooperators: {}", count_cooperators(&agents));
        }

        self.params = params.clone();
        self.recorded_snapshots.clear();
        self.state = Some(RunState { params, fitness, agents, epoch: 0 });
    }

    /// Advances up to `steps` epochs, clamped to what is left of the epoch budget.
    /// Returns the number of epochs actually executed.
    pub fn run(&mut self, steps: usize) -> EngineResult<usize> {
        let state = self.state.as_mut().ok_or(EngineError::NotInitialized)?;
        let remaining = state.params.epoch_budget.saturating_sub(state.epoch);
        let epochs = steps.min(remaining);
        if epochs < steps {
            debug!("Requested {} epochs, {} left in budget; running {}.", steps, remaining, epochs);
        }

        for _ in 0..epochs {
            for _ in 0..state.agents.len() {
                state.imitate(&mut self.rng);
            }
            state.epoch += 1;
            if log_enabled!(Level::Trace) {
                trace!("Epoch {} done: {} cooperators", state.epoch, count_cooperators(&state.agents));
            }
        }
        Ok(epochs)
    }

    /// Runs until the epoch budget is exhausted.
    pub fn run_to_end(&mut self) -> EngineResult<usize> {
        let remaining = self.remaining_epochs()?;
        self.run(remaining)
    }

    /// Executes one imitation event outside the epoch loop. The epoch counter is
    /// not advanced. `None` for an empty population.
    pub fn imitate(&mut self) -> EngineResult<Option<ImitationEvent>> {
        let state = self.state.as_mut().ok_or(EngineError::NotInitialized)?;
        if state.agents.is_empty() {
            return Ok(None);
        }
        Ok(Some(state.imitate(&mut self.rng)))
    }

    fn state(&self) -> EngineResult<&RunState> {
        self.state.as_ref().ok_or(EngineError::NotInitialized)
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    pub fn population(&self) -> EngineResult<&[Agent]> {
        Ok(&self.state()?.agents)
    }

    pub fn population_snapshot(&self) -> EngineResult<Vec<AgentSnapshot>> {
        Ok(self.state()?.agents.iter().map(Agent::to_snapshot).collect())
    }

    pub fn epoch(&self) -> EngineResult<usize> {
        Ok(self.state()?.epoch)
    }

    pub fn remaining_epochs(&self) -> EngineResult<usize> {
        let state = self.state()?;
        Ok(state.params.epoch_budget.saturating_sub(state.epoch))
    }

    pub fn is_finished(&self) -> EngineResult<bool> {
        Ok(self.remaining_epochs()? == 0)
    }

    pub fn count_cooperators(&self) -> EngineResult<usize> {
        Ok(count_cooperators(&self.state()?.agents))
    }

    pub fn count_defectors(&self) -> EngineResult<usize> {
        let state = self.state()?;
        Ok(state.agents.len() - count_cooperators(&state.agents))
    }

    /// Recomputes an agent's fitness from current strategies without storing it.
    pub fn evaluate_fitness(&self, id: usize) -> EngineResult<f64> {
        let state = self.state()?;
        if id >= state.agents.len() {
            return Err(EngineError::AgentOutOfRange { index: id, population_size: state.agents.len() });
        }
        Ok(state.fitness.evaluate(&state.agents, id))
    }

    /// `histogram[k]` is the number of agents with exactly `k` neighbors.
    pub fn neighbor_histogram(&self) -> EngineResult<Vec<usize>> {
        let lists: Vec<&[usize]> = self.state()?.agents.iter().map(|a| a.neighbors.as_slice()).collect();
        Ok(neighbor_histogram(&lists))
    }

    pub fn payoff(&self) -> EngineResult<PayoffMatrix> {
        Ok(self.state()?.fitness.payoff)
    }

    pub fn snapshot(&self, include_agents: bool) -> EngineResult<Snapshot> {
        Ok(self.state()?.snapshot(include_agents))
    }

    /// Appends the current aggregate state to the run's history.
    pub fn record_snapshot(&mut self, include_agents: bool) -> EngineResult<()> {
        let snapshot = self.state()?.snapshot(include_agents);
        self.recorded_snapshots.push(snapshot);
        Ok(())
    }

    pub fn recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }

    /// Parameters for the next setup or reset.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Parameters the current population was built with.
    pub fn active_params(&self) -> Option<&SimParams> {
        self.state.as_ref().map(|s| &s.params)
    }

    pub fn radius(&self) -> f64 { self.params.radius }
    pub fn cost_benefit_ratio(&self) -> f64 { self.params.cost_benefit_ratio }
    pub fn population_size(&self) -> usize { self.params.population_size }
    pub fn epoch_budget(&self) -> usize { self.params.epoch_budget }

    // Setters only touch the pending parameters; the running population keeps its own.
    pub fn set_radius(&mut self, radius: f64) { self.params.set_radius(radius); }
    pub fn set_cost_benefit_ratio(&mut self, u: f64) { self.params.cost_benefit_ratio = u; }
    pub fn set_population_size(&mut self, n: usize) { self.params.population_size = n; }
    pub fn set_epoch_budget(&mut self, e: usize) { self.params.epoch_budget = e; }
    pub fn set_use_average_fitness(&mut self, on: bool) { self.params.use_average_fitness = on; }
    pub fn set_wrap_mode(&mut self, wrap: WrapMode) { self.params.wrap_mode = wrap; }
}

/// Rejects parameters that would produce a meaningless population and refreshes
/// the cached squared radius.
fn validate_params(mut params: SimParams) -> EngineResult<SimParams> {
    if !params.radius.is_finite() || params.radius < 0.0 {
        return Err(EngineError::InvalidParameter {
            name: "radius",
            reason: format!("must be finite and non-negative, got {}", params.radius),
        });
    }
    if !params.cost_benefit_ratio.is_finite() || params.cost_benefit_ratio < 0.0 {
        return Err(EngineError::InvalidParameter {
            name: "cost_benefit_ratio",
            reason: format!("must be finite and non-negative, got {}", params.cost_benefit_ratio),
        });
    }
    params.set_radius(params.radius);
    Ok(params)
}
