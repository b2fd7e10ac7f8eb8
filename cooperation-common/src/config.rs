use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use crate::vecmath::WrapMode;
use std::path::Path;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NeighborIndexKind {
    /// Tests every unordered pair once.
    #[default]
    BruteForce,
    /// Buckets agents into a toroidal grid before testing pairs.
    Grid,
}

// Population and payoff settings for every queued run
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorldConfig {
    #[serde(default = "default_radius")]
    pub radius: f64,
    #[serde(default = "default_cost_benefit_ratio")]
    pub cost_benefit_ratio: f64,
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    #[serde(default = "default_epoch_budget")]
    pub epoch_budget: usize,
    #[serde(default)]
    pub use_average_fitness: bool,
    #[serde(default)]
    pub wrap_mode: WrapMode,
    #[serde(default)]
    pub neighbor_index: NeighborIndexKind,
}

// How many runs to queue and how they are seeded and sampled
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct QueueConfig {
    #[serde(default = "default_num_runs")]
    pub num_runs: usize,
    #[serde(default)]
    pub base_seed: u64,
    /// Record a snapshot every this many epochs (0 = final state only).
    #[serde(default = "default_record_interval")]
    pub record_interval_epochs: usize,
    /// Execute queued runs on the rayon pool instead of one after another.
    #[serde(default)]
    pub parallel_runs: bool,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_summary: bool,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub save_neighbor_histogram: bool,
    #[serde(default)]
    pub save_final_population: bool,
}

fn default_radius() -> f64 { 0.02 }
fn default_cost_benefit_ratio() -> f64 { 0.175 }
fn default_population_size() -> usize { 6400 }
fn default_epoch_budget() -> usize { 5000 }
fn default_num_runs() -> usize { 10 }
fn default_record_interval() -> usize { 100 }
fn default_base_filename() -> String { "pd_output".to_string() }
fn default_true() -> bool { true }

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            radius: default_radius(),
            cost_benefit_ratio: default_cost_benefit_ratio(),
            population_size: default_population_size(),
            epoch_budget: default_epoch_budget(),
            use_average_fitness: false,
            wrap_mode: WrapMode::default(),
            neighbor_index: NeighborIndexKind::default(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig {
            num_runs: default_num_runs(),
            base_seed: 0,
            record_interval_epochs: default_record_interval(),
            parallel_runs: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: default_base_filename(),
            save_summary: true,
            format: OutputFormat::default(),
            save_neighbor_histogram: false,
            save_final_population: false,
        }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.world.radius.is_finite() || self.world.radius < 0.0 {
            anyhow::bail!("radius must be a finite, non-negative number (got {}).", self.world.radius);
        }
        if !self.world.cost_benefit_ratio.is_finite() || self.world.cost_benefit_ratio < 0.0 {
            anyhow::bail!(
                "cost_benefit_ratio must be a finite, non-negative number (got {}).",
                self.world.cost_benefit_ratio
            );
        }
        if self.queue.num_runs == 0 {
            anyhow::bail!("num_runs must be greater than 0.");
        }
        if self.output.base_filename.trim().is_empty() {
            anyhow::bail!("base_filename must not be empty.");
        }
        Ok(())
    }

    /// Converts the configuration into the parameters of a single run.
    pub fn get_sim_params(&self) -> SimParams {
        SimParams::new(
            self.world.radius,
            self.world.cost_benefit_ratio,
            self.world.population_size,
            self.world.epoch_budget,
            self.world.use_average_fitness,
        )
        .with_wrap_mode(self.world.wrap_mode)
    }
}
