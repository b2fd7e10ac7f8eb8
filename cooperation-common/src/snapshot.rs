use serde::{Serialize, Deserialize};
use crate::strategy::Strategy;

/// Position and strategy of one agent, as exposed to callers outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub x: f64,
    pub y: f64,
    pub strategy: Strategy,
}

/// Aggregate state of a population at a given epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Epoch at which the snapshot was taken.
    pub epoch: usize,
    pub population_size: usize,
    pub num_coop: usize,
    pub num_defect: usize,
    /// Per-agent state; only filled in when requested.
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "agents": null
    pub agents: Option<Vec<AgentSnapshot>>,
}

impl Snapshot {
    /// Fraction of the population cooperating, 0 for an empty population.
    pub fn cooperation_fraction(&self) -> f64 {
        if self.population_size == 0 {
            0.0
        } else {
            self.num_coop as f64 / self.population_size as f64
        }
    }
}
