use serde::{Deserialize, Serialize};
use crate::vecmath::WrapMode;

/// Simulation parameters for one population, derived from the configuration.
/// Fixed for the lifetime of a run; changing them only takes effect on the next setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Neighborhood radius (r).
    pub radius: f64,
    /// Cached r^2 for neighbor comparisons.
    pub radius_sq: f64,
    /// Cost / benefit ratio (u).
    pub cost_benefit_ratio: f64,
    /// Population size (N).
    pub population_size: usize,
    /// Epoch budget (E).
    pub epoch_budget: usize,
    /// Use the average payoff over neighbors for fitness instead of the total.
    pub use_average_fitness: bool,
    pub wrap_mode: WrapMode,
}

impl SimParams {
    pub fn new(
        radius: f64,
        cost_benefit_ratio: f64,
        population_size: usize,
        epoch_budget: usize,
        use_average_fitness: bool,
    ) -> Self {
        SimParams {
            radius,
            radius_sq: radius * radius,
            cost_benefit_ratio,
            population_size,
            epoch_budget,
            use_average_fitness,
            wrap_mode: WrapMode::default(),
        }
    }

    pub fn with_wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    /// Updates the radius together with its squared cache.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.radius_sq = radius * radius;
    }
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams::new(0.02, 0.175, 6400, 5000, false)
    }
}
