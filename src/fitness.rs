use crate::payoff::PayoffMatrix;
use crate::population::Agent;

/// Scores an agent by playing one round against each of its neighbors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessModel {
    pub payoff: PayoffMatrix,
    /// Divide the total payoff by the number of neighbors.
    pub use_average: bool,
}

impl FitnessModel {
    pub fn new(payoff: PayoffMatrix, use_average: bool) -> Self {
        FitnessModel { payoff, use_average }
    }

    /// Fitness of `agents[id]` given everyone's current strategies. Reads only.
    ///
    /// In average mode an agent without neighbors scores 0.0 rather than NaN.
    pub fn evaluate(&self, agents: &[Agent], id: usize) -> f64 {
        let agent = &agents[id];

        let c_count = agent
            .neighbors
            .iter()
            .filter(|&&n| agents[n].strategy.is_cooperate())
            .count();
        let d_count = agent.neighbors.len() - c_count;

        let (c_value, d_value) = self.payoff.row(agent.strategy);
        let total = c_value * c_count as f64 + d_value * d_count as f64;

        if !self.use_average {
            total
        } else if agent.neighbors.is_empty() {
            0.0
        } else {
            total / agent.neighbors.len() as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cooperation_common::{Strategy, Vec2};

    // 0 (C) and 1 (C) and 2 (D) all see each other; 3 (D) is alone.
    fn triangle() -> Vec<Agent> {
        let mut agents = vec![
            Agent::new(Vec2::new(0.5, 0.5), Strategy::Cooperate),
            Agent::new(Vec2::new(0.51, 0.5), Strategy::Cooperate),
            Agent::new(Vec2::new(0.5, 0.51), Strategy::Defect),
            Agent::new(Vec2::new(0.1, 0.1), Strategy::Defect),
        ];
        agents[0].neighbors = vec![1, 2];
        agents[1].neighbors = vec![0, 2];
        agents[2].neighbors = vec![0, 1];
        agents
    }

    #[test]
    fn total_payoff() {
        let agents = triangle();
        let model = FitnessModel::new(PayoffMatrix::from_cost_benefit_ratio(0.2), false);
        assert!((model.evaluate(&agents, 0) - 1.0).abs() < 1e-12);
        assert!((model.evaluate(&agents, 1) - 1.0).abs() < 1e-12);
        assert!((model.evaluate(&agents, 2) - 2.4).abs() < 1e-12);
        assert_eq!(model.evaluate(&agents, 3), 0.0);
    }

    #[test]
    fn average_payoff_and_isolated_guard() {
        let agents = triangle();
        let model = FitnessModel::new(PayoffMatrix::from_cost_benefit_ratio(0.2), true);
        assert!((model.evaluate(&agents, 0) - 0.5).abs() < 1e-12);
        assert!((model.evaluate(&agents, 2) - 1.2).abs() < 1e-12);
        let isolated = model.evaluate(&agents, 3);
        assert!(!isolated.is_nan());
        assert_eq!(isolated, 0.0);
    }

    #[test]
    fn defector_among_defectors_earns_ratio() {
        let mut agents = triangle();
        for a in agents.iter_mut() {
            a.strategy = Strategy::Defect;
        }
        let model = FitnessModel::new(PayoffMatrix::from_cost_benefit_ratio(0.3), false);
        assert!((model.evaluate(&agents, 0) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn evaluation_is_repeatable() {
        let agents = triangle();
        let model = FitnessModel::new(PayoffMatrix::from_cost_benefit_ratio(0.175), false);
        for id in 0..agents.len() {
            assert_eq!(model.evaluate(&agents, id).to_bits(), model.evaluate(&agents, id).to_bits());
        }
    }
}
