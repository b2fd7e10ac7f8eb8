use cooperation_common::{AgentSnapshot, Strategy, Vec2};
use serde::{Deserialize, Serialize};

/// One individual in the population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub position: Vec2,
    pub strategy: Strategy,
    /// Result of the most recent fitness evaluation for this agent.
    pub fitness: f64,
    /// Indices into the same population, ascending.
    pub neighbors: Vec<usize>,
}

impl Agent {
    pub fn new(position: Vec2, strategy: Strategy) -> Self {
        Agent {
            position,
            strategy,
            fitness: 0.0,
            neighbors: Vec::new(),
        }
    }

    pub fn to_snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            x: self.position.x,
            y: self.position.y,
            strategy: self.strategy,
        }
    }
}

/// Linear scan for agents currently cooperating.
pub fn count_cooperators(agents: &[Agent]) -> usize {
    agents.iter().filter(|a| a.strategy.is_cooperate()).count()
}
