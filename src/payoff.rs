use serde::{Deserialize, Serialize};
use cooperation_common::Strategy;

/// Prisoner's Dilemma payoffs, indexed by (own strategy, opponent strategy).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayoffMatrix {
    pub cc: f64,
    pub cd: f64,
    pub dc: f64,
    pub dd: f64,
}

impl PayoffMatrix {
    /// Weak Prisoner's Dilemma parameterised by the cost / benefit ratio `u`.
    pub fn from_cost_benefit_ratio(u: f64) -> Self {
        PayoffMatrix {
            cc: 1.0,
            cd: 0.0,
            dc: 1.0 + u,
            dd: u,
        }
    }

    /// Payoffs against a cooperator and against a defector for an agent playing `own`.
    #[inline(always)]
    pub fn row(&self, own: Strategy) -> (f64, f64) {
        match own {
            Strategy::Cooperate => (self.cc, self.cd),
            Strategy::Defect => (self.dc, self.dd),
        }
    }
}
