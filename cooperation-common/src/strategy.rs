use serde::{Deserialize, Serialize};
use std::fmt;

/// The two Prisoner's Dilemma strategies an agent can hold.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Cooperate,
    Defect,
}

impl Strategy {
    #[inline(always)]
    pub fn is_cooperate(self) -> bool {
        self == Strategy::Cooperate
    }

    pub fn from_cooperate(cooperate: bool) -> Self {
        if cooperate { Strategy::Cooperate } else { Strategy::Defect }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Cooperate => f.write_str("cooperate"),
            Strategy::Defect => f.write_str("defect"),
        }
    }
}
