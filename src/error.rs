use thiserror::Error;

/// Errors reported by the simulation engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// A parameter cannot be used to build a population.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    /// Run or query requested before any setup.
    #[error("simulation has not been set up")]
    NotInitialized,
    #[error("agent index {index} out of range for population of {population_size}")]
    AgentOutOfRange { index: usize, population_size: usize },
}

pub type EngineResult<T> = Result<T, EngineError>;
