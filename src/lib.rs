//! Spatial Prisoner's Dilemma: agents on a unit torus imitate fitter neighbors.

pub mod error;
pub mod fitness;
pub mod grid;
pub mod neighbors;
pub mod payoff;
pub mod population;
pub mod queue;
pub mod report;
pub mod simulation;

pub use error::{EngineError, EngineResult};
pub use fitness::FitnessModel;
pub use grid::CellGridIndex;
pub use neighbors::{BruteForceIndex, NeighborIndex};
pub use payoff::PayoffMatrix;
pub use population::Agent;
pub use queue::{RunInfo, RunQueue, RunSettings};
pub use simulation::{ImitationEvent, PdSimulation};

pub use cooperation_common::{
    AgentSnapshot, NeighborIndexKind, SimParams, SimulationConfig, Snapshot, Strategy, Vec2, WrapMode,
};
