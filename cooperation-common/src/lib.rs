pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod strategy;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, WorldConfig, QueueConfig, OutputConfig, OutputFormat, NeighborIndexKind};
pub use sim_params::SimParams;
pub use snapshot::{AgentSnapshot, Snapshot};
pub use strategy::Strategy;
pub use vecmath::{Vec2, WrapMode, wrap_delta};
