pub mod simulation;

pub use simulation::{SimulationPlugin, SimulationReport};
