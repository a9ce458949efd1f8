//! orbitsim library
//!
//! Leapfrog integration of point masses in static background potentials and
//! under their mutual gravity. Exposed as a library to enable integration
//! testing and benchmarks.

pub mod cli;
pub mod config;
pub mod physics;
pub mod plugins;
pub mod prelude;
pub mod scenarios;
pub mod simulation;

// Re-export commonly used items
pub use config::SimulationConfig;
pub use physics::math::{Scalar, Vector};
pub use plugins::SimulationPlugin;
pub use simulation::{RunOutcome, RunReport, Simulation, SimulationError};
