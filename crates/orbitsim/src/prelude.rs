//! orbitsim prelude module
//!
//! This module re-exports the most commonly used types, traits, and functions
//! to reduce import boilerplate.

// External crate re-exports
pub use bevy::prelude::*;

// Internal re-exports - Config
pub use crate::config::{ClusterConfig, ConfigError, SimulationConfig};

// Internal re-exports - Physics
pub use crate::physics::body::Body;
pub use crate::physics::cluster::Cluster;
pub use crate::physics::initial_conditions::InitialConditions;
pub use crate::physics::integrators::{AccelerationField, Integrator, Leapfrog};
pub use crate::physics::math::{Scalar, Vector};
pub use crate::physics::potentials::{Potential, PotentialModel};
pub use crate::physics::state::State;
pub use crate::physics::system::{System, UpdateScheme};

// Internal re-exports - Simulation
pub use crate::simulation::{RunOutcome, Simulation};
