pub mod body;
pub mod cluster;
pub mod galaxy;
pub mod initial_conditions;
pub mod integrators;
pub mod math;
pub mod potentials;
pub mod state;
pub mod system;
pub mod totals;
