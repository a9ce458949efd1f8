//! Numerical integration methods

use crate::physics::math::{Scalar, Vector};
use crate::physics::state::State;

pub mod leapfrog;

pub use leapfrog::Leapfrog;

/// Source of accelerations for an integrator
pub trait AccelerationField {
    /// Acceleration at the given position
    fn at(&self, position: Vector) -> Vector;
}

/// Base trait for fixed-step integrators whose step splits around a single
/// force evaluation at the new position
///
/// Splitting the step lets the system either evaluate each body's force as
/// soon as that body has moved, or move every body first and evaluate all
/// forces against the same configuration.
pub trait Integrator: Send + Sync {
    /// Everything that happens before the force evaluation
    fn advance(&self, state: &mut State, dt: Scalar);

    /// Finishes the step once the acceleration at the new position is known
    fn complete(&self, state: &mut State, acceleration: Vector, dt: Scalar);

    /// Advance a single body's state by one time step
    fn step(&self, state: &mut State, field: &dyn AccelerationField, dt: Scalar) {
        self.advance(state, dt);
        let acceleration = field.at(state.position);
        self.complete(state, acceleration, dt);
    }

    /// Get the name of this integrator
    fn name(&self) -> &str;

    /// Get the order of this integrator
    fn order(&self) -> usize;
}
