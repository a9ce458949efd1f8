//! Kick-drift-kick leapfrog

use super::Integrator;
use crate::physics::math::{Scalar, Vector};
use crate::physics::state::State;

/// Leapfrog integrator in kick-drift-kick form
///
/// 1. v += ½·dt·a (acceleration left over from the previous step)
/// 2. x += dt·v
/// 3. a = a(x)
/// 4. v += ½·dt·a
///
/// Second order and symplectic. The state's acceleration must hold the force
/// at the current position before the first step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Leapfrog;

impl Integrator for Leapfrog {
    fn advance(&self, state: &mut State, dt: Scalar) {
        state.velocity += state.acceleration * (0.5 * dt);
        state.position += state.velocity * dt;
    }

    fn complete(&self, state: &mut State, acceleration: Vector, dt: Scalar) {
        state.acceleration = acceleration;
        state.velocity += acceleration * (0.5 * dt);
    }

    fn name(&self) -> &str {
        "leapfrog"
    }

    fn order(&self) -> usize {
        2
    }
}
