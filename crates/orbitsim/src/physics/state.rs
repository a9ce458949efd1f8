use crate::physics::math::{Scalar, Vector};
use serde::{Deserialize, Serialize};

/// Kinematic state of one body at one instant
///
/// Only the current state is held in memory; trajectories exist only in the
/// emitted output records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub position: Vector,
    pub velocity: Vector,
    #[serde(default)]
    pub acceleration: Vector,
}

impl State {
    pub fn new(position: Vector, velocity: Vector) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector::ZERO,
        }
    }

    /// Scales position and velocity, leaving acceleration untouched
    pub fn scaled(self, factor: Scalar) -> Self {
        Self {
            position: self.position * factor,
            velocity: self.velocity * factor,
            ..self
        }
    }

    /// Shifts the state into a frame moving with `position` and `velocity`
    pub fn offset(self, position: Vector, velocity: Vector) -> Self {
        Self {
            position: self.position + position,
            velocity: self.velocity + velocity,
            ..self
        }
    }
}
