use super::{PotentialModel, require_positive};
use crate::config::ConfigError;
use crate::physics::math::{G, Scalar, Vector, unit_direction};
use crate::physics::state::State;
use orbitsim_macros::ConfigDefaults;
use serde::{Deserialize, Serialize};

/// Hénon isochrone: `Φ = -G·M / (b + sqrt(r² + b²))`
#[derive(ConfigDefaults, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Isochrone {
    /// Scale length
    #[default(1.0)]
    pub b: Scalar,

    /// Multiplier on the circular speed
    #[default(1.0)]
    pub velocity_multiplier: Scalar,

    /// When set, start at this fraction of the local escape speed instead of
    /// the (scaled) circular speed
    #[default(None)]
    pub escape_fraction: Option<Scalar>,

    #[serde(skip)]
    #[default(1.0)]
    pub mass: Scalar,
}

impl Isochrone {
    fn c(&self, r: Scalar) -> Scalar {
        libm::sqrt(r * r + self.b * self.b)
    }

    pub fn circular_speed(&self, r: Scalar) -> Scalar {
        let c = self.c(r);
        let bc = self.b + c;
        libm::sqrt(G * self.mass * r * r / (c * bc * bc))
    }

    pub fn escape_speed(&self, position: Vector) -> Scalar {
        libm::sqrt(2.0 * self.potential(position).abs())
    }
}

impl PotentialModel for Isochrone {
    fn acceleration(&self, position: Vector) -> Vector {
        let c = self.c(position.length());
        let bc = self.b + c;
        position * (-G * self.mass / (c * bc * bc))
    }

    fn potential(&self, position: Vector) -> Scalar {
        -G * self.mass / (self.b + self.c(position.length()))
    }

    fn initial_state(&self, radius: Scalar, direction: Vector) -> State {
        let position = Vector::new(radius, 0.0, 0.0);
        let speed = match self.escape_fraction {
            Some(fraction) => self.escape_speed(position) * fraction,
            None => self.circular_speed(radius) * self.velocity_multiplier,
        };
        State::new(position, unit_direction(direction) * speed)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("isochrone", "b", self.b)?;
        if let Some(fraction) = self.escape_fraction {
            if !(fraction.is_finite() && fraction >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "isochrone: escape_fraction must be non-negative, got {fraction}"
                )));
            }
        }
        Ok(())
    }

    fn mass(&self) -> Scalar {
        self.mass
    }

    fn set_mass(&mut self, mass: Scalar) {
        self.mass = mass;
    }
}
