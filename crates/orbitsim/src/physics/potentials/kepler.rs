//! Point-mass potential

use super::{PotentialModel, require_positive};
use crate::config::ConfigError;
use crate::physics::math::{Scalar, Vector, unit_direction};
use crate::physics::state::State;
use orbitsim_macros::ConfigDefaults;
use serde::{Deserialize, Serialize};

/// Point mass with `G·M = 1`
///
/// The initial state is taken from the orbital elements: a body at true
/// anomaly `theta` on an orbit with semi-major axis `a` and eccentricity `e`.
/// The radius passed to [`PotentialModel::initial_state`] is ignored.
///
/// The central mass is tracked for bookkeeping only; the force law always
/// uses unit `G·M`. Acceleration is singular at the origin.
#[derive(ConfigDefaults, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kepler {
    /// Semi-major axis
    #[default(1.0)]
    pub a: Scalar,

    /// Eccentricity, `0 <= e < 1`
    #[default(0.0)]
    pub e: Scalar,

    /// True anomaly of the starting point, radians
    #[default(0.0)]
    pub theta: Scalar,

    #[default(1.0)]
    pub velocity_multiplier: Scalar,

    #[serde(skip)]
    #[default(1.0)]
    pub mass: Scalar,
}

impl Kepler {
    pub fn new(a: Scalar, e: Scalar) -> Self {
        Self {
            a,
            e,
            ..Self::default()
        }
    }

    /// Orbital radius at the starting anomaly, `a(1 - e²) / (1 + e·cos θ)`
    pub fn initial_radius(&self) -> Scalar {
        self.a * (1.0 - self.e * self.e) / (1.0 + self.e * libm::cos(self.theta))
    }

    /// `sqrt(1/a)·sqrt((1 + e)/(1 - e))`
    pub fn initial_speed(&self) -> Scalar {
        libm::sqrt(1.0 / self.a) * libm::sqrt((1.0 + self.e) / (1.0 - self.e))
    }

    /// Orbital period `2π·sqrt(a³)`
    pub fn period(&self) -> Scalar {
        2.0 * std::f64::consts::PI * libm::sqrt(self.a * self.a * self.a)
    }
}

impl PotentialModel for Kepler {
    fn acceleration(&self, position: Vector) -> Vector {
        let r = position.length();
        position * (-1.0 / (r * r * r))
    }

    fn potential(&self, position: Vector) -> Scalar {
        -1.0 / position.length()
    }

    fn initial_state(&self, _radius: Scalar, direction: Vector) -> State {
        let position = Vector::new(self.initial_radius(), 0.0, 0.0);
        let velocity = unit_direction(direction) * self.initial_speed() * self.velocity_multiplier;
        State::new(position, velocity)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("kepler", "a", self.a)?;
        if !(self.e.is_finite() && (0.0..1.0).contains(&self.e)) {
            return Err(ConfigError::Invalid(format!(
                "kepler: eccentricity must satisfy 0 <= e < 1 (bound orbits only), got {}",
                self.e
            )));
        }
        if !self.theta.is_finite() || !self.velocity_multiplier.is_finite() {
            return Err(ConfigError::Invalid(
                "kepler: theta and velocity_multiplier must be finite".to_string(),
            ));
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
