use super::{PotentialModel, require_positive};
use crate::config::ConfigError;
use crate::physics::math::{Scalar, Vector, unit_direction};
use crate::physics::state::State;
use orbitsim_macros::ConfigDefaults;
use serde::{Deserialize, Serialize};

/// Flattened logarithmic halo: `Φ = ½v0²·ln(x² + y² + Rc² + z²/q²)`
#[derive(ConfigDefaults, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logarithmic {
    /// Asymptotic circular speed
    #[default(1.0)]
    pub v0: Scalar,

    /// Core radius `Rc`
    #[default(0.1)]
    pub core_radius: Scalar,

    /// Axis ratio `q` of the equipotentials
    #[default(1.0)]
    pub flattening: Scalar,

    #[default(1.0)]
    pub velocity_multiplier: Scalar,

    /// Start at the exact in-plane circular speed `v0·R/sqrt(R² + Rc²)`
    /// instead of the asymptotic `v0`
    #[default(false)]
    pub use_circular_velocity: bool,

    #[serde(skip)]
    #[default(1.0)]
    pub mass: Scalar,
}

impl Logarithmic {
    fn psi(&self, position: Vector) -> Scalar {
        let q2 = self.flattening * self.flattening;
        position.x * position.x
            + position.y * position.y
            + self.core_radius * self.core_radius
            + position.z * position.z / q2
    }

    pub fn circular_speed(&self, radius: Scalar) -> Scalar {
        self.v0 * radius / libm::sqrt(radius * radius + self.core_radius * self.core_radius)
    }
}

impl PotentialModel for Logarithmic {
    fn acceleration(&self, position: Vector) -> Vector {
        let q2 = self.flattening * self.flattening;
        let scale = -self.v0 * self.v0 / self.psi(position);
        Vector::new(position.x, position.y, position.z / q2) * scale
    }

    fn potential(&self, position: Vector) -> Scalar {
        0.5 * self.v0 * self.v0 * libm::log(self.psi(position))
    }

    fn initial_state(&self, radius: Scalar, direction: Vector) -> State {
        let speed = if self.use_circular_velocity {
            self.circular_speed(radius)
        } else {
            self.v0
        };
        State::new(
            Vector::new(radius, 0.0, 0.0),
            unit_direction(direction) * speed * self.velocity_multiplier,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("logarithmic", "v0", self.v0)?;
        require_positive("logarithmic", "flattening", self.flattening)?;
        if !(self.core_radius.is_finite() && self.core_radius >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "logarithmic: core_radius must be non-negative, got {}",
                self.core_radius
            )));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_velocity_switch() {
        let model = Logarithmic {
            v0: 2.0,
            core_radius: 1.0,
            ..Default::default()
        };
        assert_eq!(model.initial_state(1.0, Vector::Y).velocity.y, 2.0);

        let circular = Logarithmic {
            use_circular_velocity: true,
            ..model
        };
        let state = circular.initial_state(1.0, Vector::Y);
        assert!((state.velocity.y - libm::sqrt(2.0)).abs() < 1e-12);

        // v²/R equals the in-plane pull
        let pull = circular.acceleration(state.position).length();
        assert!((state.velocity.length_squared() - pull).abs() < 1e-12);
    }

    #[test]
    fn test_flattening_strengthens_vertical_pull() {
        let model = Logarithmic {
            flattening: 0.5,
            core_radius: 0.0,
            ..Default::default()
        };
        let a = model.acceleration(Vector::new(1.0, 0.0, 1.0));
        assert!((a - Vector::new(-0.2, 0.0, -0.8)).length() < 1e-12);
        assert!(a.z.abs() > a.x.abs());
    }

    #[test]
    fn test_validation() {
        assert!(Logarithmic::default().validate().is_ok());
        assert!(
            Logarithmic {
                flattening: 0.0,
                ..Default::default()
            }
            .validate()
            .is_err()
        );
        assert!(
            Logarithmic {
                core_radius: -0.5,
                ..Default::default()
            }
            .validate()
            .is_err()
        );
    }
}
