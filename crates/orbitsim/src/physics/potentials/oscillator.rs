use super::PotentialModel;
use crate::config::ConfigError;
use crate::physics::math::{G, PI, Scalar, Vector, unit_direction};
use crate::physics::state::State;
use orbitsim_macros::ConfigDefaults;
use serde::{Deserialize, Serialize};

/// Which potential-energy expression the oscillator reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OscillatorPotential {
    /// `-½r² + ω²`, as produced by the coursework models. Not the potential of
    /// the force law, so total energy is not conserved with this form.
    #[default]
    AsObserved,
    /// `½ω²r²`, consistent with the acceleration
    Harmonic,
}

/// Isotropic harmonic oscillator: a uniform-density sphere, `a = -ω²·x`
#[derive(ConfigDefaults, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Oscillator {
    /// Density of the homogeneous sphere, gives `ω = sqrt(4πGρ/3)`
    #[default(3.0 / (4.0 * PI))]
    pub density: Scalar,

    /// Explicit angular frequency, overrides the density
    #[default(None)]
    pub omega: Option<Scalar>,

    #[default(1.0)]
    pub velocity_multiplier: Scalar,

    #[default(OscillatorPotential::AsObserved)]
    pub potential_form: OscillatorPotential,

    #[serde(skip)]
    #[default(1.0)]
    pub mass: Scalar,
}

impl Oscillator {
    pub fn omega(&self) -> Scalar {
        self.omega
            .unwrap_or_else(|| libm::sqrt(4.0 * PI * G * self.density / 3.0))
    }
}

impl PotentialModel for Oscillator {
    fn acceleration(&self, position: Vector) -> Vector {
        let omega = self.omega();
        position * (-omega * omega)
    }

    fn potential(&self, position: Vector) -> Scalar {
        let omega = self.omega();
        let r2 = position.length_squared();
        match self.potential_form {
            OscillatorPotential::AsObserved => -0.5 * r2 + omega * omega,
            OscillatorPotential::Harmonic => 0.5 * omega * omega * r2,
        }
    }

    fn initial_state(&self, radius: Scalar, direction: Vector) -> State {
        let speed = radius * self.omega() * self.velocity_multiplier;
        State::new(
            Vector::new(radius, 0.0, 0.0),
            unit_direction(direction) * speed,
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(omega) = self.omega {
            if !(omega.is_finite() && omega >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "oscillator: omega must be non-negative, got {omega}"
                )));
            }
        } else if !(self.density.is_finite() && self.density >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "oscillator: density must be non-negative, got {}",
                self.density
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
