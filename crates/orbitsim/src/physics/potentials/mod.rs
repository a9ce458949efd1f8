//! Background potential models
//!
//! Every model maps a position to an acceleration and a potential per unit
//! mass, and knows how to place a body on a physically sensible initial orbit.

use crate::config::ConfigError;
use crate::physics::math::{Scalar, Vector};
use crate::physics::state::State;
use serde::{Deserialize, Serialize};

pub mod isochrone;
pub mod kepler;
pub mod logarithmic;
pub mod oscillator;

pub use isochrone::Isochrone;
pub use kepler::Kepler;
pub use logarithmic::Logarithmic;
pub use oscillator::{Oscillator, OscillatorPotential};

/// Force law shared by every background model
pub trait PotentialModel {
    /// Acceleration felt by a test particle at `position`
    fn acceleration(&self, position: Vector) -> Vector;

    /// Potential energy per unit mass at `position`
    fn potential(&self, position: Vector) -> Scalar;

    /// Initial state at `radius` along +x, moving along `direction`
    fn initial_state(&self, radius: Scalar, direction: Vector) -> State;

    /// Rejects parameter combinations the model cannot integrate
    fn validate(&self) -> Result<(), ConfigError>;

    /// Central mass `M`
    fn mass(&self) -> Scalar;

    /// Replaces the central mass, used when a cluster writes back its total mass
    fn set_mass(&mut self, mass: Scalar);
}

/// Closed set of background models, selected by `kind` in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Potential {
    Kepler(Kepler),
    Isochrone(Isochrone),
    Oscillator(Oscillator),
    Logarithmic(Logarithmic),
}

impl Potential {
    pub const NAMES: [&'static str; 4] = ["kepler", "isochrone", "oscillator", "logarithmic"];

    /// Model with default parameters for a configuration name
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "kepler" => Ok(Self::Kepler(Kepler::default())),
            "isochrone" => Ok(Self::Isochrone(Isochrone::default())),
            "oscillator" | "harmonic" => Ok(Self::Oscillator(Oscillator::default())),
            "logarithmic" | "log" => Ok(Self::Logarithmic(Logarithmic::default())),
            _ => Err(ConfigError::Invalid(format!(
                "Unknown model '{name}'. Available models: {}",
                Self::NAMES.join(", ")
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Kepler(_) => "kepler",
            Self::Isochrone(_) => "isochrone",
            Self::Oscillator(_) => "oscillator",
            Self::Logarithmic(_) => "logarithmic",
        }
    }

    fn model(&self) -> &dyn PotentialModel {
        match self {
            Self::Kepler(model) => model,
            Self::Isochrone(model) => model,
            Self::Oscillator(model) => model,
            Self::Logarithmic(model) => model,
        }
    }

    fn model_mut(&mut self) -> &mut dyn PotentialModel {
        match self {
            Self::Kepler(model) => model,
            Self::Isochrone(model) => model,
            Self::Oscillator(model) => model,
            Self::Logarithmic(model) => model,
        }
    }
}

impl Default for Potential {
    fn default() -> Self {
        Self::Kepler(Kepler::default())
    }
}

impl PotentialModel for Potential {
    fn acceleration(&self, position: Vector) -> Vector {
        self.model().acceleration(position)
    }

    fn potential(&self, position: Vector) -> Scalar {
        self.model().potential(position)
    }

    fn initial_state(&self, radius: Scalar, direction: Vector) -> State {
        self.model().initial_state(radius, direction)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.model().validate()
    }

    fn mass(&self) -> Scalar {
        self.model().mass()
    }

    fn set_mass(&mut self, mass: Scalar) {
        self.model_mut().set_mass(mass);
    }
}

/// Finite, strictly positive check shared by the model validators
pub(crate) fn require_positive(model: &str, field: &str, value: Scalar) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{model}: {field} must be positive, got {value}"
        )))
    }
}
