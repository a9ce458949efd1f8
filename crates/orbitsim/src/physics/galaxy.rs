//! Ring-galaxy initial conditions
//!
//! A galaxy is one massive centre plus massless test particles on concentric
//! circular rings. Two of them on a mutual orbit make the classic toy model of
//! a tidal encounter.

use crate::config::ConfigError;
use crate::physics::math::{DEG_TO_RAD, G, PI, Scalar, Vector};
use crate::physics::state::State;
use orbitsim_macros::ConfigDefaults;
use rand::Rng;
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(ConfigDefaults, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingGalaxy {
    #[default(5)]
    pub rings: usize,

    /// Particles on the innermost ring
    #[default(12)]
    pub first_ring: usize,

    /// Extra particles on each successive ring
    #[default(6)]
    pub ring_increment: usize,

    /// Ring `k` (from zero) sits at radius `(k + 1)·spacing`
    #[default(3.0)]
    pub spacing: Scalar,

    /// Tilt of the disk about the y axis, degrees
    #[default(0.0)]
    pub inclination: Scalar,

    /// Position of the galaxy centre
    #[default(Vector::ZERO)]
    pub position: Vector,

    /// Velocity of the galaxy centre
    #[default(Vector::ZERO)]
    pub velocity: Vector,

    /// Random phase offset per particle, as a fraction of the angular spacing
    /// on its ring
    #[default(0.0)]
    pub phase_jitter: Scalar,

    #[default(0)]
    pub seed: u64,
}

impl RingGalaxy {
    /// Particle count of each ring, innermost first
    pub fn ring_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.rings).map(|ring| self.first_ring + ring * self.ring_increment)
    }

    /// Centre plus every ring particle
    pub fn body_count(&self) -> usize {
        1 + self.ring_sizes().sum::<usize>()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "ring_galaxy: spacing must be positive, got {}",
                self.spacing
            )));
        }
        if !(0.0..=1.0).contains(&self.phase_jitter) {
            return Err(ConfigError::Invalid(format!(
                "ring_galaxy: phase_jitter must be within [0, 1], got {}",
                self.phase_jitter
            )));
        }
        if !(self.inclination.is_finite()
            && self.position.is_finite()
            && self.velocity.is_finite())
        {
            return Err(ConfigError::Invalid(
                "ring_galaxy: inclination, position and velocity must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// States for the centre (index 0) followed by every ring particle
    pub fn states(&self, mass: Scalar) -> Vec<State> {
        let theta = self.inclination * DEG_TO_RAD;
        let (sin_theta, cos_theta) = libm::sincos(theta);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut states = Vec::with_capacity(self.body_count());
        states.push(State::new(self.position, self.velocity));

        for (ring, count) in self.ring_sizes().enumerate() {
            let radius = (ring + 1) as Scalar * self.spacing;
            let speed = libm::sqrt(G * mass / radius);
            let step = 2.0 * PI / count as Scalar;

            for slot in 0..count {
                let mut phi = slot as Scalar * step;
                if self.phase_jitter > 0.0 {
                    phi += rng.random_range(-0.5..=0.5) * self.phase_jitter * step;
                }
                let (sin_phi, cos_phi) = libm::sincos(phi);

                let position =
                    Vector::new(cos_phi * cos_theta, sin_phi, -cos_phi * sin_theta) * radius;
                let velocity =
                    Vector::new(-sin_phi * cos_theta, cos_phi, sin_phi * sin_theta) * speed;
                states.push(State::new(position, velocity).offset(self.position, self.velocity));
            }
        }

        states
    }

    /// The centre carries the whole galaxy mass, ring particles are massless
    pub fn masses(&self, mass: Scalar) -> Vec<Scalar> {
        let mut masses = vec![0.0; self.body_count()];
        masses[0] = mass;
        masses
    }
}
