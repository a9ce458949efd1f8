use crate::physics::math::{Scalar, Vector, polar_angle, relative_error};
use crate::physics::state::State;
use crate::simulation::output::BodyRecord;

/// A point mass and its per-step diagnostics
///
/// Energies and angular momentum are specific (per unit mass) so that
/// massless test particles have meaningful values.
///
/// Diagnostics are only refreshed by [`Body::update`]. After moving a body,
/// set its potential with [`Body::set_potential`] and then call `update`,
/// otherwise the energy fields describe the previous step.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub state: State,
    pub mass: Scalar,
    cluster: usize,

    background_potential: Scalar,
    interaction_potential: Scalar,

    radius: Scalar,
    theta: Scalar,
    angular_momentum: Vector,
    kinetic_energy: Scalar,
    potential_energy: Scalar,
    total_energy: Scalar,
    initial_energy: Option<Scalar>,
    energy_error: Scalar,
}

impl Body {
    pub fn new(state: State, mass: Scalar, cluster: usize) -> Self {
        Self {
            state,
            mass,
            cluster,
            background_potential: 0.0,
            interaction_potential: 0.0,
            radius: 0.0,
            theta: 0.0,
            angular_momentum: Vector::ZERO,
            kinetic_energy: 0.0,
            potential_energy: 0.0,
            total_energy: 0.0,
            initial_energy: None,
            energy_error: 0.0,
        }
    }

    /// Index of the owning cluster within its system
    pub fn cluster(&self) -> usize {
        self.cluster
    }

    /// Stores the potential per unit mass, split into the cluster background
    /// and the pairwise interaction with every other body
    pub fn set_potential(&mut self, background: Scalar, interaction: Scalar) {
        self.background_potential = background;
        self.interaction_potential = interaction;
    }

    /// Recomputes the diagnostics from the current state and potential
    pub fn update(&mut self) {
        let position = self.state.position;
        let velocity = self.state.velocity;

        self.radius = position.length();
        self.theta = polar_angle(position);
        self.angular_momentum = position.cross(velocity);
        self.kinetic_energy = 0.5 * velocity.length_squared();
        self.potential_energy = self.background_potential + self.interaction_potential;
        self.total_energy = self.kinetic_energy + self.potential_energy;
        self.energy_error = match self.initial_energy {
            Some(initial) => relative_error(initial, self.total_energy),
            None => 0.0,
        };
    }

    /// Drops the energy baseline, refreshes the diagnostics and captures the
    /// current total energy as the new baseline
    pub fn reset(&mut self) {
        self.initial_energy = None;
        self.update();
        self.initial_energy = Some(self.total_energy);
    }

    pub fn radius(&self) -> Scalar {
        self.radius
    }

    /// Polar angle in the x-y plane
    pub fn theta(&self) -> Scalar {
        self.theta
    }

    /// Specific angular momentum `x × v`
    pub fn angular_momentum(&self) -> Vector {
        self.angular_momentum
    }

    pub fn kinetic_energy(&self) -> Scalar {
        self.kinetic_energy
    }

    pub fn potential_energy(&self) -> Scalar {
        self.potential_energy
    }

    pub fn background_potential(&self) -> Scalar {
        self.background_potential
    }

    pub fn interaction_potential(&self) -> Scalar {
        self.interaction_potential
    }

    pub fn total_energy(&self) -> Scalar {
        self.total_energy
    }

    pub fn initial_energy(&self) -> Option<Scalar> {
        self.initial_energy
    }

    pub fn energy_error(&self) -> Scalar {
        self.energy_error
    }

    pub fn record(&self, time: Scalar) -> BodyRecord {
        BodyRecord {
            time,
            position: self.state.position,
            velocity: self.state.velocity,
            acceleration: self.state.acceleration,
            radius: self.radius,
            theta: self.theta,
            angular_momentum: self.angular_momentum,
            mass: self.mass,
            total_energy: self.total_energy,
            kinetic_energy: self.kinetic_energy,
            potential_energy: self.potential_energy,
            energy_error: self.energy_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbiting_body() -> Body {
        Body::new(State::new(Vector::X, Vector::Y), 2.0, 0)
    }

    #[test]
    fn test_update_derives_diagnostics() {
        let mut body = orbiting_body();
        body.set_potential(-1.0, -0.25);
        body.update();

        assert_eq!(body.radius(), 1.0);
        assert!((body.theta() - 0.0).abs() < 1e-15);
        assert_eq!(body.angular_momentum(), Vector::Z);
        assert_eq!(body.kinetic_energy(), 0.5);
        assert_eq!(body.potential_energy(), -1.25);
        assert_eq!(body.total_energy(), -0.75);
        assert_eq!(body.energy_error(), 0.0);
        assert_eq!(body.initial_energy(), None);
    }

    #[test]
    fn test_reset_captures_baseline() {
        let mut body = orbiting_body();
        body.set_potential(-1.0, 0.0);
        body.reset();
        assert_eq!(body.initial_energy(), Some(-0.5));

        body.state.velocity = Vector::new(0.0, 0.5, 0.0);
        body.update();
        // E = 0.125 - 1 = -0.875, |(-0.5 + 0.875) / -0.5| = 0.75
        assert!((body.energy_error() - 0.75).abs() < 1e-15);

        body.reset();
        assert_eq!(body.initial_energy(), Some(-0.875));
        assert_eq!(body.energy_error(), 0.0);
    }

    #[test]
    fn test_stale_until_updated() {
        let mut body = orbiting_body();
        body.reset();
        body.state.position = Vector::new(3.0, 0.0, 0.0);
        assert_eq!(body.radius(), 1.0);
        body.update();
        assert_eq!(body.radius(), 3.0);
    }

    #[test]
    fn test_record_fields() {
        let mut body = orbiting_body();
        body.set_potential(-1.0, 0.0);
        body.reset();
        let record = body.record(1.5);
        assert_eq!(record.time, 1.5);
        assert_eq!(record.position, Vector::X);
        assert_eq!(record.mass, 2.0);
        assert_eq!(record.total_energy, -0.5);
    }
}
