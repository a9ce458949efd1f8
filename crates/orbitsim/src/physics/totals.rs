use crate::physics::body::Body;
use crate::physics::math::{Scalar, Vector, relative_error};
use crate::simulation::output::AggregateRecord;

/// Mass-weighted momentum and energy summed over a group of bodies
///
/// `E_pot = Σ m·Φ_bg + ½·Σ m·Φ_int`: every pairwise interaction is seen from
/// both endpoints, so that part is halved, while the background is counted
/// once per body. Without a background this equals `½·Σ m·PE` summed over
/// the per-body `E_pot` column.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    mass: Scalar,
    angular_momentum: Vector,
    kinetic_energy: Scalar,
    potential_energy: Scalar,
    total_energy: Scalar,
    initial_energy: Option<Scalar>,
    energy_error: Scalar,
}

impl Totals {
    /// Re-sums the totals over `bodies`; the baseline is left untouched
    pub fn accumulate<'a>(&mut self, bodies: impl IntoIterator<Item = &'a Body>) {
        let mut mass = 0.0;
        let mut angular_momentum = Vector::ZERO;
        let mut kinetic_energy = 0.0;
        let mut background = 0.0;
        let mut interaction = 0.0;

        for body in bodies {
            mass += body.mass;
            angular_momentum += body.angular_momentum() * body.mass;
            kinetic_energy += body.kinetic_energy() * body.mass;
            background += body.background_potential() * body.mass;
            interaction += body.interaction_potential() * body.mass;
        }

        self.mass = mass;
        self.angular_momentum = angular_momentum;
        self.kinetic_energy = kinetic_energy;
        self.potential_energy = background + 0.5 * interaction;
        self.total_energy = self.kinetic_energy + self.potential_energy;
        self.energy_error = match self.initial_energy {
            Some(initial) => relative_error(initial, self.total_energy),
            None => 0.0,
        };
    }

    /// Captures the current total energy as the baseline
    pub fn capture_baseline(&mut self) {
        self.initial_energy = Some(self.total_energy);
        self.energy_error = 0.0;
    }

    pub fn mass(&self) -> Scalar {
        self.mass
    }

    pub fn angular_momentum(&self) -> Vector {
        self.angular_momentum
    }

    pub fn kinetic_energy(&self) -> Scalar {
        self.kinetic_energy
    }

    pub fn potential_energy(&self) -> Scalar {
        self.potential_energy
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

    pub fn record(&self, time: Scalar) -> AggregateRecord {
        AggregateRecord {
            time,
            mass: self.mass,
            angular_momentum: self.angular_momentum,
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
    use crate::physics::state::State;

    fn body(position: Vector, velocity: Vector, mass: Scalar, background: Scalar, interaction: Scalar) -> Body {
        let mut body = Body::new(State::new(position, velocity), mass, 0);
        body.set_potential(background, interaction);
        body.update();
        body
    }

    #[test]
    fn test_pairwise_energy_counted_once() {
        // Two unit masses at distance 2: each sees Φ_int = -1/2, pair energy is -1/2
        let bodies = [
            body(Vector::new(-1.0, 0.0, 0.0), Vector::ZERO, 1.0, 0.0, -0.5),
            body(Vector::new(1.0, 0.0, 0.0), Vector::ZERO, 1.0, 0.0, -0.5),
        ];
        let mut totals = Totals::default();
        totals.accumulate(&bodies);

        assert_eq!(totals.mass(), 2.0);
        assert_eq!(totals.potential_energy(), -0.5);
        assert_eq!(totals.total_energy(), -0.5);
    }

    #[test]
    fn test_interaction_only_potential_is_half_the_body_sum() {
        let bodies = [
            body(Vector::X, Vector::Y, 1.0, 0.0, -0.75),
            body(-Vector::X, Vector::ZERO, 2.0, 0.0, -0.4),
            body(Vector::Z, Vector::X, 0.5, 0.0, -1.2),
        ];
        let mut totals = Totals::default();
        totals.accumulate(&bodies);

        let halved: Scalar = bodies
            .iter()
            .map(|body| body.potential_energy() * body.mass)
            .sum::<Scalar>()
            / 2.0;
        assert!((totals.potential_energy() - halved).abs() < 1e-15);
    }

    #[test]
    fn test_background_counted_per_body() {
        let bodies = [body(Vector::X, Vector::Y, 3.0, -1.0, 0.0)];
        let mut totals = Totals::default();
        totals.accumulate(&bodies);

        assert_eq!(totals.kinetic_energy(), 1.5);
        assert_eq!(totals.potential_energy(), -3.0);
        assert_eq!(totals.angular_momentum(), Vector::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_massless_bodies_do_not_contribute() {
        let bodies = [
            body(Vector::X, Vector::Y, 1.0, -1.0, 0.0),
            body(Vector::new(5.0, 0.0, 0.0), Vector::Y, 0.0, 0.0, -0.2),
        ];
        let mut totals = Totals::default();
        totals.accumulate(&bodies);
        assert_eq!(totals.total_energy(), -0.5);
    }

    #[test]
    fn test_error_relative_to_baseline() {
        let mut bodies = vec![body(Vector::X, Vector::Y, 1.0, -1.0, 0.0)];
        let mut totals = Totals::default();
        totals.accumulate(&bodies);
        assert_eq!(totals.energy_error(), 0.0);
        totals.capture_baseline();
        assert_eq!(totals.initial_energy(), Some(-0.5));

        bodies[0] = body(Vector::X, Vector::ZERO, 1.0, -1.0, 0.0);
        totals.accumulate(&bodies);
        assert!((totals.energy_error() - 1.0).abs() < 1e-15);
        assert_eq!(totals.record(2.0).energy_error, totals.energy_error());
    }
}
