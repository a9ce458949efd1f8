use crate::config::{ClusterConfig, ConfigError};
use crate::physics::body::Body;
use crate::physics::initial_conditions::Placement;
use crate::physics::math::Scalar;
use crate::physics::potentials::{Potential, PotentialModel};
use crate::physics::totals::Totals;
use crate::simulation::output::AggregateRecord;

/// A named group of bodies sharing one background model
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    name: String,
    model: Potential,
    use_background: bool,
    bodies: Vec<Body>,
    totals: Totals,
}

impl Cluster {
    /// Builds the cluster described by `config` as cluster number `index`
    /// of its system
    ///
    /// Missing masses are filled with the first configured mass (or 1.0) and
    /// the total mass is written into the model. Unless configured otherwise,
    /// only a single-body cluster feels its background.
    pub fn from_config(index: usize, config: &ClusterConfig) -> Result<Self, ConfigError> {
        let context = format!("cluster '{}'", config.name);

        config.model.validate().map_err(|e| e.in_context(&context))?;
        config
            .initial_conditions
            .validate()
            .map_err(|e| e.in_context(&context))?;

        let masses = config.resolved_masses().map_err(|e| e.in_context(&context))?;
        let mass_total: Scalar = masses.iter().sum();

        let mut model = config.model.clone();
        model.set_mass(mass_total);

        let placement = Placement {
            model: &model,
            masses: &masses,
            radius: config.radius,
            direction: config.velocity_direction,
        };
        let states = config
            .initial_conditions
            .states(&placement)
            .map_err(|e| e.in_context(&context))?;

        let use_background = config.use_background.unwrap_or(masses.len() == 1);
        let bodies = states
            .into_iter()
            .zip(masses)
            .map(|(state, mass)| Body::new(state, mass, index))
            .collect();

        Ok(Self {
            name: config.name.clone(),
            model,
            use_background,
            bodies,
            totals: Totals::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Potential {
        &self.model
    }

    pub fn use_background(&self) -> bool {
        self.use_background
    }

    pub fn n_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn mass_total(&self) -> Scalar {
        self.model.mass()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut [Body] {
        &mut self.bodies
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Re-sums momentum and energy over the bodies
    pub fn update(&mut self) {
        self.totals.accumulate(&self.bodies);
    }

    /// Re-sums and captures the energy baseline; bodies must already be reset
    pub fn reset(&mut self) {
        self.update();
        self.totals.capture_baseline();
    }

    pub fn record(&self, time: Scalar) -> AggregateRecord {
        self.totals.record(time)
    }
}
