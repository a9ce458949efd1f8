//! The root aggregate: every cluster, flattened into one body list for
//! pairwise gravity

use crate::config::{ClusterConfig, ConfigError};
use crate::physics::body::Body;
use crate::physics::cluster::Cluster;
use crate::physics::integrators::{AccelerationField, Integrator};
use crate::physics::math::{G, Scalar, Vector};
use crate::physics::potentials::PotentialModel;
use crate::physics::totals::Totals;
use crate::simulation::output::AggregateRecord;
use serde::{Deserialize, Serialize};

/// Order in which bodies are moved and their forces evaluated within a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScheme {
    /// Each body completes its whole step before the next one starts, so
    /// later bodies see the new positions of earlier ones
    #[default]
    Sequential,
    /// Every body drifts first, then all forces are evaluated against the
    /// same configuration
    Synchronous,
}

impl UpdateScheme {
    pub fn name(&self) -> &'static str {
        match self {
            UpdateScheme::Sequential => "sequential",
            UpdateScheme::Synchronous => "synchronous",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct System {
    clusters: Vec<Cluster>,
    /// (cluster, position within cluster) for every global body index
    index: Vec<(usize, usize)>,
    totals: Totals,
}

/// Acceleration seen by one body of a system at an arbitrary position
pub struct SystemField<'a> {
    pub system: &'a System,
    pub index: usize,
}

impl AccelerationField for SystemField<'_> {
    fn at(&self, position: Vector) -> Vector {
        self.system.acceleration_at(self.index, position)
    }
}

impl System {
    /// Assembles a system and computes its initial forces and baselines
    pub fn new(clusters: Vec<Cluster>) -> Result<Self, ConfigError> {
        if clusters.is_empty() {
            return Err(ConfigError::Invalid(
                "the system needs at least one cluster".to_string(),
            ));
        }

        let mut system = Self {
            clusters,
            index: Vec::new(),
            totals: Totals::default(),
        };
        system.reset();
        Ok(system)
    }

    pub fn from_config(clusters: &[ClusterConfig]) -> Result<Self, ConfigError> {
        let clusters = clusters
            .iter()
            .enumerate()
            .map(|(index, config)| Cluster::from_config(index, config))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(clusters)
    }

    pub fn n_bodies(&self) -> usize {
        self.index.len()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Every body, in global index order
    pub fn bodies(&self) -> impl Iterator<Item = &Body> + '_ {
        self.clusters.iter().flat_map(|cluster| cluster.bodies())
    }

    /// Cluster and local position of a global body index
    pub fn locate(&self, index: usize) -> Option<(usize, usize)> {
        self.index.get(index).copied()
    }

    pub fn body(&self, index: usize) -> Option<&Body> {
        let (cluster, local) = self.locate(index)?;
        self.clusters[cluster].bodies().get(local)
    }

    pub fn body_mut(&mut self, index: usize) -> Option<&mut Body> {
        let (cluster, local) = self.locate(index)?;
        self.clusters[cluster].bodies_mut().get_mut(local)
    }

    /// Acceleration on body `index` at its current position
    pub fn acceleration(&self, index: usize) -> Vector {
        match self.body(index) {
            Some(body) => self.acceleration_at(index, body.state.position),
            None => Vector::ZERO,
        }
    }

    /// Acceleration body `index` would feel at `position`: its own cluster's
    /// background (when enabled) plus the pull of every other massive body
    pub fn acceleration_at(&self, index: usize, position: Vector) -> Vector {
        let mut acceleration = match self.background(index) {
            Some(cluster) => cluster.model().acceleration(position),
            None => Vector::ZERO,
        };

        for (other, body) in self.bodies().enumerate() {
            if other == index || body.mass == 0.0 {
                continue;
            }
            let separation = position - body.state.position;
            let distance = separation.length();
            if distance == 0.0 {
                continue;
            }
            acceleration -= separation * (G * body.mass / (distance * distance * distance));
        }

        acceleration
    }

    /// Potential per unit mass of body `index`
    pub fn potential(&self, index: usize) -> Scalar {
        let (background, interaction) = self.potential_parts(index);
        background + interaction
    }

    /// Potential per unit mass of body `index`, split into the cluster
    /// background and the pairwise interaction
    pub fn potential_parts(&self, index: usize) -> (Scalar, Scalar) {
        let Some(position) = self.body(index).map(|body| body.state.position) else {
            return (0.0, 0.0);
        };

        let background = match self.background(index) {
            Some(cluster) => cluster.model().potential(position),
            None => 0.0,
        };

        let interaction = self
            .bodies()
            .enumerate()
            .filter(|(other, body)| *other != index && body.mass != 0.0)
            .filter_map(|(_, body)| {
                let distance = (position - body.state.position).length();
                (distance != 0.0).then(|| -G * body.mass / distance)
            })
            .sum();

        (background, interaction)
    }

    /// Owning cluster of body `index` when its background applies
    fn background(&self, index: usize) -> Option<&Cluster> {
        let (cluster, _) = self.locate(index)?;
        let cluster = &self.clusters[cluster];
        cluster.use_background().then_some(cluster)
    }

    /// Rebuilds the body index, evaluates the forces and potentials of the
    /// current configuration and captures every energy baseline
    pub fn reset(&mut self) {
        self.index = self
            .clusters
            .iter()
            .enumerate()
            .flat_map(|(cluster, members)| (0..members.n_bodies()).map(move |local| (cluster, local)))
            .collect();

        let accelerations: Vec<Vector> = (0..self.n_bodies()).map(|i| self.acceleration(i)).collect();
        let potentials: Vec<(Scalar, Scalar)> =
            (0..self.n_bodies()).map(|i| self.potential_parts(i)).collect();

        for (body, (acceleration, (background, interaction))) in self
            .clusters
            .iter_mut()
            .flat_map(|cluster| cluster.bodies_mut())
            .zip(accelerations.into_iter().zip(potentials))
        {
            body.state.acceleration = acceleration;
            body.set_potential(background, interaction);
            body.reset();
        }

        for cluster in &mut self.clusters {
            cluster.reset();
        }
        self.totals.accumulate(self.clusters.iter().flat_map(|cluster| cluster.bodies()));
        self.totals.capture_baseline();
    }

    /// Advances every body by one step, then refreshes all diagnostics
    pub fn step(&mut self, integrator: &dyn Integrator, dt: Scalar, scheme: UpdateScheme) {
        match scheme {
            UpdateScheme::Sequential => {
                for index in 0..self.n_bodies() {
                    let Some(mut state) = self.body(index).map(|body| body.state) else {
                        continue;
                    };
                    integrator.step(&mut state, &SystemField { system: self, index }, dt);
                    if let Some(body) = self.body_mut(index) {
                        body.state = state;
                    }
                }
            }
            UpdateScheme::Synchronous => {
                for cluster in &mut self.clusters {
                    for body in cluster.bodies_mut() {
                        integrator.advance(&mut body.state, dt);
                    }
                }
                let accelerations: Vec<Vector> =
                    (0..self.n_bodies()).map(|i| self.acceleration(i)).collect();
                for (body, acceleration) in self
                    .clusters
                    .iter_mut()
                    .flat_map(|cluster| cluster.bodies_mut())
                    .zip(accelerations)
                {
                    integrator.complete(&mut body.state, acceleration, dt);
                }
            }
        }

        self.update();
    }

    /// Assigns potentials from the current configuration and re-sums every
    /// body, cluster and system diagnostic
    pub fn update(&mut self) {
        let potentials: Vec<(Scalar, Scalar)> =
            (0..self.n_bodies()).map(|i| self.potential_parts(i)).collect();

        for (body, (background, interaction)) in self
            .clusters
            .iter_mut()
            .flat_map(|cluster| cluster.bodies_mut())
            .zip(potentials)
        {
            body.set_potential(background, interaction);
            body.update();
        }

        for cluster in &mut self.clusters {
            cluster.update();
        }
        self.totals.accumulate(self.clusters.iter().flat_map(|cluster| cluster.bodies()));
    }

    pub fn record(&self, time: Scalar) -> AggregateRecord {
        self.totals.record(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::initial_conditions::InitialConditions;
    use crate::physics::integrators::Leapfrog;
    use crate::physics::potentials::{Isochrone, Kepler, Potential};
    use crate::physics::state::State;

    fn fixed(name: &str, states: Vec<State>, masses: Vec<Scalar>) -> ClusterConfig {
        ClusterConfig {
            name: name.to_string(),
            masses,
            use_background: Some(false),
            initial_conditions: InitialConditions::Fixed { states },
            ..Default::default()
        }
    }

    fn at_rest(x: Scalar) -> State {
        State::new(Vector::new(x, 0.0, 0.0), Vector::ZERO)
    }

    #[test]
    fn test_pairwise_acceleration() {
        let system = System::from_config(&[fixed(
            "pair",
            vec![at_rest(-1.0), at_rest(1.0)],
            vec![1.0, 3.0],
        )])
        .unwrap();

        // Distance 2: a = G·m/4 towards the other body
        assert_eq!(system.acceleration(0), Vector::new(0.75, 0.0, 0.0));
        assert_eq!(system.acceleration(1), Vector::new(-0.25, 0.0, 0.0));
        assert_eq!(system.potential(0), -1.5);
        assert_eq!(system.potential(1), -0.5);

        // Initial accelerations are stored by reset
        assert_eq!(system.body(0).unwrap().state.acceleration, system.acceleration(0));
    }

    #[test]
    fn test_zero_separation_is_skipped() {
        let system = System::from_config(&[fixed(
            "stack",
            vec![at_rest(1.0), at_rest(1.0), at_rest(3.0)],
            vec![1.0, 1.0, 1.0],
        )])
        .unwrap();

        let acceleration = system.acceleration(0);
        assert!(acceleration.is_finite());
        assert_eq!(acceleration, Vector::new(0.25, 0.0, 0.0));
        assert_eq!(system.potential(0), -0.5);
    }

    #[test]
    fn test_massless_bodies_exert_no_force() {
        let system = System::from_config(&[fixed(
            "tracer",
            vec![at_rest(0.0), at_rest(2.0)],
            vec![0.0, 4.0],
        )])
        .unwrap();

        assert_eq!(system.acceleration(1), Vector::ZERO);
        assert_eq!(system.acceleration(0), Vector::new(1.0, 0.0, 0.0));
        assert_eq!(system.totals().mass(), 4.0);
    }

    #[test]
    fn test_background_only_applies_to_own_cluster() {
        let halo = ClusterConfig {
            name: "halo".to_string(),
            bodies: Some(1),
            model: Potential::Isochrone(Isochrone::default()),
            radius: 2.0,
            ..Default::default()
        };
        let tracer = fixed("tracer", vec![at_rest(-5.0)], vec![0.0]);
        let system = System::from_config(&[halo, tracer]).unwrap();

        assert_eq!(system.n_bodies(), 2);
        assert_eq!(system.locate(1), Some((1, 0)));
        assert!(system.clusters()[0].use_background());

        // A single-body cluster always feels its own background
        let body = system.body(0).unwrap();
        let expected = system.clusters()[0].model().acceleration(body.state.position);
        assert_eq!(system.acceleration(0), expected);

        // The tracer feels only the halo's body, not its background
        let tracer_acceleration = system.acceleration(1);
        let separation = Vector::new(-5.0, 0.0, 0.0) - body.state.position;
        let pull = -separation / separation.length().powi(3);
        assert!((tracer_acceleration - pull).length() < 1e-15);
        assert_eq!(system.potential_parts(1).0, 0.0);
    }

    #[test]
    fn test_reset_counts_bodies_and_captures_baseline() {
        let system = System::from_config(&[
            fixed("a", vec![at_rest(-1.0)], vec![1.0]),
            fixed("b", vec![at_rest(1.0), at_rest(2.0)], vec![1.0, 1.0]),
        ])
        .unwrap();

        assert_eq!(system.n_bodies(), 3);
        assert_eq!(system.bodies().count(), 3);
        assert!(system.totals().initial_energy().is_some());
        assert!(system.clusters().iter().all(|c| c.totals().initial_energy().is_some()));
        assert!(system.bodies().all(|b| b.initial_energy().is_some()));
        assert!(system.body(3).is_none());
    }

    #[test]
    fn test_schemes_agree_for_single_body() {
        let config = [ClusterConfig::default()];
        let mut sequential = System::from_config(&config).unwrap();
        let mut synchronous = sequential.clone();

        for _ in 0..100 {
            sequential.step(&Leapfrog, 1e-3, UpdateScheme::Sequential);
            synchronous.step(&Leapfrog, 1e-3, UpdateScheme::Synchronous);
        }
        assert_eq!(sequential, synchronous);
    }

    #[test]
    fn test_synchronous_conserves_momentum() {
        let states = vec![
            State::new(Vector::new(-1.0, 0.0, 0.0), Vector::new(0.0, -0.3, 0.0)),
            State::new(Vector::new(1.0, 0.0, 0.0), Vector::new(0.0, 0.3, 0.0)),
            State::new(Vector::new(0.0, 2.0, 0.0), Vector::new(0.2, 0.0, 0.0)),
        ];
        let masses = vec![1.0, 2.0, 0.5];
        let mut system = System::from_config(&[fixed("three", states, masses)]).unwrap();

        let momentum = |system: &System| -> Vector {
            system.bodies().map(|body| body.state.velocity * body.mass).sum()
        };
        let initial = momentum(&system);

        for _ in 0..1000 {
            system.step(&Leapfrog, 1e-3, UpdateScheme::Synchronous);
        }
        assert!((momentum(&system) - initial).length() < 1e-10);
    }

    #[test]
    fn test_sequential_sees_moved_bodies() {
        let states = vec![
            State::new(Vector::new(-1.0, 0.0, 0.0), Vector::new(0.0, -0.5, 0.0)),
            State::new(Vector::new(1.0, 0.0, 0.0), Vector::new(0.0, 0.5, 0.0)),
        ];
        let config = [fixed("pair", states, vec![1.0, 1.0])];
        let mut sequential = System::from_config(&config).unwrap();
        let mut synchronous = sequential.clone();

        sequential.step(&Leapfrog, 0.1, UpdateScheme::Sequential);
        synchronous.step(&Leapfrog, 0.1, UpdateScheme::Synchronous);

        // Both drift the same way, but sequentially the first body's force is
        // evaluated before the second body has moved
        let first = (sequential.body(0).unwrap(), synchronous.body(0).unwrap());
        assert_eq!(first.0.state.position, first.1.state.position);
        assert_ne!(first.0.state.velocity, first.1.state.velocity);

        let second = (sequential.body(1).unwrap(), synchronous.body(1).unwrap());
        assert_eq!(second.0.state, second.1.state);
    }

    #[test]
    fn test_step_refreshes_diagnostics() {
        let config = ClusterConfig {
            model: Potential::Kepler(Kepler::new(1.0, 0.5)),
            ..Default::default()
        };
        let mut system = System::from_config(&[config]).unwrap();
        let before = system.record(0.0);
        assert_eq!(before.energy_error, 0.0);

        system.step(&Leapfrog, 1e-3, UpdateScheme::Sequential);
        let after = system.record(1e-3);

        assert_ne!(before.kinetic_energy, after.kinetic_energy);
        assert_ne!(before.potential_energy, after.potential_energy);
        assert!(after.energy_error < 1e-4);
        assert_eq!(after.mass, 1.0);
    }

    #[test]
    fn test_scheme_parsing() {
        #[derive(Deserialize)]
        struct Wrapper {
            scheme: UpdateScheme,
        }
        let wrapper: Wrapper = toml::from_str("scheme = \"synchronous\"").unwrap();
        assert_eq!(wrapper.scheme, UpdateScheme::Synchronous);
        assert_eq!(UpdateScheme::default().name(), "sequential");
    }
}
