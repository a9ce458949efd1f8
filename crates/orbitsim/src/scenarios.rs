//! Built-in scenarios, selectable with `--scenario`

use crate::config::{ClusterConfig, SimulationConfig, TimeConfig};
use crate::physics::galaxy::RingGalaxy;
use crate::physics::initial_conditions::InitialConditions;
use crate::physics::math::{PI, Scalar, Vector};
use crate::physics::potentials::{Isochrone, Kepler, Logarithmic, Oscillator, Potential};
use crate::physics::system::UpdateScheme;
use clap::ValueEnum;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[value(rename_all = "snake_case")]
pub enum Scenario {
    Kepler,
    TwoBody,
    FigureEight,
    StableTriple,
    UnstableTriple,
    Isochrone,
    Oscillator,
    Logarithmic,
    Galaxy,
    Collision,
}

impl Scenario {
    pub fn name(&self) -> String {
        self.to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Kepler => "single body on an e = 0.7 Kepler orbit for one period",
            Scenario::TwoBody => "masses 2 and 1 on a mutual e = 0.7 orbit",
            Scenario::FigureEight => "three equal masses on the figure-eight choreography",
            Scenario::StableTriple => "collinear three-body system that stays bound",
            Scenario::UnstableTriple => "collinear three-body system that breaks up",
            Scenario::Isochrone => "test particle in an isochrone potential with b = 0.1",
            Scenario::Oscillator => "test particle in a harmonic core with ω = 1",
            Scenario::Logarithmic => "loop orbit in a flattened logarithmic halo",
            Scenario::Galaxy => "massless rings orbiting a single galaxy centre",
            Scenario::Collision => "two ring galaxies on an e = 0.8 encounter",
        }
    }

    /// The complete configuration of this scenario
    pub fn config(&self) -> SimulationConfig {
        let mut config = match self {
            Scenario::Kepler => single(
                Potential::Kepler(Kepler::new(1.0, 0.7)),
                time(2.0 * PI, 1e-3, 1e-2),
            ),
            Scenario::TwoBody => few_body(
                InitialConditions::TwoBody,
                vec![2.0, 1.0],
                Potential::Kepler(Kepler::new(1.0, 0.7)),
            ),
            Scenario::FigureEight => few_body(
                InitialConditions::FigureEight,
                vec![1.0],
                Potential::default(),
            ),
            Scenario::StableTriple => few_body(
                InitialConditions::StableTriple,
                vec![1.0],
                Potential::default(),
            ),
            Scenario::UnstableTriple => few_body(
                InitialConditions::UnstableTriple,
                vec![1.0],
                Potential::default(),
            ),
            Scenario::Isochrone => single(
                Potential::Isochrone(Isochrone {
                    b: 0.1,
                    ..Default::default()
                }),
                time(6.0 * PI, 1e-3, 1e-2),
            ),
            Scenario::Oscillator => single(
                Potential::Oscillator(Oscillator {
                    omega: Some(1.0),
                    ..Default::default()
                }),
                time(2.0 * PI, 1e-3, 1e-2),
            ),
            Scenario::Logarithmic => single(
                Potential::Logarithmic(Logarithmic {
                    v0: 1.0,
                    core_radius: 0.2,
                    flattening: 0.8,
                    ..Default::default()
                }),
                time(10.0 * PI, 1e-2, 1e-2),
            ),
            Scenario::Galaxy => SimulationConfig {
                time: time(100.0, 0.1, 1.0),
                clusters: vec![galaxy("galaxy", RingGalaxy::default(), 1.0)],
                ..Default::default()
            },
            Scenario::Collision => collision(),
        };

        config.output.directory = format!("output/{}", self.name());
        config
    }
}

fn time(end: Scalar, delta: Scalar, output_interval: Scalar) -> TimeConfig {
    TimeConfig {
        start: 0.0,
        end,
        delta,
        output_interval: Some(output_interval),
    }
}

fn single(model: Potential, time: TimeConfig) -> SimulationConfig {
    SimulationConfig {
        time,
        clusters: vec![ClusterConfig {
            name: model.name().to_string(),
            bodies: Some(1),
            masses: vec![1.0],
            model,
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Preset-placed bodies with pairwise gravity only, integrated with
/// synchronous updates
fn few_body(
    initial_conditions: InitialConditions,
    masses: Vec<Scalar>,
    model: Potential,
) -> SimulationConfig {
    let mut config = SimulationConfig {
        time: time(2.0 * PI, 1e-4, 1e-2),
        clusters: vec![ClusterConfig {
            name: initial_conditions.name().to_string(),
            masses,
            use_background: Some(false),
            initial_conditions,
            model,
            ..Default::default()
        }],
        ..Default::default()
    };
    config.integration.scheme = UpdateScheme::Synchronous;
    config
}

fn galaxy(name: &str, galaxy: RingGalaxy, mass: Scalar) -> ClusterConfig {
    ClusterConfig {
        name: name.to_string(),
        masses: vec![mass],
        use_background: Some(false),
        initial_conditions: InitialConditions::RingGalaxy(galaxy),
        ..Default::default()
    }
}

/// Two ring galaxies placed at apocentre of a Kepler orbit with pericentre
/// `rmin`, each offset from the barycentre by the other's mass fraction
fn collision() -> SimulationConfig {
    let rmin: Scalar = 25.0;
    let e: Scalar = 0.8;
    let (mass_a, mass_b) = (1.0, 1.0 / 3.0);
    let mass = mass_a + mass_b;

    let a = rmin / (1.0 - e);
    let r = a * (1.0 + e);
    let v0 = libm::sqrt(a * (1.0 - e * e) * mass) / r;

    let rings = RingGalaxy {
        rings: 5,
        first_ring: 12,
        ring_increment: 6,
        spacing: 3.0,
        ..Default::default()
    };
    let first = RingGalaxy {
        inclination: 0.0,
        position: Vector::new(-r * mass_b / mass, 0.0, 0.0),
        velocity: Vector::new(0.0, -v0 * mass_b / mass, 0.0),
        ..rings.clone()
    };
    let second = RingGalaxy {
        inclination: -70.0,
        position: Vector::new(r * mass_a / mass, 0.0, 0.0),
        velocity: Vector::new(0.0, v0 * mass_a / mass, 0.0),
        ..rings
    };

    SimulationConfig {
        time: time(5000.0, 0.2, 10.0),
        clusters: vec![
            galaxy("galaxy_a", first, mass_a),
            galaxy("galaxy_b", second, mass_b),
        ],
        ..Default::default()
    }
}
