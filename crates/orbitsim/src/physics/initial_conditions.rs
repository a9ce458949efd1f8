//! Initial-condition strategies for a cluster

use crate::config::ConfigError;
use crate::physics::galaxy::RingGalaxy;
use crate::physics::math::{Scalar, Vector};
use crate::physics::potentials::{Potential, PotentialModel};
use crate::physics::state::State;
use serde::{Deserialize, Serialize};

/// How a cluster places its bodies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitialConditions {
    /// Every body takes the model's initial state at the cluster radius
    #[default]
    Model,
    /// Two bodies on a mutual orbit about their barycentre
    TwoBody,
    /// Chenciner-Montgomery three-body figure-eight
    FigureEight,
    UnstableTriple,
    StableTriple,
    /// Explicit per-body states
    Fixed { states: Vec<State> },
    RingGalaxy(RingGalaxy),
}

/// Cluster-level inputs shared by every strategy
#[derive(Debug, Clone, Copy)]
pub struct Placement<'a> {
    pub model: &'a Potential,
    pub masses: &'a [Scalar],
    pub radius: Scalar,
    pub direction: Vector,
}

impl Placement<'_> {
    pub fn mass_total(&self) -> Scalar {
        self.masses.iter().sum()
    }
}

const FIGURE_EIGHT_POSITION: (Scalar, Scalar) = (-0.97000436, 0.24308753);
const FIGURE_EIGHT_VELOCITY: (Scalar, Scalar) = (-0.466203685, -0.43236573);

const UNSTABLE_TRIPLE: [(Scalar, Scalar); 3] = [(-1.1, -1.216), (-0.1, 0.198), (1.2, 1.018)];
const STABLE_TRIPLE: [(Scalar, Scalar); 3] = [(-1.7, -1.067), (-0.7, 0.347), (2.4, 0.720)];

impl InitialConditions {
    pub const NAMES: [&'static str; 7] = [
        "model",
        "two_body",
        "figure_eight",
        "unstable_triple",
        "stable_triple",
        "fixed",
        "ring_galaxy",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::TwoBody => "two_body",
            Self::FigureEight => "figure_eight",
            Self::UnstableTriple => "unstable_triple",
            Self::StableTriple => "stable_triple",
            Self::Fixed { .. } => "fixed",
            Self::RingGalaxy(_) => "ring_galaxy",
        }
    }

    /// Body count the strategy dictates, if any
    pub fn required_bodies(&self) -> Option<usize> {
        match self {
            Self::Model => None,
            Self::TwoBody => Some(2),
            Self::FigureEight | Self::UnstableTriple | Self::StableTriple => Some(3),
            Self::Fixed { states } => Some(states.len()),
            Self::RingGalaxy(galaxy) => Some(galaxy.body_count()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::RingGalaxy(galaxy) => galaxy.validate(),
            Self::Fixed { states } => {
                if states.is_empty() {
                    return Err(ConfigError::Invalid(
                        "fixed initial conditions need at least one state".to_string(),
                    ));
                }
                if states
                    .iter()
                    .any(|state| !state.position.is_finite() || !state.velocity.is_finite())
                {
                    return Err(ConfigError::Invalid(
                        "fixed initial conditions contain a non-finite state".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Initial states for every body of the cluster, in body order
    pub fn states(&self, placement: &Placement) -> Result<Vec<State>, ConfigError> {
        let n = placement.masses.len();
        if let Some(required) = self.required_bodies() {
            if required != n {
                return Err(ConfigError::Invalid(format!(
                    "'{}' initial conditions place {required} bodies, but the cluster has {n}",
                    self.name()
                )));
            }
        }

        match self {
            Self::Model => Ok(vec![
                placement
                    .model
                    .initial_state(placement.radius, placement.direction);
                n
            ]),
            Self::TwoBody => two_body(placement),
            Self::FigureEight => Ok(figure_eight()),
            Self::UnstableTriple => Ok(triple(&UNSTABLE_TRIPLE)),
            Self::StableTriple => Ok(triple(&STABLE_TRIPLE)),
            Self::Fixed { states } => Ok(states.clone()),
            Self::RingGalaxy(galaxy) => Ok(galaxy.states(placement.mass_total())),
        }
    }
}

/// Splits the model's unit-radius orbit between the two bodies in inverse
/// proportion to their masses, with the first body on the opposite side
fn two_body(placement: &Placement) -> Result<Vec<State>, ConfigError> {
    let mass_total = placement.mass_total();
    if mass_total <= 0.0 {
        return Err(ConfigError::Invalid(
            "two_body initial conditions need a positive total mass".to_string(),
        ));
    }

    let base = placement.model.initial_state(1.0, Vector::Y);
    Ok(placement
        .masses
        .iter()
        .enumerate()
        .map(|(index, &mass)| {
            let share = (mass_total - mass) / mass_total;
            if index == 0 {
                base.scaled(-share)
            } else {
                base.scaled(share)
            }
        })
        .collect())
}

fn figure_eight() -> Vec<State> {
    let (px, py) = FIGURE_EIGHT_POSITION;
    let (vx, vy) = FIGURE_EIGHT_VELOCITY;
    vec![
        State::new(Vector::new(px, py, 0.0), Vector::new(vx, vy, 0.0)),
        State::new(Vector::new(-px, -py, 0.0), Vector::new(vx, vy, 0.0)),
        State::new(Vector::ZERO, Vector::new(-2.0 * vx, -2.0 * vy, 0.0)),
    ]
}

/// Collinear triple: bodies on the x axis moving along y
fn triple(table: &[(Scalar, Scalar); 3]) -> Vec<State> {
    table
        .iter()
        .map(|&(x, vy)| State::new(Vector::new(x, 0.0, 0.0), Vector::new(0.0, vy, 0.0)))
        .collect()
}
