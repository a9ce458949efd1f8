//! Simulation plugin
//!
//! Runs the configured integration once inside the app's `Update` schedule,
//! stores the outcome as a resource and requests exit with a status that
//! reflects it.

use crate::prelude::*;
use crate::simulation::output::{NullSink, OutputSink, TsvSink};
use crate::simulation::{Phase, RunOutcome, Simulation, SimulationError};

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Integrate,
}

/// Outcome of the run, filled in once it finishes
#[derive(Resource, Debug, Default)]
pub struct SimulationReport {
    pub phase: Phase,
    pub outcome: Option<RunOutcome>,
    pub error: Option<String>,
}

pub struct SimulationPlugin {
    config: Option<SimulationConfig>,
}

impl SimulationPlugin {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl Default for SimulationPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = self
            .config
            .clone()
            .unwrap_or_else(SimulationConfig::load_from_user_config);

        match toml::to_string_pretty(&config) {
            Ok(toml_string) => {
                debug!("=== Current Configuration (TOML) ===\n{}", toml_string);
                debug!("=== End Configuration ===");
            }
            Err(e) => {
                error!("Failed to serialize configuration to TOML: {}", e);
            }
        }

        app.insert_resource(config);
        app.init_resource::<SimulationReport>();

        app.add_systems(
            Update,
            run_simulation
                .in_set(SimulationSet::Integrate)
                .run_if(|report: Res<SimulationReport>| report.phase == Phase::Idle),
        );
    }
}

fn execute(config: &SimulationConfig) -> Result<RunOutcome, SimulationError> {
    let mut simulation = Simulation::from_config(config.clone())?;
    let mut sink: Box<dyn OutputSink> = if config.output.enabled {
        Box::new(TsvSink::new(config.output_directory()))
    } else {
        Box::new(NullSink)
    };
    simulation.execute(sink.as_mut())
}

fn run_simulation(
    config: Res<SimulationConfig>,
    mut report: ResMut<SimulationReport>,
    mut exit: EventWriter<AppExit>,
) {
    report.phase = Phase::Running;

    match execute(&config) {
        Ok(outcome) => {
            if let RunOutcome::Completed(run) = &outcome {
                if config.output.enabled {
                    info!("Records written to {}", config.output.directory);
                }
                info!("System totals over the run:\n{}", run.summary);
            }
            report.outcome = Some(outcome);
            exit.write(AppExit::Success);
        }
        Err(e) => {
            error!("Simulation failed: {}", e);
            report.error = Some(e.to_string());
            exit.write(AppExit::error());
        }
    }

    report.phase = Phase::Complete;
}
