//! The integration driver
//!
//! [`Simulation`] owns a [`System`] and a [`Clock`] and advances the system
//! step by step, routing records to an [`OutputSink`] at the configured
//! cadence.

pub mod clock;
pub mod output;
pub mod progress;
pub mod signature;
pub mod summary;

use crate::config::{ConfigError, SimulationConfig};
use crate::physics::integrators::{Integrator, Leapfrog};
use crate::physics::math::Scalar;
use crate::physics::system::System;
use bevy::log::{debug, info};
use chrono::TimeDelta;
use clock::Clock;
use output::{OutputError, OutputLayout, OutputSink};
use progress::ProgressReporter;
use signature::{RunSignature, SignatureCache};
use std::fmt;
use summary::{RunSummary, SummaryBuilder};

pub use crate::physics::system::UpdateScheme;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Complete,
}

#[derive(Debug)]
pub enum SimulationError {
    Config(ConfigError),
    Output(OutputError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::Config(err) => write!(f, "{err}"),
            SimulationError::Output(err) => write!(f, "Output failed: {err}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Config(err) => Some(err),
            SimulationError::Output(err) => Some(err),
        }
    }
}

impl From<ConfigError> for SimulationError {
    fn from(err: ConfigError) -> Self {
        SimulationError::Config(err)
    }
}

impl From<OutputError> for SimulationError {
    fn from(err: OutputError) -> Self {
        SimulationError::Output(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub steps: u64,
    /// Number of output times written, the initial state included
    pub outputs: usize,
    pub final_time: Scalar,
    pub wall_clock: TimeDelta,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunReport),
    /// The stored signature matched, nothing was integrated
    Unchanged,
}

pub struct Simulation {
    config: SimulationConfig,
    initial: System,
    system: System,
    clock: Clock,
    integrator: Box<dyn Integrator>,
    cache: Option<SignatureCache>,
    phase: Phase,
}

impl Simulation {
    /// Validates `config` and builds the system and clock it describes
    ///
    /// The rerun cache lives in the output directory and is only consulted
    /// when output is enabled and caching is on.
    pub fn from_config(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let system = System::from_config(&config.clusters)?;
        let clock = Clock::from_config(&config.time)?;
        let cache = (config.output.enabled && config.output.use_cache)
            .then(|| SignatureCache::new(config.output_directory()));

        Ok(Self {
            config,
            initial: system.clone(),
            system,
            clock,
            integrator: Box::new(Leapfrog),
            cache,
            phase: Phase::Idle,
        })
    }

    pub fn with_cache(mut self, cache: Option<SignatureCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_integrator(mut self, integrator: Box<dyn Integrator>) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn scheme(&self) -> UpdateScheme {
        self.config.integration.scheme
    }

    /// Integrates from the initial configuration to the end time
    ///
    /// Every run starts over from the initial state, so calling this twice
    /// repeats the same run.
    pub fn execute(&mut self, sink: &mut dyn OutputSink) -> Result<RunOutcome, SimulationError> {
        self.clock.reset();
        self.system = self.initial.clone();
        self.system.reset();

        let signature = RunSignature::compute(&self.config, &self.system)?;
        if let Some(cache) = &self.cache {
            if cache.is_current(signature) {
                info!(
                    "Output in {} is up to date (signature {signature}), skipping run",
                    self.config.output.directory
                );
                self.phase = Phase::Complete;
                return Ok(RunOutcome::Unchanged);
            }
            // The tables are about to be overwritten; a run that fails part
            // way must not leave the old signature vouching for them
            cache.invalidate()?;
        }

        info!(
            "Integrating {} bodies in {} clusters with {} ({} updates), {} steps of {}",
            self.system.n_bodies(),
            self.system.clusters().len(),
            self.integrator.name(),
            self.scheme().name(),
            self.clock.steps_max(),
            self.clock.delta()
        );

        self.phase = Phase::Running;
        sink.open(OutputLayout {
            bodies: self.system.n_bodies(),
            clusters: self.system.clusters().len(),
        })?;

        let mut summary = SummaryBuilder::default();
        let mut outputs = 0;
        self.write_records(sink, &mut summary)?;
        outputs += 1;

        let interval = self.config.time.output_interval;
        let tolerance = self.clock.delta() * 1e-6;
        let mut next_output = interval.map(|interval| self.clock.start() + interval);
        let mut progress = ProgressReporter::new(self.config.output.progress_interval);

        loop {
            self.clock.increment();
            if !self.clock.running() {
                break;
            }

            self.system
                .step(self.integrator.as_ref(), self.clock.delta(), self.scheme());

            let time = self.clock.current_time();
            let due = match (next_output, interval) {
                (Some(next), Some(interval)) => {
                    let due = time >= next - tolerance || self.clock.is_final_step();
                    if due {
                        next_output = Some(next_boundary(
                            self.clock.start(),
                            time,
                            interval,
                            tolerance,
                        ));
                    }
                    due
                }
                _ => true,
            };
            if due {
                self.write_records(sink, &mut summary)?;
                outputs += 1;
            }

            progress.observe(self.clock.progress(), time);
        }

        sink.close()?;
        if let Some(cache) = &self.cache {
            cache.store(signature)?;
        }
        self.phase = Phase::Complete;

        let report = RunReport {
            steps: self.clock.steps_max(),
            outputs,
            final_time: self.clock.start() + self.clock.steps_max() as Scalar * self.clock.delta(),
            wall_clock: self.clock.elapsed(),
            summary: summary.finish(),
        };
        info!(
            "Finished {} steps to t = {} in {:.3}s, {} outputs written",
            report.steps,
            report.final_time,
            report.wall_clock.num_milliseconds() as f64 / 1000.0,
            report.outputs
        );
        debug!("System summary:\n{}", report.summary);

        Ok(RunOutcome::Completed(report))
    }

    fn write_records(
        &self,
        sink: &mut dyn OutputSink,
        summary: &mut SummaryBuilder,
    ) -> Result<(), OutputError> {
        let time = self.clock.current_time();
        for (index, body) in self.system.bodies().enumerate() {
            sink.write_body(index, &body.record(time))?;
        }
        for (index, cluster) in self.system.clusters().iter().enumerate() {
            sink.write_cluster(index, &cluster.record(time))?;
        }
        let record = self.system.record(time);
        sink.write_system(&record)?;
        summary.push(&record);
        Ok(())
    }
}

/// First output boundary `start + k·interval` strictly after `time`
///
/// When `interval` is below the resolution of `start` the boundary collapses
/// onto `time`, which makes every following step due.
fn next_boundary(start: Scalar, time: Scalar, interval: Scalar, tolerance: Scalar) -> Scalar {
    let index = ((time - start + tolerance) / interval).floor() + 1.0;
    start + index * interval
}
