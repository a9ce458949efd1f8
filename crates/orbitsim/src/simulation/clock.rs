use crate::config::{ConfigError, TimeConfig};
use crate::physics::math::Scalar;
use chrono::{DateTime, Local, TimeDelta};

/// Fixed-step simulation clock
///
/// Time is always derived as `start + steps·delta` so it never accumulates
/// rounding, and the clock runs for exactly `steps_max` increments.
#[derive(Debug, Clone, PartialEq)]
pub struct Clock {
    start: Scalar,
    end: Scalar,
    delta: Scalar,
    steps: u64,
    steps_max: u64,
    wall_clock_start: Option<DateTime<Local>>,
}

// Absorbs the representation error of quotients such as 0.3 / 0.1
const STEP_TOLERANCE: Scalar = 1e-9;

impl Clock {
    pub fn new(start: Scalar, end: Scalar, delta: Scalar) -> Result<Self, ConfigError> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "time step must be positive, got {delta}"
            )));
        }
        if !(start.is_finite() && end.is_finite()) || end < start {
            return Err(ConfigError::Invalid(format!(
                "end time {end} is before start time {start}"
            )));
        }

        let steps_max = ((end - start) / delta + STEP_TOLERANCE).floor() as u64;
        Ok(Self {
            start,
            end,
            delta,
            steps: 0,
            steps_max,
            wall_clock_start: None,
        })
    }

    pub fn from_config(config: &TimeConfig) -> Result<Self, ConfigError> {
        Self::new(config.start, config.end, config.delta)
    }

    /// Rewinds to the start time and restarts the wall clock
    pub fn reset(&mut self) {
        self.steps = 0;
        self.wall_clock_start = Some(Local::now());
    }

    pub fn increment(&mut self) {
        self.steps += 1;
    }

    pub fn running(&self) -> bool {
        self.steps <= self.steps_max
    }

    pub fn current_time(&self) -> Scalar {
        self.start + self.steps as Scalar * self.delta
    }

    /// Whether the current step is the last one the clock will run
    pub fn is_final_step(&self) -> bool {
        self.steps == self.steps_max
    }

    /// Fraction of the interval covered, within `[0, 1]`
    pub fn progress(&self) -> Scalar {
        if self.end <= self.start {
            return 1.0;
        }
        ((self.current_time() - self.start) / (self.end - self.start)).clamp(0.0, 1.0)
    }

    /// Wall-clock time since the last reset
    pub fn elapsed(&self) -> TimeDelta {
        self.wall_clock_start
            .map(|start| Local::now() - start)
            .unwrap_or_else(TimeDelta::zero)
    }

    pub fn start(&self) -> Scalar {
        self.start
    }

    pub fn end(&self) -> Scalar {
        self.end
    }

    pub fn delta(&self) -> Scalar {
        self.delta
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn steps_max(&self) -> u64 {
        self.steps_max
    }
}
