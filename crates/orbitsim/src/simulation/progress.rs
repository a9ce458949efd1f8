use crate::physics::math::Scalar;
use bevy::log::info;

/// Logs a line each time progress crosses another `interval` percent
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReporter {
    interval: Scalar,
    reported: Scalar,
}

impl ProgressReporter {
    pub fn new(interval: Scalar) -> Self {
        Self {
            interval,
            reported: 0.0,
        }
    }

    /// Reports `progress` (a fraction in `[0, 1]`) reached at simulation
    /// time `time`. Returns the percentage logged, if any
    pub fn observe(&mut self, progress: Scalar, time: Scalar) -> Option<Scalar> {
        if !(self.interval > 0.0) {
            return None;
        }

        // Last boundary at or below the current percentage
        let percent = progress * 100.0;
        let reached = (((percent + 1e-9) / self.interval).floor() * self.interval).min(100.0);
        if !(reached > self.reported) {
            return None;
        }

        self.reported = reached;
        info!("{:>5.1}% complete (t = {:.4})", reached, time);
        Some(reached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_each_interval_once() {
        let mut reporter = ProgressReporter::new(25.0);
        let reported: Vec<Scalar> = (0..=100)
            .filter_map(|step| reporter.observe(step as Scalar / 100.0, step as Scalar))
            .collect();
        assert_eq!(reported, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn test_large_jumps_report_latest_boundary() {
        let mut reporter = ProgressReporter::new(10.0);
        assert_eq!(reporter.observe(0.05, 0.0), None);
        assert_eq!(reporter.observe(0.37, 1.0), Some(30.0));
        assert_eq!(reporter.observe(0.38, 1.1), None);
        assert_eq!(reporter.observe(1.0, 2.0), Some(100.0));
        assert_eq!(reporter.observe(1.0, 2.0), None);
    }

    #[test]
    fn test_tiny_interval_reports_without_stalling() {
        let mut reporter = ProgressReporter::new(1e-18);
        let half = reporter.observe(0.5, 1.0).expect("boundary reached");
        assert!((half - 50.0).abs() < 1e-6, "{half}");
        assert_eq!(reporter.observe(0.5, 1.0), None);

        let done = reporter.observe(1.0, 2.0).expect("boundary reached");
        assert!((done - 100.0).abs() < 1e-6, "{done}");
    }

    #[test]
    fn test_disabled_reporter() {
        let mut reporter = ProgressReporter::new(0.0);
        assert_eq!(reporter.observe(1.0, 1.0), None);
    }
}
