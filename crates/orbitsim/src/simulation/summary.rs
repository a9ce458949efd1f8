//! Per-column statistics over the system records of a run

use crate::physics::math::Scalar;
use crate::simulation::output::{AggregateRecord, Record};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub min: Scalar,
    pub max: Scalar,
    pub mean: Scalar,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    samples: usize,
    columns: Vec<ColumnSummary>,
}

impl RunSummary {
    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn columns(&self) -> &[ColumnSummary] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|column| column.name == name)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<8} {:>18} {:>18} {:>18}", "column", "min", "max", "mean")?;
        for column in &self.columns {
            writeln!(
                f,
                "{:<8} {:>18.10e} {:>18.10e} {:>18.10e}",
                column.name, column.min, column.max, column.mean
            )?;
        }
        write!(f, "({} records)", self.samples)
    }
}

/// Running min/max/sum over aggregate records
#[derive(Debug, Clone, Default)]
pub struct SummaryBuilder {
    samples: usize,
    min: Vec<Scalar>,
    max: Vec<Scalar>,
    sum: Vec<Scalar>,
}

impl SummaryBuilder {
    pub fn push(&mut self, record: &AggregateRecord) {
        let values = record.values();
        if self.samples == 0 {
            self.min = values.clone();
            self.max = values.clone();
            self.sum = values;
        } else {
            for (i, value) in values.into_iter().enumerate() {
                self.min[i] = self.min[i].min(value);
                self.max[i] = self.max[i].max(value);
                self.sum[i] += value;
            }
        }
        self.samples += 1;
    }

    pub fn finish(self) -> RunSummary {
        if self.samples == 0 {
            return RunSummary::default();
        }

        let count = self.samples as Scalar;
        let columns = AggregateRecord::columns()
            .iter()
            .zip(self.min.iter().zip(&self.max).zip(&self.sum))
            .map(|(&name, ((&min, &max), &sum))| ColumnSummary {
                name,
                min,
                max,
                mean: sum / count,
            })
            .collect();

        RunSummary {
            samples: self.samples,
            columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::math::Vector;

    fn record(time: Scalar, total_energy: Scalar) -> AggregateRecord {
        AggregateRecord {
            time,
            mass: 2.0,
            angular_momentum: Vector::new(0.0, 0.0, time),
            total_energy,
            kinetic_energy: 0.0,
            potential_energy: total_energy,
            energy_error: 0.0,
        }
    }

    #[test]
    fn test_statistics() {
        let mut builder = SummaryBuilder::default();
        builder.push(&record(0.0, -1.0));
        builder.push(&record(1.0, -0.5));
        builder.push(&record(2.0, -1.5));
        let summary = builder.finish();

        assert_eq!(summary.samples(), 3);
        assert_eq!(summary.columns().len(), AggregateRecord::columns().len());

        let time = summary.column("time").unwrap();
        assert_eq!((time.min, time.max, time.mean), (0.0, 2.0, 1.0));

        let energy = summary.column("E_tot").unwrap();
        assert_eq!((energy.min, energy.max, energy.mean), (-1.5, -0.5, -1.0));

        let momentum = summary.column("mom_z").unwrap();
        assert_eq!(momentum.max, 2.0);
        assert!(summary.column("missing").is_none());
    }

    #[test]
    fn test_empty_summary() {
        let summary = SummaryBuilder::default().finish();
        assert_eq!(summary.samples(), 0);
        assert!(summary.columns().is_empty());
        assert!(summary.to_string().contains("0 records"));
    }
}
