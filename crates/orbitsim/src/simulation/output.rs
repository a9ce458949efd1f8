//! Output records and the sinks that persist them
//!
//! Three independent record streams are produced: one per body, one per
//! cluster and one for the whole system. The file sink writes each stream as
//! a tab-separated table with a single header line.

use crate::physics::math::{Scalar, Vector};
use orbitsim_macros::Record;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Flat row of named numeric columns
pub trait Record {
    fn columns() -> &'static [&'static str];
    fn values(&self) -> Vec<Scalar>;
}

/// Per-body diagnostics at one output time
#[derive(Record, Debug, Clone, Copy, PartialEq)]
pub struct BodyRecord {
    pub time: Scalar,
    #[record(vector = "pos")]
    pub position: Vector,
    #[record(vector = "vel")]
    pub velocity: Vector,
    #[record(vector = "acc")]
    pub acceleration: Vector,
    pub radius: Scalar,
    pub theta: Scalar,
    #[record(vector = "mom")]
    pub angular_momentum: Vector,
    pub mass: Scalar,
    #[record(rename = "E_tot")]
    pub total_energy: Scalar,
    #[record(rename = "E_kin")]
    pub kinetic_energy: Scalar,
    #[record(rename = "E_pot")]
    pub potential_energy: Scalar,
    #[record(rename = "E_err")]
    pub energy_error: Scalar,
}

/// Cluster-wide or system-wide totals at one output time
#[derive(Record, Debug, Clone, Copy, PartialEq)]
pub struct AggregateRecord {
    pub time: Scalar,
    pub mass: Scalar,
    #[record(vector = "mom")]
    pub angular_momentum: Vector,
    #[record(rename = "E_tot")]
    pub total_energy: Scalar,
    #[record(rename = "E_kin")]
    pub kinetic_energy: Scalar,
    #[record(rename = "E_pot")]
    pub potential_energy: Scalar,
    #[record(rename = "E_err")]
    pub energy_error: Scalar,
}

macro_rules! impl_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Record for $ty {
                fn columns() -> &'static [&'static str] {
                    <$ty>::COLUMNS
                }

                fn values(&self) -> Vec<Scalar> {
                    self.row()
                }
            }
        )*
    };
}

impl_record!(BodyRecord, AggregateRecord);

/// Errors raised while persisting records
#[derive(Debug)]
pub enum OutputError {
    /// A file or directory could not be created or written
    Io { path: PathBuf, source: io::Error },
    /// A record was written to a stream the sink never opened
    UnknownStream(String),
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::Io { path, source } => {
                write!(f, "Failed to write output '{}': {source}", path.display())
            }
            OutputError::UnknownStream(stream) => write!(f, "Unknown output stream: {stream}"),
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io { source, .. } => Some(source),
            OutputError::UnknownStream(_) => None,
        }
    }
}

/// Number of streams a sink must provide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLayout {
    pub bodies: usize,
    pub clusters: usize,
}

/// Consumer of the per-step body, cluster and system records
pub trait OutputSink {
    fn open(&mut self, layout: OutputLayout) -> Result<(), OutputError>;
    fn write_body(&mut self, index: usize, record: &BodyRecord) -> Result<(), OutputError>;
    fn write_cluster(&mut self, index: usize, record: &AggregateRecord) -> Result<(), OutputError>;
    fn write_system(&mut self, record: &AggregateRecord) -> Result<(), OutputError>;
    fn close(&mut self) -> Result<(), OutputError>;
}

pub fn body_file_name(index: usize) -> String {
    format!("body_{index:05}.dat")
}

pub fn cluster_file_name(index: usize) -> String {
    format!("cluster_{index:05}.dat")
}

pub const SYSTEM_FILE_NAME: &str = "system.dat";

/// Tab-separated table writer for one record type
pub struct RecordWriter<W: Write> {
    writer: W,
    rows: usize,
}

impl<W: Write> RecordWriter<W> {
    /// Writes the header line for `R`
    pub fn create<R: Record>(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{}", R::columns().join("\t"))?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write<R: Record>(&mut self, record: &R) -> io::Result<()> {
        let line = record
            .values()
            .iter()
            .map(|value| format!("{value:.10e}"))
            .collect::<Vec<_>>()
            .join("\t");
        writeln!(self.writer, "{line}")?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Buffered rows for one table, appended to its file in batches
///
/// No file handle is held between batches, so the number of tables is not
/// bounded by the process limit on open files.
struct FileStream {
    path: PathBuf,
    writer: RecordWriter<Vec<u8>>,
}

impl FileStream {
    /// Pending bytes that trigger an append to disk
    const BATCH_BYTES: usize = 8 * 1024;

    /// Truncates the file at `path` and writes the header for `R`
    fn create<R: Record>(path: PathBuf) -> Result<Self, OutputError> {
        let writer = RecordWriter::create::<R>(Vec::new()).map_err(|source| OutputError::Io {
            path: path.clone(),
            source,
        })?;
        let mut stream = Self { path, writer };
        stream.persist(OpenOptions::new().write(true).create(true).truncate(true))?;
        Ok(stream)
    }

    fn write<R: Record>(&mut self, record: &R) -> Result<(), OutputError> {
        self.writer.write(record).map_err(|source| OutputError::Io {
            path: self.path.clone(),
            source,
        })?;
        if self.writer.get_ref().len() >= Self::BATCH_BYTES {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), OutputError> {
        if self.writer.get_ref().is_empty() {
            return Ok(());
        }
        self.persist(OpenOptions::new().append(true))
    }

    fn persist(&mut self, options: &OpenOptions) -> Result<(), OutputError> {
        let pending = self.writer.get_mut();
        options
            .open(&self.path)
            .and_then(|mut file| file.write_all(pending.as_slice()))
            .map_err(|source| OutputError::Io {
                path: self.path.clone(),
                source,
            })?;
        pending.clear();
        Ok(())
    }
}

/// Writes every stream to its own `.dat` file under a directory
pub struct TsvSink {
    directory: PathBuf,
    bodies: Vec<FileStream>,
    clusters: Vec<FileStream>,
    system: Option<FileStream>,
}

impl TsvSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            bodies: Vec::new(),
            clusters: Vec::new(),
            system: None,
        }
    }
}

impl OutputSink for TsvSink {
    fn open(&mut self, layout: OutputLayout) -> Result<(), OutputError> {
        fs::create_dir_all(&self.directory).map_err(|source| OutputError::Io {
            path: self.directory.clone(),
            source,
        })?;

        self.bodies = (0..layout.bodies)
            .map(|index| FileStream::create::<BodyRecord>(self.directory.join(body_file_name(index))))
            .collect::<Result<_, _>>()?;
        self.clusters = (0..layout.clusters)
            .map(|index| {
                FileStream::create::<AggregateRecord>(self.directory.join(cluster_file_name(index)))
            })
            .collect::<Result<_, _>>()?;
        self.system = Some(FileStream::create::<AggregateRecord>(
            self.directory.join(SYSTEM_FILE_NAME),
        )?);
        Ok(())
    }

    fn write_body(&mut self, index: usize, record: &BodyRecord) -> Result<(), OutputError> {
        self.bodies
            .get_mut(index)
            .ok_or_else(|| OutputError::UnknownStream(body_file_name(index)))?
            .write(record)
    }

    fn write_cluster(&mut self, index: usize, record: &AggregateRecord) -> Result<(), OutputError> {
        self.clusters
            .get_mut(index)
            .ok_or_else(|| OutputError::UnknownStream(cluster_file_name(index)))?
            .write(record)
    }

    fn write_system(&mut self, record: &AggregateRecord) -> Result<(), OutputError> {
        self.system
            .as_mut()
            .ok_or_else(|| OutputError::UnknownStream(SYSTEM_FILE_NAME.to_string()))?
            .write(record)
    }

    fn close(&mut self) -> Result<(), OutputError> {
        for stream in self
            .bodies
            .iter_mut()
            .chain(self.clusters.iter_mut())
            .chain(self.system.iter_mut())
        {
            stream.flush()?;
        }
        self.bodies.clear();
        self.clusters.clear();
        self.system = None;
        Ok(())
    }
}

/// Keeps every record in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub bodies: Vec<Vec<BodyRecord>>,
    pub clusters: Vec<Vec<AggregateRecord>>,
    pub system: Vec<AggregateRecord>,
    pub closed: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for MemorySink {
    fn open(&mut self, layout: OutputLayout) -> Result<(), OutputError> {
        self.bodies = vec![Vec::new(); layout.bodies];
        self.clusters = vec![Vec::new(); layout.clusters];
        self.system.clear();
        self.closed = false;
        Ok(())
    }

    fn write_body(&mut self, index: usize, record: &BodyRecord) -> Result<(), OutputError> {
        self.bodies
            .get_mut(index)
            .ok_or_else(|| OutputError::UnknownStream(body_file_name(index)))?
            .push(*record);
        Ok(())
    }

    fn write_cluster(&mut self, index: usize, record: &AggregateRecord) -> Result<(), OutputError> {
        self.clusters
            .get_mut(index)
            .ok_or_else(|| OutputError::UnknownStream(cluster_file_name(index)))?
            .push(*record);
        Ok(())
    }

    fn write_system(&mut self, record: &AggregateRecord) -> Result<(), OutputError> {
        self.system.push(*record);
        Ok(())
    }

    fn close(&mut self) -> Result<(), OutputError> {
        self.closed = true;
        Ok(())
    }
}

/// Discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn open(&mut self, _layout: OutputLayout) -> Result<(), OutputError> {
        Ok(())
    }

    fn write_body(&mut self, _index: usize, _record: &BodyRecord) -> Result<(), OutputError> {
        Ok(())
    }

    fn write_cluster(&mut self, _index: usize, _record: &AggregateRecord) -> Result<(), OutputError> {
        Ok(())
    }

    fn write_system(&mut self, _record: &AggregateRecord) -> Result<(), OutputError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
