use crate::physics::initial_conditions::InitialConditions;
use crate::physics::math::{PI, Scalar, Vector};
use crate::physics::potentials::{Potential, PotentialModel};
use crate::physics::system::UpdateScheme;
use bevy::prelude::*;
use directories::ProjectDirs;
use orbitsim_macros::ConfigDefaults;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefix of environment variables read by [`SimulationConfig::load_layered`]
pub const ENV_PREFIX: &str = "ORBITSIM";

/// Errors raised while loading or resolving a configuration
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or written
    Io(std::io::Error),
    /// The configuration could not be parsed or serialized
    Parse(String),
    /// The configuration parsed but describes something that cannot be run
    Invalid(String),
}

impl ConfigError {
    /// Prefixes an `Invalid` message with where it came from
    pub fn in_context(self, context: &str) -> Self {
        match self {
            ConfigError::Invalid(message) => ConfigError::Invalid(format!("{context}: {message}")),
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {err}"),
            ConfigError::Parse(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[derive(ConfigDefaults, Resource, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    #[default(TimeConfig::default())]
    pub time: TimeConfig,

    #[default(OutputConfig::default())]
    pub output: OutputConfig,

    #[default(IntegrationConfig::default())]
    pub integration: IntegrationConfig,

    #[default(vec![ClusterConfig::default()])]
    pub clusters: Vec<ClusterConfig>,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TimeConfig {
    #[default(0.0)]
    pub start: Scalar,

    #[default(2.0 * PI)]
    pub end: Scalar,

    /// Fixed step size
    #[default(1e-3)]
    pub delta: Scalar,

    /// Simulation time between emitted records; every step when absent
    #[default(None)]
    pub output_interval: Option<Scalar>,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    #[default("output")]
    pub directory: String,

    #[default(true)]
    pub enabled: bool,

    /// Skip the run when the stored signature matches
    #[default(true)]
    pub use_cache: bool,

    /// Percentage between progress log lines
    #[default(10.0)]
    pub progress_interval: Scalar,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct IntegrationConfig {
    #[default(UpdateScheme::default())]
    pub scheme: UpdateScheme,
}

#[derive(ConfigDefaults, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ClusterConfig {
    #[default("cluster")]
    pub name: String,

    /// Body count; presets that dictate their own count may leave it unset
    #[default(None)]
    pub bodies: Option<usize>,

    /// Per-body masses, padded with the first entry
    #[default(Vec::new())]
    pub masses: Vec<Scalar>,

    /// Whether bodies feel the cluster model as a background field.
    /// Defaults to on for single-body clusters and off otherwise
    #[default(None)]
    pub use_background: Option<bool>,

    #[default(1.0)]
    pub radius: Scalar,

    #[default(Vector::Y)]
    pub velocity_direction: Vector,

    #[default(InitialConditions::default())]
    pub initial_conditions: InitialConditions,

    #[default(Potential::default())]
    pub model: Potential,
}

impl ClusterConfig {
    /// Number of bodies the cluster will hold
    pub fn body_count(&self) -> Result<usize, ConfigError> {
        let count = match (self.initial_conditions.required_bodies(), self.bodies) {
            (Some(required), Some(requested)) if required != requested => {
                return Err(ConfigError::Invalid(format!(
                    "'{}' initial conditions place {required} bodies, but {requested} were requested",
                    self.initial_conditions.name()
                )));
            }
            (Some(required), _) => required,
            (None, Some(requested)) => requested,
            (None, None) => 1,
        };

        if count == 0 {
            return Err(ConfigError::Invalid(
                "a cluster needs at least one body".to_string(),
            ));
        }
        Ok(count)
    }

    /// One mass per body
    ///
    /// A ring galaxy puts its whole mass (the first configured mass, or 1.0)
    /// on the centre. Otherwise the configured list is padded with its first
    /// entry, or with 1.0 when empty.
    pub fn resolved_masses(&self) -> Result<Vec<Scalar>, ConfigError> {
        let first = self.masses.first().copied().unwrap_or(1.0);

        let masses = if let InitialConditions::RingGalaxy(galaxy) = &self.initial_conditions {
            if self.masses.len() > 1 {
                return Err(ConfigError::Invalid(format!(
                    "ring_galaxy takes a single galaxy mass, got {}",
                    self.masses.len()
                )));
            }
            galaxy.masses(first)
        } else {
            let count = self.body_count()?;
            if self.masses.len() > count {
                return Err(ConfigError::Invalid(format!(
                    "{} masses given for {count} bodies",
                    self.masses.len()
                )));
            }
            let mut masses = self.masses.clone();
            masses.resize(count, first);
            masses
        };

        if let Some(mass) = masses.iter().find(|mass| !(mass.is_finite() && **mass >= 0.0)) {
            return Err(ConfigError::Invalid(format!(
                "masses must be finite and non-negative, got {mass}"
            )));
        }
        Ok(masses)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate()?;
        self.initial_conditions.validate()?;
        self.body_count()?;
        self.resolved_masses()?;

        if !(self.radius.is_finite() && self.velocity_direction.is_finite()) {
            return Err(ConfigError::Invalid(
                "radius and velocity_direction must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// Checks every setting the run depends on, before anything is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        let time = &self.time;
        if !(time.delta.is_finite() && time.delta > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "time step must be positive, got {}",
                time.delta
            )));
        }
        if !(time.start.is_finite() && time.end.is_finite()) || time.end < time.start {
            return Err(ConfigError::Invalid(format!(
                "end time {} is before start time {}",
                time.end, time.start
            )));
        }
        if let Some(interval) = time.output_interval {
            if !(interval.is_finite() && interval > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "output interval must be positive, got {interval}"
                )));
            }
        }
        if !(self.output.progress_interval > 0.0 && self.output.progress_interval <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "progress interval must be within (0, 100], got {}",
                self.output.progress_interval
            )));
        }
        if self.clusters.is_empty() {
            return Err(ConfigError::Invalid(
                "the system needs at least one cluster".to_string(),
            ));
        }
        for cluster in &self.clusters {
            cluster
                .validate()
                .map_err(|e| e.in_context(&format!("cluster '{}'", cluster.name)))?;
        }
        Ok(())
    }

    /// Replaces every cluster's model with the named model at its default parameters
    pub fn with_model(mut self, name: &str) -> Result<Self, ConfigError> {
        let model = Potential::from_name(name)?;
        for cluster in &mut self.clusters {
            cluster.model = model.clone();
        }
        Ok(self)
    }

    /// Output directory as a path
    pub fn output_directory(&self) -> PathBuf {
        PathBuf::from(&self.output.directory)
    }

    /// Loads a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from a file, falling back to defaults if the file
    /// doesn't exist or cannot be parsed
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io(_)) => {
                info!("Config file {} not found. Using defaults.", path.display());
                Self::default()
            }
            Err(e) => {
                warn!(
                    "Failed to parse config file {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Loads `path` (when it exists) with `ORBITSIM__SECTION__KEY`
    /// environment variables layered on top
    pub fn load_layered(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Path of the per-user configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "orbitsim").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the per-user configuration, or defaults when there is none
    pub fn load_from_user_config() -> Self {
        match Self::user_config_path() {
            Some(path) => match Self::load_layered(&path) {
                Ok(config) => config,
                Err(e) => {
                    warn!(
                        "Failed to load user config {}: {}. Using defaults.",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            None => {
                debug!("No user config directory on this platform. Using defaults.");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::galaxy::RingGalaxy;
    use crate::physics::potentials::Kepler;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("orbitsim-config-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clusters.len(), 1);
        assert_eq!(config.time.delta, 1e-3);
        assert_eq!(config.integration.scheme, UpdateScheme::Sequential);
    }

    #[test]
    fn test_parse_full_config() {
        let config: SimulationConfig = toml::from_str(
            r#"
            [time]
            end = 10.0
            delta = 0.01
            output_interval = 0.5

            [output]
            directory = "runs/triple"
            use_cache = false

            [integration]
            scheme = "synchronous"

            [[clusters]]
            name = "triple"
            masses = [1.0, 2.0, 3.0]
            initial_conditions = { kind = "stable_triple" }
            model = { kind = "isochrone", b = 2.0 }
            "#,
        )
        .unwrap();

        assert_eq!(config.time.end, 10.0);
        assert_eq!(config.time.start, 0.0);
        assert_eq!(config.time.output_interval, Some(0.5));
        assert_eq!(config.output.directory, "runs/triple");
        assert!(!config.output.use_cache);
        assert_eq!(config.integration.scheme, UpdateScheme::Synchronous);
        assert_eq!(config.clusters[0].body_count().unwrap(), 3);
        assert_eq!(config.clusters[0].model.name(), "isochrone");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_time_settings() {
        let mut config = SimulationConfig::default();
        config.time.delta = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = SimulationConfig::default();
        config.time.end = -1.0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.time.output_interval = Some(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_system_is_rejected() {
        let config = SimulationConfig {
            clusters: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_cluster_names_the_cluster() {
        let mut config = SimulationConfig::default();
        config.clusters[0].name = "comet".to_string();
        config.clusters[0].model = Potential::Kepler(Kepler::new(1.0, 1.5));

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("comet"));
        assert!(message.contains("eccentricity"));
    }

    #[test]
    fn test_body_count_resolution() {
        let preset = ClusterConfig {
            initial_conditions: InitialConditions::FigureEight,
            ..Default::default()
        };
        assert_eq!(preset.body_count().unwrap(), 3);

        let mismatched = ClusterConfig {
            bodies: Some(2),
            ..preset.clone()
        };
        assert!(mismatched.body_count().is_err());

        let empty = ClusterConfig {
            bodies: Some(0),
            ..Default::default()
        };
        assert!(empty.body_count().is_err());

        assert_eq!(ClusterConfig::default().body_count().unwrap(), 1);
    }

    #[test]
    fn test_mass_resolution() {
        let padded = ClusterConfig {
            bodies: Some(4),
            masses: vec![3.0, 1.0],
            ..Default::default()
        };
        assert_eq!(padded.resolved_masses().unwrap(), vec![3.0, 1.0, 3.0, 3.0]);

        let negative = ClusterConfig {
            masses: vec![-1.0],
            ..Default::default()
        };
        assert!(negative.resolved_masses().is_err());

        let galaxy = ClusterConfig {
            masses: vec![2.0],
            initial_conditions: InitialConditions::RingGalaxy(RingGalaxy {
                rings: 1,
                first_ring: 5,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            galaxy.resolved_masses().unwrap(),
            vec![2.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_with_model() {
        let config = SimulationConfig::default().with_model("logarithmic").unwrap();
        assert_eq!(config.clusters[0].model.name(), "logarithmic");

        let error = SimulationConfig::default().with_model("plummer").unwrap_err();
        assert!(error.to_string().contains("plummer"));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("save.toml");
        let mut config = SimulationConfig::default();
        config.time.end = 3.5;
        config.clusters[0].masses = vec![0.5];

        config.save(&path).unwrap();
        let loaded = SimulationConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let missing = SimulationConfig::load_or_default(temp_path("missing.toml"));
        assert_eq!(missing, SimulationConfig::default());

        let path = temp_path("broken.toml");
        std::fs::write(&path, "time = [").unwrap();
        let broken = SimulationConfig::load_or_default(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(broken, SimulationConfig::default());
    }

    #[test]
    fn test_load_is_strict() {
        let path = temp_path("strict.toml");
        std::fs::write(&path, "[time]\ndelta = \"fast\"\n").unwrap();
        let result = SimulationConfig::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(ConfigError::Parse(_))));

        assert!(matches!(
            SimulationConfig::load(temp_path("absent.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_load_layered_reads_file() {
        let path = temp_path("layered.toml");
        std::fs::write(&path, "[time]\nend = 4.0\ndelta = 0.5\n").unwrap();
        let config = SimulationConfig::load_layered(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.time.end, 4.0);
        assert_eq!(config.time.delta, 0.5);
        assert_eq!(config.output, OutputConfig::default());
    }
}
