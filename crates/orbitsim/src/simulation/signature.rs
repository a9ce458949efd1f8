//! Rerun detection
//!
//! A run is identified by a hash of everything that determines its
//! trajectories. When the stored hash matches and the previous output is
//! still on disk, the run can be skipped.

use crate::config::{ClusterConfig, ConfigError, IntegrationConfig, SimulationConfig, TimeConfig};
use crate::physics::system::System;
use crate::simulation::output::{OutputError, SYSTEM_FILE_NAME};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};

pub const SIGNATURE_FILE_NAME: &str = ".signature";

/// Settings that change the trajectories; output location and caching do not
#[derive(Serialize)]
struct SignedSettings<'a> {
    time: &'a TimeConfig,
    integration: &'a IntegrationConfig,
    clusters: &'a [ClusterConfig],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunSignature(u64);

impl RunSignature {
    /// Hashes the clock and model settings together with the resolved
    /// initial state of every body
    pub fn compute(config: &SimulationConfig, system: &System) -> Result<Self, ConfigError> {
        let settings = toml::to_string(&SignedSettings {
            time: &config.time,
            integration: &config.integration,
            clusters: &config.clusters,
        })?;

        let mut hasher = DefaultHasher::new();
        settings.hash(&mut hasher);
        for body in system.bodies() {
            let state = &body.state;
            for component in [state.position, state.velocity]
                .iter()
                .flat_map(|vector| vector.to_array())
                .chain([body.mass])
            {
                component.to_bits().hash(&mut hasher);
            }
        }
        Ok(Self(hasher.finish()))
    }

    pub fn parse(text: &str) -> Option<Self> {
        u64::from_str_radix(text.trim(), 16).ok().map(Self)
    }
}

impl fmt::Display for RunSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Signature file stored beside the output of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCache {
    directory: PathBuf,
}

impl SignatureCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(SIGNATURE_FILE_NAME)
    }

    /// The stored signature; unreadable or malformed files count as absent
    pub fn load(&self) -> Option<RunSignature> {
        fs::read_to_string(self.path())
            .ok()
            .and_then(|text| RunSignature::parse(&text))
    }

    /// Whether `signature` matches the stored one and that run's output exists
    pub fn is_current(&self, signature: RunSignature) -> bool {
        self.load() == Some(signature) && self.output_exists()
    }

    fn output_exists(&self) -> bool {
        Path::new(&self.directory).join(SYSTEM_FILE_NAME).is_file()
    }

    pub fn store(&self, signature: RunSignature) -> Result<(), OutputError> {
        let path = self.path();
        fs::create_dir_all(&self.directory)
            .and_then(|()| fs::write(&path, format!("{signature}\n")))
            .map_err(|source| OutputError::Io { path, source })
    }

    /// Removes the stored signature; a missing file is not an error
    pub fn invalidate(&self) -> Result<(), OutputError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Err(error) if error.kind() != io::ErrorKind::NotFound => {
                Err(OutputError::Io { path, source: error })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("orbitsim-signature-{}-{name}", std::process::id()))
    }

    fn signature(config: &SimulationConfig) -> RunSignature {
        let system = System::from_config(&config.clusters).unwrap();
        RunSignature::compute(config, &system).unwrap()
    }

    #[test]
    fn test_signature_is_stable() {
        let config = SimulationConfig::default();
        assert_eq!(signature(&config), signature(&config));
    }

    #[test]
    fn test_signature_tracks_trajectory_settings() {
        let base = SimulationConfig::default();

        let mut longer = base.clone();
        longer.time.end *= 2.0;
        assert_ne!(signature(&base), signature(&longer));

        let mut heavier = base.clone();
        heavier.clusters[0].masses = vec![2.0];
        assert_ne!(signature(&base), signature(&heavier));

        let mut elsewhere = base.clone();
        elsewhere.output.directory = "somewhere/else".to_string();
        elsewhere.output.progress_interval = 25.0;
        assert_eq!(signature(&base), signature(&elsewhere));
    }

    #[test]
    fn test_display_and_parse() {
        let signature = RunSignature(0xdead_beef);
        assert_eq!(signature.to_string(), "00000000deadbeef");
        assert_eq!(RunSignature::parse("00000000deadbeef\n"), Some(signature));
        assert_eq!(RunSignature::parse("not hex"), None);
    }

    #[test]
    fn test_cache_requires_matching_signature_and_output() {
        let directory = temp_dir("cache");
        let _ = fs::remove_dir_all(&directory);
        let cache = SignatureCache::new(&directory);
        let signature = RunSignature(42);

        assert_eq!(cache.load(), None);
        assert!(!cache.is_current(signature));

        cache.store(signature).unwrap();
        assert_eq!(cache.load(), Some(signature));
        // Signature alone is not enough without the system output
        assert!(!cache.is_current(signature));

        fs::write(directory.join(SYSTEM_FILE_NAME), "time\n").unwrap();
        assert!(cache.is_current(signature));
        assert!(!cache.is_current(RunSignature(43)));

        fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn test_invalidate_forgets_signature() {
        let directory = temp_dir("invalidate");
        let _ = fs::remove_dir_all(&directory);
        let cache = SignatureCache::new(&directory);

        // Nothing stored yet
        cache.invalidate().unwrap();

        cache.store(RunSignature(7)).unwrap();
        fs::write(directory.join(SYSTEM_FILE_NAME), "time\n").unwrap();
        assert!(cache.is_current(RunSignature(7)));

        cache.invalidate().unwrap();
        assert_eq!(cache.load(), None);
        assert!(!cache.is_current(RunSignature(7)));
        assert!(directory.join(SYSTEM_FILE_NAME).is_file());

        fs::remove_dir_all(&directory).unwrap();
    }
}
