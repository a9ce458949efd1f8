//! Command line interface for orbitsim

use clap::{Parser, ValueEnum};
use std::fmt;

use crate::config::SimulationConfig;
use crate::physics::initial_conditions::InitialConditions;
use crate::physics::potentials::Potential;
use crate::scenarios::Scenario;

/// CLI-specific errors
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be loaded
    ConfigLoad(String),
    /// Invalid model name provided
    InvalidModel(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::ConfigLoad(msg) => write!(f, "Failed to load configuration: {msg}"),
            CliError::InvalidModel(msg) => write!(f, "Invalid model: {msg}"),
        }
    }
}

impl std::error::Error for CliError {}

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_DATE"), ")");

/// orbitsim - leapfrog N-body integrator
#[derive(Parser, Debug, Default)]
#[command(version = VERSION, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Start from a built-in scenario instead of a configuration file
    #[arg(short, long, value_name = "NAME", conflicts_with = "config")]
    pub scenario: Option<Scenario>,

    /// End time (overrides config file)
    #[arg(short, long, value_name = "TIME")]
    pub end: Option<f64>,

    /// Step size (overrides config file)
    #[arg(short, long, value_name = "DT")]
    pub delta: Option<f64>,

    /// Simulation time between records (overrides config file)
    #[arg(long, value_name = "TIME")]
    pub output_interval: Option<f64>,

    /// Directory for output files (overrides config file)
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<String>,

    /// Background model for every cluster, with default parameters
    /// (e.g., kepler, isochrone, oscillator, logarithmic)
    #[arg(short, long, value_name = "NAME")]
    pub model: Option<String>,

    /// Run even when the output is up to date
    #[arg(short, long)]
    pub force: bool,

    /// Integrate without writing any output
    #[arg(long)]
    pub no_output: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// List available models and exit
    #[arg(long)]
    pub list_models: bool,

    /// List built-in scenarios and exit
    #[arg(long)]
    pub list_scenarios: bool,
}

/// Handles the --list-models flag by printing available models and initial conditions
pub fn handle_list_models() {
    println!("Available models:");
    for name in Potential::NAMES {
        println!("  - {name}");
    }

    println!("\nAliases:");
    println!("  - harmonic -> oscillator");
    println!("  - log -> logarithmic");

    println!("\nInitial conditions:");
    for name in InitialConditions::NAMES {
        println!("  - {name}");
    }
}

/// Handles the --list-scenarios flag
pub fn handle_list_scenarios() {
    println!("Available scenarios:");
    for scenario in Scenario::value_variants() {
        println!("  - {:<16} {}", scenario.name(), scenario.description());
    }
}

/// Loads configuration from a scenario, a file or the user config, then
/// applies command-line overrides
pub fn load_and_apply_config(args: &Args) -> Result<SimulationConfig, CliError> {
    // Load configuration
    let mut config = if let Some(scenario) = args.scenario {
        println!("Using scenario: {}", scenario.name());
        scenario.config()
    } else if let Some(config_path) = &args.config {
        println!("Loading configuration from: {config_path}");
        if !std::path::Path::new(config_path).is_file() {
            return Err(CliError::ConfigLoad(format!("{config_path} does not exist")));
        }
        SimulationConfig::load_layered(config_path)
            .map_err(|err| CliError::ConfigLoad(err.to_string()))?
    } else {
        SimulationConfig::load_from_user_config()
    };

    // Apply command-line overrides
    if let Some(end) = args.end {
        println!("Overriding end time to: {end}");
        config.time.end = end;
    }

    if let Some(delta) = args.delta {
        println!("Overriding step size to: {delta}");
        config.time.delta = delta;
    }

    if let Some(interval) = args.output_interval {
        println!("Overriding output interval to: {interval}");
        config.time.output_interval = Some(interval);
    }

    if let Some(directory) = &args.output_dir {
        println!("Writing output to: {directory}");
        config.output.directory = directory.clone();
    }

    if let Some(model) = &args.model {
        config = config
            .with_model(model)
            .map_err(|err| CliError::InvalidModel(err.to_string()))?;
        println!("Using model: {model}");
    }

    if args.force {
        config.output.use_cache = false;
    }

    if args.no_output {
        config.output.enabled = false;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::system::UpdateScheme;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "orbitsim",
            "--scenario",
            "figure_eight",
            "--end",
            "1.5",
            "-d",
            "0.01",
            "--force",
            "--no-output",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.scenario, Some(Scenario::FigureEight));
        assert_eq!(args.end, Some(1.5));
        assert_eq!(args.delta, Some(0.01));
        assert!(args.force && args.no_output && args.verbose);
    }

    #[test]
    fn test_scenario_conflicts_with_config() {
        let result = Args::try_parse_from(["orbitsim", "-s", "kepler", "-c", "run.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply_to_scenario() {
        let args = Args {
            scenario: Some(Scenario::TwoBody),
            end: Some(1.0),
            output_interval: Some(0.5),
            output_dir: Some("elsewhere".to_string()),
            model: Some("isochrone".to_string()),
            force: true,
            no_output: true,
            ..Default::default()
        };
        let config = load_and_apply_config(&args).unwrap();

        assert_eq!(config.time.end, 1.0);
        assert_eq!(config.time.output_interval, Some(0.5));
        assert_eq!(config.output.directory, "elsewhere");
        assert_eq!(config.clusters[0].model.name(), "isochrone");
        assert!(!config.output.use_cache);
        assert!(!config.output.enabled);
        assert_eq!(config.integration.scheme, UpdateScheme::Synchronous);
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let args = Args {
            scenario: Some(Scenario::Kepler),
            model: Some("plummer".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            load_and_apply_config(&args),
            Err(CliError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args {
            config: Some("/nonexistent/orbitsim.toml".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            load_and_apply_config(&args),
            Err(CliError::ConfigLoad(_))
        ));
    }
}
