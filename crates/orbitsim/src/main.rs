use bevy::app::ScheduleRunnerPlugin;
use bevy::log::{DEFAULT_FILTER, Level, LogPlugin};
use bevy::prelude::*;
use clap::Parser;
use orbitsim::SimulationPlugin;
use orbitsim::cli::{Args, handle_list_models, handle_list_scenarios, load_and_apply_config};

fn main() -> AppExit {
    let args = Args::parse();

    if args.list_models {
        handle_list_models();
        return AppExit::Success;
    }

    if args.list_scenarios {
        handle_list_scenarios();
        return AppExit::Success;
    }

    let config = match load_and_apply_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return AppExit::error();
        }
    };

    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_once()),
        LogPlugin {
            level,
            filter: DEFAULT_FILTER.to_string(),
            ..default()
        },
        SimulationPlugin::with_config(config),
    ));

    app.run()
}
