//! Memoria Simulator
//!
//! Command-line driver for the Memoria layer browsing engine.

use clap::Parser;
use env_logger::Env;
use log::info;

use memoria::cli::{commands, Cli, Commands};
use memoria::Result;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Memoria Simulator v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.config.as_deref();
    match cli.command {
        Some(Commands::Layout { count }) => commands::layout(count, config),
        Some(Commands::Simulate {
            count,
            script,
            dt,
            events,
        }) => commands::simulate(count, &script, dt, events.as_deref(), config),
        Some(Commands::CheckConfig) => commands::check_config(config),
        None => {
            println!("Memoria Simulator v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}
