pub mod commands;
pub mod db;
pub mod models;
pub mod services;
pub mod utils;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::debug;
use commands::{Cli, Commands};

/// Parse the command line and dispatch
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    utils::logging::init(cli.log_json).map_err(|e| anyhow!(e))?;

    let manager = commands::config::init_config_manager(cli.config.as_deref())?;
    debug!(path = %manager.config_file_path().display(), "config location");

    if let Commands::Config { write_default } = cli.command {
        return commands::config::show_config(&manager, write_default);
    }

    let config = commands::config::load_config(&manager)?;
    match cli.command {
        Commands::Run => commands::capture::run(&config),
        Commands::Once => commands::capture::once(&config).map(|_| ()),
        Commands::Dashboard { bind } => commands::dashboard::serve(&config, bind),
        Commands::Migrate => commands::storage::migrate(&config.storage).map(|_| ()),
        Commands::Config { .. } => Ok(()),
    }
}
