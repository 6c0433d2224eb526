use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;
use crate::models::config::AppConfig;
use crate::services::config::ConfigManager;

/// Manager for `--config` if given, else the platform location
pub fn init_config_manager(path: Option<&Path>) -> Result<ConfigManager> {
    match path {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new().map_err(|e| anyhow!(e)),
    }
}

pub fn load_config(manager: &ConfigManager) -> Result<AppConfig> {
    manager.load().map_err(|e| anyhow!(e))
}

/// Print the effective configuration, optionally seeding the file with defaults
pub fn show_config(manager: &ConfigManager, write_default: bool) -> Result<()> {
    let path = manager.config_file_path();

    if write_default {
        if manager.config_exists() {
            info!(path = %path.display(), "config file already exists, leaving it untouched");
        } else {
            manager.save(&AppConfig::default()).map_err(|e| anyhow!(e))?;
            info!(path = %path.display(), "wrote default config");
        }
    }

    let config = load_config(manager)?;
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
