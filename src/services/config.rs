use crate::models::config::AppConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "aqi-monitor";
const CONFIG_FILE: &str = "config.json";

/// Loads and saves `AppConfig` as pretty JSON
pub struct ConfigManager {
    config_dir: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the platform config directory (`<config_dir>/aqi-monitor/config.json`).
    ///
    /// The directory is created on first `save`, not here.
    pub fn new() -> Result<Self, String> {
        let config_dir = dirs::config_dir()
            .ok_or("Failed to determine config directory")?
            .join(APP_DIR);

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
            config_dir,
        })
    }

    /// Manager for an explicit file, e.g. from `--config`
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let config_path = path.into();
        let config_dir = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            config_dir,
            config_path,
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), String> {
        if !self.config_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.config_dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let json = serde_json::to_string_pretty(config)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(&self.config_path, json)
            .map_err(|e| format!("Failed to write config file: {}", e))?;

        debug!(path = %self.config_path.display(), "config saved");
        Ok(())
    }

    /// Load and validate the configuration.
    ///
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<AppConfig, String> {
        if !self.config_exists() {
            debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        config
            .validate()
            .map_err(|e| format!("Invalid config {}: {}", self.config_path.display(), e))?;

        Ok(config)
    }

    pub fn config_file_path(&self) -> &PathBuf {
        &self.config_path
    }

    pub fn config_exists(&self) -> bool {
        self.config_path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FrameSourceConfig;
    use crate::models::roi::RoiDefinition;

    fn temp_manager() -> (tempfile::TempDir, ConfigManager) {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join(CONFIG_FILE));
        (dir, manager)
    }

    #[test]
    fn test_default_location() {
        let manager = ConfigManager::new().unwrap();
        let path = manager.config_file_path();
        assert!(path.ends_with(Path::new(APP_DIR).join(CONFIG_FILE)));
    }

    #[test]
    fn test_load_default_when_missing() {
        let (_dir, manager) = temp_manager();
        assert!(!manager.config_exists());

        let config = manager.load().unwrap();
        assert_eq!(config.rois.len(), 6);
        assert_eq!(config.capture.interval_secs, 300);
    }

    #[test]
    fn test_save_then_load() {
        let (_dir, manager) = temp_manager();

        let mut config = AppConfig::default();
        config.capture.interval_secs = 60;
        config.rois = vec![RoiDefinition::new("Water Level", 1, 2, 30, 40)];
        config.source = FrameSourceConfig::File {
            path: PathBuf::from("frame.png"),
        };
        manager.save(&config).unwrap();
        assert!(manager.config_exists());

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.capture.interval_secs, 60);
        assert_eq!(loaded.rois, config.rois);
        assert_eq!(loaded.source, config.source);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let (_dir, manager) = temp_manager();
        fs::create_dir_all(manager.config_file_path().parent().unwrap()).unwrap();
        fs::write(
            manager.config_file_path(),
            r#"{"capture": {"interval_secs": 10}}"#,
        )
        .unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.capture.interval_secs, 10);
        assert_eq!(loaded.capture.poll_interval_ms, 500);
        assert_eq!(loaded.ocr.page_seg_mode, 7);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let (_dir, manager) = temp_manager();
        let mut config = AppConfig::default();
        config.capture.interval_secs = 0;
        manager.save(&config).unwrap();

        let err = manager.load().unwrap_err();
        assert!(err.contains("Invalid config"), "{}", err);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let (_dir, manager) = temp_manager();
        fs::create_dir_all(manager.config_file_path().parent().unwrap()).unwrap();
        fs::write(manager.config_file_path(), "{ not json").unwrap();

        assert!(manager.load().unwrap_err().contains("Failed to parse"));
    }
}
