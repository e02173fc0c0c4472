/*
 * Manages the switcher's user settings: the log level and whether logs are
 * also written to a file. Settings are persisted as JSON in the per-user
 * configuration directory. A missing or empty settings file yields defaults.
 *
 * It uses a trait-based approach (`ConfigManagerOperations`) to allow for
 * different storage backends or mock implementations for testing. The
 * concrete implementation (`CoreConfigManager`) resolves its directory through
 * `path_utils` unless one is supplied explicitly.
 */
use crate::core::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::PathBuf;

const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitcherSettings {
    pub log_level: String,
    pub log_to_file: bool,
}

impl Default for SwitcherSettings {
    fn default() -> Self {
        SwitcherSettings {
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serde(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {e}"),
            ConfigError::Serde(e) => write!(f, "Configuration file format error: {e}"),
            ConfigError::NoConfigDirectory => {
                write!(f, "Could not determine the configuration directory")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub trait ConfigManagerOperations: Send + Sync {
    /*
     * Reads `settings.json` from the application's local config directory.
     *
     * Args:
     *   app_name: Application name used to locate the config directory.
     *
     * Returns:
     *   The stored settings, or the defaults when the file is missing or
     *   empty. `ConfigError` on I/O or JSON failures.
     */
    fn load_settings(&self, app_name: &str) -> Result<SwitcherSettings>;
    /// Writes `settings` as pretty JSON, creating the config directory if needed.
    fn save_settings(&self, app_name: &str, settings: &SwitcherSettings) -> Result<()>;
}

pub struct CoreConfigManager {
    config_dir_override: Option<PathBuf>,
}

impl CoreConfigManager {
    pub fn new() -> Self {
        CoreConfigManager {
            config_dir_override: None,
        }
    }

    /// Stores settings in `config_dir` instead of the per-user directory.
    pub fn with_config_dir(config_dir: PathBuf) -> Self {
        CoreConfigManager {
            config_dir_override: Some(config_dir),
        }
    }

    fn settings_file(&self, app_name: &str) -> Result<PathBuf> {
        let dir = match &self.config_dir_override {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                dir.clone()
            }
            None => path_utils::get_base_app_config_local_dir(app_name)
                .ok_or(ConfigError::NoConfigDirectory)?,
        };
        Ok(dir.join(SETTINGS_FILENAME))
    }
}

impl Default for CoreConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManagerOperations for CoreConfigManager {
    fn load_settings(&self, app_name: &str) -> Result<SwitcherSettings> {
        log::trace!("CoreConfigManager: Loading settings for app '{app_name}'");
        let file_path = self.settings_file(app_name)?;

        if !file_path.exists() {
            log::debug!("CoreConfigManager: Settings file {file_path:?} does not exist, using defaults.");
            return Ok(SwitcherSettings::default());
        }

        let contents = fs::read_to_string(&file_path)?;
        if contents.trim().is_empty() {
            log::debug!("CoreConfigManager: Settings file {file_path:?} is empty, using defaults.");
            return Ok(SwitcherSettings::default());
        }

        let settings: SwitcherSettings = serde_json::from_str(&contents)?;
        log::debug!("CoreConfigManager: Loaded settings {settings:?} from {file_path:?}.");
        Ok(settings)
    }

    fn save_settings(&self, app_name: &str, settings: &SwitcherSettings) -> Result<()> {
        log::trace!("CoreConfigManager: Saving settings {settings:?} for app '{app_name}'");
        let file_path = self.settings_file(app_name)?;

        let file = File::create(&file_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, settings)?;
        log::debug!("CoreConfigManager: Saved settings to {file_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const APP_NAME_FOR_TESTS: &str = "ReferenceSwitcherTests";

    #[test]
    fn test_core_config_manager_save_and_load_in_user_dir() {
        // Arrange
        let unique_app_name = format!("TestApp_RefSwitcher_Config_{}", rand::random::<u64>());
        let manager = CoreConfigManager::new();
        let settings = SwitcherSettings {
            log_level: "debug".to_string(),
            log_to_file: false,
        };

        // Act
        manager
            .save_settings(&unique_app_name, &settings)
            .expect("Saving settings should succeed.");
        let loaded = manager
            .load_settings(&unique_app_name)
            .expect("Loading settings should succeed.");

        // Assert
        assert_eq!(loaded, settings);

        // Cleanup
        if let Some(config_dir) = path_utils::get_base_app_config_local_dir(&unique_app_name) {
            if let Err(e) = fs::remove_dir_all(&config_dir) {
                eprintln!("Test cleanup failed for {config_dir:?}: {e}");
            }
        }
    }

    #[test]
    fn test_load_settings_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path().to_path_buf());

        let loaded = manager.load_settings(APP_NAME_FOR_TESTS).unwrap();
        assert_eq!(loaded, SwitcherSettings::default());
    }

    #[test]
    fn test_load_settings_defaults_when_empty() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join(SETTINGS_FILENAME)).unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path().to_path_buf());

        let loaded = manager.load_settings(APP_NAME_FOR_TESTS).unwrap();
        assert_eq!(loaded, SwitcherSettings::default());
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(SETTINGS_FILENAME),
            r#"{ "log_level": "trace" }"#,
        )
        .unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path().to_path_buf());

        let loaded = manager.load_settings(APP_NAME_FOR_TESTS).unwrap();
        assert_eq!(loaded.log_level, "trace");
        assert!(loaded.log_to_file);
    }

    #[test]
    fn test_corrupt_settings_report_format_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILENAME), "{ not json").unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path().to_path_buf());

        assert!(matches!(
            manager.load_settings(APP_NAME_FOR_TESTS),
            Err(ConfigError::Serde(_))
        ));
    }

    #[test]
    fn test_save_settings_overwrites() {
        let dir = tempdir().unwrap();
        let manager = CoreConfigManager::with_config_dir(dir.path().to_path_buf());
        let first = SwitcherSettings {
            log_level: "warn".to_string(),
            log_to_file: true,
        };
        let second = SwitcherSettings {
            log_level: "error".to_string(),
            log_to_file: false,
        };

        manager.save_settings(APP_NAME_FOR_TESTS, &first).unwrap();
        assert_eq!(manager.load_settings(APP_NAME_FOR_TESTS).unwrap(), first);

        manager.save_settings(APP_NAME_FOR_TESTS, &second).unwrap();
        assert_eq!(manager.load_settings(APP_NAME_FOR_TESTS).unwrap(), second);
    }
}
