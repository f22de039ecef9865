use std::{
    collections::BTreeSet,
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{Datelike, Local};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{
    RaceEngineerError,
    api::{OPENF1_BASE_URL, SessionKey},
    race::{Aggregation, DataWindow, DriverNumber},
};

const CONFIG_DIR_NAME: &str = "race-engineer";
const CONFIG_FILE_NAME: &str = "config.json";

pub const REFRESH_RATE_S: u64 = 30;
pub const REQUEST_TIMEOUT_S: u64 = 10;

/// Dashboard settings kept between runs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionKey,
    /// Season used to list races
    pub year: i32,
    pub refresh_rate_s: u64,
    pub data_window: DataWindow,
    pub aggregation: Aggregation,
    /// Drivers shown in the leaderboard; empty shows everyone
    pub selected_drivers: BTreeSet<DriverNumber>,
    pub api_base_url: String,
    pub request_timeout_s: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionKey::Latest,
            year: Local::now().year(),
            refresh_rate_s: REFRESH_RATE_S,
            data_window: DataWindow::Off,
            aggregation: Aggregation::Median,
            selected_drivers: BTreeSet::new(),
            api_base_url: OPENF1_BASE_URL.to_string(),
            request_timeout_s: REQUEST_TIMEOUT_S,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Settings saved in the user config directory, if any could be read.
    pub fn from_local_file() -> Option<Self> {
        let config_path = Self::default_path()?;
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file {:?}: {}", config_path, e);
                None
            }
        }
    }

    pub fn load(config_path: &Path) -> Result<Option<Self>, RaceEngineerError> {
        if !config_path.exists() {
            return Ok(None);
        }
        let file =
            File::open(config_path).map_err(|e| RaceEngineerError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(Some)
            .map_err(|e| RaceEngineerError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<(), RaceEngineerError> {
        let config_path = Self::default_path().ok_or(RaceEngineerError::NoConfigDir)?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), RaceEngineerError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| RaceEngineerError::ConfigIOError { source: e })?;
        }

        let file = File::create(config_path)
            .map_err(|e| RaceEngineerError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RaceEngineerError::ConfigSerializeError { source: e })
    }

    pub fn refresh_rate(&self) -> Duration {
        Duration::from_secs(self.refresh_rate_s.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = AppConfig {
            session: SessionKey::Key(9158),
            data_window: DataWindow::Minutes(10),
            aggregation: Aggregation::Fixed(95.),
            selected_drivers: BTreeSet::from([1, 44]),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), Some(config));
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        assert_eq!(AppConfig::load(&path).unwrap(), None);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"session": "latest", "refresh_rate_s": 5}"#).unwrap();

        let config = AppConfig::load(&path).unwrap().unwrap();
        assert_eq!(config.refresh_rate_s, 5);
        assert_eq!(config.session, SessionKey::Latest);
        assert_eq!(config.aggregation, Aggregation::Median);
        assert!(config.selected_drivers.is_empty());
    }

    #[test]
    fn test_invalid_session_key_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"session": "monza"}"#).unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(RaceEngineerError::ConfigSerializeError { .. })
        ));
    }
}
