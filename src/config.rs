use crate::geo::DEFAULT_MAX_DISTANCE_KM;
use crate::geocode::{GazetteerGeocoder, Place};
use crate::scoring::model::CRASH_HISTORY_MODEL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const DEFAULT_SERVER_PORT: u16 = 8080;
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppSection,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
    #[serde(default)]
    pub dataset: Option<DatasetSection>,
    #[serde(default)]
    pub scoring: Option<ScoringSection>,
    #[serde(default)]
    pub geocoder: Option<GeocoderSection>,
    #[serde(default)]
    pub server: Option<ServerSection>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetSection {
    /// Crash CSV file; an empty dataset is used when missing or unreadable
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScoringSection {
    /// "crash_history" (default) or "heuristic"
    pub model: Option<String>,
    /// Corridor half-width around the route in kilometers (default: 1.0)
    pub max_distance_km: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderSection {
    #[serde(default)]
    pub places: Vec<Place>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSection {
    /// Port to listen on (default: 8080)
    pub port: Option<u16>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_default() -> Result<Config, ConfigError> {
    load_from_path(DEFAULT_CONFIG_PATH)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(config)
}

impl Config {
    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .map(|s| s.level.as_str())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn dataset_path(&self) -> Option<&Path> {
        let path = self.dataset.as_ref()?.path.as_deref()?;
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    }

    /// Returns the scoring model name (default: crash_history)
    pub fn scoring_model(&self) -> &str {
        self.scoring
            .as_ref()
            .and_then(|s| s.model.as_deref())
            .unwrap_or(CRASH_HISTORY_MODEL)
    }

    /// Returns the route corridor width in kilometers (default: 1.0)
    pub fn max_distance_km(&self) -> f64 {
        self.scoring
            .as_ref()
            .and_then(|s| s.max_distance_km)
            .unwrap_or(DEFAULT_MAX_DISTANCE_KM)
    }

    /// Gazetteer built from `[[geocoder.places]]`, or the built-in San Jose
    /// table when none are configured.
    pub fn geocoder(&self) -> GazetteerGeocoder {
        match &self.geocoder {
            Some(section) if !section.places.is_empty() => {
                GazetteerGeocoder::from_places(&section.places)
            }
            _ => GazetteerGeocoder::san_jose_default(),
        }
    }

    /// Returns the server port (default: 8080)
    pub fn server_port(&self) -> u16 {
        self.server
            .as_ref()
            .and_then(|s| s.port)
            .unwrap_or(DEFAULT_SERVER_PORT)
    }
}
