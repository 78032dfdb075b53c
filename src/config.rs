use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::app::DEFAULT_ZOOM;
use crate::error::ConfigError;
use crate::geolocation::DEFAULT_LOOKUP_URL;
use crate::models::Coords;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_map_zoom")]
    pub map_zoom: u8,
    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,
    /// Skip the network lookup and start here.
    #[serde(default)]
    pub fixed_location: Option<Coords>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mapty")
}
fn default_map_zoom() -> u8 {
    DEFAULT_ZOOM
}
fn default_geolocation_url() -> String {
    DEFAULT_LOOKUP_URL.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_zoom: default_map_zoom(),
            geolocation_url: default_geolocation_url(),
            fixed_location: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn config_file() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mapty")
            .join("config.json")
    }

    /// Read the configuration file (defaults when it does not exist), then
    /// apply environment overrides.
    pub fn try_load() -> Result<Self, ConfigError> {
        let config = Self::from_file(&Self::config_file())?.unwrap_or_default();
        Ok(config.with_env_overrides(|key| env::var(key).ok()))
    }

    pub fn from_file(path: &std::path::Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(Self::from_json(&content)?))
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// `MAPTY_LAT` + `MAPTY_LNG` pin the start position, `MAPTY_DATA_DIR`
    /// moves the store.
    pub fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let lat = var("MAPTY_LAT").and_then(|v| v.trim().parse::<f64>().ok());
        let lng = var("MAPTY_LNG").and_then(|v| v.trim().parse::<f64>().ok());
        if let (Some(lat), Some(lng)) = (lat, lng) {
            self.fixed_location = Some(Coords::new(lat, lng));
        }
        if let Some(dir) = var("MAPTY_DATA_DIR").filter(|d| !d.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_json(r#"{"map_zoom": 15, "fixed_location": [15.0, -10.0]}"#).unwrap();
        assert_eq!(config.map_zoom, 15);
        assert_eq!(config.fixed_location, Some(Coords::new(15.0, -10.0)));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.geolocation_url, DEFAULT_LOOKUP_URL);
    }

    #[test]
    fn broken_file_is_an_error() {
        assert!(matches!(Config::from_json("zoom = 3"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_location_and_dir() {
        let config = Config::default().with_env_overrides(|key| match key {
            "MAPTY_LAT" => Some("45.8".into()),
            "MAPTY_LNG" => Some(" 15.97".into()),
            "MAPTY_DATA_DIR" => Some("/tmp/mapty-test".into()),
            _ => None,
        });
        assert_eq!(config.fixed_location, Some(Coords::new(45.8, 15.97)));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/mapty-test"));
    }

    #[test]
    fn half_a_location_is_ignored() {
        let config = Config::default().with_env_overrides(|key| (key == "MAPTY_LAT").then(|| "1.0".to_string()));
        assert_eq!(config.fixed_location, None);
    }

    #[test]
    fn missing_file_is_none() {
        let path = std::env::temp_dir().join("mapty_no_such_config.json");
        let _ = fs::remove_file(&path);
        assert!(Config::from_file(&path).unwrap().is_none());
    }
}
