//! Application configuration management.
//!
//! Configuration is stored at `~/.config/multiverso/config.json` and may be
//! overridden per run by environment variables (`MULTIVERSO_API_URL`,
//! `MULTIVERSO_DATA_DIR`, `MULTIVERSO_OFFLINE`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::DEFAULT_BASE_URL;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "multiverso";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_API_URL: &str = "MULTIVERSO_API_URL";
const ENV_DATA_DIR: &str = "MULTIVERSO_DATA_DIR";
const ENV_OFFLINE: &str = "MULTIVERSO_OFFLINE";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Skip the connectivity probe and start from the cache.
    #[serde(default)]
    pub start_offline: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        debug!(?config, "Config loaded");
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Apply overrides from `lookup` (the process environment in production).
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = lookup(ENV_OFFLINE) {
            self.start_offline =
                matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Directory holding favorites, theme and the character cache
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn overridden(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).cloned());
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url(), DEFAULT_BASE_URL);
        assert!(!config.start_offline);
    }

    #[test]
    fn test_env_overrides() {
        let config = overridden(&[
            (ENV_API_URL, "http://localhost:8080/api"),
            (ENV_DATA_DIR, "/tmp/multiverso"),
            (ENV_OFFLINE, "true"),
        ]);
        assert_eq!(config.api_base_url(), "http://localhost:8080/api");
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/multiverso"));
        assert!(config.start_offline);
    }

    #[test]
    fn test_blank_overrides_ignored() {
        let config = overridden(&[(ENV_API_URL, "  "), (ENV_OFFLINE, "no")]);
        assert_eq!(config.api_base_url(), DEFAULT_BASE_URL);
        assert!(!config.start_offline);
    }

    #[test]
    fn test_partial_file_parses() {
        let config: Config = serde_json::from_str(r#"{"start_offline": true}"#).unwrap();
        assert!(config.start_offline);
        assert!(config.api_base_url.is_none());
    }
}
