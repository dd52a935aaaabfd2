use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::HikariError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub network: NetworkConfig,
    pub stream: StreamConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessdata: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub quality: u32,
    pub fnval: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub header_thumbnail_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: bool,
}

impl AppConfig {
    /// Load config: user file if it exists, built-in defaults otherwise.
    pub fn load() -> Result<Self, HikariError> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, falling back to defaults when it is missing.
    pub fn load_from(path: &std::path::Path) -> Result<Self, HikariError> {
        if path.exists() {
            let user_str =
                std::fs::read_to_string(path).map_err(|e| HikariError::Config(e.to_string()))?;
            toml::from_str(&user_str).map_err(|e| HikariError::Config(e.to_string()))
        } else {
            toml::from_str(DEFAULT_CONFIG).map_err(|e| HikariError::Config(e.to_string()))
        }
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), HikariError> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HikariError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Directory holding cached covers, avatars and their index.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache.cache_dir.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.cache_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("cache"))
        })
    }

    /// Directory for rolling log files.
    pub fn log_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "hikari")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = AppConfig::default();
        assert_eq!(config.general.language, "zh-CN");
        assert_eq!(config.stream.quality, 127);
        assert_eq!(config.stream.fnval, 4048);
        assert_eq!(config.cache.header_thumbnail_size, 48);
        assert!(config.network.sessdata.is_none());
        assert!(!config.logging.file);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = AppConfig::default();
        config.network.sessdata = Some("abc%2C123".into());
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.network.sessdata.as_deref(), Some("abc%2C123"));
        assert_eq!(deserialized.network.timeout_secs, config.network.timeout_secs);
    }

    #[test]
    fn test_load_from_missing_path_uses_defaults() {
        let config = AppConfig::load_from(std::path::Path::new("/nonexistent/hikari.toml")).unwrap();
        assert_eq!(config.logging.level, "hikari=info");
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = AppConfig::default();
        config.cache.cache_dir = Some(PathBuf::from("/tmp/hikari-cache"));
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/hikari-cache"));
    }
}
