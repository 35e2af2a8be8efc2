//! Dashboard configuration stored as TOML under the application root.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::app_dirs;

/// Default filename used to store the dashboard configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5 * 60;

/// Errors that can occur while loading or saving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to resolve the application directory.
    #[error("App dir error: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    /// Failed to read the configuration file.
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write the configuration file.
    #[error("Failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML.
    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The configured service base URL is not a valid URL.
    #[error("Invalid service base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
}

/// Settings for the dashboard client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the HR service.
    pub base_url: String,
    /// Seconds between scheduled background refreshes.
    pub refresh_interval_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
        }
    }
}

impl DashboardConfig {
    /// Scheduled refresh period.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Validate the configured base URL, returning it with any trailing
    /// slash removed so endpoint paths can be appended uniformly.
    pub fn validated_base_url(&self) -> Result<String, ConfigError> {
        let parsed = Url::parse(&self.base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })?;
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from disk, returning defaults if missing.
pub fn load_or_default() -> Result<DashboardConfig, ConfigError> {
    let path = config_path()?;
    load_from_path(&path)
}

/// Load configuration from a specific path, returning defaults if missing.
pub fn load_from_path(path: &Path) -> Result<DashboardConfig, ConfigError> {
    if !path.exists() {
        return Ok(DashboardConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist configuration to disk, overwriting any previous contents.
pub fn save(config: &DashboardConfig) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_to_path(config, &path)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &DashboardConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = toml::to_string_pretty(config)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
