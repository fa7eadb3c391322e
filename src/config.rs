//! Settings, read from a TOML file.
//!
//! The file lives in the per-user config directory:
//! - Windows: %APPDATA%\podcover\config.toml
//! - macOS: ~/Library/Application Support/podcover/config.toml
//! - Linux: ~/.config/podcover/config.toml
//!
//! Every field has a default, so a partial (or missing) file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cover::ScaleMode;

/// All settings, one table per concern
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cover caching
    pub cache: CacheConfig,

    /// HTTP settings for cover and page fetches
    pub network: NetworkConfig,

    /// How covers are fitted to the requested size
    pub scaling: ScalingConfig,
}

/// Cover caching settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Where new cover files go (None = user cache directory)
    pub directory: Option<PathBuf>,

    /// Maximum number of scaled covers kept in memory
    pub max_entries: usize,

    /// Maximum pixel bytes kept in memory (0 = unlimited)
    pub max_bytes: usize,

    /// Seconds to wait before retrying a cover that failed to download (0 = always retry)
    pub failure_cooldown_secs: u64,

    /// Write an empty cache file when a download fails
    pub persist_failures: bool,
}

impl CacheConfig {
    pub fn failure_cooldown(&self) -> Duration {
        Duration::from_secs(self.failure_cooldown_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            max_entries: 256,
            max_bytes: 64 * 1024 * 1024,
            failure_cooldown_secs: 300,
            persist_failures: true,
        }
    }
}

/// HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: concat!("podcover/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Scaling settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// "expand" (keep aspect, overflow one side) or "fill" (crop to exact size)
    pub mode: ScaleMode,
}

/// Directory holding podcover's config file
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("podcover"))
}

/// Default config file location
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load the config file from its default location.
///
/// Never fails: a missing, unreadable or malformed file yields the defaults,
/// with a log line saying why.
pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::warn!("No config directory on this system, using default settings");
            Config::default()
        }
    }
}

/// Load a config file, falling back to defaults like [`load`].
pub fn load_from(path: &Path) -> Config {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist, using default settings", path.display());
            return Config::default();
        }
        Err(e) => {
            tracing::error!("Cannot read {}: {}", path.display(), e);
            return Config::default();
        }
    };

    toml::from_str(&contents).unwrap_or_else(|e| {
        tracing::error!("Ignoring malformed config {}: {}", path.display(), e);
        Config::default()
    })
}

/// Save to the default location, returning the path written.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &path)?;
    Ok(path)
}

/// Save to `path`, creating its directory first.
///
/// The file is replaced in one step so readers never see half a config.
pub fn save_to(config: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    let text = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    let staging = path.with_extension("toml.part");
    std::fs::write(&staging, text).map_err(|e| ConfigError::Write(staging.clone(), e))?;
    std::fs::rename(&staging, path)
        .map_err(|e| ConfigError::Rename(staging, path.to_path_buf(), e))?;

    tracing::debug!("Wrote config to {}", path.display());
    Ok(())
}

/// Errors writing the config file. Reading never errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no config directory on this system")]
    NoConfigDir,

    #[error("cannot create {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("cannot encode config: {0}")]
    Serialize(toml::ser::Error),

    #[error("cannot write {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("cannot move {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}
