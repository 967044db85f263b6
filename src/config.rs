use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Synchronization constants
// =============================================================================

/// Maximum number of registry fetches in flight at once
pub const DEFAULT_CONCURRENCY: usize = 25;

/// Timeout for a single registry fetch in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Default base URL for npm registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Scope every tracked package is published under
pub const DEFAULT_SCOPE: &str = "types";

pub const DEFAULT_VERSIONS_FILENAME: &str = "data/versions.json";
pub const DEFAULT_CHANGES_FILENAME: &str = "data/version-changes.txt";

/// Synchronization configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    /// Maximum number of outstanding registry fetches
    pub concurrency: usize,
    pub registry_url: String,
    /// Scope prepended to package names; `null` publishes unscoped
    pub scope: Option<String>,
    /// Location of the ledger document
    pub versions_path: PathBuf,
    /// Location of the change list
    pub changes_path: PathBuf,
    /// Per-fetch timeout in milliseconds
    pub fetch_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            scope: Some(DEFAULT_SCOPE.to_string()),
            versions_path: PathBuf::from(DEFAULT_VERSIONS_FILENAME),
            changes_path: PathBuf::from(DEFAULT_CHANGES_FILENAME),
            fetch_timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

impl SyncConfig {
    /// Load configuration from a JSON file
    ///
    /// An explicitly given path must exist. Without one, the default location
    /// is tried and a missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let default_path = config_path();
                if default_path.exists() {
                    Self::read(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

/// Returns the path to the default configuration file.
/// Uses $XDG_CONFIG_HOME/version-ledger/config.json if XDG_CONFIG_HOME is set,
/// otherwise falls back to the platform config directory,
/// or ./version-ledger/config.json if neither is available.
pub fn config_path() -> PathBuf {
    config_dir_with_env(std::env::var("XDG_CONFIG_HOME").ok(), dirs::config_dir())
        .join("config.json")
}

fn config_dir_with_env(xdg_config_home: Option<String>, config_dir: Option<PathBuf>) -> PathBuf {
    let config_dir = xdg_config_home
        .map(PathBuf::from)
        .or(config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    config_dir.join("version-ledger")
}
