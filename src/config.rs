//! Application-level configuration loading: where the club state lives and how wide the
//! auto-assign search is.

use std::{
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the host looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "COURT_ROTATION_CONFIG_PATH";
/// Default state file.
const DEFAULT_STORAGE_PATH: &str = "data/court-rotation.json";
/// Default key the state is stored under inside the state file.
const DEFAULT_STORAGE_NAMESPACE: &str = "badminton-store";
/// Default number of top-priority players searched by auto-assign.
pub const DEFAULT_CANDIDATE_POOL_SIZE: usize = 12;
/// Auto-assign needs at least one full court worth of candidates.
const MIN_CANDIDATE_POOL_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    storage_path: PathBuf,
    storage_namespace: String,
    candidate_pool_size: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&resolve_config_path())
    }

    /// Load the configuration from an explicit path, falling back to built-in defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        storage = %app_config.storage_path.display(),
                        pool = app_config.candidate_pool_size,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Override the state file location.
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Override the auto-assign search width (never below four).
    pub fn with_candidate_pool_size(mut self, size: usize) -> Self {
        self.candidate_pool_size = size.max(MIN_CANDIDATE_POOL_SIZE);
        self
    }

    /// File the club state is saved to.
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Key the state is stored under inside the state file.
    pub fn storage_namespace(&self) -> &str {
        &self.storage_namespace
    }

    /// How many top-priority players auto-assign considers.
    pub fn candidate_pool_size(&self) -> usize {
        self.candidate_pool_size
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.into(),
            candidate_pool_size: DEFAULT_CANDIDATE_POOL_SIZE,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    storage_path: Option<PathBuf>,
    storage_namespace: Option<String>,
    candidate_pool_size: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            storage_path: value.storage_path.unwrap_or(defaults.storage_path),
            storage_namespace: value
                .storage_namespace
                .filter(|namespace| !namespace.trim().is_empty())
                .unwrap_or(defaults.storage_namespace),
            candidate_pool_size: value
                .candidate_pool_size
                .unwrap_or(defaults.candidate_pool_size)
                .max(MIN_CANDIDATE_POOL_SIZE),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
