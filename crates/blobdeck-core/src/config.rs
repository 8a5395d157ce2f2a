use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env::{EnvLayer, PROFILE_KEY, PROVIDER_KEY, SNAPSHOT_KEY};
use crate::executor::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE};

pub const DEFAULT_CONFIRM_TOKEN: &str = "PURGE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BlobdeckConfig {
    pub version: u32,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl Default for BlobdeckConfig {
    fn default() -> Self {
        Self {
            version: 1,
            store: StoreConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub page_size: usize,
    pub concurrency: usize,
    pub confirm_token: String,
    pub provider: Option<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            confirm_token: DEFAULT_CONFIRM_TOKEN.to_string(),
            provider: None,
        }
    }
}

impl BlobdeckConfig {
    /// Overrides store and provider settings from the environment.
    pub fn apply_env(&mut self, env: &EnvLayer) {
        if let Some(snapshot) = env.get(SNAPSHOT_KEY) {
            self.store.snapshot = Some(PathBuf::from(snapshot));
        }
        if let Some(profile) = env.get(PROFILE_KEY) {
            self.store.profile = Some(profile);
        }
        if let Some(provider) = env.get(PROVIDER_KEY) {
            self.defaults.provider = Some(provider);
        }
    }

    pub fn profile_label(&self) -> &str {
        self.store.profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs.home_dir().join(".config").join("blobdeck"))
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<BlobdeckConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: BlobdeckConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

/// Loads `path` when it exists, otherwise falls back to defaults.
pub fn load_config_or_default(path: &Path) -> Result<BlobdeckConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(BlobdeckConfig::default())
    }
}

pub fn validate_config(config: &BlobdeckConfig) -> Result<(), ConfigError> {
    if config.version != 1 {
        return Err(ConfigError::Validation {
            message: "version must be 1".to_string(),
        });
    }

    let defaults = &config.defaults;
    if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&defaults.page_size) {
        return Err(ConfigError::Validation {
            message: format!(
                "defaults.page_size must be between {MIN_PAGE_SIZE} and {MAX_PAGE_SIZE}"
            ),
        });
    }

    if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&defaults.concurrency) {
        return Err(ConfigError::Validation {
            message: format!(
                "defaults.concurrency must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
            ),
        });
    }

    let token = defaults.confirm_token.as_str();
    if token.is_empty() || token.trim() != token {
        return Err(ConfigError::Validation {
            message: "defaults.confirm_token must be non-empty without surrounding whitespace"
                .to_string(),
        });
    }

    if let Some(snapshot) = &config.store.snapshot
        && snapshot.as_os_str().is_empty()
    {
        return Err(ConfigError::Validation {
            message: "store.snapshot must be non-empty when set".to_string(),
        });
    }

    Ok(())
}
