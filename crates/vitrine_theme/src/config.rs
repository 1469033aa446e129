//! Engine configuration file handling (vitrine.toml)

use crate::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "vitrine.toml";

/// Top-level engine configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub boundary: BoundaryConfig,
}

/// Theme hosting service
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request budget in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub memory_ttl_secs: u64,
    #[serde(default = "default_ttl_secs")]
    pub durable_ttl_secs: u64,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    /// Directory for the durable tier; in-memory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
}

fn default_ttl_secs() -> u64 {
    vitrine_cache::DEFAULT_TTL.as_secs()
}

fn default_memory_capacity() -> usize {
    vitrine_cache::DEFAULT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_ttl_secs: default_ttl_secs(),
            durable_ttl_secs: default_ttl_secs(),
            memory_capacity: default_memory_capacity(),
            storage_dir: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Drop responses of superseded loads instead of last-writer-wins
    #[serde(default)]
    pub discard_stale_responses: bool,
    /// Durable key of the persisted active theme
    #[serde(default = "default_persist_key")]
    pub persist_key: String,
}

fn default_persist_key() -> String {
    crate::store::DEFAULT_PERSIST_KEY.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            discard_stale_responses: false,
            persist_key: default_persist_key(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct BoundaryConfig {
    /// Consecutive render failures under one theme before forcing the default
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
}

fn default_max_failures() -> u32 {
    crate::boundary::DEFAULT_MAX_FAILURES
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            max_consecutive_failures: default_max_failures(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file, or from `vitrine.toml` inside a directory
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILE_NAME)
        } else {
            path.to_path_buf()
        };

        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;

        let config: EngineConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: config_path.clone(),
            source,
        })?;

        tracing::debug!("Loaded engine config from {}", config_path.display());
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let exists = if path.is_dir() {
            path.join(CONFIG_FILE_NAME).exists()
        } else {
            path.exists()
        };
        if exists {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.service.timeout_ms)
    }

    pub fn memory_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.memory_ttl_secs)
    }

    pub fn durable_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.durable_ttl_secs)
    }
}
