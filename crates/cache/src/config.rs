//! Cache configuration with environment overrides and validation
use crate::errors::{CacheError, RecoveryHint, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable naming the cache directory
pub const CACHE_DIR_ENV: &str = "NUTFLOW_CACHE_DIR";
/// Environment variable naming the storage backend
pub const CACHE_STORAGE_ENV: &str = "NUTFLOW_CACHE_STORAGE";

/// Where cached entries are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    /// One file per entry in a directory
    #[default]
    Disk,
}

impl FromStr for Storage {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disk" => Ok(Storage::Disk),
            other => Err(CacheError::Configuration {
                message: format!("unsupported storage '{other}', only 'disk' is available"),
                recovery_hint: RecoveryHint::UpdateConfiguration,
            }),
        }
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Disk => f.write_str("disk"),
        }
    }
}

/// Source of configuration for debugging and precedence tracking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default configuration
    #[default]
    Default,
    /// Environment variable
    EnvironmentVariable(String),
    /// Set in code through the builder
    Builder,
}

/// Configuration for a disk cache unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory; `None` means a fresh temporary directory
    pub base_dir: Option<PathBuf>,
    /// Storage backend
    pub storage: Storage,
    /// Remove the directory when the cache unit is dropped
    pub clear_on_drop: bool,
    /// Where this configuration came from
    #[serde(skip)]
    pub source: ConfigSource,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            storage: Storage::Disk,
            clear_on_drop: false,
            source: ConfigSource::Default,
        }
    }
}

impl CacheConfig {
    /// Start building a configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// Configuration for a fixed directory
    pub fn at(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
            source: ConfigSource::Builder,
            ..Self::default()
        }
    }

    /// Defaults overridden by `NUTFLOW_CACHE_DIR` and `NUTFLOW_CACHE_STORAGE`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        let mut overridden = Vec::new();

        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.base_dir = Some(PathBuf::from(dir));
                overridden.push(CACHE_DIR_ENV);
            }
        }

        if let Ok(storage) = std::env::var(CACHE_STORAGE_ENV) {
            config.storage = storage.parse()?;
            overridden.push(CACHE_STORAGE_ENV);
        }

        if !overridden.is_empty() {
            config.source = ConfigSource::EnvironmentVariable(overridden.join(","));
        }
        tracing::debug!(?config, "Loaded cache configuration");
        Ok(config)
    }
}

/// Builder for creating cache configurations
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
    storage: Option<String>,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base directory
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = Some(base_dir.into());
        self
    }

    /// Set the storage backend by name; checked in [`build`]
    ///
    /// [`build`]: CacheConfigBuilder::build
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    /// Remove the directory when the cache unit is dropped
    pub fn with_clear_on_drop(mut self, clear_on_drop: bool) -> Self {
        self.config.clear_on_drop = clear_on_drop;
        self
    }

    /// Build the configuration, rejecting unknown storage names
    pub fn build(mut self) -> Result<CacheConfig> {
        if let Some(storage) = self.storage.take() {
            self.config.storage = storage.parse()?;
        }
        self.config.source = ConfigSource::Builder;
        Ok(self.config)
    }
}
