//! Configuration for the concurrent units
use nutflow_core::{Error, Result};
use std::num::NonZeroUsize;

/// Environment variable overriding the worker count
pub const WORKERS_ENV: &str = "NUTFLOW_WORKERS";
/// Environment variable overriding the chunk size
pub const CHUNKSIZE_ENV: &str = "NUTFLOW_CHUNKSIZE";

fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn positive(name: &str, value: usize) -> Result<usize> {
    if value == 0 {
        return Err(Error::configuration(format!("{name} must be positive")));
    }
    Ok(value)
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| Error::configuration(format!("invalid {key}='{raw}': {e}"))),
        Err(_) => Ok(None),
    }
}

/// Settings for [`MapPar`](crate::MapPar)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelConfig {
    /// Threads in the pool
    pub workers: usize,
    /// Elements dispatched to the pool at once
    pub chunksize: usize,
    /// Prefix for pool thread names
    pub thread_name: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = available_parallelism();
        Self {
            workers: cpus,
            chunksize: cpus,
            thread_name: "nutflow-map".to_string(),
        }
    }
}

impl ParallelConfig {
    pub fn builder() -> ParallelConfigBuilder {
        ParallelConfigBuilder::default()
    }

    /// Defaults overridden by `NUTFLOW_WORKERS` and `NUTFLOW_CHUNKSIZE`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(workers) = env_usize(WORKERS_ENV)? {
            config.workers = workers;
        }
        if let Some(chunksize) = env_usize(CHUNKSIZE_ENV)? {
            config.chunksize = chunksize;
        }
        config.validate()?;
        tracing::debug!(?config, "Loaded parallel configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        positive("workers", self.workers)?;
        positive("chunksize", self.chunksize)?;
        Ok(())
    }
}

/// Builder for [`ParallelConfig`]
#[derive(Debug, Default)]
pub struct ParallelConfigBuilder {
    workers: Option<usize>,
    chunksize: Option<usize>,
    thread_name: Option<String>,
}

impl ParallelConfigBuilder {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_chunksize(mut self, chunksize: usize) -> Self {
        self.chunksize = Some(chunksize);
        self
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Unset fields take their defaults; zero counts are rejected
    pub fn build(self) -> Result<ParallelConfig> {
        let defaults = ParallelConfig::default();
        let config = ParallelConfig {
            workers: self.workers.unwrap_or(defaults.workers),
            chunksize: self.chunksize.unwrap_or(defaults.chunksize),
            thread_name: self.thread_name.unwrap_or(defaults.thread_name),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Settings for [`Prefetch`](crate::Prefetch)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchConfig {
    /// Capacity of the queue between worker and consumer
    pub num_prefetch: usize,
    /// Name of the worker thread
    pub thread_name: String,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            num_prefetch: 1,
            thread_name: "nutflow-prefetch".to_string(),
        }
    }
}

impl PrefetchConfig {
    pub fn new(num_prefetch: usize) -> Result<Self> {
        let config = Self {
            num_prefetch,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        positive("num_prefetch", self.num_prefetch).map(drop)
    }
}
