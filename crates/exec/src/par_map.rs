//! Order-preserving parallel map

use crate::config::ParallelConfig;
use nutflow_core::{Error, Nut, NutKind, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

type MapFn<T, O> = Arc<dyn Fn(T) -> O + Send + Sync>;

/// Maps `f` over the upstream on a thread pool.
///
/// The pool is built once, when the unit is constructed, and shared by
/// every evaluation and clone. Each evaluation pulls up to `chunksize`
/// elements, maps them in parallel, and yields the results in input order
/// before pulling the next chunk. A panic inside `f` propagates to the
/// consumer.
pub struct MapPar<T, O> {
    f: MapFn<T, O>,
    pool: Arc<ThreadPool>,
    chunksize: usize,
}

impl<T, O> MapPar<T, O> {
    /// Pool sized by [`ParallelConfig::default`]
    pub fn new<F>(f: F) -> Result<Self>
    where
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        Self::with_config(f, ParallelConfig::default())
    }

    pub fn with_config<F>(f: F, config: ParallelConfig) -> Result<Self>
    where
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        config.validate()?;
        let prefix = config.thread_name.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(move |i| format!("{prefix}-{i}"))
            .build()
            .map_err(|e| Error::worker("build thread pool", e.to_string()))?;
        tracing::debug!(
            workers = config.workers,
            chunksize = config.chunksize,
            "Built parallel map pool"
        );

        Ok(Self {
            f: Arc::new(f),
            pool: Arc::new(pool),
            chunksize: config.chunksize,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn chunksize(&self) -> usize {
        self.chunksize
    }
}

impl<T, O> Clone for MapPar<T, O> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            pool: Arc::clone(&self.pool),
            chunksize: self.chunksize,
        }
    }
}

impl<T, O> std::fmt::Debug for MapPar<T, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapPar")
            .field("workers", &self.workers())
            .field("chunksize", &self.chunksize)
            .finish()
    }
}

impl<I, T, O> Nut<I> for MapPar<T, O>
where
    I: IntoIterator<Item = T>,
    T: Send,
    O: Send,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = ParMapped<I::IntoIter, T, O>;

    fn apply(&self, input: I) -> Self::Output {
        ParMapped {
            iter: input.into_iter(),
            unit: self.clone(),
            ready: Vec::new().into_iter(),
        }
    }
}

/// Output of [`MapPar`]
pub struct ParMapped<I, T, O> {
    iter: I,
    unit: MapPar<T, O>,
    ready: std::vec::IntoIter<O>,
}

impl<I, T, O> Iterator for ParMapped<I, T, O>
where
    I: Iterator<Item = T>,
    T: Send,
    O: Send,
{
    type Item = O;

    fn next(&mut self) -> Option<O> {
        if let Some(result) = self.ready.next() {
            return Some(result);
        }

        let chunk: Vec<T> = self.iter.by_ref().take(self.unit.chunksize).collect();
        if chunk.is_empty() {
            return None;
        }

        let f = &self.unit.f;
        tracing::trace!(len = chunk.len(), "Dispatching chunk to pool");
        let results: Vec<O> = self
            .unit
            .pool
            .install(|| chunk.into_par_iter().map(|element| f(element)).collect());
        self.ready = results.into_iter();
        self.ready.next()
    }
}
