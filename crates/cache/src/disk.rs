//! The disk cache unit
//!
//! A [`Cache`] is bound to one directory. The first evaluation streams the
//! upstream through, persisting every element before yielding it. Once that
//! pass has run to completion, later evaluations ignore the upstream and
//! replay the stored elements in order.
//!
//! A cache holding entries from a pass that stopped early is refused with
//! [`CacheError::Incomplete`] instead of replaying partial data. Clear it to
//! start over.

use crate::config::CacheConfig;
use crate::errors::{CacheError, RecoveryHint, Result};
use crate::storage::{DirStatus, EntryStore};
use nutflow_core::{Nut, NutKind};
use nutflow_utils::tracing::nut_span;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Backing directory of a cache
#[derive(Debug)]
enum CacheDir {
    /// Removed when the cache is dropped
    Temp(TempDir),
    Fixed(PathBuf),
}

impl CacheDir {
    fn path(&self) -> &Path {
        match self {
            CacheDir::Temp(dir) => dir.path(),
            CacheDir::Fixed(path) => path,
        }
    }
}

#[derive(Debug)]
struct CacheState {
    dir: CacheDir,
    store: EntryStore,
    writing: bool,
    clear_on_drop: bool,
}

impl Drop for CacheState {
    fn drop(&mut self) {
        if self.clear_on_drop {
            if let CacheDir::Fixed(path) = &self.dir {
                tracing::debug!(path = %path.display(), "Removing cache directory on drop");
                if let Err(e) = self.store.remove_all() {
                    tracing::warn!(error = %e, "Failed to remove cache directory");
                }
            }
        }
    }
}

/// Persists a sequence on its first evaluation and replays it afterwards.
///
/// Clones share the same directory and state. Only one first pass may be
/// open at a time.
#[derive(Debug, Clone)]
pub struct Cache {
    state: Arc<Mutex<CacheState>>,
}

impl Cache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        let dir = match config.base_dir {
            Some(path) => CacheDir::Fixed(path),
            None => {
                let temp = tempfile::Builder::new()
                    .prefix("nutflow-cache-")
                    .tempdir()
                    .map_err(|e| CacheError::Io {
                        path: std::env::temp_dir(),
                        operation: "create temporary cache directory",
                        recovery_hint: RecoveryHint::CheckPermissions {
                            path: std::env::temp_dir(),
                        },
                        source: e,
                    })?;
                CacheDir::Temp(temp)
            }
        };
        let store = EntryStore::new(dir.path());
        tracing::debug!(path = %store.dir().display(), "Opened cache");

        Ok(Self {
            state: Arc::new(Mutex::new(CacheState {
                dir,
                store,
                writing: false,
                clear_on_drop: config.clear_on_drop,
            })),
        })
    }

    /// Cache in a fresh temporary directory
    pub fn temporary() -> Result<Self> {
        Self::new(CacheConfig::default())
    }

    /// Cache in a fixed directory, replaying whatever a previous complete
    /// pass left there
    pub fn at(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(CacheConfig::at(path))
    }

    pub fn path(&self) -> PathBuf {
        self.state.lock().store.dir().to_path_buf()
    }

    /// True when the next evaluation will replay instead of writing
    pub fn is_complete(&self) -> Result<bool> {
        let state = self.state.lock();
        Ok(matches!(state.store.status()?, DirStatus::Complete(_)))
    }

    /// Remove every stored entry so the next evaluation is a first pass
    pub fn clear(&self) -> Result<()> {
        let state = self.state.lock();
        if state.writing {
            return Err(CacheError::ConcurrencyConflict {
                path: state.store.dir().to_path_buf(),
                operation: "clear",
                recovery_hint: RecoveryHint::WaitForWriter,
            });
        }
        tracing::debug!(path = %state.store.dir().display(), "Clearing cache");
        state.store.remove_all()
    }

    /// Guard that clears the cache when it goes out of scope
    pub fn scoped(self) -> ScopedCache {
        ScopedCache { cache: self }
    }

    fn open<I, T>(&self, input: I) -> Cached<I, T> {
        let _span = nut_span("processor", "Cache").entered();
        let mut state = self.state.lock();
        let path = state.store.dir().to_path_buf();
        if state.writing {
            return Cached::failed(CacheError::ConcurrencyConflict {
                path,
                operation: "evaluate",
                recovery_hint: RecoveryHint::WaitForWriter,
            });
        }

        match state.store.status() {
            Ok(DirStatus::Empty) => {
                tracing::debug!(path = %path.display(), "Writing cache");
                state.writing = true;
                Cached {
                    mode: Mode::Write(Writer {
                        iter: input,
                        store: state.store.clone(),
                        state: Arc::clone(&self.state),
                        index: 0,
                        done: false,
                    }),
                }
            }
            Ok(DirStatus::Complete(manifest)) => {
                tracing::debug!(path = %path.display(), entries = manifest.entries, "Replaying cache");
                Cached {
                    mode: Mode::Replay(Replay {
                        store: state.store.clone(),
                        index: 0,
                        total: manifest.entries,
                        failed: false,
                        _marker: PhantomData,
                    }),
                }
            }
            Ok(DirStatus::Incomplete { entries }) => Cached::failed(CacheError::Incomplete {
                path,
                reason: format!("{entries} entries but no finished first pass"),
                recovery_hint: RecoveryHint::ClearAndRetry,
            }),
            Err(e) => Cached::failed(e),
        }
    }
}

impl<I> Nut<I> for Cache
where
    I: IntoIterator,
    I::Item: Serialize + DeserializeOwned,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Cached<I::IntoIter, I::Item>;

    fn apply(&self, input: I) -> Self::Output {
        self.open(input.into_iter())
    }
}

/// A cache that is cleared when dropped
#[derive(Debug)]
pub struct ScopedCache {
    cache: Cache,
}

impl Deref for ScopedCache {
    type Target = Cache;

    fn deref(&self) -> &Cache {
        &self.cache
    }
}

impl Drop for ScopedCache {
    fn drop(&mut self) {
        if let Err(e) = self.cache.clear() {
            tracing::warn!(error = %e, "Failed to clear scoped cache");
        }
    }
}

impl<I> Nut<I> for ScopedCache
where
    I: IntoIterator,
    I::Item: Serialize + DeserializeOwned,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Cached<I::IntoIter, I::Item>;

    fn apply(&self, input: I) -> Self::Output {
        self.cache.open(input.into_iter())
    }
}

/// Output of [`Cache`]: the upstream elements, each wrapped in a `Result`
pub struct Cached<I, T> {
    mode: Mode<I, T>,
}

enum Mode<I, T> {
    Write(Writer<I>),
    Replay(Replay<T>),
    Failed(Option<CacheError>),
}

impl<I, T> Cached<I, T> {
    fn failed(error: CacheError) -> Self {
        tracing::debug!(error = %error, "Cache evaluation refused");
        Cached {
            mode: Mode::Failed(Some(error)),
        }
    }

    /// True when this evaluation reads stored entries
    pub fn is_replay(&self) -> bool {
        matches!(self.mode, Mode::Replay(_))
    }
}

impl<I, T> Iterator for Cached<I, T>
where
    I: Iterator<Item = T>,
    T: Serialize + DeserializeOwned,
{
    type Item = std::result::Result<T, CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.mode {
            Mode::Write(writer) => writer.next(),
            Mode::Replay(replay) => replay.next(),
            Mode::Failed(error) => error.take().map(Err),
        }
    }
}

struct Writer<I> {
    iter: I,
    store: EntryStore,
    state: Arc<Mutex<CacheState>>,
    index: usize,
    done: bool,
}

impl<I> Writer<I> {
    fn finish(&mut self) {
        self.done = true;
        self.state.lock().writing = false;
    }

    fn next<T: Serialize>(&mut self) -> Option<Result<T>>
    where
        I: Iterator<Item = T>,
    {
        if self.done {
            return None;
        }
        match self.iter.next() {
            Some(element) => match self.store.write_entry(self.index, &element) {
                Ok(()) => {
                    self.index += 1;
                    Some(Ok(element))
                }
                Err(e) => {
                    self.finish();
                    Some(Err(e))
                }
            },
            None => {
                let manifest = self.store.write_manifest(self.index);
                self.finish();
                tracing::debug!(entries = self.index, "Cache first pass complete");
                manifest.err().map(Err)
            }
        }
    }
}

impl<I> Drop for Writer<I> {
    fn drop(&mut self) {
        if !self.done {
            tracing::debug!(
                entries = self.index,
                "Cache first pass abandoned before the upstream was exhausted"
            );
            self.finish();
        }
    }
}

struct Replay<T> {
    store: EntryStore,
    index: usize,
    total: usize,
    failed: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Iterator for Replay<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        if self.failed || self.index >= self.total {
            return None;
        }
        let entry = self.store.read_entry(self.index);
        self.index += 1;
        if entry.is_err() {
            self.failed = true;
        }
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.failed {
            0
        } else {
            self.total - self.index
        };
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutflow_core::Chain;
    use tempfile::TempDir;

    fn collect<I: Iterator<Item = std::result::Result<T, CacheError>>, T>(iter: I) -> Vec<T> {
        iter.collect::<std::result::Result<Vec<T>, CacheError>>()
            .unwrap()
    }

    #[test]
    fn test_write_then_replay() {
        let cache = Cache::temporary().unwrap();
        let first = vec![3, 1, 2].then(&cache);
        assert!(!first.is_replay());
        assert_eq!(collect(first), vec![3, 1, 2]);
        assert!(cache.is_complete().unwrap());

        let replay = vec![9, 9, 9, 9].then(&cache);
        assert!(replay.is_replay());
        assert_eq!(collect(replay), vec![3, 1, 2]);
    }

    #[test]
    fn test_replay_ignores_upstream() {
        let cache = Cache::temporary().unwrap();
        assert_eq!(collect((0..3).then(&cache)), vec![0, 1, 2]);
        let never = (0..).inspect(|_| panic!("upstream must not be pulled"));
        assert_eq!(collect(never.then(&cache)), vec![0, 1, 2]);
    }

    #[test]
    fn test_clear_allows_fresh_pass() {
        let cache = Cache::temporary().unwrap();
        assert_eq!(collect(vec!["a".to_string()].then(&cache)), vec!["a"]);
        cache.clear().unwrap();
        assert!(!cache.is_complete().unwrap());
        assert_eq!(collect(vec!["b".to_string()].then(&cache)), vec!["b"]);
        assert_eq!(collect(Vec::<String>::new().then(&cache)), vec!["b"]);
    }

    #[test]
    fn test_partial_first_pass_fails_fast() {
        let cache = Cache::temporary().unwrap();
        let mut first = (0..10).then(&cache);
        assert_eq!(first.next().unwrap().unwrap(), 0);
        assert_eq!(first.next().unwrap().unwrap(), 1);
        drop(first);

        let mut second = (0..10).then(&cache);
        let err = second.next().unwrap().unwrap_err();
        assert!(err.is_incomplete());
        assert!(second.next().is_none());
    }

    #[test]
    fn test_second_evaluation_while_writing() {
        let cache = Cache::temporary().unwrap();
        let mut first = (0..4).then(&cache);
        assert!(first.next().is_some());

        let mut second = (0..4).then(&cache);
        let err = second.next().unwrap().unwrap_err();
        assert!(matches!(err, CacheError::ConcurrencyConflict { .. }));
        assert!(cache.clear().is_err());

        assert_eq!(first.count(), 3);
        assert!(cache.is_complete().unwrap());
    }

    #[test]
    fn test_empty_upstream_is_complete() {
        let cache = Cache::temporary().unwrap();
        assert!(collect(Vec::<u8>::new().then(&cache)).is_empty());
        assert!(cache.is_complete().unwrap());
        assert!(collect(vec![1u8].then(&cache)).is_empty());
    }

    #[test]
    fn test_fixed_dir_survives_instances() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("shared");
        {
            let cache = Cache::at(&dir).unwrap();
            assert_eq!(collect(vec![(1, 'x'), (2, 'y')].then(&cache)), vec![(1, 'x'), (2, 'y')]);
        }
        let reopened = Cache::at(&dir).unwrap();
        assert_eq!(collect(Vec::<(i32, char)>::new().then(&reopened)), vec![(1, 'x'), (2, 'y')]);
    }

    #[test]
    fn test_corrupt_entry_stops_replay() {
        let cache = Cache::temporary().unwrap();
        assert_eq!(collect((0..3u32).then(&cache)).len(), 3);
        let entry = cache.path().join(crate::storage::entry_file_name(1));
        std::fs::write(&entry, b"garbage").unwrap();

        let mut replay = (0..3u32).then(&cache);
        assert_eq!(replay.next().unwrap().unwrap(), 0);
        assert!(replay.next().unwrap().unwrap_err().is_corruption());
        assert!(replay.next().is_none());
    }

    #[test]
    fn test_serialization_failure_propagates() {
        struct Unserializable;

        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("refused"))
            }
        }

        impl<'de> serde::Deserialize<'de> for Unserializable {
            fn deserialize<D: serde::Deserializer<'de>>(_: D) -> std::result::Result<Self, D::Error> {
                Ok(Unserializable)
            }
        }

        let cache = Cache::temporary().unwrap();
        let mut out = vec![Unserializable].then(&cache);
        assert!(matches!(
            out.next(),
            Some(Err(CacheError::Serialization { .. }))
        ));
        assert!(out.next().is_none());
    }

    #[test]
    fn test_scoped_clears_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("scoped");
        {
            let scoped = Cache::at(&dir).unwrap().scoped();
            assert_eq!(collect((0..2).then(&scoped)), vec![0, 1]);
            assert!(dir.exists());
        }
        assert!(!dir.exists());
    }

    #[test]
    fn test_unsupported_storage_never_opens() {
        let result = CacheConfig::builder()
            .with_storage("memory")
            .build()
            .and_then(Cache::new);
        assert!(matches!(result, Err(CacheError::Configuration { .. })));
    }

    #[test]
    fn test_clear_on_drop_and_temp_cleanup() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("dropped");
        let cache = Cache::new(
            CacheConfig::builder()
                .with_base_dir(&dir)
                .with_clear_on_drop(true)
                .build()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(collect((0..2).then(&cache)).len(), 2);
        drop(cache);
        assert!(!dir.exists());

        let temp = Cache::temporary().unwrap();
        let temp_path = temp.path();
        assert_eq!(collect((0..2).then(&temp)).len(), 2);
        drop(temp);
        assert!(!temp_path.exists());
    }
}
