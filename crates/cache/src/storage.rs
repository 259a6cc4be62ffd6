//! On-disk entry format
//!
//! Each cached element lives in its own file `cache_{index:010}.bin`:
//! - a bincode-encoded [`EntryHeader`] (magic, format version, payload
//!   length, CRC32C of the payload)
//! - the bincode-encoded element
//!
//! Files are written atomically. Once a first pass has drained its
//! upstream, `manifest.json` records how many entries belong to the cache;
//! a directory without a manifest is never replayed.

use crate::errors::{CacheError, RecoveryHint, Result, SerializationOp};
use crc32c::crc32c;
use nutflow_utils::{is_temp_file, write_atomic, write_atomic_with, Durability};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Magic number for entry files: "NUTF"
const ENTRY_MAGIC: u32 = 0x4E55_5446;

/// Current entry format version
pub const FORMAT_VERSION: u32 = 1;

/// Name of the completion manifest inside a cache directory
pub const MANIFEST_FILE: &str = "manifest.json";

const ENTRY_PREFIX: &str = "cache_";
const ENTRY_SUFFIX: &str = ".bin";

/// File name of the entry at `index`
pub fn entry_file_name(index: usize) -> String {
    format!("{ENTRY_PREFIX}{index:010}{ENTRY_SUFFIX}")
}

fn is_entry_file(name: &str) -> bool {
    name.strip_prefix(ENTRY_PREFIX)
        .and_then(|rest| rest.strip_suffix(ENTRY_SUFFIX))
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Binary header in front of every entry payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct EntryHeader {
    magic: u32,
    version: u32,
    payload_len: u64,
    payload_crc: u32,
}

impl EntryHeader {
    fn for_payload(payload: &[u8]) -> Self {
        Self {
            magic: ENTRY_MAGIC,
            version: FORMAT_VERSION,
            payload_len: payload.len() as u64,
            payload_crc: crc32c(payload),
        }
    }

    fn validate(&self, key: &str, payload: &[u8]) -> Result<()> {
        if self.magic != ENTRY_MAGIC {
            return Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!(
                    "Invalid magic number: expected {:08x}, got {:08x}",
                    ENTRY_MAGIC, self.magic
                ),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        if self.version != FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                key: key.to_string(),
                expected_version: FORMAT_VERSION,
                actual_version: self.version,
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        if self.payload_len != payload.len() as u64 {
            return Err(CacheError::Corruption {
                key: key.to_string(),
                reason: format!(
                    "Payload length mismatch: header says {}, file has {}",
                    self.payload_len,
                    payload.len()
                ),
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        let actual_crc = crc32c(payload);
        if actual_crc != self.payload_crc {
            return Err(CacheError::IntegrityFailure {
                key: key.to_string(),
                expected_crc: self.payload_crc,
                actual_crc,
                recovery_hint: RecoveryHint::ClearAndRetry,
            });
        }

        Ok(())
    }
}

/// Contents of `manifest.json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub entries: usize,
}

/// What a cache directory currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    /// Missing directory or no entries
    Empty,
    /// A finished first pass
    Complete(Manifest),
    /// Entries without a matching manifest
    Incomplete { entries: usize },
}

/// Reads and writes entry files in one directory
#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: PathBuf,
}

impl EntryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, index: usize) -> PathBuf {
        self.dir.join(entry_file_name(index))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Serialize `value` and persist it as entry `index`
    pub fn write_entry<T: Serialize>(&self, index: usize, value: &T) -> Result<()> {
        let key = entry_file_name(index);
        let payload = bincode::serialize(value).map_err(|e| CacheError::Serialization {
            key: key.clone(),
            operation: SerializationOp::Encode,
            source: e,
            recovery_hint: RecoveryHint::Manual {
                instructions: "Check that the element type serializes".to_string(),
            },
        })?;
        let header = EntryHeader::for_payload(&payload);

        let mut bytes = bincode::serialize(&header).map_err(|e| CacheError::Serialization {
            key,
            operation: SerializationOp::Encode,
            source: e,
            recovery_hint: RecoveryHint::ClearAndRetry,
        })?;
        bytes.extend_from_slice(&payload);

        let path = self.entry_path(index);
        write_atomic(&path, &bytes).map_err(|e| self.write_error(&path, e))?;
        tracing::trace!(index, bytes = bytes.len(), "Wrote cache entry");
        Ok(())
    }

    /// Read and verify entry `index`
    pub fn read_entry<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let key = entry_file_name(index);
        let path = self.entry_path(index);
        let file_data = fs::read(&path).map_err(|e| CacheError::Io {
            path: path.clone(),
            operation: "read cache entry",
            recovery_hint: if e.kind() == io::ErrorKind::NotFound {
                RecoveryHint::ClearAndRetry
            } else {
                RecoveryHint::CheckPermissions { path: path.clone() }
            },
            source: e,
        })?;

        let mut reader: &[u8] = &file_data;
        let header: EntryHeader =
            bincode::deserialize_from(&mut reader).map_err(|e| CacheError::Corruption {
                key: key.clone(),
                reason: format!("Unreadable header: {e}"),
                recovery_hint: RecoveryHint::ClearAndRetry,
            })?;
        header.validate(&key, reader)?;

        let value = bincode::deserialize(reader).map_err(|e| CacheError::Serialization {
            key,
            operation: SerializationOp::Decode,
            source: e,
            recovery_hint: RecoveryHint::ClearAndRetry,
        })?;
        tracing::trace!(index, "Read cache entry");
        Ok(value)
    }

    /// Record that the first pass wrote exactly `entries` entries; synced
    /// to disk before it becomes visible
    pub fn write_manifest(&self, entries: usize) -> Result<()> {
        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            entries,
        };
        let json = serde_json::to_vec_pretty(&manifest)?;
        let path = self.manifest_path();
        write_atomic_with(&path, &json, Durability::Sync).map_err(|e| self.write_error(&path, e))
    }

    pub fn read_manifest(&self) -> Result<Option<Manifest>> {
        let path = self.manifest_path();
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::Io {
                recovery_hint: RecoveryHint::CheckPermissions { path: path.clone() },
                path,
                operation: "read manifest",
                source: e,
            }),
        }
    }

    /// Number of entry files present, ignoring in-flight temp files
    pub fn count_entries(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(self.list_error(e)),
        };

        let mut count = 0;
        for entry in entries {
            let path = entry.map_err(|e| self.list_error(e))?.path();
            if is_temp_file(&path) {
                continue;
            }
            if path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(is_entry_file)
            {
                count += 1;
            }
        }
        Ok(count)
    }

    pub fn status(&self) -> Result<DirStatus> {
        let entries = self.count_entries()?;
        match self.read_manifest()? {
            Some(manifest) if manifest.entries == entries => Ok(DirStatus::Complete(manifest)),
            Some(_) => Ok(DirStatus::Incomplete { entries }),
            None if entries == 0 => Ok(DirStatus::Empty),
            None => Ok(DirStatus::Incomplete { entries }),
        }
    }

    /// Remove the whole directory; a missing directory is not an error
    pub fn remove_all(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io {
                path: self.dir.clone(),
                operation: "remove cache directory",
                recovery_hint: RecoveryHint::CheckPermissions {
                    path: self.dir.clone(),
                },
                source: e,
            }),
        }
    }

    fn write_error(&self, path: &Path, error: nutflow_core::Error) -> CacheError {
        match error {
            nutflow_core::Error::FileSystem { source, .. } => CacheError::Io {
                path: path.to_path_buf(),
                operation: "write cache entry",
                source,
                recovery_hint: RecoveryHint::CheckDiskSpace,
            },
            other => other.into(),
        }
    }

    fn list_error(&self, error: io::Error) -> CacheError {
        CacheError::Io {
            path: self.dir.clone(),
            operation: "list cache directory",
            source: error,
            recovery_hint: RecoveryHint::CheckPermissions {
                path: self.dir.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        name: String,
        tags: Vec<String>,
    }

    #[test]
    fn test_entry_file_names() {
        assert_eq!(entry_file_name(7), "cache_0000000007.bin");
        assert!(is_entry_file("cache_0000000007.bin"));
        assert!(!is_entry_file("cache_.bin"));
        assert!(!is_entry_file("manifest.json"));
        assert!(!is_entry_file("cache_12a.bin"));
    }

    #[test]
    fn test_write_then_read_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = EntryStore::new(temp_dir.path().join("c"));
        let row = Row {
            id: 3,
            name: "walnut".to_string(),
            tags: vec!["shell".to_string()],
        };
        store.write_entry(0, &row).unwrap();
        assert_eq!(store.read_entry::<Row>(0).unwrap(), row);
        assert_eq!(store.count_entries().unwrap(), 1);
    }

    #[test]
    fn test_corruption_detection() {
        let temp_dir = TempDir::new().unwrap();
        let store = EntryStore::new(temp_dir.path());
        store.write_entry(0, &"a payload long enough to flip".to_string()).unwrap();

        let path = store.entry_path(0);
        let mut file_data = std::fs::read(&path).unwrap();
        let last = file_data.len() - 1;
        file_data[last] ^= 0xFF;
        std::fs::write(&path, file_data).unwrap();

        match store.read_entry::<String>(0) {
            Ok(_) => panic!("Should have detected corruption"),
            Err(CacheError::IntegrityFailure { .. }) => {}
            Err(e) => panic!("Wrong error type: {e}"),
        }
    }

    #[test]
    fn test_truncated_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = EntryStore::new(temp_dir.path());
        store.write_entry(0, &vec![1u64, 2, 3]).unwrap();

        let path = store.entry_path(0);
        let file_data = std::fs::read(&path).unwrap();
        std::fs::write(&path, &file_data[..file_data.len() - 4]).unwrap();

        let err = store.read_entry::<Vec<u64>>(0).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_missing_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = EntryStore::new(temp_dir.path());
        let err = store.read_entry::<u8>(4).unwrap_err();
        assert!(matches!(err, CacheError::Io { .. }));
        assert!(err.is_recoverable_by_clear());
    }

    #[test]
    fn test_status() {
        let temp_dir = TempDir::new().unwrap();
        let store = EntryStore::new(temp_dir.path().join("status"));
        assert_eq!(store.status().unwrap(), DirStatus::Empty);

        store.write_entry(0, &1i32).unwrap();
        store.write_entry(1, &2i32).unwrap();
        assert_eq!(store.status().unwrap(), DirStatus::Incomplete { entries: 2 });

        store.write_manifest(2).unwrap();
        assert_eq!(
            store.status().unwrap(),
            DirStatus::Complete(Manifest {
                format_version: FORMAT_VERSION,
                entries: 2
            })
        );

        std::fs::remove_file(store.entry_path(1)).unwrap();
        assert_eq!(store.status().unwrap(), DirStatus::Incomplete { entries: 1 });

        store.remove_all().unwrap();
        assert!(!store.dir().exists());
        assert_eq!(store.status().unwrap(), DirStatus::Empty);
        store.remove_all().unwrap();
    }

    #[test]
    fn test_manifest_replaces_previous_without_leftovers() {
        let temp_dir = TempDir::new().unwrap();
        let store = EntryStore::new(temp_dir.path().join("manifest"));
        assert_eq!(store.read_manifest().unwrap(), None);

        store.write_manifest(3).unwrap();
        store.write_manifest(5).unwrap();
        assert_eq!(store.read_manifest().unwrap().map(|m| m.entries), Some(5));

        let names: Vec<String> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![MANIFEST_FILE.to_string()]);
    }

    proptest::proptest! {
        #[test]
        fn prop_any_flipped_byte_is_detected(
            values in proptest::collection::vec(proptest::num::i64::ANY, 1..32),
            position in proptest::num::usize::ANY,
        ) {
            let temp_dir = TempDir::new().unwrap();
            let store = EntryStore::new(temp_dir.path());
            store.write_entry(0, &values).unwrap();

            let path = store.entry_path(0);
            let mut file_data = std::fs::read(&path).unwrap();
            let position = position % file_data.len();
            file_data[position] ^= 0x01;
            std::fs::write(&path, file_data).unwrap();

            proptest::prop_assert!(store.read_entry::<Vec<i64>>(0).is_err());
        }
    }
}
