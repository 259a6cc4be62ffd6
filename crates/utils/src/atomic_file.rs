//! Atomic file writes: a reader sees either the old file or the complete
//! new one, never a partially written entry.

use nutflow_core::{Error, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Whether to fsync the temporary file before renaming it into place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// Rename only; survives process crashes but not power loss
    #[default]
    Rename,
    /// fsync before the rename
    Sync,
}

/// Write `content` to `path` atomically, creating the parent directory
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_atomic_with(path, content, Durability::default())
}

/// Write `content` to `path` atomically with the given durability
pub fn write_atomic_with(path: &Path, content: &[u8], durability: Durability) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::configuration(format!("no parent directory for '{}'", path.display())))?;

    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

    let temp_path = temp_path_for(parent, path);
    if let Err(e) = write_temp(&temp_path, content, durability) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::file_system(path, "atomic rename", e)
    })
}

fn write_temp(temp_path: &Path, content: &[u8], durability: Durability) -> Result<()> {
    let mut file =
        File::create(temp_path).map_err(|e| Error::file_system(temp_path, "create temporary file", e))?;
    file.write_all(content)
        .map_err(|e| Error::file_system(temp_path, "write temporary file", e))?;
    if durability == Durability::Sync {
        file.sync_all()
            .map_err(|e| Error::file_system(temp_path, "sync temporary file", e))?;
    }
    Ok(())
}

// Hidden temp file next to the target so the rename stays on one filesystem
fn temp_path_for(parent: &Path, path: &Path) -> PathBuf {
    let stem = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    parent.join(format!(".{stem}.{}.tmp", Uuid::new_v4().simple()))
}

/// True for the hidden temporary files `write_atomic` leaves only on crash
pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name.ends_with(".tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("entry.bin");

        write_atomic(&file_path, &[1, 2, 3]).unwrap();

        assert_eq!(fs::read(&file_path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nested").join("entry.bin");

        write_atomic_with(&file_path, b"payload", Durability::Sync).unwrap();

        assert_eq!(fs::read(&file_path).unwrap(), b"payload");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("entry.bin");
        fs::write(&file_path, "old").unwrap();

        write_atomic(&file_path, b"new").unwrap();

        let names: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(names, vec![file_path.clone()]);
        assert_eq!(fs::read(&file_path).unwrap(), b"new");
    }

    #[test]
    fn test_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let err = write_atomic(&blocker.join("entry.bin"), b"x").unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("/x/.cache_0000000001.bin.abc.tmp")));
        assert!(!is_temp_file(Path::new("/x/cache_0000000001.bin")));
    }
}
