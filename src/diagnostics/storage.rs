//! Durable storage port for the diagnostic buffer.
//!
//! The store depends on this interface rather than a concrete location so
//! tests can substitute an in-memory fake. Production uses one JSON file
//! under the application root (a single fixed key).

use std::path::PathBuf;
use std::sync::Mutex;

use crate::app_dirs;

/// Filename of the persisted diagnostic buffer.
pub const LOG_STORE_FILE_NAME: &str = "diagnostic_log.json";

/// Errors surfaced by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("App dir error: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value-style durable storage for the serialized buffer.
pub trait LogStorage: Send {
    /// Return the stored payload, or `None` when nothing was persisted yet.
    fn get(&self) -> Result<Option<Vec<u8>>, StorageError>;
    /// Overwrite the stored payload.
    fn set(&self, bytes: &[u8]) -> Result<(), StorageError>;
    /// Remove the stored payload if present.
    fn remove(&self) -> Result<(), StorageError>;
}

/// File-backed storage rooted in the application directory.
#[derive(Debug)]
pub struct FileLogStorage {
    path: PathBuf,
}

impl FileLogStorage {
    /// Store the buffer at the default location under the app root.
    pub fn in_app_root() -> Result<Self, StorageError> {
        Ok(Self {
            path: app_dirs::app_root_dir()?.join(LOG_STORE_FILE_NAME),
        })
    }

    /// Store the buffer at an explicit path.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LogStorage for FileLogStorage {
    fn get(&self) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&self, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory storage, used by tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryLogStorage {
    cell: Mutex<Option<Vec<u8>>>,
}

impl MemoryLogStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LogStorage for MemoryLogStorage {
    fn get(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self
            .cell
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone())
    }

    fn set(&self, bytes: &[u8]) -> Result<(), StorageError> {
        *self.cell.lock().unwrap_or_else(|err| err.into_inner()) = Some(bytes.to_vec());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self.cell.lock().unwrap_or_else(|err| err.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_storage_round_trips() {
        let dir = tempdir().unwrap();
        let storage = FileLogStorage::at_path(dir.path().join("store").join("logs.json"));
        assert!(storage.get().unwrap().is_none());
        storage.set(b"[1,2,3]").unwrap();
        assert_eq!(storage.get().unwrap().unwrap(), b"[1,2,3]");
        storage.remove().unwrap();
        assert!(storage.get().unwrap().is_none());
    }

    #[test]
    fn file_storage_remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let storage = FileLogStorage::at_path(dir.path().join("logs.json"));
        storage.remove().unwrap();
        storage.remove().unwrap();
    }

    #[test]
    fn memory_storage_round_trips() {
        let storage = MemoryLogStorage::new();
        assert!(storage.get().unwrap().is_none());
        storage.set(b"payload").unwrap();
        assert_eq!(storage.get().unwrap().unwrap(), b"payload");
        storage.remove().unwrap();
        assert!(storage.get().unwrap().is_none());
    }
}
