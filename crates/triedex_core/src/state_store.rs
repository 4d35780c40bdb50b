//! Durable-state collaborators.
//!
//! The scheduler persists its progress state through the [`StateStore`]
//! trait. The store holds a single opaque byte record; the engine owns the
//! record's format (see [`crate::ProgressState`]), stores do not interpret
//! it.

use crate::error::{IndexError, IndexResult};
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Durable storage for the progress state.
///
/// # Implementors
///
/// - [`MemoryStateStore`] - process-local, progress lost on restart
/// - [`FileStateStore`] - a single file, written atomically
pub trait StateStore: Send + Sync {
    /// Fetches the stored state bytes, or `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn fetch(&self) -> IndexResult<Option<Vec<u8>>>;

    /// Stores the state bytes, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be made durable. The mapping
    /// function has already run for the batch when this is called, so a
    /// failure means redelivery on the next run, never data loss.
    fn store(&self, bytes: &[u8]) -> IndexResult<()>;

    /// Clears the stored state, resetting the indexer to "never indexed".
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be removed.
    fn clear(&self) -> IndexResult<()> {
        Ok(())
    }
}

/// A process-local state store backed by a single in-memory cell.
///
/// Progress is lost on restart, so this is only suitable for ephemeral
/// indexes and tests. It is the default store when none is supplied.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    cell: Mutex<Option<Vec<u8>>>,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with existing state bytes.
    ///
    /// Useful for testing restart scenarios.
    #[must_use]
    pub fn with_state(bytes: Vec<u8>) -> Self {
        Self {
            cell: Mutex::new(Some(bytes)),
        }
    }

    /// Returns a copy of the stored bytes, for tests and debugging.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.cell.lock().clone()
    }
}

impl StateStore for MemoryStateStore {
    fn fetch(&self) -> IndexResult<Option<Vec<u8>>> {
        Ok(self.cell.lock().clone())
    }

    fn store(&self, bytes: &[u8]) -> IndexResult<()> {
        *self.cell.lock() = Some(bytes.to_vec());
        Ok(())
    }

    fn clear(&self) -> IndexResult<()> {
        *self.cell.lock() = None;
        Ok(())
    }
}

/// A state store persisting the record to a single file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    tmp_path: PathBuf,
}

impl FileStateStore {
    /// Creates a store persisting to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tmp_path = path.clone().into_os_string();
        tmp_path.push(".tmp");
        Self {
            path,
            tmp_path: PathBuf::from(tmp_path),
        }
    }

    /// The path the record is persisted at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn fetch(&self) -> IndexResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(IndexError::Io(e)),
        }
    }

    fn store(&self, bytes: &[u8]) -> IndexResult<()> {
        fs::write(&self.tmp_path, bytes)
            .and_then(|()| fs::rename(&self.tmp_path, &self.path))
            .map_err(|e| IndexError::state_persist(format!("{}: {e}", self.path.display())))
    }

    fn clear(&self) -> IndexResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IndexError::Io(e)),
        }
    }
}
