//! CBOR serialization for registry snapshots.
//!
//! - CBOR via `ciborium`
//! - Deterministic output for identical registries
//! - Schema evolution through `#[serde(default)]`
//! - Snapshot files are replaced atomically (unique temp file, then rename)
//! - Writers across processes serialize on an advisory `<snapshot>.lock`

use crate::registry::RegistrySnapshot;
use fs2::FileExt;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Serialization errors.
#[derive(Debug, Error)]
pub enum SerializationError {
    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    Encode(String),

    /// CBOR decoding failed.
    #[error("CBOR decoding failed: {0}")]
    Decode(String),

    /// Reading or writing the snapshot file failed.
    #[error("Snapshot file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serialize to CBOR bytes.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| SerializationError::Encode(format!("{:?}", e)))?;
    Ok(bytes)
}

/// Deserialize from CBOR bytes.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    ciborium::from_reader(bytes).map_err(|e| SerializationError::Decode(format!("{:?}", e)))
}

/// Write a registry snapshot to `path`, replacing any previous one.
pub fn save_snapshot(path: &Path, snapshot: &RegistrySnapshot) -> Result<(), SerializationError> {
    let bytes = to_cbor(snapshot)?;
    let io_err = |source| SerializationError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(&bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    tracing::debug!(path = %path.display(), topics = snapshot.topics.len(), "snapshot saved");
    Ok(())
}

/// Exclusive lock over a snapshot file, held until dropped.
///
/// Advisory only: it orders processes that all take it before reading the
/// snapshot and release it after writing.
#[derive(Debug)]
pub struct SnapshotLock {
    _file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Block until the exclusive lock for the snapshot at `path` is acquired.
pub fn lock_snapshot(path: &Path) -> Result<SnapshotLock, SerializationError> {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    let lock_path = PathBuf::from(name);
    let io_err = |source| SerializationError::Io {
        path: lock_path.clone(),
        source,
    };

    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(io_err)?;
    file.lock_exclusive().map_err(io_err)?;

    tracing::debug!(path = %lock_path.display(), "snapshot lock acquired");
    Ok(SnapshotLock {
        _file: file,
        path: lock_path,
    })
}

/// Read a registry snapshot. Returns `None` if the file does not exist.
pub fn load_snapshot(path: &Path) -> Result<Option<RegistrySnapshot>, SerializationError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SerializationError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let snapshot: RegistrySnapshot = from_cbor(&bytes)?;
    tracing::debug!(path = %path.display(), topics = snapshot.topics.len(), "snapshot loaded");
    Ok(Some(snapshot))
}
