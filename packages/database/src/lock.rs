//! Cross-process writer lock for a snapshot.
//!
//! The server, `ingest` and `add` may all run at once against the same
//! data directory. Every read-modify-write of the snapshot happens while
//! holding an exclusive advisory lock on a sibling `<snapshot>.lock` file,
//! so at most one process writes the cache at a time.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;

use crate::DbError;

/// Held exclusive lock. Released when dropped (closing the file releases
/// the OS lock).
#[derive(Debug)]
pub struct SnapshotLock {
    _file: File,
    path: PathBuf,
}

impl SnapshotLock {
    /// Blocks until the exclusive lock on `path` is acquired, creating the
    /// lock file and its directory if needed.
    ///
    /// The lock is per open file, so a second [`SnapshotLock`] on the same
    /// path blocks even inside the same process.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the lock file cannot be opened or locked.
    pub fn acquire(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            crate::paths::ensure_dir(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;

        log::debug!("Waiting for cache lock {}", path.display());
        FileExt::lock_exclusive(&file)?;
        log::debug!("Acquired cache lock {}", path.display());

        Ok(Self {
            _file: file,
            path: path.to_path_buf(),
        })
    }

    /// Async variant of [`SnapshotLock::acquire`]; waits on the blocking
    /// pool so the runtime keeps serving other tasks.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the lock cannot be taken or the blocking
    /// task fails.
    pub async fn acquire_async(path: PathBuf) -> Result<Self, DbError> {
        tokio::task::spawn_blocking(move || Self::acquire(&path))
            .await
            .map_err(std::io::Error::other)?
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
