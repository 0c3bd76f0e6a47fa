//! File-based locking to prevent concurrent runs against one backup directory

use fd_lock::RwLock;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Backup directory {0:?} is already in use by another run (lock held)")]
    Busy(PathBuf),

    #[error("Failed to prepare lock for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Run `f` while holding an exclusive, non-blocking lock on `directory`
///
/// The directory is created if needed. The lock file lives in the temp dir so
/// nothing extra appears next to the backups, and it is never removed.
pub fn with_directory_lock<T>(directory: &Path, f: impl FnOnce() -> T) -> Result<T, LockError> {
    let io_err = |source| LockError::Io {
        path: directory.to_path_buf(),
        source,
    };

    fs::create_dir_all(directory).map_err(io_err)?;
    let canonical = directory.canonicalize().map_err(io_err)?;
    let lock_path = lock_path(&canonical);

    debug!("Attempting to acquire lock: {:?}", lock_path);

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(io_err)?;

    let mut lock = RwLock::new(file);
    let result = {
        let _guard = lock
            .try_write()
            .map_err(|_| LockError::Busy(canonical.clone()))?;
        info!("Acquired backup lock for directory: {:?}", canonical);
        f()
    };

    // The file stays: unlinking it would let a waiter holding the old inode
    // and a newcomer creating a fresh one both win the lock
    drop(lock);
    info!("Released backup lock: {:?}", lock_path);

    Ok(result)
}

/// Lock file path for a directory
fn lock_path(directory: &Path) -> PathBuf {
    let key: String = directory
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    std::env::temp_dir().join(format!("db-backup-{}.lock", key.trim_matches('_')))
}
