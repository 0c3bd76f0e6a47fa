//! Backup artifacts and the size/duration formatting used in messages

use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix shared by every artifact file name
pub const ARTIFACT_PREFIX: &str = "backup_";

/// Extension of a raw dump
pub const RAW_EXTENSION: &str = "sql";

/// Timestamp layout embedded in artifact names (one-second resolution)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A dump file on disk, raw or compressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
}

impl BackupArtifact {
    /// Measure an existing file
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        Ok(Self {
            path,
            size_bytes: metadata.len(),
            modified: DateTime::<Local>::from(metadata.modified()?),
        })
    }

    /// File name without directory
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.size_bytes)
    }
}

/// `backup_<database>_<YYYYMMDD_HHMMSS>.<extension>`
///
/// Two dumps of the same database started within the same second get the same
/// name; callers refuse to overwrite instead of disambiguating.
pub fn artifact_file_name(database: &str, at: &DateTime<Local>, extension: &str) -> String {
    format!(
        "{}{}_{}.{}",
        ARTIFACT_PREFIX,
        database,
        at.format(TIMESTAMP_FORMAT),
        extension
    )
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Format duration in compact form: `12.3s`, `4.5m` or `1.2h`
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs_f64();
    if seconds < 60.0 {
        format!("{:.1}s", seconds)
    } else if seconds < 3600.0 {
        format!("{:.1}m", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / 3600.0)
    }
}

/// Format a byte count with a binary unit
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} TB", size)
}
