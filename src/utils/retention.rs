//! Count-based retention of backup artifacts
//!
//! Every driver prunes through the same [`RetentionManager`], so the rule is
//! identical for all database kinds: keep the `n` most recently modified
//! `backup_*.{sql,zip}` files of the backup directory and delete the rest.
//! Files with equal modification times are ordered arbitrarily.

use crate::artifact::{ARTIFACT_PREFIX, RAW_EXTENSION};
use crate::config::CompressionKind;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, error, info};

/// An artifact found while scanning the backup directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionCandidate {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct RetentionManager {
    directory: PathBuf,
    extensions: Vec<&'static str>,
}

impl RetentionManager {
    /// Manage raw dumps and every archive format the compressor can produce
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        let mut extensions = vec![RAW_EXTENSION];
        extensions.extend(CompressionKind::Zip.extension());

        Self {
            directory: directory.into(),
            extensions,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Whether a file name follows the artifact naming convention
    pub fn is_artifact_name(&self, file_name: &str) -> bool {
        file_name.starts_with(ARTIFACT_PREFIX)
            && self
                .extensions
                .iter()
                .any(|ext| file_name.len() > ext.len() + 1 && file_name.ends_with(&format!(".{}", ext)))
    }

    /// Artifacts in the directory, newest first
    pub fn candidates(&self) -> io::Result<Vec<RetentionCandidate>> {
        let mut candidates: Vec<_> = fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| self.is_artifact_name(&entry.file_name().to_string_lossy()))
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                Some(RetentionCandidate {
                    path: entry.path(),
                    modified: metadata.modified().ok()?,
                    size_bytes: metadata.len(),
                })
            })
            .collect();

        // Sort by modification time (newest first)
        candidates.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(candidates)
    }

    /// Delete every artifact beyond the `keep` newest
    ///
    /// Files named in `protected` survive regardless of their rank. Failures are
    /// logged and skipped; returns how many files were removed.
    pub fn prune(&self, keep: usize, protected: &[&Path]) -> usize {
        info!("Cleaning up old backups, keeping {} most recent", keep);

        let candidates = match self.candidates() {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Error cleaning up old backups in {:?}: {}", self.directory, e);
                return 0;
            }
        };

        let protected_names: Vec<_> = protected.iter().filter_map(|p| p.file_name()).collect();
        let mut removed = 0;

        for candidate in candidates.into_iter().skip(keep) {
            let name = candidate.path.file_name();
            if name.is_some_and(|n| protected_names.contains(&n)) {
                debug!("Keeping protected backup file: {:?}", candidate.path);
                continue;
            }

            match fs::remove_file(&candidate.path) {
                Ok(()) => {
                    info!("Removed old backup file: {:?}", candidate.path);
                    removed += 1;
                }
                Err(e) => {
                    error!("Failed to remove old backup file {:?}: {}", candidate.path, e);
                }
            }
        }

        info!("Cleanup completed: removed {} old backup files", removed);
        removed
    }
}
