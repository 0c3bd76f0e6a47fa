//! Database backup drivers
//!
//! A driver knows how to invoke one vendor's dump tool. The dump/verify/prune
//! lifecycle is shared and lives in the trait's provided methods; variants only
//! describe their command line and environment.

pub mod mysql;
pub mod postgres;

pub use mysql::MysqlDriver;
pub use postgres::PostgresDriver;

use crate::artifact::{artifact_file_name, BackupArtifact, RAW_EXTENSION};
use crate::config::{Config, DatabaseConfig, DatabaseKind};
use crate::utils::command::CommandError;
use crate::utils::executor::CommandExecutor;
use crate::utils::retention::RetentionManager;
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum DatabaseBackupError {
    #[error("{tool} exited with status {}", .exit_code.map_or_else(|| "unknown".to_string(), |c| c.to_string()))]
    DumpFailed {
        tool: &'static str,
        exit_code: Option<i32>,
    },

    #[error("Could not run {tool}: {source}")]
    Command {
        tool: &'static str,
        #[source]
        source: CommandError,
    },

    #[error("Backup file already exists, refusing to overwrite: {0:?}")]
    ArtifactExists(PathBuf),

    #[error("Backup file was not created: {0:?}")]
    ArtifactMissing(PathBuf),

    #[error("Backup file is empty: {0:?}")]
    ArtifactEmpty(PathBuf),

    #[error("Failed to prepare backup directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of "now" for artifact names
pub type Clock = fn() -> DateTime<Local>;

fn system_clock() -> DateTime<Local> {
    Local::now()
}

/// Everything a driver needs besides its own command line
#[derive(Clone)]
pub struct DriverContext {
    pub database: DatabaseConfig,
    pub backup_dir: PathBuf,
    pub executor: Arc<dyn CommandExecutor>,
    pub clock: Clock,
}

impl DriverContext {
    pub fn new(
        database: DatabaseConfig,
        backup_dir: impl Into<PathBuf>,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            database,
            backup_dir: backup_dir.into(),
            executor,
            clock: system_clock,
        }
    }

    /// Replace the clock used for artifact names
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

/// Vendor-specific dump driver
pub trait DatabaseDriver {
    fn context(&self) -> &DriverContext;

    fn kind(&self) -> DatabaseKind;

    /// Full argument vector, program first; deterministic for a given config
    fn build_dump_command(&self) -> Vec<String>;

    /// Extra environment for the dump process
    fn dump_environment(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Command line as it may appear in logs
    fn display_command(&self) -> String {
        self.build_dump_command().join(" ")
    }

    /// Where the next dump will be written
    fn next_artifact_path(&self) -> PathBuf {
        let ctx = self.context();
        let name = artifact_file_name(&ctx.database.database, &(ctx.clock)(), RAW_EXTENSION);
        ctx.backup_dir.join(name)
    }

    /// Run the dump tool into a new timestamped file
    ///
    /// On any failure the partial output is removed, so no file from this
    /// attempt remains.
    fn dump(&self) -> Result<PathBuf, DatabaseBackupError> {
        let ctx = self.context();
        let tool = self.kind().dump_tool();

        fs::create_dir_all(&ctx.backup_dir).map_err(|source| DatabaseBackupError::Directory {
            path: ctx.backup_dir.clone(),
            source,
        })?;

        let path = self.next_artifact_path();
        if path.exists() {
            return Err(DatabaseBackupError::ArtifactExists(path));
        }

        info!("Starting {} backup to {:?}", self.kind(), path);
        info!("Running command: {}", self.display_command());

        let result = ctx.executor.run_command(
            &self.build_dump_command(),
            &self.dump_environment(),
            Some(&path),
        );

        let failure = match result {
            Ok(output) if output.success => return Ok(path),
            Ok(output) => DatabaseBackupError::DumpFailed {
                tool,
                exit_code: output.exit_code,
            },
            Err(CommandError::OutputFile { source, .. })
                if source.kind() == io::ErrorKind::AlreadyExists =>
            {
                // Lost a race for the same name; the file is not ours to remove
                return Err(DatabaseBackupError::ArtifactExists(path));
            }
            Err(source) => DatabaseBackupError::Command { tool, source },
        };

        remove_partial(&path);
        Err(failure)
    }

    /// Check that a dump produced a non-empty file
    fn verify(&self, path: &Path) -> Result<BackupArtifact, DatabaseBackupError> {
        let artifact = match BackupArtifact::from_path(path) {
            Ok(artifact) => artifact,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(DatabaseBackupError::ArtifactMissing(path.to_path_buf()));
            }
            Err(e) => {
                warn!("Could not inspect backup file {:?}: {}", path, e);
                return Err(DatabaseBackupError::ArtifactMissing(path.to_path_buf()));
            }
        };

        if artifact.size_bytes == 0 {
            remove_partial(path);
            return Err(DatabaseBackupError::ArtifactEmpty(path.to_path_buf()));
        }

        info!("{} backup completed successfully: {:?}", self.kind(), path);
        Ok(artifact)
    }

    /// Dump and verify
    fn backup(&self) -> Result<BackupArtifact, DatabaseBackupError> {
        let path = self.dump()?;
        self.verify(&path)
    }

    /// Retention over this driver's backup directory
    fn retention(&self) -> RetentionManager {
        RetentionManager::new(&self.context().backup_dir)
    }

    /// Keep the `retention_count` newest artifacts; best effort
    fn cleanup_old_backups(&self, retention_count: usize) -> usize {
        self.retention().prune(retention_count, &[])
    }
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => info!("Removed incomplete backup file: {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove incomplete backup file {:?}: {}", path, e),
    }
}

/// Select the driver for the configured database kind
pub fn create_driver(
    config: &Config,
    executor: Arc<dyn CommandExecutor>,
) -> Box<dyn DatabaseDriver> {
    let context = DriverContext::new(
        config.database.clone(),
        crate::config::expand_tilde(&config.backup.backup_dir),
        executor,
    );

    match config.database.kind {
        DatabaseKind::Postgresql => Box::new(PostgresDriver::new(context)),
        DatabaseKind::Mysql => Box::new(MysqlDriver::new(context)),
    }
}
