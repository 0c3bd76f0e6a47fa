//! Backup manager - orchestrates one backup run
//!
//! A run walks `Idle → Dumping → Verifying → Compressing → Pruning →
//! Notifying → Done`. Compressing is skipped when compression is off. A dump
//! or verify failure jumps to `Failed → Notifying → Done` without touching
//! compression or retention.

use crate::artifact::{format_duration, BackupArtifact};
use crate::config::{CompressionKind, Config};
use crate::database::{create_driver, DatabaseBackupError, DatabaseDriver};
use crate::i18n::{MessageKey, Translator};
use crate::managers::notification::{panic_message, DeliveryReport, NotificationManager};
use crate::notifiers::NotificationError;
use crate::utils::compress::compress_file;
use crate::utils::executor::RealExecutor;
use crate::utils::locker::{with_directory_lock, LockError};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Stages of a run, in the order they were entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStage {
    Idle,
    Dumping,
    Verifying,
    Compressing,
    Pruning,
    Failed,
    Notifying,
    Done,
}

/// Why a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The dump tool failed or produced no usable file
    Database,
    /// Another run holds the backup directory lock
    DirectoryBusy,
    /// Anything else, panics included
    Unexpected,
}

/// Outcome of [`BackupManager::run_backup`]
#[derive(Debug, Clone)]
pub enum BackupResult {
    Success {
        artifact: BackupArtifact,
        duration: Duration,
        message: String,
    },
    Failure {
        reason: FailureReason,
        message: String,
    },
}

impl BackupResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BackupResult::Success { .. })
    }

    /// The text that was sent to the notification channels
    pub fn message(&self) -> &str {
        match self {
            BackupResult::Success { message, .. } | BackupResult::Failure { message, .. } => message,
        }
    }
}

enum RunError {
    Database(DatabaseBackupError),
    Busy(String),
    Unexpected(String),
}

pub struct BackupManager {
    config: Config,
    driver: Box<dyn DatabaseDriver>,
    notifications: NotificationManager,
    translator: Translator,
    stages: Vec<BackupStage>,
    deliveries: Vec<DeliveryReport>,
}

impl BackupManager {
    pub fn new(
        config: Config,
        driver: Box<dyn DatabaseDriver>,
        notifications: NotificationManager,
        translator: Translator,
    ) -> Self {
        Self {
            config,
            driver,
            notifications,
            translator,
            stages: vec![BackupStage::Idle],
            deliveries: Vec::new(),
        }
    }

    /// Wire the real dump tools and the configured channels
    pub fn from_config(config: Config) -> Result<Self, NotificationError> {
        let translator = Translator::new(config.language);
        let driver = create_driver(&config, Arc::new(RealExecutor::new()));
        let notifications = NotificationManager::from_config(&config, translator)?;
        Ok(Self::new(config, driver, notifications, translator))
    }

    /// Stages entered by the last run
    pub fn stage_history(&self) -> &[BackupStage] {
        &self.stages
    }

    /// Per-channel results of the last run's notifications
    pub fn deliveries(&self) -> &[DeliveryReport] {
        &self.deliveries
    }

    fn enter(&mut self, stage: BackupStage) {
        self.stages.push(stage);
    }

    /// Run one complete backup
    ///
    /// Never panics and never returns an error: every failure becomes a
    /// [`BackupResult::Failure`] after the failure notification was sent.
    pub fn run_backup(&mut self) -> BackupResult {
        self.stages = vec![BackupStage::Idle];
        self.deliveries.clear();

        let start = Instant::now();
        info!("Starting database backup process");
        info!("Database type: {}", self.driver.kind());

        let backup_dir = self.driver.context().backup_dir.clone();
        let outcome = with_directory_lock(&backup_dir, || {
            panic::catch_unwind(AssertUnwindSafe(|| self.produce_artifact()))
        });

        let outcome = match outcome {
            Ok(Ok(Ok(artifact))) => Ok(artifact),
            Ok(Ok(Err(e))) => Err(RunError::Database(e)),
            Ok(Err(payload)) => Err(RunError::Unexpected(panic_message(payload.as_ref()))),
            Err(LockError::Busy(path)) => Err(RunError::Busy(path.display().to_string())),
            Err(e) => Err(RunError::Unexpected(e.to_string())),
        };

        let result = match outcome {
            Ok(artifact) => {
                let duration = start.elapsed();
                let message = self.success_message(&artifact, duration);

                self.enter(BackupStage::Notifying);
                self.deliveries = self.notifications.send_success(&artifact.path, &message);

                info!(
                    "Backup process completed successfully in {}",
                    format_duration(duration)
                );
                BackupResult::Success {
                    artifact,
                    duration,
                    message,
                }
            }
            Err(e) => {
                self.enter(BackupStage::Failed);
                let (reason, message) = self.failure_message(e);
                error!("{}", message);

                self.enter(BackupStage::Notifying);
                self.deliveries = self.notifications.send_failure(&message);
                BackupResult::Failure { reason, message }
            }
        };

        self.enter(BackupStage::Done);
        result
    }

    /// Dump, verify, compress and prune; the returned artifact is the one reported
    fn produce_artifact(&mut self) -> Result<BackupArtifact, DatabaseBackupError> {
        self.enter(BackupStage::Dumping);
        let path = self.driver.dump()?;

        self.enter(BackupStage::Verifying);
        let raw = self.driver.verify(&path)?;
        info!("Backup created: {:?} ({:.1} MB)", raw.path, raw.size_mb());

        let compression = self.config.backup.compression;
        let artifact = if compression == CompressionKind::None {
            raw
        } else {
            self.enter(BackupStage::Compressing);
            self.compress(raw, compression)
        };

        self.enter(BackupStage::Pruning);
        let protected: [&Path; 1] = [&artifact.path];
        self.driver
            .retention()
            .prune(self.config.backup.retention_count, &protected);

        Ok(artifact)
    }

    fn compress(&self, raw: BackupArtifact, kind: CompressionKind) -> BackupArtifact {
        let Some(archive) = compress_file(&raw.path, kind) else {
            return raw;
        };

        match BackupArtifact::from_path(&archive) {
            Ok(compressed) => {
                info!(
                    "Backup compressed: {:?} ({:.1} MB)",
                    compressed.path,
                    compressed.size_mb()
                );
                compressed
            }
            Err(e) => {
                warn!("Could not inspect archive {:?}: {}; reporting the raw dump", archive, e);
                raw
            }
        }
    }

    fn success_message(&self, artifact: &BackupArtifact, duration: Duration) -> String {
        let t = &self.translator;
        let db = &self.driver.context().database;
        let timestamp = (self.driver.context().clock)().format("%Y-%m-%d %H:%M:%S");

        let mut message = format!(
            "\u{2705} {}\n\n\
             {}:\n- {}: {}\n- {}: {}\n- {}: {}\n\n\
             {}:\n- {}: {}\n- {}: {:.1} MB\n- {}: {}\n- {}: {}",
            t.text(MessageKey::BackupCompleted),
            t.text(MessageKey::DatabaseDetails),
            t.text(MessageKey::DatabaseType),
            db.kind,
            t.text(MessageKey::DatabaseHost),
            db.host,
            t.text(MessageKey::DatabaseName),
            db.database,
            t.text(MessageKey::BackupDetails),
            t.text(MessageKey::BackupFile),
            artifact.file_name(),
            t.text(MessageKey::BackupSize),
            artifact.size_mb(),
            t.text(MessageKey::BackupDuration),
            format_duration(duration),
            t.text(MessageKey::BackupTimestamp),
            timestamp,
        );

        if self.config.show_star_message {
            message.push_str("\n\n");
            message.push_str(t.text(MessageKey::StarMessage));
        }
        message
    }

    fn failure_message(&self, error: RunError) -> (FailureReason, String) {
        let t = &self.translator;
        match error {
            RunError::Database(e) => (
                FailureReason::Database,
                format!("{}: {}", t.text(MessageKey::DatabaseBackupFailed), e),
            ),
            RunError::Busy(dir) => (
                FailureReason::DirectoryBusy,
                format!("{}: {}", t.text(MessageKey::DirectoryBusy), dir),
            ),
            RunError::Unexpected(e) => (
                FailureReason::Unexpected,
                format!("{}: {}", t.text(MessageKey::UnexpectedError), e),
            ),
        }
    }
}
