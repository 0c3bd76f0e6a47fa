//! Test context and harness
//!
//! Owns a configuration and its temp directory, and wires a backup manager
//! from mocks so scenarios read like the real run.

use crate::config_builder::ConfigBuilder;
use crate::fixtures::fixed_clock;
use db_backup::config::{Config, DatabaseKind};
use db_backup::database::{DatabaseDriver, DriverContext, MysqlDriver, PostgresDriver};
use db_backup::i18n::Translator;
use db_backup::managers::backup::BackupManager;
use db_backup::managers::notification::NotificationManager;
use db_backup::notifiers::Notifier;
use db_backup::utils::executor::mock::MockExecutor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test context that manages test resources and provides common utilities
pub struct TestContext {
    /// Temporary directory for test files
    temp_dir: TempDir,
    /// The test configuration
    config: Config,
}

impl TestContext {
    /// PostgreSQL `orders` database with default settings
    pub fn new() -> Self {
        Self::from_builder(ConfigBuilder::postgres("orders"))
    }

    /// Create a test context from a ConfigBuilder
    pub fn from_builder(builder: ConfigBuilder) -> Self {
        let (config, temp_dir) = builder.persist();
        Self { temp_dir, config }
    }

    /// Get the temporary directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backup_dir(&self) -> &Path {
        &self.config.backup.backup_dir
    }

    /// Driver for the configured kind, running through `executor` on the pinned clock
    pub fn driver(&self, executor: MockExecutor) -> Box<dyn DatabaseDriver> {
        let context = DriverContext::new(
            self.config.database.clone(),
            self.config.backup.backup_dir.clone(),
            Arc::new(executor),
        )
        .with_clock(fixed_clock);

        match self.config.database.kind {
            DatabaseKind::Postgresql => Box::new(PostgresDriver::new(context)),
            DatabaseKind::Mysql => Box::new(MysqlDriver::new(context)),
        }
    }

    /// Backup manager over `executor` with the given channels
    pub fn manager(&self, executor: MockExecutor, notifiers: Vec<Box<dyn Notifier>>) -> BackupManager {
        BackupManager::new(
            self.config.clone(),
            self.driver(executor),
            NotificationManager::new(notifiers),
            Translator::new(self.config.language),
        )
    }

    /// Create a file in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Sorted names of the files in the backup directory
    pub fn backup_files(&self) -> Vec<String> {
        crate::fixtures::file_names(self.backup_dir())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait for assertion helpers
pub trait ResultAssertions<T> {
    /// Assert that the result is Ok and return the value
    fn assert_ok(self) -> T;

    /// Assert that the result is Err and the error message contains the given string
    fn assert_err_contains(self, needle: &str);
}

impl<T: std::fmt::Debug, E: std::fmt::Display> ResultAssertions<T> for Result<T, E> {
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {}", e),
        }
    }

    fn assert_err_contains(self, needle: &str) {
        match self {
            Ok(v) => panic!("Expected Err containing '{}', got Ok: {:?}", needle, v),
            Err(e) => {
                let err_msg = e.to_string();
                assert!(
                    err_msg.contains(needle),
                    "Error '{}' does not contain '{}'",
                    err_msg,
                    needle
                );
            }
        }
    }
}

/// Extension trait for Option assertions
pub trait OptionAssertions<T> {
    /// Assert that the option is Some and return the value
    fn assert_some(self) -> T;

    /// Assert that the option is None
    fn assert_none(self);
}

impl<T: std::fmt::Debug> OptionAssertions<T> for Option<T> {
    fn assert_some(self) -> T {
        match self {
            Some(v) => v,
            None => panic!("Expected Some, got None"),
        }
    }

    fn assert_none(self) {
        if let Some(v) = self {
            panic!("Expected None, got Some: {:?}", v);
        }
    }
}
