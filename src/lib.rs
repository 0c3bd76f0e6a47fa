//! db-backup library
//!
//! Dumps a PostgreSQL or MySQL database to a timestamped file, optionally
//! zips it, keeps the newest N artifacts and reports the outcome through
//! Telegram and email.

pub mod artifact;
pub mod config;
pub mod database;
pub mod i18n;
pub mod managers;
pub mod notifiers;
pub mod utils;

// Re-export commonly used types
pub use artifact::BackupArtifact;
pub use config::{load_config, load_config_from_env, load_config_from_env_file, Config};
pub use database::{create_driver, DatabaseBackupError, DatabaseDriver};
pub use i18n::{Language, Translator};
pub use managers::backup::{BackupManager, BackupResult, BackupStage, FailureReason};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::notification::NotificationManager;
pub use notifiers::{NotificationError, Notifier};
