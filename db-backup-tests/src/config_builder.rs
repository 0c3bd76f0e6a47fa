//! Fluent API for building test configurations
//!
//! Provides a builder pattern for creating test configurations with sensible
//! defaults. The backup directory lives in a temp dir owned by the builder.

use db_backup::config::{
    BackupSettings, CompressionKind, Config, DatabaseConfig, DatabaseKind, EmailConfig,
    LoggingSettings, ScheduleConfig, TelegramConfig,
};
use db_backup::i18n::Language;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder for `kind` backing up `database` on `db.internal`
    pub fn new(kind: DatabaseKind, database: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backup_dir = temp_dir.path().join("backups");

        let config = Config {
            database: DatabaseConfig {
                kind,
                host: "db.internal".to_string(),
                port: None,
                user: "backup".to_string(),
                password: "s3cret".to_string(),
                database: database.to_string(),
            },
            backup: BackupSettings {
                backup_dir,
                retention_count: 3,
                compression: CompressionKind::None,
            },
            telegram: TelegramConfig::default(),
            email: EmailConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingSettings::default(),
            language: Language::En,
            show_star_message: false,
        };

        Self { temp_dir, config }
    }

    /// PostgreSQL database with defaults
    pub fn postgres(database: &str) -> Self {
        Self::new(DatabaseKind::Postgresql, database)
    }

    /// MySQL database with defaults
    pub fn mysql(database: &str) -> Self {
        Self::new(DatabaseKind::Mysql, database)
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.config.database.host = host.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.database.port = Some(port);
        self
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.config.database.user = user.to_string();
        self.config.database.password = password.to_string();
        self
    }

    pub fn with_retention(mut self, count: usize) -> Self {
        self.config.backup.retention_count = count;
        self
    }

    pub fn with_compression(mut self, compression: CompressionKind) -> Self {
        self.config.backup.compression = compression;
        self
    }

    /// Put backups somewhere other than the builder's temp dir
    pub fn with_backup_dir(mut self, path: &Path) -> Self {
        self.config.backup.backup_dir = path.to_path_buf();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.config.language = language;
        self
    }

    pub fn with_star_message(mut self, show: bool) -> Self {
        self.config.show_star_message = show;
        self
    }

    /// Enable Telegram with placeholder credentials
    pub fn with_telegram(mut self) -> Self {
        self.config.telegram = TelegramConfig {
            enabled: true,
            bot_token: "123456:test-token".to_string(),
            chat_id: "-100200300".to_string(),
        };
        self
    }

    /// Enable email with placeholder credentials
    pub fn with_email(mut self) -> Self {
        self.config.email = EmailConfig {
            enabled: true,
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "backup".to_string(),
            password: "mail-secret".to_string(),
            from_email: "backup@example.com".to_string(),
            to_email: "ops@example.com".to_string(),
        };
        self
    }

    /// Build the configuration (temp dir is dropped!)
    ///
    /// Warning: the backup directory will be deleted when this returns.
    /// Use `persist()` to keep it.
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and keep the temp directory alive
    pub fn persist(self) -> (Config, TempDir) {
        (self.config, self.temp_dir)
    }

    /// Write the configuration as TOML into the temp dir
    pub fn write_toml(self) -> (PathBuf, Config, TempDir) {
        let path = self.temp_dir.path().join("db-backup.toml");
        let content = toml::to_string_pretty(&self.config).expect("Failed to serialize config");
        fs::write(&path, content).expect("Failed to write config file");
        (path, self.config, self.temp_dir)
    }
}
