use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::i18n::Language;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Language of notification texts
    #[serde(default)]
    pub language: Language,

    /// Append the promotional footer to success messages
    #[serde(default = "default_true")]
    pub show_star_message: bool,

    pub database: DatabaseConfig,
    #[serde(default)]
    pub backup: BackupSettings,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Database connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(rename = "type", default)]
    pub kind: DatabaseKind,
    #[serde(default)]
    pub host: String,
    /// Falls back to the kind's default port when unset
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
}

impl DatabaseConfig {
    /// Port to connect to
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.kind.default_port())
    }
}

/// Supported database kinds
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    #[default]
    #[serde(alias = "postgres")]
    Postgresql,
    #[serde(alias = "mariadb")]
    Mysql,
}

/// Kind strings accepted in configuration, aliases included
pub const SUPPORTED_DATABASE_KINDS: &[(&str, DatabaseKind)] = &[
    ("postgresql", DatabaseKind::Postgresql),
    ("postgres", DatabaseKind::Postgresql),
    ("mysql", DatabaseKind::Mysql),
    ("mariadb", DatabaseKind::Mysql),
];

impl DatabaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Postgresql => "postgresql",
            DatabaseKind::Mysql => "mysql",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            DatabaseKind::Postgresql => 5432,
            DatabaseKind::Mysql => 3306,
        }
    }

    /// Name of the dump tool this kind shells out to
    pub fn dump_tool(&self) -> &'static str {
        match self {
            DatabaseKind::Postgresql => "pg_dump",
            DatabaseKind::Mysql => "mysqldump",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a kind string outside [`SUPPORTED_DATABASE_KINDS`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported database type: {0}. Supported types: postgresql, postgres, mysql, mariadb")]
pub struct UnknownDatabaseKind(pub String);

impl FromStr for DatabaseKind {
    type Err = UnknownDatabaseKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SUPPORTED_DATABASE_KINDS
            .iter()
            .find(|(name, _)| *name == wanted)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| UnknownDatabaseKind(s.to_string()))
    }
}

/// Local backup settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupSettings {
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Number of artifacts kept after a run
    #[serde(default = "default_retention_count")]
    pub retention_count: usize,

    #[serde(default)]
    pub compression: CompressionKind,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            retention_count: default_retention_count(),
            compression: CompressionKind::default(),
        }
    }
}

/// Compression applied to a finished dump
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CompressionKind {
    None,
    #[default]
    Zip,
    /// Anything else; treated like `none` at compression time
    #[serde(other)]
    Unsupported,
}

impl CompressionKind {
    /// Lenient parse: unknown names map to [`CompressionKind::Unsupported`]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "" | "none" => CompressionKind::None,
            "zip" => CompressionKind::Zip,
            _ => CompressionKind::Unsupported,
        }
    }

    /// Extension of the produced archive
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            CompressionKind::Zip => Some("zip"),
            CompressionKind::None | CompressionKind::Unsupported => None,
        }
    }
}

/// Telegram bot channel
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

/// SMTP email channel
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub from_email: String,
    #[serde(default)]
    pub to_email: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: String::new(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_email: String::new(),
            to_email: String::new(),
        }
    }
}

/// Schedule consumed by cron, not by the backup run itself
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { cron: default_cron() }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file; console only when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_log_max_files")]
    pub max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            max_files: default_log_max_files(),
        }
    }
}

// Default value functions

fn default_true() -> bool { true }
fn default_backup_dir() -> PathBuf { PathBuf::from("/backups") }
fn default_retention_count() -> usize { 3 }
fn default_smtp_port() -> u16 { 587 }
fn default_cron() -> String { "0 3 * * *".to_string() }
fn default_log_level() -> String { "INFO".to_string() }
fn default_log_max_files() -> u32 { 10 }
