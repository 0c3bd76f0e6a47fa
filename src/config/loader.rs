use super::types::*;
use crate::i18n::Language;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to load environment file: {0}")]
    EnvFileError(#[from] dotenvy::Error),

    #[error("Missing required configuration values: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error(transparent)]
    UnsupportedDatabase(#[from] UnknownDatabaseKind),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Load and validate configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load an env file into the process environment, then read the configuration from it
pub fn load_config_from_env_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    dotenvy::from_path(path.as_ref())?;
    load_config_from_env()
}

/// Load and validate configuration from the process environment
pub fn load_config_from_env() -> Result<Config> {
    config_from_vars(std::env::vars())
}

/// Build and validate configuration from environment-style key/value pairs
///
/// Keys follow the deployment's `.env` conventions (`DB_HOST`, `BACKUP_DIR`, ...).
/// Unset keys take the same defaults as the TOML format.
pub fn config_from_vars<I, K, V>(vars: I) -> Result<Config>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let vars = EnvVars(
        vars.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    );

    let kind: DatabaseKind = vars.get("DB_TYPE").unwrap_or("postgresql").parse()?;

    let database = DatabaseConfig {
        kind,
        host: vars.string("DB_HOST"),
        port: vars.parsed("DB_PORT")?,
        user: vars.string("DB_USER"),
        password: vars.string("DB_PASSWORD"),
        database: vars.string("DB_DATABASE"),
    };

    let defaults = BackupSettings::default();
    let backup = BackupSettings {
        backup_dir: vars
            .get("BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.backup_dir),
        retention_count: vars
            .parsed("BACKUP_RETENTION_COUNT")?
            .unwrap_or(defaults.retention_count),
        compression: vars
            .get("BACKUP_COMPRESSION")
            .map(CompressionKind::parse)
            .unwrap_or(defaults.compression),
    };

    let telegram = TelegramConfig {
        enabled: vars.flag("TELEGRAM_ENABLED", false),
        bot_token: vars.string("TELEGRAM_BOT_TOKEN"),
        chat_id: vars.string("TELEGRAM_CHAT_ID"),
    };

    let email = EmailConfig {
        enabled: vars.flag("EMAIL_ENABLED", false),
        smtp_server: vars.string("EMAIL_SMTP_SERVER"),
        smtp_port: vars
            .parsed("EMAIL_SMTP_PORT")?
            .unwrap_or(EmailConfig::default().smtp_port),
        username: vars.string("EMAIL_USERNAME"),
        password: vars.string("EMAIL_PASSWORD"),
        from_email: vars.string("EMAIL_FROM"),
        to_email: vars.string("EMAIL_TO"),
    };

    let schedule = ScheduleConfig {
        cron: vars
            .get("CRON_SCHEDULE")
            .map(str::to_string)
            .unwrap_or_else(|| ScheduleConfig::default().cron),
    };

    let log_defaults = LoggingSettings::default();
    let logging = LoggingSettings {
        level: vars
            .get("LOG_LEVEL")
            .map(str::to_string)
            .unwrap_or(log_defaults.level),
        file: vars.get("LOG_FILE").map(PathBuf::from),
        max_files: log_defaults.max_files,
    };

    let config = Config {
        database,
        backup,
        telegram,
        email,
        schedule,
        logging,
        language: vars.get("LANGUAGE").map(Language::from_code).unwrap_or_default(),
        show_star_message: vars.flag("SHOW_STAR_MESSAGE", true),
    };

    validate_config(&config)?;
    Ok(config)
}

/// Validate the configuration
///
/// All missing mandatory fields are reported together.
pub fn validate_config(config: &Config) -> Result<()> {
    let mut missing = Vec::new();

    let db = &config.database;
    for (name, value) in [
        ("database.host", &db.host),
        ("database.user", &db.user),
        ("database.password", &db.password),
        ("database.database", &db.database),
    ] {
        if value.trim().is_empty() {
            missing.push(name.to_string());
        }
    }

    if config.telegram.enabled {
        missing.extend(config.telegram.missing_fields().into_iter().map(|f| format!("telegram.{}", f)));
    }

    if config.email.enabled {
        missing.extend(config.email.missing_fields().into_iter().map(|f| format!("email.{}", f)));
    }

    if !missing.is_empty() {
        return Err(ConfigError::MissingFields(missing));
    }

    // The name is embedded in the artifact file name inside a flat directory
    let name = config.database.database.trim();
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(ConfigError::InvalidValue {
            key: "database.database".to_string(),
            value: config.database.database.clone(),
        });
    }

    if config.backup.backup_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Backup directory must not be empty".to_string(),
        ));
    }

    // Validate cron schedule format (basic check)
    if !crate::utils::cron::is_valid_schedule(&config.schedule.cron) {
        return Err(ConfigError::ValidationError(format!(
            "Invalid cron schedule format (expected 5 fields): {}",
            config.schedule.cron
        )));
    }

    if crate::managers::logging::parse_level(&config.logging.level).is_none() {
        return Err(ConfigError::InvalidValue {
            key: "logging.level".to_string(),
            value: config.logging.level.clone(),
        });
    }

    Ok(())
}

impl TelegramConfig {
    /// Mandatory fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bot_token.trim().is_empty() {
            missing.push("bot_token");
        }
        if self.chat_id.trim().is_empty() {
            missing.push("chat_id");
        }
        missing
    }
}

impl EmailConfig {
    /// Mandatory fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("smtp_server", &self.smtp_server),
            ("username", &self.username),
            ("password", &self.password),
            ("from_email", &self.from_email),
            ("to_email", &self.to_email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Snapshot of environment-style variables
struct EnvVars(HashMap<String, String>);

impl EnvVars {
    /// Value of a key; empty values count as unset
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(default)
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}
