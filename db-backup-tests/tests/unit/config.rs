//! Unit tests for configuration loading and validation
//!
//! These tests verify the TOML and environment-file sources and the
//! validation rules they share.

use db_backup::config::{
    load_config, load_config_from_env_file, CompressionKind, ConfigError, DatabaseKind,
};
use db_backup::i18n::Language;
use serial_test::serial;
use test_utils::{ConfigBuilder, ResultAssertions, TestContext};

const ENV_KEYS: &[&str] = &[
    "DB_TYPE",
    "DB_HOST",
    "DB_PORT",
    "DB_USER",
    "DB_PASSWORD",
    "DB_DATABASE",
    "BACKUP_DIR",
    "BACKUP_RETENTION_COUNT",
    "BACKUP_COMPRESSION",
    "TELEGRAM_ENABLED",
    "TELEGRAM_BOT_TOKEN",
    "TELEGRAM_CHAT_ID",
    "EMAIL_ENABLED",
    "LANGUAGE",
    "SHOW_STAR_MESSAGE",
];

/// Removes the configuration keys from the process environment on drop
struct EnvGuard;

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_loading_valid() {
    let (path, config, _temp_dir) = ConfigBuilder::postgres("orders")
        .with_retention(7)
        .with_compression(CompressionKind::Zip)
        .write_toml();

    let loaded = load_config(&path).assert_ok();

    assert_eq!(loaded.database.database, "orders");
    assert_eq!(loaded.backup.retention_count, 7);
    assert_eq!(loaded.backup.compression, CompressionKind::Zip);
    assert_eq!(loaded.backup.backup_dir, config.backup.backup_dir);
}

#[test]
fn test_config_loading_invalid_toml() {
    let ctx = TestContext::new();
    let path = ctx.create_file("config.toml", "this is not valid toml [[[");

    load_config(&path).assert_err_contains("Failed to parse config file");
}

#[test]
fn test_config_loading_missing_file() {
    let ctx = TestContext::new();
    load_config(ctx.temp_dir().join("absent.toml")).assert_err_contains("Failed to read config file");
}

#[test]
fn test_missing_database_fields_reported_together() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "config.toml",
        r#"
[database]
type = "postgres"
host = "db1"
"#,
    );

    let err = load_config(&path).unwrap_err();
    match err {
        ConfigError::MissingFields(fields) => assert_eq!(
            fields,
            vec!["database.user", "database.password", "database.database"]
        ),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unknown_database_type_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "config.toml",
        r#"
[database]
type = "oracle"
host = "db1"
user = "u"
password = "p"
database = "d"
"#,
    );

    assert!(load_config(&path).is_err());
}

#[test]
fn test_enabled_telegram_without_token_rejected() {
    let ctx = TestContext::new();
    let path = ctx.create_file(
        "config.toml",
        r#"
[database]
host = "db1"
user = "u"
password = "p"
database = "d"

[telegram]
enabled = true
chat_id = "42"
"#,
    );

    load_config(&path).assert_err_contains("telegram.bot_token");
}

#[test]
#[serial]
fn test_env_file_source() {
    let _guard = EnvGuard;
    let ctx = TestContext::new();
    let env_file = ctx.create_file(
        ".env",
        "DB_TYPE=mariadb\n\
         DB_HOST=mysql.internal\n\
         DB_USER=root\n\
         DB_PASSWORD=pw\n\
         DB_DATABASE=shop\n\
         BACKUP_RETENTION_COUNT=5\n\
         BACKUP_COMPRESSION=none\n\
         LANGUAGE=fa\n\
         SHOW_STAR_MESSAGE=False\n",
    );

    let config = load_config_from_env_file(&env_file).assert_ok();

    assert_eq!(config.database.kind, DatabaseKind::Mysql);
    assert_eq!(config.database.effective_port(), 3306);
    assert_eq!(config.backup.retention_count, 5);
    assert_eq!(config.backup.compression, CompressionKind::None);
    assert_eq!(config.language, Language::Fa);
    assert!(!config.show_star_message);
    assert!(!config.telegram.enabled);
}

#[test]
#[serial]
fn test_env_file_invalid_number() {
    let _guard = EnvGuard;
    let ctx = TestContext::new();
    let env_file = ctx.create_file(
        ".env",
        "DB_HOST=h\nDB_USER=u\nDB_PASSWORD=p\nDB_DATABASE=d\nDB_PORT=not-a-port\n",
    );

    load_config_from_env_file(&env_file).assert_err_contains("DB_PORT");
}

#[test]
#[serial]
fn test_env_file_missing() {
    let _guard = EnvGuard;
    let ctx = TestContext::new();

    let err = load_config_from_env_file(ctx.temp_dir().join("missing.env")).unwrap_err();
    assert!(matches!(err, ConfigError::EnvFileError(_)));
}
