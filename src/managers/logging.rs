//! Logging setup
//!
//! Provides dual-output logging:
//! - Console (stderr): configured level, concise format
//! - File (optional): same level, daily rotation, old files pruned

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{expand_tilde, LoggingSettings};

/// Parse a level name as written in configuration
///
/// Case-insensitive; `warning` and `critical` are accepted for compatibility
/// with common logging vocabularies.
pub fn parse_level(name: &str) -> Option<Level> {
    match name.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" | "critical" => Some(Level::ERROR),
        _ => None,
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    /// Log file; console only when `None`
    pub file: Option<PathBuf>,
    /// Maximum number of rotated log files to keep
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file: None,
            max_files: 10,
        }
    }
}

impl LoggingConfig {
    /// Create from the `[logging]` section; unknown levels fall back to INFO
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            level: parse_level(&settings.level).unwrap_or(Level::INFO),
            file: settings.file.as_deref().map(expand_tilde),
            max_files: settings.max_files,
        }
    }
}

/// Initialize logging with console and optional file outputs
///
/// Returns a guard that must be kept alive for the duration of the program.
/// When the guard is dropped, any remaining logs are flushed to disk.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let (subscriber, file_guard, log_location) = build_subscriber(config)?;

    subscriber
        .try_init()
        .context("Failed to initialize logging")?;

    if let Some((log_dir, prefix)) = log_location {
        cleanup_old_logs(&log_dir, &prefix, config.max_files)?;
    }

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// Console layer plus the file layer when a log file is configured
///
/// Also returns the file writer's guard and the log directory and file prefix.
fn build_subscriber(
    config: &LoggingConfig,
) -> Result<(
    impl Subscriber + Send + Sync + 'static,
    Option<WorkerGuard>,
    Option<(PathBuf, String)>,
)> {
    let (file_layer, file_guard, log_location) = match &config.file {
        Some(file) => {
            let (log_dir, prefix) = split_log_path(file)?;
            fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, &prefix);
            let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No colors in file
                .with_target(true)
                .with_level(true)
                .with_span_events(FmtSpan::NONE)
                .with_filter(level_filter(config.level));

            (Some(file_layer), Some(file_guard), Some((log_dir, prefix)))
        }
        None => (None, None, None),
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .with_level(true)
        .with_span_events(FmtSpan::NONE)
        .with_filter(level_filter(config.level));

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer);

    Ok((subscriber, file_guard, log_location))
}

/// Initialize simple console-only logging (for when config isn't available)
pub fn init_console_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init();
}

/// `RUST_LOG` wins over the configured level
fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Directory and file-name prefix for the rolling appender
fn split_log_path(file: &Path) -> Result<(PathBuf, String)> {
    let prefix = file
        .file_name()
        .with_context(|| format!("Log file path has no file name: {:?}", file))?
        .to_string_lossy()
        .into_owned();

    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, prefix))
}

/// Cleanup old log files, keeping only the most recent N files
fn cleanup_old_logs(log_dir: &Path, prefix: &str, max_files: u32) -> Result<()> {
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .collect();

    // Newest first
    log_files.sort_by(|a, b| {
        let a_time = a.metadata().and_then(|m| m.modified()).ok();
        let b_time = b.metadata().and_then(|m| m.modified()).ok();
        b_time.cmp(&a_time)
    });

    for file in log_files.into_iter().skip(max_files as usize) {
        if let Err(e) = fs::remove_file(file.path()) {
            tracing::warn!("Failed to remove old log file {:?}: {}", file.path(), e);
        } else {
            tracing::debug!("Removed old log file: {:?}", file.path());
        }
    }

    Ok(())
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any remaining logs to disk.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}
