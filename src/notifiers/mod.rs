//! Notification channels
//!
//! Every channel implements [`Notifier`]. A disabled channel answers `Ok(())`
//! without touching its transport; an enabled one reports delivery problems as
//! [`NotificationError`] and leaves containment to the caller.

pub mod email;
pub mod telegram;

pub use email::{EmailNotifier, MailTransport, OutgoingEmail, SmtpMailer};
pub use telegram::{BotApi, HttpBotApi, TelegramNotifier};

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Missing required configuration fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A notification channel
pub trait Notifier {
    /// Channel name used in logs and delivery reports
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    /// Report a successful backup; `message` is the prepared summary text
    fn send_backup_success(&self, artifact: &Path, message: &str) -> Result<(), NotificationError>;

    /// Report a failed backup
    fn send_backup_failure(&self, message: &str) -> Result<(), NotificationError>;
}

/// Size of `path`, or `None` when it cannot be read
pub(crate) fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|m| m.len())
}
