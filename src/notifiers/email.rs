//! SMTP email channel

use super::{file_size, NotificationError, Notifier};
use crate::artifact::format_size;
use crate::config::EmailConfig;
use crate::i18n::{MessageKey, Translator};
use chrono::{DateTime, Local};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Artifacts at or above this size are mentioned in the body instead of attached
pub const EMAIL_ATTACHMENT_LIMIT_BYTES: u64 = 10 * 1024 * 1024;

const SMTP_TIMEOUT: Duration = Duration::from_secs(60);

/// A composed mail, independent of the wire format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub attachment: Option<PathBuf>,
}

/// Delivers composed mails
pub trait MailTransport: Send + Sync {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), NotificationError>;
}

/// STARTTLS SMTP relay with username/password authentication
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig, from: Mailbox, to: Mailbox) -> Result<Self, NotificationError> {
        let transport = SmtpTransport::starttls_relay(&config.smtp_server)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { transport, from, to })
    }

    /// Render an [`OutgoingEmail`] as a MIME message
    pub fn build_message(&self, email: &OutgoingEmail) -> Result<Message, NotificationError> {
        let builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email.subject.clone());

        let Some(path) = &email.attachment else {
            return Ok(builder
                .header(ContentType::TEXT_PLAIN)
                .body(email.body.clone())?);
        };

        let content = fs::read(path).map_err(|source| NotificationError::Io {
            path: path.clone(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let attachment =
            Attachment::new(file_name).body(content, ContentType::parse("application/octet-stream")?);

        Ok(builder.multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(email.body.clone()))
                .singlepart(attachment),
        )?)
    }
}

impl MailTransport for SmtpMailer {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        let message = self.build_message(email)?;
        self.transport.send(&message)?;
        Ok(())
    }
}

/// Sends the summary by mail, attaching small artifacts
pub struct EmailNotifier {
    transport: Option<Box<dyn MailTransport>>,
    translator: Translator,
}

impl EmailNotifier {
    /// Build from configuration
    ///
    /// An enabled channel must have every mandatory field and parseable
    /// addresses; both are checked here rather than at send time.
    pub fn new(config: &EmailConfig, translator: Translator) -> Result<Self, NotificationError> {
        if !config.enabled {
            return Ok(Self::disabled(translator));
        }
        let (from, to) = Self::validate(config)?;
        let mailer = SmtpMailer::new(config, from, to)?;
        Ok(Self {
            transport: Some(Box::new(mailer)),
            translator,
        })
    }

    /// Build an enabled channel over a custom transport
    pub fn with_transport(
        config: &EmailConfig,
        transport: Box<dyn MailTransport>,
        translator: Translator,
    ) -> Result<Self, NotificationError> {
        if !config.enabled {
            return Ok(Self::disabled(translator));
        }
        Self::validate(config)?;
        Ok(Self {
            transport: Some(transport),
            translator,
        })
    }

    fn disabled(translator: Translator) -> Self {
        Self {
            transport: None,
            translator,
        }
    }

    fn validate(config: &EmailConfig) -> Result<(Mailbox, Mailbox), NotificationError> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(NotificationError::MissingFields(missing));
        }
        let from = config.from_email.trim().parse::<Mailbox>()?;
        let to = config.to_email.trim().parse::<Mailbox>()?;
        Ok((from, to))
    }

    fn default_success_body(&self, artifact: &Path) -> String {
        let t = &self.translator;
        let size = file_size(artifact).map(format_size).unwrap_or_default();
        let modified = fs::metadata(artifact)
            .and_then(|m| m.modified())
            .map(|at| {
                DateTime::<Local>::from(at)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default();

        format!(
            "{}\n\n{}:\n- {}: {}\n- {}: {}\n- {}: {}\n- {}: {}",
            t.text(MessageKey::BackupCompleted),
            t.text(MessageKey::BackupDetails),
            t.text(MessageKey::BackupFile),
            artifact
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            t.text(MessageKey::BackupSize),
            size,
            t.text(MessageKey::BackupPath),
            artifact.display(),
            t.text(MessageKey::BackupTimestamp),
            modified
        )
    }

    /// Compose the success mail
    pub fn success_email(&self, artifact: &Path, message: &str) -> OutgoingEmail {
        let mut body = if message.is_empty() {
            self.default_success_body(artifact)
        } else {
            message.to_string()
        };

        let attachment = match file_size(artifact) {
            Some(size) if size < EMAIL_ATTACHMENT_LIMIT_BYTES => Some(artifact.to_path_buf()),
            _ => {
                body.push_str("\n\n");
                body.push_str(self.translator.text(MessageKey::EmailAttachmentSkipped));
                None
            }
        };

        OutgoingEmail {
            subject: format!(
                "\u{2705} {}",
                self.translator.text(MessageKey::EmailSuccessSubject)
            ),
            body,
            attachment,
        }
    }

    /// Compose the failure mail
    pub fn failure_email(&self, message: &str) -> OutgoingEmail {
        let t = &self.translator;
        OutgoingEmail {
            subject: format!("\u{274c} {}", t.text(MessageKey::EmailFailureSubject)),
            body: format!(
                "{}\n\n{}:\n{}\n\n{}",
                t.text(MessageKey::BackupFailed),
                t.text(MessageKey::ErrorDetails),
                message,
                t.text(MessageKey::EmailFailureHint)
            ),
            attachment: None,
        }
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    fn send_backup_success(&self, artifact: &Path, message: &str) -> Result<(), NotificationError> {
        let Some(transport) = &self.transport else {
            debug!("Email notifications are disabled");
            return Ok(());
        };

        let email = self.success_email(artifact, message);
        if email.attachment.is_none() {
            warn!("Backup file {:?} not attached to email", artifact);
        }
        transport.deliver(&email)?;

        info!("Email notification sent successfully");
        Ok(())
    }

    fn send_backup_failure(&self, message: &str) -> Result<(), NotificationError> {
        let Some(transport) = &self.transport else {
            debug!("Email notifications are disabled");
            return Ok(());
        };

        transport.deliver(&self.failure_email(message))?;

        info!("Email failure notification sent successfully");
        Ok(())
    }
}
