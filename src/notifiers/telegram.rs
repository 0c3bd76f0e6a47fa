//! Telegram bot channel

use super::{file_size, NotificationError, Notifier};
use crate::config::TelegramConfig;
use crate::i18n::{MessageKey, Translator};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bot API upload limit; larger artifacts are announced but not uploaded
pub const TELEGRAM_FILE_LIMIT_BYTES: u64 = 50 * 1024 * 1024;

const API_BASE_URL: &str = "https://api.telegram.org";
const MESSAGE_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// The two Bot API calls the notifier needs
pub trait BotApi: Send + Sync {
    fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotificationError>;

    fn send_document(
        &self,
        chat_id: &str,
        document: &Path,
        caption: &str,
    ) -> Result<(), NotificationError>;
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Bot API over HTTPS
pub struct HttpBotApi {
    client: Client,
    base_url: String,
}

impl HttpBotApi {
    pub fn new(bot_token: &str) -> Result<Self, NotificationError> {
        Self::with_base_url(API_BASE_URL, bot_token)
    }

    /// Point at a different API host (self-hosted Bot API server)
    pub fn with_base_url(base_url: &str, bot_token: &str) -> Result<Self, NotificationError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), bot_token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    fn check_response(response: Response) -> Result<(), NotificationError> {
        let status = response.status();
        let body = response.text()?;
        parse_api_response(status, &body)
    }
}

/// Interpret a Bot API reply; gateways in front of the API may answer with HTML
fn parse_api_response(status: StatusCode, body: &str) -> Result<(), NotificationError> {
    match serde_json::from_str::<ApiResponse>(body) {
        Ok(reply) if reply.ok => Ok(()),
        Ok(reply) => Err(NotificationError::Api(
            reply
                .description
                .unwrap_or_else(|| format!("HTTP {}", status)),
        )),
        Err(_) => Err(NotificationError::Api(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        ))),
    }
}

impl BotApi for HttpBotApi {
    fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .timeout(MESSAGE_TIMEOUT)
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()?;

        Self::check_response(response)
    }

    fn send_document(
        &self,
        chat_id: &str,
        document: &Path,
        caption: &str,
    ) -> Result<(), NotificationError> {
        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .file("document", document)
            .map_err(|source| NotificationError::Io {
                path: document.to_path_buf(),
                source,
            })?;

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()?;

        Self::check_response(response)
    }
}

/// Sends the summary as a chat message, then the artifact as a document
pub struct TelegramNotifier {
    chat_id: String,
    api: Option<Box<dyn BotApi>>,
    translator: Translator,
}

impl TelegramNotifier {
    /// Build from configuration; an enabled channel must have a token and chat id
    pub fn new(config: &TelegramConfig, translator: Translator) -> Result<Self, NotificationError> {
        if !config.enabled {
            return Ok(Self::disabled(translator));
        }
        Self::validate(config)?;
        let api = HttpBotApi::new(&config.bot_token)?;
        Ok(Self::enabled_with(config, Box::new(api), translator))
    }

    /// Build an enabled channel over a custom API implementation
    pub fn with_api(
        config: &TelegramConfig,
        api: Box<dyn BotApi>,
        translator: Translator,
    ) -> Result<Self, NotificationError> {
        if !config.enabled {
            return Ok(Self::disabled(translator));
        }
        Self::validate(config)?;
        Ok(Self::enabled_with(config, api, translator))
    }

    fn disabled(translator: Translator) -> Self {
        Self {
            chat_id: String::new(),
            api: None,
            translator,
        }
    }

    fn enabled_with(config: &TelegramConfig, api: Box<dyn BotApi>, translator: Translator) -> Self {
        Self {
            chat_id: config.chat_id.clone(),
            api: Some(api),
            translator,
        }
    }

    fn validate(config: &TelegramConfig) -> Result<(), NotificationError> {
        let missing = config.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::MissingFields(missing))
        }
    }

    fn caption(&self, artifact: &Path) -> String {
        format!(
            "{}: {}",
            self.translator.text(MessageKey::DocumentCaption),
            file_name(artifact)
        )
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        self.api.is_some()
    }

    fn send_backup_success(&self, artifact: &Path, message: &str) -> Result<(), NotificationError> {
        let Some(api) = &self.api else {
            debug!("Telegram notifications are disabled");
            return Ok(());
        };

        let text = if message.is_empty() {
            format!(
                "\u{2705} {}\n\n{}",
                self.translator.text(MessageKey::BackupCompleted),
                self.caption(artifact)
            )
        } else {
            message.to_string()
        };
        api.send_message(&self.chat_id, &text)?;

        match file_size(artifact) {
            Some(size) if size < TELEGRAM_FILE_LIMIT_BYTES => {
                api.send_document(&self.chat_id, artifact, &self.caption(artifact))?;
            }
            _ => warn!(
                "Backup file {:?} is too large or doesn't exist, skipping file upload",
                artifact
            ),
        }

        info!("Telegram notification sent successfully");
        Ok(())
    }

    fn send_backup_failure(&self, message: &str) -> Result<(), NotificationError> {
        let Some(api) = &self.api else {
            debug!("Telegram notifications are disabled");
            return Ok(());
        };

        let text = format!(
            "\u{274c} {}\n\n{}: {}",
            self.translator.text(MessageKey::BackupFailed),
            self.translator.text(MessageKey::ErrorLabel),
            message
        );
        api.send_message(&self.chat_id, &text)?;

        info!("Telegram failure notification sent successfully");
        Ok(())
    }
}
