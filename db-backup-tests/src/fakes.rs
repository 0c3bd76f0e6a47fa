//! Fakes for notification channels and their transports
//!
//! Each fake records what it was asked to do behind a shared
//! `parking_lot::Mutex`, so a clone kept by the test sees the calls made
//! through the boxed copy handed to the code under test.

use db_backup::notifiers::{BotApi, MailTransport, NotificationError, Notifier, OutgoingEmail};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A call received by [`FakeNotifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Success { artifact: PathBuf, message: String },
    Failure { message: String },
}

/// Notifier that records calls instead of delivering them
#[derive(Clone)]
pub struct FakeNotifier {
    name: &'static str,
    calls: Arc<Mutex<Vec<NotifierCall>>>,
    fail: bool,
}

impl FakeNotifier {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// Record calls, then report a delivery error
    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    pub fn boxed(&self) -> Box<dyn Notifier> {
        Box::new(self.clone())
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().clone()
    }

    pub fn success_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Success { .. }))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Failure { .. }))
            .count()
    }

    fn outcome(&self) -> Result<(), NotificationError> {
        if self.fail {
            Err(NotificationError::Api(format!("{} unavailable", self.name)))
        } else {
            Ok(())
        }
    }
}

impl Notifier for FakeNotifier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn send_backup_success(&self, artifact: &Path, message: &str) -> Result<(), NotificationError> {
        self.calls.lock().push(NotifierCall::Success {
            artifact: artifact.to_path_buf(),
            message: message.to_string(),
        });
        self.outcome()
    }

    fn send_backup_failure(&self, message: &str) -> Result<(), NotificationError> {
        self.calls.lock().push(NotifierCall::Failure {
            message: message.to_string(),
        });
        self.outcome()
    }
}

/// A Bot API request seen by [`RecordingBotApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotRequest {
    Message { chat_id: String, text: String },
    Document { chat_id: String, document: PathBuf, caption: String },
}

/// Bot API that records requests
#[derive(Clone, Default)]
pub struct RecordingBotApi {
    requests: Arc<Mutex<Vec<BotRequest>>>,
}

impl RecordingBotApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<BotRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl BotApi for RecordingBotApi {
    fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotificationError> {
        self.requests.lock().push(BotRequest::Message {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn send_document(
        &self,
        chat_id: &str,
        document: &Path,
        caption: &str,
    ) -> Result<(), NotificationError> {
        self.requests.lock().push(BotRequest::Document {
            chat_id: chat_id.to_string(),
            document: document.to_path_buf(),
            caption: caption.to_string(),
        });
        Ok(())
    }
}

/// Mail transport that keeps every mail in memory
#[derive(Clone, Default)]
pub struct RecordingMailTransport {
    outbox: Arc<Mutex<Vec<OutgoingEmail>>>,
}

impl RecordingMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox.lock().clone()
    }
}

impl MailTransport for RecordingMailTransport {
    fn deliver(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        self.outbox.lock().push(email.clone());
        Ok(())
    }
}
