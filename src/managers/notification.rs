//! Fan-out of backup events to every enabled channel
//!
//! Channels are called one after another. An error or panic in one channel
//! is logged and recorded in its [`DeliveryReport`]; the remaining channels
//! are still called.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{error, info};

use crate::config::Config;
use crate::i18n::Translator;
use crate::notifiers::{EmailNotifier, NotificationError, Notifier, TelegramNotifier};

/// Outcome of one channel delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub channel: &'static str,
    pub error: Option<String>,
}

impl DeliveryReport {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Notification manager holding the enabled channels
#[derive(Default)]
pub struct NotificationManager {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotificationManager {
    pub fn new(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        Self { notifiers }
    }

    /// Construct every enabled channel from configuration
    ///
    /// Fails on the first channel whose configuration is incomplete.
    pub fn from_config(config: &Config, translator: Translator) -> Result<Self, NotificationError> {
        let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();

        if config.telegram.enabled {
            notifiers.push(Box::new(TelegramNotifier::new(&config.telegram, translator)?));
        }
        if config.email.enabled {
            notifiers.push(Box::new(EmailNotifier::new(&config.email, translator)?));
        }

        if notifiers.is_empty() {
            info!("No notification providers enabled");
        } else {
            info!("Initialized {} notification providers", notifiers.len());
        }

        Ok(Self { notifiers })
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Names of the configured channels
    pub fn channels(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    /// Send a success notification to every channel
    pub fn send_success(&self, artifact: &Path, message: &str) -> Vec<DeliveryReport> {
        self.fan_out(|notifier| notifier.send_backup_success(artifact, message))
    }

    /// Send a failure notification to every channel
    pub fn send_failure(&self, message: &str) -> Vec<DeliveryReport> {
        self.fan_out(|notifier| notifier.send_backup_failure(message))
    }

    fn fan_out<F>(&self, send: F) -> Vec<DeliveryReport>
    where
        F: Fn(&dyn Notifier) -> Result<(), NotificationError>,
    {
        self.notifiers
            .iter()
            .map(|notifier| {
                let channel = notifier.name();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| send(notifier.as_ref())));

                let error = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(e)) => Some(e.to_string()),
                    Err(payload) => Some(panic_message(payload.as_ref())),
                };

                if let Some(e) = &error {
                    error!("Failed to send notification via {}: {}", channel, e);
                }

                DeliveryReport { channel, error }
            })
            .collect()
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}
