//! Unit tests for notification channels and fan-out
//!
//! Channels run over recording transports, so no network is touched.

use db_backup::i18n::{Language, Translator};
use db_backup::managers::notification::NotificationManager;
use db_backup::notifiers::{EmailNotifier, NotificationError, Notifier, TelegramNotifier};
use std::path::Path;
use test_utils::{
    BotRequest, ConfigBuilder, FakeNotifier, NotifierCall, RecordingBotApi,
    RecordingMailTransport, TestContext, SAMPLE_DUMP,
};

fn english() -> Translator {
    Translator::new(Language::En)
}

#[test]
fn test_telegram_success_sends_message_then_document() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_telegram());
    let artifact = ctx.create_file("backups/backup_orders_20260115_030000.sql", SAMPLE_DUMP);
    let api = RecordingBotApi::new();
    let notifier =
        TelegramNotifier::with_api(&ctx.config().telegram, Box::new(api.clone()), english()).unwrap();

    notifier.send_backup_success(&artifact, "summary").unwrap();

    assert_eq!(
        api.requests(),
        vec![
            BotRequest::Message {
                chat_id: "-100200300".to_string(),
                text: "summary".to_string(),
            },
            BotRequest::Document {
                chat_id: "-100200300".to_string(),
                document: artifact.clone(),
                caption: "Backup file: backup_orders_20260115_030000.sql".to_string(),
            },
        ]
    );
}

#[test]
fn test_telegram_missing_artifact_skips_upload() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_telegram());
    let api = RecordingBotApi::new();
    let notifier =
        TelegramNotifier::with_api(&ctx.config().telegram, Box::new(api.clone()), english()).unwrap();

    notifier
        .send_backup_success(&ctx.backup_dir().join("backup_orders_gone.sql"), "summary")
        .unwrap();

    assert_eq!(api.request_count(), 1);
}

#[test]
fn test_telegram_failure_text() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_telegram());
    let api = RecordingBotApi::new();
    let notifier =
        TelegramNotifier::with_api(&ctx.config().telegram, Box::new(api.clone()), english()).unwrap();

    notifier.send_backup_failure("pg_dump exited with status 1").unwrap();

    match &api.requests()[..] {
        [BotRequest::Message { text, .. }] => {
            assert_eq!(
                text,
                "\u{274c} Database backup failed!\n\nError: pg_dump exited with status 1"
            );
        }
        other => panic!("unexpected requests: {:?}", other),
    }
}

#[test]
fn test_disabled_channels_make_no_calls() {
    let ctx = TestContext::new();
    let api = RecordingBotApi::new();
    let mail = RecordingMailTransport::new();

    let telegram =
        TelegramNotifier::with_api(&ctx.config().telegram, Box::new(api.clone()), english()).unwrap();
    let email =
        EmailNotifier::with_transport(&ctx.config().email, Box::new(mail.clone()), english())
            .unwrap();

    assert!(!telegram.is_enabled());
    assert!(!email.is_enabled());
    telegram.send_backup_failure("boom").unwrap();
    email.send_backup_failure("boom").unwrap();
    telegram.send_backup_success(Path::new("/nonexistent"), "").unwrap();
    email.send_backup_success(Path::new("/nonexistent"), "").unwrap();

    assert_eq!(api.request_count(), 0);
    assert!(mail.sent().is_empty());
}

#[test]
fn test_enabled_telegram_without_chat_id_is_rejected() {
    let mut config = ConfigBuilder::postgres("orders").with_telegram().build();
    config.telegram.chat_id.clear();

    let result = TelegramNotifier::with_api(&config.telegram, Box::new(RecordingBotApi::new()), english());

    assert!(matches!(result, Err(NotificationError::MissingFields(f)) if f.contains(&"chat_id")));
}

#[test]
fn test_email_success_attaches_small_artifact() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_email());
    let artifact = ctx.create_file("backups/backup_orders_20260115_030000.sql", SAMPLE_DUMP);
    let mail = RecordingMailTransport::new();
    let notifier =
        EmailNotifier::with_transport(&ctx.config().email, Box::new(mail.clone()), english())
            .unwrap();

    notifier.send_backup_success(&artifact, "summary").unwrap();

    let sent = mail.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "\u{2705} Database Backup Completed Successfully");
    assert_eq!(sent[0].body, "summary");
    assert_eq!(sent[0].attachment.as_deref(), Some(artifact.as_path()));
}

#[test]
fn test_email_failure_body() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_email());
    let mail = RecordingMailTransport::new();
    let notifier =
        EmailNotifier::with_transport(&ctx.config().email, Box::new(mail.clone()), english())
            .unwrap();

    notifier.send_backup_failure("connection refused").unwrap();

    let sent = mail.sent();
    assert_eq!(sent[0].subject, "\u{274c} Database Backup Failed");
    assert!(sent[0].body.contains("Error Details:\nconnection refused"));
    assert!(sent[0].attachment.is_none());
}

#[test]
fn test_email_invalid_address_is_rejected() {
    let mut config = ConfigBuilder::postgres("orders").with_email().build();
    config.email.to_email = "not an address".to_string();

    let result = EmailNotifier::with_transport(
        &config.email,
        Box::new(RecordingMailTransport::new()),
        english(),
    );

    assert!(matches!(result, Err(NotificationError::Address(_))));
}

#[test]
fn test_persian_failure_text() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_telegram());
    let api = RecordingBotApi::new();
    let notifier = TelegramNotifier::with_api(
        &ctx.config().telegram,
        Box::new(api.clone()),
        Translator::new(Language::Fa),
    )
    .unwrap();

    notifier.send_backup_failure("timeout").unwrap();

    match &api.requests()[0] {
        BotRequest::Message { text, .. } => {
            assert!(text.contains("ناموفق"));
            assert!(text.ends_with(": timeout"));
        }
        other => panic!("unexpected request: {:?}", other),
    }
}

#[test]
fn test_fan_out_survives_failing_channel() {
    let broken = FakeNotifier::failing("broken");
    let healthy = FakeNotifier::new("healthy");
    let manager = NotificationManager::new(vec![broken.boxed(), healthy.boxed()]);

    let reports = manager.send_failure("disk full");

    assert_eq!(reports.len(), 2);
    assert!(!reports[0].delivered());
    assert!(reports[1].delivered());
    assert_eq!(broken.failure_count(), 1);
    assert_eq!(
        healthy.calls(),
        vec![NotifierCall::Failure {
            message: "disk full".to_string()
        }]
    );
}

#[test]
fn test_manager_from_config_builds_enabled_channels_only() {
    let config = ConfigBuilder::postgres("orders").with_telegram().build();
    let manager = NotificationManager::from_config(&config, english()).unwrap();
    assert_eq!(manager.channels(), vec!["telegram"]);

    let config = ConfigBuilder::postgres("orders").build();
    assert!(NotificationManager::from_config(&config, english()).unwrap().is_empty());
}
