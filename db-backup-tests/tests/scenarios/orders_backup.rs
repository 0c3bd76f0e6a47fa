//! Scheduled backup of the `orders` database with retention 3

use db_backup::artifact::format_duration;
use db_backup::managers::backup::{BackupResult, BackupStage};
use rstest::rstest;
use std::time::Duration;
use test_utils::{
    fixed_artifact_name, seed_artifacts, CompressionKind, ConfigBuilder, FakeNotifier,
    MockExecutor, NotifierCall, TestContext, SAMPLE_DUMP,
};

fn orders_context(compression: CompressionKind) -> TestContext {
    TestContext::from_builder(
        ConfigBuilder::postgres("orders")
            .with_host("db1")
            .with_retention(3)
            .with_compression(compression),
    )
}

#[test]
fn test_orders_backup_prunes_oldest() {
    let ctx = orders_context(CompressionKind::None);
    let seeded = seed_artifacts(ctx.backup_dir(), "orders", 3);
    let telegram = FakeNotifier::new("telegram");
    let executor = MockExecutor::succeeding(SAMPLE_DUMP);

    let mut manager = ctx.manager(executor.clone(), vec![telegram.boxed()]);
    let result = manager.run_backup();

    let BackupResult::Success {
        artifact, message, ..
    } = &result
    else {
        panic!("expected success, got {:?}", result);
    };

    // One dump invocation, one deletion: the oldest seeded file
    assert_eq!(executor.call_count("pg_dump"), 1);
    assert!(!seeded[0].exists());
    assert!(seeded[1].exists() && seeded[2].exists());
    assert_eq!(ctx.backup_files().len(), 3);
    assert_eq!(artifact.file_name(), fixed_artifact_name("orders", "sql"));

    assert!(message.contains("- Type: postgresql"));
    assert!(message.contains("- Host: db1"));
    assert!(message.contains("- Database: orders"));
    assert!(message.contains(&format!("- File: {}", artifact.file_name())));
    assert!(message.contains(" MB\n"));
    assert!(message.contains("- Timestamp: 2026-01-15 03:00:00"));

    let duration_line = message
        .lines()
        .find(|l| l.starts_with("- Duration: "))
        .expect("duration line");
    assert!(["s", "m", "h"].iter().any(|unit| duration_line.ends_with(unit)));

    assert_eq!(
        telegram.calls(),
        vec![NotifierCall::Success {
            artifact: artifact.path.clone(),
            message: message.clone(),
        }]
    );
}

#[test]
fn test_orders_backup_stage_order() {
    let ctx = orders_context(CompressionKind::Zip);
    let mut manager = ctx.manager(MockExecutor::succeeding(SAMPLE_DUMP), vec![]);

    assert!(manager.run_backup().is_success());

    assert_eq!(
        manager.stage_history(),
        &[
            BackupStage::Idle,
            BackupStage::Dumping,
            BackupStage::Verifying,
            BackupStage::Compressing,
            BackupStage::Pruning,
            BackupStage::Notifying,
            BackupStage::Done,
        ]
    );
}

#[test]
fn test_zip_artifact_is_reported_and_raw_dump_kept() {
    let ctx = orders_context(CompressionKind::Zip);
    let email = FakeNotifier::new("email");
    let mut manager = ctx.manager(MockExecutor::succeeding(SAMPLE_DUMP), vec![email.boxed()]);

    let result = manager.run_backup();

    let BackupResult::Success { artifact, .. } = result else {
        panic!("expected success");
    };
    assert_eq!(artifact.file_name(), fixed_artifact_name("orders", "zip"));
    assert_eq!(
        ctx.backup_files(),
        vec![
            fixed_artifact_name("orders", "sql"),
            fixed_artifact_name("orders", "zip"),
        ]
    );
    assert_eq!(email.success_count(), 1);
}

#[test]
fn test_retention_zero_keeps_only_new_artifact() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_retention(0));
    seed_artifacts(ctx.backup_dir(), "orders", 2);
    let mut manager = ctx.manager(MockExecutor::succeeding(SAMPLE_DUMP), vec![]);

    assert!(manager.run_backup().is_success());

    assert_eq!(ctx.backup_files(), vec![fixed_artifact_name("orders", "sql")]);
}

#[test]
fn test_star_message_appended_when_enabled() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_star_message(true));
    let mut manager = ctx.manager(MockExecutor::succeeding(SAMPLE_DUMP), vec![]);

    let result = manager.run_backup();

    assert!(result.message().contains("SHOW_STAR_MESSAGE=false"));
}

#[test]
fn test_all_channels_notified_even_if_one_fails() {
    let ctx = orders_context(CompressionKind::None);
    let broken = FakeNotifier::failing("telegram");
    let email = FakeNotifier::new("email");
    let mut manager = ctx.manager(
        MockExecutor::succeeding(SAMPLE_DUMP),
        vec![broken.boxed(), email.boxed()],
    );

    let result = manager.run_backup();

    assert!(result.is_success());
    assert_eq!(broken.success_count(), 1);
    assert_eq!(email.success_count(), 1);
    let delivered: Vec<_> = manager.deliveries().iter().map(|d| d.delivered()).collect();
    assert_eq!(delivered, vec![false, true]);
}

#[rstest]
#[case(Duration::from_secs_f64(12.34), "12.3s")]
#[case(Duration::from_secs(270), "4.5m")]
#[case(Duration::from_secs(4320), "1.2h")]
fn test_duration_units(#[case] duration: Duration, #[case] expected: &str) {
    assert_eq!(format_duration(duration), expected);
}
