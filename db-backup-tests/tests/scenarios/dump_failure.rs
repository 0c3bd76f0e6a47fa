//! A dump that fails must leave nothing behind and alert every channel once

use db_backup::managers::backup::{BackupResult, BackupStage, FailureReason};
use db_backup::utils::locker::with_directory_lock;
use test_utils::{
    seed_artifacts, ConfigBuilder, FakeNotifier, MockExecutor, MockResponse, NotifierCall,
    TestContext,
};

#[test]
fn test_access_denied_dump() {
    let ctx = TestContext::from_builder(ConfigBuilder::mysql("shop"));
    let telegram = FakeNotifier::new("telegram");
    let email = FakeNotifier::new("email");
    let mut manager = ctx.manager(
        MockExecutor::failing(2, "mysqldump: Got error: 1045: Access denied"),
        vec![telegram.boxed(), email.boxed()],
    );

    let result = manager.run_backup();

    match &result {
        BackupResult::Failure { reason, message } => {
            assert_eq!(*reason, FailureReason::Database);
            assert_eq!(message, "Database backup failed: mysqldump exited with status 2");
        }
        other => panic!("expected failure, got {:?}", other),
    }

    assert!(ctx.backup_files().is_empty());
    for channel in [&telegram, &email] {
        assert_eq!(
            channel.calls(),
            vec![NotifierCall::Failure {
                message: result.message().to_string()
            }]
        );
    }
}

#[test]
fn test_failure_stage_order() {
    let ctx = TestContext::new();
    let mut manager = ctx.manager(MockExecutor::failing(1, "boom"), vec![]);

    manager.run_backup();

    assert_eq!(
        manager.stage_history(),
        &[
            BackupStage::Idle,
            BackupStage::Dumping,
            BackupStage::Failed,
            BackupStage::Notifying,
            BackupStage::Done,
        ]
    );
}

#[test]
fn test_failed_dump_does_not_prune() {
    let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders").with_retention(1));
    seed_artifacts(ctx.backup_dir(), "orders", 3);
    let mut manager = ctx.manager(MockExecutor::failing(1, "boom"), vec![]);

    assert!(!manager.run_backup().is_success());

    assert_eq!(ctx.backup_files().len(), 3);
}

#[test]
fn test_missing_dump_tool() {
    let ctx = TestContext::new();
    let channel = FakeNotifier::new("telegram");
    let mut manager = ctx.manager(
        MockExecutor::new().with_response(MockResponse::LaunchError),
        vec![channel.boxed()],
    );

    let result = manager.run_backup();

    assert!(!result.is_success());
    assert!(result.message().contains("pg_dump"));
    assert_eq!(channel.failure_count(), 1);
    assert_eq!(channel.success_count(), 0);
}

#[test]
fn test_concurrent_run_is_refused() {
    let ctx = TestContext::new();
    std::fs::create_dir_all(ctx.backup_dir()).unwrap();
    let channel = FakeNotifier::new("email");
    let executor = MockExecutor::succeeding("-- dump");
    let mut manager = ctx.manager(executor.clone(), vec![channel.boxed()]);

    let result = with_directory_lock(ctx.backup_dir(), || manager.run_backup()).unwrap();

    assert!(matches!(
        result,
        BackupResult::Failure {
            reason: FailureReason::DirectoryBusy,
            ..
        }
    ));
    assert!(executor.get_calls().is_empty());
    assert!(ctx.backup_files().is_empty());
    assert_eq!(channel.failure_count(), 1);
}
