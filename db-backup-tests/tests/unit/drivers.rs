//! Unit tests for the database drivers
//!
//! These tests run both drivers against the mock executor.

use db_backup::database::DatabaseBackupError;
use rstest::rstest;
use test_utils::{
    fixed_artifact_name, ConfigBuilder, DatabaseKind, MockExecutor, MockResponse, TestContext,
    SAMPLE_DUMP,
};

fn context(kind: DatabaseKind) -> TestContext {
    TestContext::from_builder(ConfigBuilder::new(kind, "orders"))
}

#[rstest]
#[case(DatabaseKind::Postgresql, "pg_dump")]
#[case(DatabaseKind::Mysql, "mysqldump")]
fn test_dump_command_is_deterministic(#[case] kind: DatabaseKind, #[case] tool: &str) {
    let ctx = context(kind);
    let first = ctx.driver(MockExecutor::new()).build_dump_command();
    let second = ctx.driver(MockExecutor::new()).build_dump_command();

    assert_eq!(first, second);
    assert_eq!(first[0], tool);
    assert!(first.contains(&"orders".to_string()));
}

#[test]
fn test_dump_command_never_prompts() {
    let pg = context(DatabaseKind::Postgresql)
        .driver(MockExecutor::new())
        .build_dump_command();
    assert!(pg.contains(&"-w".to_string()));

    // A bare -p would make mysqldump read the password from the terminal
    let my = context(DatabaseKind::Mysql)
        .driver(MockExecutor::new())
        .build_dump_command();
    assert!(!my.iter().any(|a| a == "-p"));
}

#[test]
fn test_mysql_dump_options() {
    let ctx = TestContext::from_builder(
        ConfigBuilder::mysql("shop")
            .with_host("10.0.0.5")
            .with_port(3307)
            .with_credentials("root", "pw"),
    );

    assert_eq!(
        ctx.driver(MockExecutor::new()).build_dump_command(),
        vec![
            "mysqldump",
            "-h",
            "10.0.0.5",
            "-P",
            "3307",
            "-u",
            "root",
            "-ppw",
            "--single-transaction",
            "--routines",
            "--triggers",
            "shop"
        ]
    );
}

#[test]
fn test_postgres_password_not_on_command_line() {
    let ctx = TestContext::new();
    let executor = MockExecutor::succeeding(SAMPLE_DUMP);

    ctx.driver(executor.clone()).backup().unwrap();

    let call = &executor.get_calls()[0];
    assert!(!call.argv.iter().any(|a| a.contains("s3cret")));
    assert_eq!(call.envs, vec![("PGPASSWORD".to_string(), "s3cret".to_string())]);
}

#[rstest]
#[case(DatabaseKind::Postgresql)]
#[case(DatabaseKind::Mysql)]
fn test_backup_returns_non_empty_artifact(#[case] kind: DatabaseKind) {
    let ctx = context(kind);

    let artifact = ctx.driver(MockExecutor::succeeding(SAMPLE_DUMP)).backup().unwrap();

    assert_eq!(artifact.file_name(), fixed_artifact_name("orders", "sql"));
    assert_eq!(artifact.size_bytes, SAMPLE_DUMP.len() as u64);
    assert_eq!(std::fs::read_to_string(&artifact.path).unwrap(), SAMPLE_DUMP);
}

#[rstest]
#[case(DatabaseKind::Postgresql, 1)]
#[case(DatabaseKind::Mysql, 2)]
fn test_non_zero_exit_leaves_nothing(#[case] kind: DatabaseKind, #[case] code: i32) {
    let ctx = context(kind);

    let err = ctx
        .driver(MockExecutor::failing(code, "Access denied"))
        .backup()
        .unwrap_err();

    assert!(matches!(err, DatabaseBackupError::DumpFailed { exit_code: Some(c), .. } if c == code));
    assert!(ctx.backup_files().is_empty());
}

#[test]
fn test_missing_tool_is_a_database_error() {
    let ctx = TestContext::new();
    let executor = MockExecutor::new().with_response(MockResponse::LaunchError);

    let err = ctx.driver(executor).backup().unwrap_err();

    assert!(err.to_string().contains("pg_dump"));
    assert!(ctx.backup_files().is_empty());
}

#[test]
fn test_empty_dump_is_rejected() {
    let ctx = TestContext::new();

    let err = ctx.driver(MockExecutor::succeeding("")).backup().unwrap_err();

    assert!(matches!(err, DatabaseBackupError::ArtifactEmpty(_)));
    assert!(ctx.backup_files().is_empty());
}

#[test]
fn test_second_backup_in_same_second_is_refused() {
    let ctx = TestContext::new();
    let driver = ctx.driver(MockExecutor::succeeding(SAMPLE_DUMP));

    driver.backup().unwrap();
    let err = driver.backup().unwrap_err();

    assert!(matches!(err, DatabaseBackupError::ArtifactExists(_)));
    assert_eq!(ctx.backup_files(), vec![fixed_artifact_name("orders", "sql")]);
}

#[test]
fn test_cleanup_old_backups_through_driver() {
    let ctx = TestContext::new();
    test_utils::seed_artifacts(ctx.backup_dir(), "orders", 5);

    let removed = ctx.driver(MockExecutor::new()).cleanup_old_backups(2);

    assert_eq!(removed, 3);
    assert_eq!(ctx.backup_files().len(), 2);
}
