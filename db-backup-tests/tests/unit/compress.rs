//! Unit tests for dump compression

use db_backup::utils::compress::compress_file;
use std::fs::File;
use std::io::Read;
use test_utils::{CompressionKind, OptionAssertions, TestContext, SAMPLE_DUMP};

#[test]
fn test_compress_missing_source() {
    let ctx = TestContext::new();
    compress_file(&ctx.temp_dir().join("backup_orders_missing.sql"), CompressionKind::Zip)
        .assert_none();
}

#[test]
fn test_zip_contains_identical_dump() {
    let ctx = TestContext::new();
    let source = ctx.create_file("backups/backup_orders_20260115_030000.sql", SAMPLE_DUMP);

    let archive_path = compress_file(&source, CompressionKind::Zip).assert_some();

    assert_eq!(archive_path.extension().unwrap(), "zip");
    let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);

    let mut entry = archive.by_name("backup_orders_20260115_030000.sql").unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    assert_eq!(content, SAMPLE_DUMP);
}

#[test]
fn test_disabled_compression_produces_nothing() {
    let ctx = TestContext::new();
    let source = ctx.create_file("backups/backup_orders_20260115_030000.sql", SAMPLE_DUMP);

    compress_file(&source, CompressionKind::None).assert_none();
    compress_file(&source, CompressionKind::parse("gzip")).assert_none();
    assert_eq!(ctx.backup_files().len(), 1);
}
