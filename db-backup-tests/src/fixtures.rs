//! Test fixtures and sample data
//!
//! Provides pre-built dump contents, a fixed clock and helpers that seed a
//! backup directory with artifacts of known age.

use chrono::{DateTime, Local, TimeZone};
use db_backup::artifact::{artifact_file_name, RAW_EXTENSION};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// A small but realistic pg_dump output
pub const SAMPLE_DUMP: &str = "--\n-- PostgreSQL database dump\n--\n\
CREATE TABLE public.orders (id integer NOT NULL, total numeric(10,2));\n\
COPY public.orders (id, total) FROM stdin;\n1\t19.99\n2\t5.00\n\\.\n";

/// Clock pinned to 2026-01-15 03:00:00 local time
pub fn fixed_clock() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 1, 15, 3, 0, 0)
        .single()
        .expect("unambiguous local time")
}

/// File name the pinned clock produces for `database`
pub fn fixed_artifact_name(database: &str, extension: &str) -> String {
    artifact_file_name(database, &fixed_clock(), extension)
}

/// Create `count` raw artifacts for `database`, one day apart, oldest first
///
/// The newest seeded file is one hour old so a fresh dump always sorts first.
pub fn seed_artifacts(dir: &Path, database: &str, count: usize) -> Vec<PathBuf> {
    fs::create_dir_all(dir).expect("Failed to create backup dir");
    let newest = SystemTime::now() - Duration::from_secs(3600);

    (0..count)
        .map(|i| {
            let age_days = (count - 1 - i) as u64;
            let stamp = fixed_clock() - chrono::Duration::days(age_days as i64 + 1);
            let path = dir.join(artifact_file_name(database, &stamp, RAW_EXTENSION));
            fs::write(&path, format!("-- seeded dump {}\n", i)).expect("Failed to seed artifact");
            set_age(&path, newest - Duration::from_secs(age_days * 86_400));
            path
        })
        .collect()
}

/// Set a file's modification time
pub fn set_age(path: &Path, modified: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(modified))
        .expect("Failed to set modification time");
}

/// Sorted file names in `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}
