//! End-to-end backup runs
//!
//! Each scenario drives a full `BackupManager::run_backup` with a mocked dump
//! tool and recording notification channels.
//! Run with: `cargo test -p db-backup-tests --test scenarios`

mod dump_failure;
mod orders_backup;
