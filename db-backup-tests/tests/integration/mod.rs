//! Integration tests for db-backup
//!
//! These tests start real database containers and run the real dump tools.
//! They need Docker plus `pg_dump`/`mysqldump` on the PATH.
//! Run with: `cargo test -p db-backup-tests --test integration -- --ignored`

mod common;
