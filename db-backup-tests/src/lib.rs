//! Test utilities for db-backup
//!
//! This crate provides shared test utilities, fakes for the notification
//! transports, and helper functions for testing the db-backup application.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, MockExecutor, TestContext};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::from_builder(ConfigBuilder::postgres("orders"));
//!     let mut manager = ctx.manager(MockExecutor::succeeding("-- dump"), vec![]);
//!     assert!(manager.run_backup().is_success());
//! }
//! ```

pub mod config_builder;
pub mod fakes;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fakes::{BotRequest, FakeNotifier, NotifierCall, RecordingBotApi, RecordingMailTransport};
pub use fixtures::*;
pub use test_context::{OptionAssertions, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use db_backup::config::{
    CompressionKind, Config, DatabaseConfig, DatabaseKind, EmailConfig, TelegramConfig,
};
pub use db_backup::utils::executor::mock::{CommandCall, MockExecutor, MockResponse};
pub use db_backup::utils::executor::CommandExecutor;

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
