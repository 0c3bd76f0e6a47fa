pub mod command;
pub mod compress;
pub mod cron;
pub mod locker;
pub mod retention;

// Trait-based abstraction for testability
pub mod executor;

// Re-export commonly used types and traits (used by test crate)
pub use executor::{CommandExecutor, RealExecutor};
pub use retention::RetentionManager;
