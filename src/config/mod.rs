//! Configuration module for db-backup
//!
//! Configuration comes either from a TOML file or from environment-style
//! key/value pairs (the process environment, optionally seeded from a `.env`
//! file). Both paths end in the same validation, so a broken configuration is
//! rejected before any backup is attempted.
//!
//! ## Example Usage
//!
//! ```no_run
//! use db_backup::config;
//!
//! let config = config::load_config_from_env()?;
//! println!("Backing up {} to {:?}", config.database.database, config.backup.backup_dir);
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{
    config_from_vars, load_config, load_config_from_env, load_config_from_env_file,
    validate_config, ConfigError, Result,
};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
