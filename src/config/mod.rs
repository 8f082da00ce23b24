//! Configuration module for ftp-backup
//!
//! Loads and validates the TOML configuration file.
//!
//! ## Sections
//!
//! - `[transfer_server]` (required): FTP host, port, credentials, timeout
//! - `[backup_policy]` (required): backup name, retention count, staging directory
//! - `[database]` (optional): dump source, needed only with `--database`
//! - `[notification]` (optional): mail report settings; absent means no mail
//! - `[logging]` (optional): log file directory, level and retention
//!
//! ## Example Usage
//!
//! ```no_run
//! use ftp_backup::config;
//!
//! let config = config::load_config("ftp-backup.toml")?;
//! println!("Uploading to {}:{}", config.transfer_server.host, config.transfer_server.port);
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{load_config, parse_config, ConfigError, Result};
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
