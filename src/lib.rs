//! FTP Backup Library
//!
//! Archives a directory and/or dumps a database, uploads the artifacts to an
//! FTP server, rotates old remote copies and reports the outcome by mail.

pub mod config;
pub mod error;
pub mod job;
pub mod managers;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, parse_config, Config, ConfigError};
pub use error::{FailureKind, JobError, UsageError};
pub use job::{Artifact, ArtifactKind, BackupJob, BackupRequest, NamePattern};
pub use managers::backup::{BackupOrchestrator, RunReport, RunState};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::notification::Notifier;
pub use managers::rotation::{select_expired, RotationPolicy};
