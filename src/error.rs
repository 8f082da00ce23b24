//! Error types for each phase of a backup run
//!
//! Mandatory phases (archive, transfer) fail the run with a [`FailureKind`].
//! Best-effort phases (rotation, notification, local cleanup) return their own
//! errors, which the orchestrator logs and drops.

use crate::config::ConfigError;
use std::path::PathBuf;

/// Invocation errors detected before any work starts
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("No operation selected: provide a directory, --database, or --list-backups")]
    NoOperationSelected,
}

/// Errors resolving a [`BackupJob`](crate::job::BackupJob) from config and arguments
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Local artifact production failures
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Cannot read source directory {path:?}: {message}")]
    SourceUnreadable { path: PathBuf, message: String },

    #[error("Cannot write archive {path:?}: {source}")]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unsupported database backend: '{0}'")]
    UnsupportedBackend(String),

    #[error("Database dump ({backend}) failed: {message}")]
    Dump { backend: String, message: String },
}

/// Remote transfer failures
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("Cannot connect to {host}:{port}: {message}")]
    Connect { host: String, port: u16, message: String },

    #[error("Login rejected for user '{0}'")]
    Login(String),

    #[error("Timed out during {0}")]
    Timeout(String),

    #[error("{operation} '{name}' failed: {message}")]
    Operation {
        operation: &'static str,
        name: String,
        message: String,
    },

    #[error("Server does not report size for '{0}'")]
    SizeUnsupported(String),

    #[error("Session already closed")]
    Closed,
}

impl TransferError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransferError::Timeout(_))
    }
}

/// Remote rotation failures (never fatal to a run)
#[derive(Debug, thiserror::Error)]
pub enum RotationError {
    #[error("Failed to list remote artifacts: {0}")]
    List(#[source] TransferError),

    /// `deleted` holds the names removed before and after the failures
    #[error("Failed to delete {} of {attempted} expired artifact(s): {}", .failed.len(), .failed.join(", "))]
    Delete {
        attempted: usize,
        deleted: Vec<String>,
        failed: Vec<String>,
    },
}

/// Mail notification failures (never fatal to a run)
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Mail relay {0} refused the connection")]
    RelayUnavailable(String),

    #[error("Cannot build notification message: {0}")]
    MessageBuild(String),

    #[error("Mail relay rejected the message: {0}")]
    Delivery(String),
}

/// Closed set of fatal run outcomes
///
/// Each kind carries the message sent in the failure notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Directory archive or database dump could not be produced
    Archive,
    /// The transfer server stopped answering within the timeout
    Timeout,
    /// Connect, login or upload rejected
    Upload,
}

impl FailureKind {
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::Archive => "error while creating backup",
            FailureKind::Timeout => "ftp connection timeout exceeded",
            FailureKind::Upload => "error while uploading file",
        }
    }
}

impl From<&TransferError> for FailureKind {
    fn from(err: &TransferError) -> Self {
        if err.is_timeout() {
            FailureKind::Timeout
        } else {
            FailureKind::Upload
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages() {
        assert_eq!(FailureKind::Archive.message(), "error while creating backup");
        assert_eq!(FailureKind::Timeout.message(), "ftp connection timeout exceeded");
        assert_eq!(FailureKind::Upload.message(), "error while uploading file");
    }

    #[test]
    fn test_transfer_error_classification() {
        let timeout = TransferError::Timeout("upload".to_string());
        assert_eq!(FailureKind::from(&timeout), FailureKind::Timeout);

        let refused = TransferError::Connect {
            host: "ftp".to_string(),
            port: 21,
            message: "connection refused".to_string(),
        };
        assert_eq!(FailureKind::from(&refused), FailureKind::Upload);
    }

    #[test]
    fn test_rotation_error_message() {
        let err = RotationError::Delete {
            attempted: 3,
            deleted: vec!["c.zip".to_string()],
            failed: vec!["a.zip".to_string(), "b.zip".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Failed to delete 2 of 3 expired artifact(s): a.zip, b.zip"
        );
    }
}
