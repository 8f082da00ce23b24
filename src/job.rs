//! Backup job model: what one invocation backs up and how artifacts are named
//!
//! Remote names follow `<name>_<timestamp>.<ext>`. The timestamp format sorts
//! lexicographically in chronological order, which rotation relies on.

use crate::config::{Config, DatabaseConfig, NotificationSpec};
use crate::error::{JobError, UsageError};
use chrono::{Local, NaiveDateTime};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Timestamp embedded in every artifact name of a run
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Invocation-time choices (decoded from the CLI)
#[derive(Debug, Clone, Default)]
pub struct BackupRequest {
    /// Directory to archive
    pub directory: Option<PathBuf>,
    /// Overrides `backup_policy.name`
    pub name: Option<String>,
    /// Overrides `notification.to`
    pub email: Option<String>,
    /// Also dump the configured database
    pub use_database: bool,
}

/// What to back up. At least one source is always set.
#[derive(Debug, Clone)]
pub struct Sources {
    directory: Option<PathBuf>,
    database: Option<DatabaseConfig>,
}

impl Sources {
    pub fn new(
        directory: Option<PathBuf>,
        database: Option<DatabaseConfig>,
    ) -> Result<Self, UsageError> {
        if directory.is_none() && database.is_none() {
            return Err(UsageError::NoOperationSelected);
        }
        Ok(Self { directory, database })
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn database(&self) -> Option<&DatabaseConfig> {
        self.database.as_ref()
    }

    /// Artifact kinds in production and upload order
    pub fn kinds(&self) -> Vec<ArtifactKind> {
        let mut kinds = Vec::with_capacity(2);
        if self.directory.is_some() {
            kinds.push(ArtifactKind::Zip);
        }
        if self.database.is_some() {
            kinds.push(ArtifactKind::Dump);
        }
        kinds
    }
}

/// A single backup run, fixed at construction
#[derive(Debug, Clone)]
pub struct BackupJob {
    pub name: String,
    pub sources: Sources,
    pub timestamp: String,
    pub retention_count: u32,
    pub temp_directory: PathBuf,
    pub dump_timeout: Duration,
    /// Notification settings with any recipient override applied
    pub notification: Option<NotificationSpec>,
}

impl BackupJob {
    /// Resolve the job for a run starting now
    pub fn resolve(config: &Config, request: &BackupRequest) -> Result<Self, JobError> {
        Self::resolve_at(config, request, Local::now().naive_local())
    }

    /// Resolve the job with an explicit start time
    pub fn resolve_at(
        config: &Config,
        request: &BackupRequest,
        started: NaiveDateTime,
    ) -> Result<Self, JobError> {
        let database = if request.use_database {
            let database = config.database.clone().ok_or_else(|| {
                crate::config::ConfigError::MissingSection("database".to_string())
            })?;
            Some(database)
        } else {
            None
        };

        let sources = Sources::new(request.directory.clone(), database)?;

        let name = request
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| config.backup_policy.name.clone());

        let notification = config.notification.as_ref().map(|spec| match request.email {
            Some(ref email) => spec.with_recipient(email),
            None => spec.clone(),
        });

        Ok(Self {
            name,
            sources,
            timestamp: started.format(TIMESTAMP_FORMAT).to_string(),
            retention_count: config.backup_policy.retention_count,
            temp_directory: crate::config::expand_tilde(&config.backup_policy.temp_directory),
            dump_timeout: config.backup_policy.dump_timeout(),
            notification,
        })
    }

    /// `<name>_<timestamp>`, shared by every artifact of the run
    pub fn artifact_stem(&self) -> String {
        format!("{}_{}", self.name, self.timestamp)
    }

    /// Local path every artifact extends with its own extension
    pub fn destination_prefix(&self) -> PathBuf {
        self.temp_directory.join(self.artifact_stem())
    }

    /// Pattern selecting this backup family's remote artifacts of one kind
    pub fn pattern(&self, kind: ArtifactKind) -> NamePattern {
        NamePattern::new(&self.name, Some(kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Compressed directory archive
    Zip,
    /// Database dump
    Dump,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Zip => "zip",
            ArtifactKind::Dump => "sql",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Zip => write!(f, "directory archive"),
            ArtifactKind::Dump => write!(f, "database dump"),
        }
    }
}

/// A produced backup file awaiting upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub local_path: PathBuf,
    pub remote_name: String,
    pub kind: ArtifactKind,
}

impl Artifact {
    /// Artifact at `<prefix>.<ext>`; the remote name is the file name
    pub fn from_prefix(prefix: &Path, kind: ArtifactKind) -> Self {
        let mut local: OsString = prefix.as_os_str().to_owned();
        local.push(".");
        local.push(kind.extension());
        let local_path = PathBuf::from(local);

        let remote_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            local_path,
            remote_name,
            kind,
        }
    }
}

/// Remote artifact selector: `<name>_*` with an optional extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    prefix: String,
    extension: Option<&'static str>,
}

impl NamePattern {
    pub fn new(name: &str, kind: Option<ArtifactKind>) -> Self {
        Self {
            prefix: format!("{}_", name),
            extension: kind.map(|k| k.extension()),
        }
    }

    /// Matches every name
    pub fn any() -> Self {
        Self {
            prefix: String::new(),
            extension: None,
        }
    }

    /// Matches `<name>_*` of any kind, or everything without a name
    pub fn for_listing(name: Option<&str>) -> Self {
        match name {
            Some(name) if !name.is_empty() => Self::new(name, None),
            _ => Self::any(),
        }
    }

    /// Match `<name>_<timestamp>.<ext>` against the final path segment of a listed name
    ///
    /// Everything between the prefix and the extension must be a full
    /// timestamp, so family `db` never claims `db_prod_*` artifacts.
    pub fn matches(&self, listed: &str) -> bool {
        let base = listed.rsplit('/').next().unwrap_or(listed);
        if self.prefix.is_empty() {
            return true;
        }

        let Some(rest) = base.strip_prefix(&self.prefix) else {
            return false;
        };
        let Some((stamp, ext)) = rest.rsplit_once('.') else {
            return false;
        };
        if self.extension.is_some_and(|expected| ext != expected) {
            return false;
        }
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok()
    }
}

impl std::fmt::Display for NamePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.extension {
            Some(ext) => write!(f, "{}*.{}", self.prefix, ext),
            None => write!(f, "{}*", self.prefix),
        }
    }
}
