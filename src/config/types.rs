use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub transfer_server: ServerEndpoint,
    pub backup_policy: BackupPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationSpec>,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Config {
    /// Whether a `[database]` section was provided
    pub fn has_database(&self) -> bool {
        self.database.is_some()
    }

    /// Whether a `[notification]` section was provided
    pub fn has_notification(&self) -> bool {
        self.notification.is_some()
    }
}

/// Remote FTP server settings
#[derive(Clone, Deserialize, Serialize)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,

    /// Applied to connect and to every control/data operation
    #[serde(default = "default_transfer_timeout")]
    pub timeout_seconds: u64,
}

impl ServerEndpoint {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// Keep the password out of logs and debug output
impl fmt::Debug for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerEndpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Backup naming, retention and local staging
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupPolicy {
    /// Default backup family name (CLI `--name` overrides)
    pub name: String,

    /// Artifacts of one kind kept remotely; 0 disables rotation
    pub retention_count: u32,

    /// Where artifacts are staged before upload
    #[serde(default = "default_temp_directory")]
    pub temp_directory: PathBuf,

    #[serde(default = "default_dump_timeout")]
    pub dump_timeout_seconds: u64,

    /// Treat a missing `[notification]` section as a configuration error
    #[serde(default)]
    pub require_notification: bool,
}

impl BackupPolicy {
    pub fn dump_timeout(&self) -> Duration {
        Duration::from_secs(self.dump_timeout_seconds)
    }
}

/// Database connection used for dumps
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Backend tag, validated against [`DatabaseBackend`] at load time
    pub backend: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,

    /// Single database to dump; all databases when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Mysql,
    Postgresql,
}

impl FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(DatabaseBackend::Mysql),
            "postgresql" | "postgres" => Ok(DatabaseBackend::Postgresql),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for DatabaseBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseBackend::Mysql => write!(f, "mysql"),
            DatabaseBackend::Postgresql => write!(f, "postgresql"),
        }
    }
}

/// Mail notification settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationSpec {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,

    #[serde(default = "default_relay_host")]
    pub relay_host: String,
    #[serde(default = "default_relay_port")]
    pub relay_port: u16,
    #[serde(default = "default_relay_timeout")]
    pub timeout_seconds: u64,
}

impl NotificationSpec {
    /// Copy of this spec with the recipient replaced
    pub fn with_recipient(&self, to: &str) -> Self {
        Self {
            to: to.to_string(),
            ..self.clone()
        }
    }
}

/// Log file settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_max_files")]
    pub log_max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            log_max_files: default_log_max_files(),
        }
    }
}

// Default value functions

fn default_transfer_timeout() -> u64 { 5 }
fn default_dump_timeout() -> u64 { 3600 }
fn default_temp_directory() -> PathBuf { std::env::temp_dir().join("ftp-backup") }
fn default_relay_host() -> String { "localhost".to_string() }
fn default_relay_port() -> u16 { 25 }
fn default_relay_timeout() -> u64 { 10 }
fn default_log_directory() -> PathBuf { PathBuf::from("~/logs") }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 10 }
