//! Fluent API for building test configurations
//!
//! Provides a builder pattern for creating test configurations with sensible defaults.

use ftp_backup::config::{
    BackupPolicy, Config, DatabaseConfig, LoggingSettings, NotificationSpec, ServerEndpoint,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builder for creating test configurations
pub struct ConfigBuilder {
    temp_dir: TempDir,
    transfer_server: ServerEndpoint,
    backup_policy: BackupPolicy,
    database: Option<DatabaseConfig>,
    notification: Option<NotificationSpec>,
    logging: LoggingSettings,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder with only the required sections
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let log_directory = temp_dir.path().join("logs");
        fs::create_dir_all(&log_directory).expect("Failed to create log_directory");

        let transfer_server = ServerEndpoint {
            host: "127.0.0.1".to_string(),
            port: 21,
            username: "backup".to_string(),
            password: "ftp-secret".to_string(),
            timeout_seconds: 5,
        };

        let backup_policy = BackupPolicy {
            name: "nightly".to_string(),
            retention_count: 0,
            temp_directory: temp_dir.path().join("staging"),
            dump_timeout_seconds: 3600,
            require_notification: false,
        };

        Self {
            temp_dir,
            transfer_server,
            backup_policy,
            database: None,
            notification: None,
            logging: LoggingSettings {
                log_directory,
                log_level: "debug".to_string(),
                log_max_files: 5,
            },
        }
    }

    /// Create a config with a notification section, the usual production shape
    pub fn minimal() -> Self {
        Self::new().with_notification("ops@example.com")
    }

    /// Set the backup name
    pub fn with_name(mut self, name: &str) -> Self {
        self.backup_policy.name = name.to_string();
        self
    }

    /// Set the retention count
    pub fn with_retention(mut self, retention_count: u32) -> Self {
        self.backup_policy.retention_count = retention_count;
        self
    }

    /// Point the transfer server at a host and port
    pub fn with_server(mut self, host: &str, port: u16) -> Self {
        self.transfer_server.host = host.to_string();
        self.transfer_server.port = port;
        self
    }

    /// Set the transfer timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.transfer_server.timeout_seconds = seconds;
        self
    }

    /// Add a MySQL database section
    pub fn with_mysql(mut self, database: Option<&str>) -> Self {
        self.database = Some(DatabaseConfig {
            backend: "mysql".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: "db-secret".to_string(),
            database: database.map(str::to_string),
        });
        self
    }

    /// Add a database section with a custom backend tag
    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.database = Some(database);
        self
    }

    /// Add a notification section sending to `to`
    pub fn with_notification(mut self, to: &str) -> Self {
        self.notification = Some(NotificationSpec {
            subject: "Backup report".to_string(),
            from: "backup@example.com".to_string(),
            to: to.to_string(),
            body: "Backup finished successfully".to_string(),
            relay_host: "localhost".to_string(),
            relay_port: 25,
            timeout_seconds: 10,
        });
        self
    }

    /// Remove the notification section
    pub fn without_notification(mut self) -> Self {
        self.notification = None;
        self
    }

    /// Require a notification section at load time
    pub fn requiring_notification(mut self) -> Self {
        self.backup_policy.require_notification = true;
        self
    }

    /// Get the temp directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Staging directory artifacts are written to
    pub fn staging_dir(&self) -> PathBuf {
        self.backup_policy.temp_directory.clone()
    }

    /// Build the configuration, dropping the temp directory
    pub fn build(self) -> Config {
        self.persist().0
    }

    /// Build the configuration and keep the temp directory alive
    pub fn persist(self) -> (Config, TempDir) {
        let config = Config {
            transfer_server: self.transfer_server,
            backup_policy: self.backup_policy,
            database: self.database,
            notification: self.notification,
            logging: self.logging,
        };
        (config, self.temp_dir)
    }

    /// Build, write the config as TOML and return its path
    pub fn write_to_file(self, file_name: &str) -> (PathBuf, Config, TempDir) {
        let (config, temp_dir) = self.persist();
        let path = temp_dir.path().join(file_name);
        let content = toml::to_string_pretty(&config).expect("Failed to serialize config");
        fs::write(&path, content).expect("Failed to write config file");
        (path, config, temp_dir)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
