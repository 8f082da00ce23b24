//! Test context and harness for orchestrator testing
//!
//! Provides a unified context for setting up test environments and wiring
//! mocked capabilities into a [`BackupOrchestrator`].

use crate::config_builder::ConfigBuilder;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use ftp_backup::config::Config;
use ftp_backup::job::{BackupJob, BackupRequest};
use ftp_backup::managers::backup::BackupOrchestrator;
use ftp_backup::managers::notification::Notifier;
use ftp_backup::utils::archive_ops::mock::MockArchiver;
use ftp_backup::utils::mail::mock::MockMailRelay;
use ftp_backup::utils::transfer_ops::mock::MockTransferClient;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test context that manages test resources and provides common utilities
pub struct TestContext {
    /// Temporary directory for test files
    temp_dir: TempDir,
    /// The test configuration
    config: Option<Config>,
}

impl TestContext {
    /// Create a new test context with a temporary directory
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
            config: None,
        }
    }

    /// Create a test context with a minimal configuration
    pub fn with_minimal_config() -> Self {
        Self::from_builder(ConfigBuilder::minimal())
    }

    /// Create a test context from a ConfigBuilder
    pub fn from_builder(builder: ConfigBuilder) -> Self {
        let (config, temp_dir) = builder.persist();

        Self {
            temp_dir,
            config: Some(config),
        }
    }

    /// Get the temporary directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the configuration
    pub fn config(&self) -> Option<&Config> {
        self.config.as_ref()
    }

    /// Create a subdirectory in the temp dir
    pub fn create_subdir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create subdirectory");
        path
    }

    /// Create a file in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Create a small website-like tree to archive
    pub fn create_source_tree(&self) -> PathBuf {
        self.create_file("site/index.html", "<html></html>");
        self.create_file("site/css/style.css", "body {}");
        self.create_file("site/uploads/logo.png", "png");
        self.temp_dir.path().join("site")
    }

    /// Check if a file exists in the temp directory
    pub fn file_exists(&self, name: &str) -> bool {
        self.temp_dir.path().join(name).exists()
    }

    /// Read a file from the temp directory
    pub fn read_file(&self, name: &str) -> Result<String> {
        let path = self.temp_dir.path().join(name);
        Ok(std::fs::read_to_string(path)?)
    }

    /// Wire mocks into an orchestrator over this context's config
    pub fn harness(&self, transfer: MockTransferClient) -> Harness {
        Harness::new(
            self.config.clone().expect("Context has no config"),
            MockArchiver::new(),
            transfer,
            MockMailRelay::new(),
        )
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An orchestrator over mocked capabilities, with handles to inspect them
pub struct Harness {
    pub orchestrator: BackupOrchestrator,
    pub archiver: MockArchiver,
    pub transfer: MockTransferClient,
    pub relay: MockMailRelay,
}

impl Harness {
    pub fn new(
        config: Config,
        archiver: MockArchiver,
        transfer: MockTransferClient,
        relay: MockMailRelay,
    ) -> Self {
        let orchestrator = BackupOrchestrator::with_capabilities(
            config,
            Box::new(archiver.clone()),
            Box::new(transfer.clone()),
            Notifier::with_relay(Box::new(relay.clone())),
        );

        Self {
            orchestrator,
            archiver,
            transfer,
            relay,
        }
    }

    /// Resolve a job for `request` as if started on 2024-01-`day` 03:00:00
    pub fn job_on(&self, request: &BackupRequest, day: u32) -> BackupJob {
        BackupJob::resolve_at(self.orchestrator.config(), request, run_time(day))
            .expect("Failed to resolve job")
    }
}

/// Start time of the nightly run on 2024-01-`day`
pub fn run_time(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|d| d.and_hms_opt(3, 0, 0))
        .expect("Invalid test date")
}

/// Extension trait for assertion helpers
pub trait ResultAssertions<T> {
    /// Assert that the result is Ok and return the value
    fn assert_ok(self) -> T;

    /// Assert that the result is Err
    fn assert_err(self);

    /// Assert that the result is Err and the error message contains the given string
    fn assert_err_contains(self, needle: &str);
}

impl<T: std::fmt::Debug, E: std::fmt::Display> ResultAssertions<T> for Result<T, E> {
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {}", e),
        }
    }

    fn assert_err(self) {
        if let Ok(v) = self {
            panic!("Expected Err, got Ok: {:?}", v);
        }
    }

    fn assert_err_contains(self, needle: &str) {
        match self {
            Ok(v) => panic!("Expected Err containing '{}', got Ok: {:?}", needle, v),
            Err(e) => {
                let err_msg = e.to_string();
                assert!(
                    err_msg.contains(needle),
                    "Error '{}' does not contain '{}'",
                    err_msg,
                    needle
                );
            }
        }
    }
}

/// Extension trait for Option assertions
pub trait OptionAssertions<T> {
    /// Assert that the option is Some and return the value
    fn assert_some(self) -> T;

    /// Assert that the option is None
    fn assert_none(self);
}

impl<T: std::fmt::Debug> OptionAssertions<T> for Option<T> {
    fn assert_some(self) -> T {
        match self {
            Some(v) => v,
            None => panic!("Expected Some, got None"),
        }
    }

    fn assert_none(self) {
        if let Some(v) = self {
            panic!("Expected None, got Some: {:?}", v);
        }
    }
}
