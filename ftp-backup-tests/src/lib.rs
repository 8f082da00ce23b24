//! Test utilities for ftp-backup
//!
//! This crate provides shared test utilities, mock implementations,
//! and helper functions for testing the ftp-backup application.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{ConfigBuilder, TestContext, MockTransferClient};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::from_builder(ConfigBuilder::minimal().with_retention(3));
//!     let harness = ctx.harness(MockTransferClient::new());
//!     // ... test code
//! }
//! ```

pub mod config_builder;
pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use config_builder::ConfigBuilder;
pub use fixtures::*;
pub use test_context::{Harness, OptionAssertions, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use ftp_backup::config::{
    BackupPolicy, Config, DatabaseConfig, LoggingSettings, NotificationSpec, ServerEndpoint,
};

// Re-export mock implementations from the main crate
pub use ftp_backup::utils::archive_ops::mock::{ArchiveCall, MockArchiver};
pub use ftp_backup::utils::archive_ops::ArchiveProducer;
pub use ftp_backup::utils::executor::mock::{MockExecutor, MockResponse};
pub use ftp_backup::utils::executor::CommandExecutor;
pub use ftp_backup::utils::mail::mock::MockMailRelay;
pub use ftp_backup::utils::transfer_ops::mock::{MockFailure, MockTransferClient, TransferCall};
pub use ftp_backup::utils::transfer_ops::{Session, TransferClient};

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
