//! Command tests for ftp-backup
//!
//! These tests verify backup runs and remote listing using mocked
//! transfer, archive and mail capabilities.

mod list;
mod run;
