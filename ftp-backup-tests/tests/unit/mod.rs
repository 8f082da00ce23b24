//! Unit tests for ftp-backup building blocks
//!
//! These tests exercise config loading, rotation selection and archive
//! production against real files in temporary directories.

mod archive;
mod config;
mod rotation;
