//! Remote artifact rotation
//!
//! Listings are assumed chronological (names embed a sortable timestamp), so
//! the oldest artifacts are the first ones listed. Listings are never re-sorted.

use crate::error::RotationError;
use crate::job::NamePattern;
use crate::utils::transfer_ops::Session;
use tracing::{debug, info, warn};

/// Names to delete so that at most `retention_count` remain
///
/// A retention count of 0 disables rotation and selects nothing.
pub fn select_expired(listing: &[String], retention_count: u32) -> Vec<String> {
    let keep = retention_count as usize;
    if keep == 0 || listing.len() <= keep {
        return Vec::new();
    }
    listing[..listing.len() - keep].to_vec()
}

/// Keeps the newest `retention_count` remote artifacts per pattern
#[derive(Debug, Clone, Copy)]
pub struct RotationPolicy {
    retention_count: u32,
}

impl RotationPolicy {
    pub fn new(retention_count: u32) -> Self {
        Self { retention_count }
    }

    pub fn is_enabled(&self) -> bool {
        self.retention_count > 0
    }

    /// List artifacts matching `pattern` and delete the expired ones
    ///
    /// Returns the names actually deleted. Does not touch the server when
    /// rotation is disabled. A failed delete does not stop the others.
    pub fn rotate(
        &self,
        session: &mut dyn Session,
        pattern: &NamePattern,
    ) -> Result<Vec<String>, RotationError> {
        if !self.is_enabled() {
            debug!("Rotation disabled, skipping {}", pattern);
            return Ok(Vec::new());
        }

        let listing = session.list(pattern).map_err(RotationError::List)?;
        let expired = select_expired(&listing, self.retention_count);

        if expired.is_empty() {
            debug!(
                "{} remote artifact(s) match {}, within retention of {}",
                listing.len(),
                pattern,
                self.retention_count
            );
            return Ok(Vec::new());
        }

        info!(
            "Rotating {}: {} found, keeping {}, deleting {}",
            pattern,
            listing.len(),
            self.retention_count,
            expired.len()
        );

        let mut deleted = Vec::with_capacity(expired.len());
        let mut failed = Vec::new();
        for name in &expired {
            match session.delete(name) {
                Ok(()) => deleted.push(name.clone()),
                Err(e) => {
                    warn!("Failed to delete expired artifact {}: {}", name, e);
                    failed.push(name.clone());
                }
            }
        }

        if !failed.is_empty() {
            return Err(RotationError::Delete {
                attempted: expired.len(),
                deleted,
                failed,
            });
        }

        Ok(deleted)
    }
}
