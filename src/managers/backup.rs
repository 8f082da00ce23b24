//! Backup orchestrator - sequences archive, upload, rotation and notification
//!
//! One run walks `Init → Configured → Archiving → Uploading → [Rotating] →
//! Notifying → Done`. A failure in archiving or uploading moves to `Failed`,
//! which closes the session, sends exactly one failure notification, and
//! leaves uploaded-phase artifacts on disk for manual recovery.

use crate::config::Config;
use crate::error::{ArchiveError, FailureKind, JobError, RotationError, TransferError};
use crate::job::{Artifact, ArtifactKind, BackupJob, BackupRequest, NamePattern};
use crate::managers::notification::Notifier;
use crate::managers::rotation::RotationPolicy;
use crate::utils::archive_ops::{ArchiveProducer, RealArchiver};
use crate::utils::ftp::FtpClient;
use crate::utils::transfer_ops::{RemoteEntry, Session, TransferClient};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Phases of a single backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Configured,
    Archiving,
    Uploading,
    Rotating,
    Notifying,
    Done,
    Failed,
}

impl RunState {
    /// Whether a run may move from `self` to `next`
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Init, Configured)
            | (Configured, Archiving)
            | (Archiving, Uploading)
            | (Uploading, Rotating)
            | (Uploading, Notifying)
            | (Rotating, Notifying)
            | (Notifying, Done) => true,
            (Init, Failed) | (Done, Failed) | (Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Every state entered, in order
    pub states: Vec<RunState>,
    pub failure: Option<FailureKind>,
    pub artifacts: Vec<Artifact>,
    /// Remote names uploaded successfully
    pub uploaded: Vec<String>,
    /// Remote names deleted by rotation
    pub rotated: Vec<String>,
    /// Whether a notification was delivered
    pub notified: bool,
}

impl RunReport {
    fn new() -> Self {
        Self {
            states: vec![RunState::Init],
            failure: None,
            artifacts: Vec::new(),
            uploaded: Vec::new(),
            rotated: Vec::new(),
            notified: false,
        }
    }

    /// Current (last entered) state
    pub fn state(&self) -> RunState {
        self.states.last().copied().unwrap_or(RunState::Init)
    }

    pub fn succeeded(&self) -> bool {
        self.state() == RunState::Done
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state().can_transition_to(next),
            "invalid run transition {:?} -> {:?}",
            self.state(),
            next
        );
        debug!("Run state {:?} -> {:?}", self.state(), next);
        self.states.push(next);
    }
}

pub struct BackupOrchestrator {
    config: Config,
    archiver: Box<dyn ArchiveProducer>,
    transfer: Box<dyn TransferClient>,
    notifier: Notifier,
}

impl BackupOrchestrator {
    /// Create an orchestrator using zip/dump, FTP and SMTP
    pub fn new(config: Config) -> Self {
        Self {
            config,
            archiver: Box::new(RealArchiver::new()),
            transfer: Box::new(FtpClient::new()),
            notifier: Notifier::new(),
        }
    }

    /// Create an orchestrator with specific capabilities
    pub fn with_capabilities(
        config: Config,
        archiver: Box<dyn ArchiveProducer>,
        transfer: Box<dyn TransferClient>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            archiver,
            transfer,
            notifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the job for `request` and run it
    ///
    /// Errors only when the job cannot be resolved; run failures are
    /// reported through [`RunReport`].
    pub fn run(&self, request: &BackupRequest) -> Result<RunReport, JobError> {
        let job = BackupJob::resolve(&self.config, request)?;
        Ok(self.run_job(&job))
    }

    /// Run a resolved job to `Done` or `Failed`
    pub fn run_job(&self, job: &BackupJob) -> RunReport {
        let start_time = Instant::now();
        let mut report = RunReport::new();
        report.advance(RunState::Configured);

        info!("Starting new backup {}/{}", job.name, job.artifact_stem());

        report.advance(RunState::Archiving);
        let artifacts = match self.produce_artifacts(job) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                error!("Backup failed ({}): {}", FailureKind::Archive, e);
                return self.fail(report, job, FailureKind::Archive, None);
            }
        };
        report.artifacts = artifacts.clone();

        report.advance(RunState::Uploading);
        let mut session = match self.transfer.connect(&self.config.transfer_server) {
            Ok(session) => session,
            Err(e) => {
                let kind = FailureKind::from(&e);
                error!("Backup failed ({}): {}", kind, e);
                return self.fail(report, job, kind, None);
            }
        };

        for artifact in &artifacts {
            if let Err(e) = session.upload(artifact) {
                let kind = FailureKind::from(&e);
                error!("Backup failed ({}): {}", kind, e);
                return self.fail(report, job, kind, Some(session));
            }
            report.uploaded.push(artifact.remote_name.clone());
        }
        info!("{} artifact(s) uploaded", report.uploaded.len());

        let policy = RotationPolicy::new(job.retention_count);
        if policy.is_enabled() {
            report.advance(RunState::Rotating);
            for artifact in &artifacts {
                let pattern = job.pattern(artifact.kind);
                match policy.rotate(session.as_mut(), &pattern) {
                    Ok(deleted) => report.rotated.extend(deleted),
                    Err(RotationError::Delete { deleted, failed, .. }) => {
                        warn!(
                            "Rotation of {} incomplete, could not delete: {}",
                            pattern,
                            failed.join(", ")
                        );
                        report.rotated.extend(deleted);
                    }
                    Err(e) => warn!("Rotation of {} failed: {}", pattern, e),
                }
            }
        }

        report.advance(RunState::Notifying);
        session.close();
        match job.notification {
            Some(ref spec) => report.notified = self.notifier.notify_logged(spec, None),
            None => debug!("No notification configured"),
        }

        cleanup_local(&artifacts);
        report.advance(RunState::Done);

        info!(
            "Finished backup {}/{} in {:.2}s",
            job.name,
            job.artifact_stem(),
            start_time.elapsed().as_secs_f64()
        );
        report
    }

    /// Produce every requested artifact, directory archive first
    ///
    /// On failure, artifacts already produced in this call are removed.
    fn produce_artifacts(&self, job: &BackupJob) -> Result<Vec<Artifact>, ArchiveError> {
        let prefix = job.destination_prefix();
        let mut produced = Vec::new();

        if let Some(directory) = job.sources.directory() {
            match self.archiver.produce_directory_archive(directory, &prefix) {
                Ok(artifact) => {
                    info!("Backup file created: {:?}", artifact.local_path);
                    produced.push(artifact);
                }
                Err(e) => {
                    discard_partial(&prefix, ArtifactKind::Zip);
                    cleanup_local(&produced);
                    return Err(e);
                }
            }
        }

        if let Some(database) = job.sources.database() {
            match self
                .archiver
                .produce_database_dump(database, &prefix, job.dump_timeout)
            {
                Ok(artifact) => {
                    info!("Database dump created: {:?}", artifact.local_path);
                    produced.push(artifact);
                }
                Err(e) => {
                    discard_partial(&prefix, ArtifactKind::Dump);
                    cleanup_local(&produced);
                    return Err(e);
                }
            }
        }

        Ok(produced)
    }

    /// Enter `Failed`: close the session, send one failure notification
    fn fail(
        &self,
        mut report: RunReport,
        job: &BackupJob,
        kind: FailureKind,
        session: Option<Box<dyn Session>>,
    ) -> RunReport {
        report.advance(RunState::Failed);
        report.failure = Some(kind);

        if let Some(mut session) = session {
            session.close();
        }

        match job.notification {
            Some(ref spec) => {
                report.notified = self.notifier.notify_logged(spec, Some(kind.message()));
            }
            None => warn!("No notification configured, failure not reported by mail"),
        }

        if !report.artifacts.is_empty() {
            info!(
                "Keeping {} local artifact(s) for manual recovery in {:?}",
                report.artifacts.len(),
                job.temp_directory
            );
        }

        report
    }

    /// List remote artifacts (all, or one backup family) with their sizes
    pub fn list_remote(&self, name: Option<&str>) -> Result<Vec<RemoteEntry>, TransferError> {
        let mut session = self.transfer.connect(&self.config.transfer_server)?;
        let pattern = NamePattern::for_listing(name);
        let result = collect_entries(session.as_mut(), &pattern);
        session.close();
        result
    }
}

fn collect_entries(
    session: &mut dyn Session,
    pattern: &NamePattern,
) -> Result<Vec<RemoteEntry>, TransferError> {
    let names = session.list(pattern)?;
    let mut entries = Vec::with_capacity(names.len());

    for name in names {
        let size = match session.size(&name) {
            Ok(size) => Some(size),
            Err(TransferError::SizeUnsupported(_)) => None,
            Err(e) => return Err(e),
        };
        entries.push(RemoteEntry { name, size });
    }

    Ok(entries)
}

/// Best-effort removal of local artifacts
fn cleanup_local(artifacts: &[Artifact]) {
    for artifact in artifacts {
        remove_if_present(&artifact.local_path);
    }
}

/// Remove whatever a failed producer left behind
fn discard_partial(prefix: &Path, kind: ArtifactKind) {
    remove_if_present(&Artifact::from_prefix(prefix, kind).local_path);
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!("Removed local artifact {:?}", path),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove local artifact {:?}: {}", path, e),
    }
}
