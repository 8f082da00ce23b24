//! Artifact production abstraction for testability

use super::executor::{CommandExecutor, RealExecutor};
use crate::config::DatabaseConfig;
use crate::error::ArchiveError;
use crate::job::{Artifact, ArtifactKind};
use std::path::Path;
use std::time::Duration;

/// Produces backup artifacts in the local staging directory
pub trait ArchiveProducer: Send + Sync {
    /// Compress `source` into `<destination_prefix>.zip`
    fn produce_directory_archive(
        &self,
        source: &Path,
        destination_prefix: &Path,
    ) -> Result<Artifact, ArchiveError>;

    /// Dump the database into `<destination_prefix>.sql`
    fn produce_database_dump(
        &self,
        spec: &DatabaseConfig,
        destination_prefix: &Path,
        timeout: Duration,
    ) -> Result<Artifact, ArchiveError>;
}

/// Default implementation: zip on disk, dumps through a command executor
pub struct RealArchiver {
    executor: Box<dyn CommandExecutor>,
}

impl RealArchiver {
    pub fn new() -> Self {
        Self {
            executor: Box::new(RealExecutor::new()),
        }
    }

    /// Use a specific executor for dump commands
    pub fn with_executor(executor: Box<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

impl Default for RealArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveProducer for RealArchiver {
    fn produce_directory_archive(
        &self,
        source: &Path,
        destination_prefix: &Path,
    ) -> Result<Artifact, ArchiveError> {
        let artifact = Artifact::from_prefix(destination_prefix, ArtifactKind::Zip);
        super::archive::zip_directory(source, &artifact.local_path)?;
        Ok(artifact)
    }

    fn produce_database_dump(
        &self,
        spec: &DatabaseConfig,
        destination_prefix: &Path,
        timeout: Duration,
    ) -> Result<Artifact, ArchiveError> {
        let artifact = Artifact::from_prefix(destination_prefix, ArtifactKind::Dump);
        super::archive::dump_database(self.executor.as_ref(), spec, &artifact.local_path, timeout)?;
        Ok(artifact)
    }
}

/// Mock archive producer, writing small placeholder files
pub mod mock {
    use super::*;
    use std::fs;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum ArchiveCall {
        Directory { source: String },
        Dump { backend: String },
    }

    #[derive(Clone, Default)]
    pub struct MockArchiver {
        pub calls: Arc<Mutex<Vec<ArchiveCall>>>,
        pub should_fail_directory: Arc<Mutex<bool>>,
        pub should_fail_dump: Arc<Mutex<bool>>,
    }

    impl MockArchiver {
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure the directory archive to fail
        pub fn with_failing_directory(self) -> Self {
            *self.should_fail_directory.lock().unwrap() = true;
            self
        }

        /// Configure the database dump to fail
        pub fn with_failing_dump(self) -> Self {
            *self.should_fail_dump.lock().unwrap() = true;
            self
        }

        pub fn get_calls(&self) -> Vec<ArchiveCall> {
            self.calls.lock().unwrap().clone()
        }

        /// Whether anything was produced or attempted
        pub fn was_called(&self) -> bool {
            !self.calls.lock().unwrap().is_empty()
        }

        fn write_placeholder(artifact: &Artifact) -> Result<(), ArchiveError> {
            if let Some(parent) = artifact.local_path.parent() {
                fs::create_dir_all(parent).map_err(|e| ArchiveError::DestinationUnwritable {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            fs::write(&artifact.local_path, artifact.remote_name.as_bytes()).map_err(|e| {
                ArchiveError::DestinationUnwritable {
                    path: artifact.local_path.clone(),
                    source: e,
                }
            })
        }
    }

    impl ArchiveProducer for MockArchiver {
        fn produce_directory_archive(
            &self,
            source: &Path,
            destination_prefix: &Path,
        ) -> Result<Artifact, ArchiveError> {
            self.calls.lock().unwrap().push(ArchiveCall::Directory {
                source: source.display().to_string(),
            });
            if *self.should_fail_directory.lock().unwrap() {
                return Err(ArchiveError::SourceUnreadable {
                    path: source.to_path_buf(),
                    message: "Mock directory failure".to_string(),
                });
            }
            let artifact = Artifact::from_prefix(destination_prefix, ArtifactKind::Zip);
            Self::write_placeholder(&artifact)?;
            Ok(artifact)
        }

        fn produce_database_dump(
            &self,
            spec: &DatabaseConfig,
            destination_prefix: &Path,
            _timeout: Duration,
        ) -> Result<Artifact, ArchiveError> {
            self.calls.lock().unwrap().push(ArchiveCall::Dump {
                backend: spec.backend.clone(),
            });
            if *self.should_fail_dump.lock().unwrap() {
                return Err(ArchiveError::Dump {
                    backend: spec.backend.clone(),
                    message: "Mock dump failure".to_string(),
                });
            }
            let artifact = Artifact::from_prefix(destination_prefix, ArtifactKind::Dump);
            Self::write_placeholder(&artifact)?;
            Ok(artifact)
        }
    }
}
