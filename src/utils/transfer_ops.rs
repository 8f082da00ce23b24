//! Remote transfer abstraction for testability
//!
//! A [`TransferClient`] opens a [`Session`]; the orchestrator owns that session
//! for the rest of the run and issues one operation at a time.

use crate::config::ServerEndpoint;
use crate::error::TransferError;
use crate::job::{Artifact, NamePattern};

/// Opens authenticated sessions to the transfer server
pub trait TransferClient: Send + Sync {
    /// Connect and log in, bounded by the endpoint timeout
    fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn Session>, TransferError>;
}

/// An open connection to the transfer server
pub trait Session: Send {
    /// Upload an artifact under its remote name
    fn upload(&mut self, artifact: &Artifact) -> Result<(), TransferError>;

    /// Names matching `pattern`, in the order the server listed them
    fn list(&mut self, pattern: &NamePattern) -> Result<Vec<String>, TransferError>;

    /// Size in bytes; [`TransferError::SizeUnsupported`] when the server won't say
    fn size(&mut self, name: &str) -> Result<u64, TransferError>;

    fn delete(&mut self, name: &str) -> Result<(), TransferError>;

    /// Close the session. Safe to call more than once.
    fn close(&mut self);
}

/// A listed remote artifact and its size, if known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub size: Option<u64>,
}

impl std::fmt::Display for RemoteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.size {
            Some(size) => write!(f, "{}\t{} bytes", self.name, size),
            None => write!(f, "{}\t? bytes", self.name),
        }
    }
}

/// In-memory transfer server for testing
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum TransferCall {
        Connect,
        Upload { name: String },
        List { pattern: String },
        Size { name: String },
        Delete { name: String },
        Close,
    }

    /// How a configured failure presents itself
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MockFailure {
        Timeout,
        Refused,
    }

    #[derive(Default)]
    struct MockRemote {
        files: Vec<String>,
        sizes: HashMap<String, u64>,
        calls: Vec<TransferCall>,
        connect_failure: Option<MockFailure>,
        upload_failures: Vec<(String, MockFailure)>,
        failing_deletes: Vec<String>,
        fail_list: bool,
        size_unsupported: bool,
    }

    /// Mock transfer client sharing one remote directory across sessions
    #[derive(Clone, Default)]
    pub struct MockTransferClient {
        remote: Arc<Mutex<MockRemote>>,
    }

    impl MockTransferClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populate the remote directory (listing order is preserved)
        pub fn with_remote_files(self, files: Vec<String>) -> Self {
            self.remote.lock().unwrap().files = files;
            self
        }

        /// Configure connect to fail
        pub fn with_failing_connect(self, failure: MockFailure) -> Self {
            self.remote.lock().unwrap().connect_failure = Some(failure);
            self
        }

        /// Configure uploads whose remote name ends with `suffix` to fail
        pub fn with_failing_upload(self, suffix: &str, failure: MockFailure) -> Self {
            self.remote
                .lock()
                .unwrap()
                .upload_failures
                .push((suffix.to_string(), failure));
            self
        }

        /// Configure deletes of one remote name to fail
        pub fn with_failing_delete(self, name: &str) -> Self {
            self.remote
                .lock()
                .unwrap()
                .failing_deletes
                .push(name.to_string());
            self
        }

        /// Configure listing to fail
        pub fn with_failing_list(self) -> Self {
            self.remote.lock().unwrap().fail_list = true;
            self
        }

        /// Configure the server to reject size queries
        pub fn without_size_support(self) -> Self {
            self.remote.lock().unwrap().size_unsupported = true;
            self
        }

        /// Set the size reported for a remote file
        pub fn with_size(self, name: &str, size: u64) -> Self {
            self.remote
                .lock()
                .unwrap()
                .sizes
                .insert(name.to_string(), size);
            self
        }

        pub fn get_calls(&self) -> Vec<TransferCall> {
            self.remote.lock().unwrap().calls.clone()
        }

        pub fn remote_files(&self) -> Vec<String> {
            self.remote.lock().unwrap().files.clone()
        }

        pub fn count(&self, predicate: impl Fn(&TransferCall) -> bool) -> usize {
            self.remote
                .lock()
                .unwrap()
                .calls
                .iter()
                .filter(|c| predicate(c))
                .count()
        }

        pub fn close_count(&self) -> usize {
            self.count(|c| matches!(c, TransferCall::Close))
        }

        pub fn list_called(&self) -> bool {
            self.count(|c| matches!(c, TransferCall::List { .. })) > 0
        }

        pub fn connect_called(&self) -> bool {
            self.count(|c| matches!(c, TransferCall::Connect)) > 0
        }
    }

    fn failure_error(failure: MockFailure, operation: &'static str, name: &str) -> TransferError {
        match failure {
            MockFailure::Timeout => TransferError::Timeout(format!("{} '{}'", operation, name)),
            MockFailure::Refused => TransferError::Operation {
                operation,
                name: name.to_string(),
                message: "Mock failure".to_string(),
            },
        }
    }

    impl TransferClient for MockTransferClient {
        fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn Session>, TransferError> {
            let mut remote = self.remote.lock().unwrap();
            remote.calls.push(TransferCall::Connect);
            match remote.connect_failure {
                Some(MockFailure::Timeout) => Err(TransferError::Timeout("connect".to_string())),
                Some(MockFailure::Refused) => Err(TransferError::Connect {
                    host: endpoint.host.clone(),
                    port: endpoint.port,
                    message: "Mock connection refused".to_string(),
                }),
                None => Ok(Box::new(MockSession {
                    remote: Arc::clone(&self.remote),
                })),
            }
        }
    }

    struct MockSession {
        remote: Arc<Mutex<MockRemote>>,
    }

    impl Session for MockSession {
        fn upload(&mut self, artifact: &Artifact) -> Result<(), TransferError> {
            let mut remote = self.remote.lock().unwrap();
            remote.calls.push(TransferCall::Upload {
                name: artifact.remote_name.clone(),
            });
            let failure = remote
                .upload_failures
                .iter()
                .find(|(suffix, _)| artifact.remote_name.ends_with(suffix.as_str()))
                .map(|(_, f)| *f);
            if let Some(failure) = failure {
                return Err(failure_error(failure, "upload", &artifact.remote_name));
            }
            remote.files.push(artifact.remote_name.clone());
            Ok(())
        }

        fn list(&mut self, pattern: &NamePattern) -> Result<Vec<String>, TransferError> {
            let mut remote = self.remote.lock().unwrap();
            remote.calls.push(TransferCall::List {
                pattern: pattern.to_string(),
            });
            if remote.fail_list {
                return Err(failure_error(MockFailure::Refused, "list", &pattern.to_string()));
            }
            Ok(remote
                .files
                .iter()
                .filter(|f| pattern.matches(f))
                .cloned()
                .collect())
        }

        fn size(&mut self, name: &str) -> Result<u64, TransferError> {
            let mut remote = self.remote.lock().unwrap();
            remote.calls.push(TransferCall::Size {
                name: name.to_string(),
            });
            if remote.size_unsupported {
                return Err(TransferError::SizeUnsupported(name.to_string()));
            }
            Ok(remote.sizes.get(name).copied().unwrap_or(0))
        }

        fn delete(&mut self, name: &str) -> Result<(), TransferError> {
            let mut remote = self.remote.lock().unwrap();
            remote.calls.push(TransferCall::Delete {
                name: name.to_string(),
            });
            if remote.failing_deletes.iter().any(|n| n == name) {
                return Err(failure_error(MockFailure::Refused, "delete", name));
            }
            remote.files.retain(|f| f != name);
            Ok(())
        }

        fn close(&mut self) {
            self.remote.lock().unwrap().calls.push(TransferCall::Close);
        }
    }
}
