//! FTP implementation of the transfer capability

use super::transfer_ops::{Session, TransferClient};
use crate::config::ServerEndpoint;
use crate::error::TransferError;
use crate::job::{Artifact, NamePattern};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpResult, FtpStream, Status};
use tracing::{debug, info};

/// Connects to plain FTP servers
#[derive(Debug, Clone, Default)]
pub struct FtpClient;

impl FtpClient {
    pub fn new() -> Self {
        Self
    }
}

impl TransferClient for FtpClient {
    fn connect(&self, endpoint: &ServerEndpoint) -> Result<Box<dyn Session>, TransferError> {
        let timeout = endpoint.timeout();
        let connect_error = |message: String| TransferError::Connect {
            host: endpoint.host.clone(),
            port: endpoint.port,
            message,
        };

        let addr = (endpoint.host.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|e| connect_error(e.to_string()))?
            .next()
            .ok_or_else(|| connect_error("host resolved to no address".to_string()))?;

        info!("Connecting to FTP server {}:{}", endpoint.host, endpoint.port);

        let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| {
            if is_timeout(e.kind()) {
                TransferError::Timeout("connect".to_string())
            } else {
                connect_error(e.to_string())
            }
        })?;

        // Bound the greeting and every later control-channel exchange
        tcp.set_read_timeout(Some(timeout))
            .and_then(|_| tcp.set_write_timeout(Some(timeout)))
            .map_err(|e| connect_error(e.to_string()))?;

        let mut stream = FtpStream::connect_with_stream(tcp)
            .map_err(|e| map_error(e, "connect", &endpoint.host))?
            .passive_stream_builder(data_stream_builder(timeout));

        stream
            .login(endpoint.username.as_str(), endpoint.password.as_str())
            .map_err(|e| match map_error(e, "login", &endpoint.username) {
                TransferError::Operation { .. } => TransferError::Login(endpoint.username.clone()),
                other => other,
            })?;
        stream
            .transfer_type(FileType::Binary)
            .map_err(|e| map_error(e, "set binary mode", ""))?;

        info!("Logged in to FTP server as '{}'", endpoint.username);

        Ok(Box::new(FtpSession {
            stream: Some(stream),
        }))
    }
}

/// An authenticated FTP control connection
pub struct FtpSession {
    stream: Option<FtpStream>,
}

impl FtpSession {
    fn stream(&mut self) -> Result<&mut FtpStream, TransferError> {
        self.stream.as_mut().ok_or(TransferError::Closed)
    }
}

impl Session for FtpSession {
    fn upload(&mut self, artifact: &Artifact) -> Result<(), TransferError> {
        let file = File::open(&artifact.local_path).map_err(|e| TransferError::Operation {
            operation: "upload",
            name: artifact.remote_name.clone(),
            message: format!("cannot open {:?}: {}", artifact.local_path, e),
        })?;
        let mut reader = BufReader::new(file);

        info!("Uploading {} to FTP server", artifact.remote_name);
        let bytes = self
            .stream()?
            .put_file(artifact.remote_name.as_str(), &mut reader)
            .map_err(|e| map_error(e, "upload", &artifact.remote_name))?;
        info!("Uploaded {} ({} bytes)", artifact.remote_name, bytes);

        Ok(())
    }

    fn list(&mut self, pattern: &NamePattern) -> Result<Vec<String>, TransferError> {
        debug!("Listing remote files matching {}", pattern);
        let names = match self.stream()?.nlst(None) {
            Ok(names) => names,
            // Some servers answer NLST on an empty directory with 550
            Err(FtpError::UnexpectedResponse(ref response))
                if response.status == Status::FileUnavailable =>
            {
                Vec::new()
            }
            Err(e) => return Err(map_error(e, "list", &pattern.to_string())),
        };

        Ok(names.into_iter().filter(|n| pattern.matches(n)).collect())
    }

    fn size(&mut self, name: &str) -> Result<u64, TransferError> {
        match self.stream()?.size(name) {
            Ok(size) => Ok(size as u64),
            Err(FtpError::ConnectionError(ref io)) if is_timeout(io.kind()) => {
                Err(TransferError::Timeout(format!("size '{}'", name)))
            }
            Err(e) => {
                debug!("SIZE {} not answered: {}", name, e);
                Err(TransferError::SizeUnsupported(name.to_string()))
            }
        }
    }

    fn delete(&mut self, name: &str) -> Result<(), TransferError> {
        info!("Deleting remote file {}", name);
        self.stream()?
            .rm(name)
            .map_err(|e| map_error(e, "delete", name))
    }

    fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            match stream.quit() {
                Ok(()) => debug!("FTP session closed"),
                Err(e) => debug!("FTP QUIT failed (connection dropped anyway): {}", e),
            }
        }
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Opens passive data connections under the same bound as the control channel
fn data_stream_builder(timeout: Duration) -> impl Fn(SocketAddr) -> FtpResult<TcpStream> {
    move |addr| {
        let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(FtpError::ConnectionError)?;
        tcp.set_read_timeout(Some(timeout))
            .and_then(|_| tcp.set_write_timeout(Some(timeout)))
            .map_err(FtpError::ConnectionError)?;
        Ok(tcp)
    }
}

fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

fn map_error(err: FtpError, operation: &'static str, name: &str) -> TransferError {
    match err {
        FtpError::ConnectionError(ref io) if is_timeout(io.kind()) => {
            TransferError::Timeout(format!("{} '{}'", operation, name))
        }
        other => TransferError::Operation {
            operation,
            name: name.to_string(),
            message: other.to_string(),
        },
    }
}
