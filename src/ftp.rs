//! suppaftp-backed implementation of the archive session
//!
//! Maps FTP status codes onto the crate's error taxonomy so the engine
//! and materializer never see raw protocol errors.

use std::io::Read;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;

use suppaftp::types::{FileType, Response};
use suppaftp::{FtpError, FtpStream, Status};

use crate::config::Config;
use crate::remote::{ArchiveSession, ConnectError, Connector, RemoteError};

/// Opens one plain-FTP session per upload attempt
pub struct FtpConnector {
    config: Arc<Config>,
}

impl FtpConnector {
    pub fn new(config: Arc<Config>) -> Self {
        FtpConnector { config }
    }
}

impl Connector for FtpConnector {
    fn connect(&self) -> Result<Box<dyn ArchiveSession>, ConnectError> {
        let timeout = Duration::from_secs(self.config.connect_timeout_seconds);

        // Resolve host to all possible addresses and try each in turn.
        let addrs: Vec<std::net::SocketAddr> = (self.config.host.as_str(), self.config.port)
            .to_socket_addrs()
            .map_err(|_| ConnectError::HostUnreachable)?
            .collect();

        if addrs.is_empty() {
            return Err(ConnectError::HostUnreachable);
        }

        let mut last_error = None;
        let mut connected = None;
        for addr in addrs {
            match FtpStream::connect_timeout(addr, timeout) {
                Ok(stream) => {
                    connected = Some(stream);
                    break;
                }
                Err(e) => last_error = Some(e),
            }
        }

        let mut stream = match connected {
            Some(stream) => stream,
            None => {
                let err = last_error.expect("at least one address was attempted");
                return Err(classify_connect(err));
            }
        };

        if let Err(e) = stream.login(&self.config.login, &self.config.password) {
            let _ = stream.quit();
            return Err(classify_connect(e));
        }

        // Binary mode once per session; every stored file is a video.
        if let Err(e) = stream.transfer_type(FileType::Binary) {
            let _ = stream.quit();
            return Err(ConnectError::Unknown(e.to_string()));
        }

        Ok(Box::new(FtpArchiveSession {
            stream: Some(stream),
        }))
    }
}

/// A live FTP control connection, closed at most once
pub struct FtpArchiveSession {
    stream: Option<FtpStream>,
}

impl FtpArchiveSession {
    fn stream(&mut self) -> Result<&mut FtpStream, RemoteError> {
        self.stream
            .as_mut()
            .ok_or_else(|| RemoteError::Protocol("session already closed".to_string()))
    }
}

impl ArchiveSession for FtpArchiveSession {
    fn cwd(&mut self, path: &str) -> Result<(), RemoteError> {
        self.stream()?
            .cwd(path)
            .map_err(|e| classify_remote(e, RemoteError::NotFound))
    }

    fn mkd(&mut self, path: &str) -> Result<(), RemoteError> {
        // 550 from MKD usually means the directory is already there;
        // the materializer's follow-up cwd decides whether that is true.
        self.stream()?
            .mkdir(path)
            .map(|_| ())
            .map_err(|e| classify_remote(e, RemoteError::AlreadyExists))
    }

    fn size(&mut self, name: &str) -> Result<usize, RemoteError> {
        self.stream()?
            .size(name)
            .map_err(|e| classify_remote(e, RemoteError::NotFound))
    }

    fn store(&mut self, name: &str, reader: &mut dyn Read) -> Result<(), RemoteError> {
        self.stream()?
            .put_file(name, &mut { reader })
            .map(|_| ())
            .map_err(|e| classify_remote(e, RemoteError::PermissionDenied))
    }

    fn quit(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.quit();
        }
    }
}

impl Drop for FtpArchiveSession {
    fn drop(&mut self) {
        self.quit();
    }
}

/// Classifies a connection/login failure for logging
fn classify_connect(err: FtpError) -> ConnectError {
    match err {
        FtpError::ConnectionError(io) => match io.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                ConnectError::TimedOut
            }
            std::io::ErrorKind::ConnectionRefused => ConnectError::ConnectionRefused,
            std::io::ErrorKind::NotFound => ConnectError::HostUnreachable,
            _ => ConnectError::Unknown(io.to_string()),
        },
        FtpError::UnexpectedResponse(response) => classify_auth(response),
        other => ConnectError::Unknown(other.to_string()),
    }
}

fn classify_auth(response: Response) -> ConnectError {
    if response.status == Status::NotLoggedIn {
        ConnectError::AuthRejected
    } else {
        ConnectError::Unknown(format!(
            "{:?}: {}",
            response.status,
            String::from_utf8_lossy(&response.body).trim()
        ))
    }
}

/// Classifies a remote-operation failure
///
/// `file_unavailable` supplies the context-dependent meaning of a 550
/// reply: NotFound for cwd/size probes, AlreadyExists for mkd,
/// PermissionDenied for store.
fn classify_remote(err: FtpError, file_unavailable: RemoteError) -> RemoteError {
    match err {
        FtpError::UnexpectedResponse(response) => match response.status {
            Status::FileUnavailable => file_unavailable,
            Status::BadFilename => RemoteError::PermissionDenied,
            status => RemoteError::Protocol(format!(
                "{:?}: {}",
                status,
                String::from_utf8_lossy(&response.body).trim()
            )),
        },
        other => RemoteError::Protocol(other.to_string()),
    }
}
