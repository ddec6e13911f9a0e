//! Remote archive session abstraction and directory materialization
//!
//! The uploader talks to the archive exclusively through the
//! `ArchiveSession` trait so tests can substitute a scripted fake for a
//! live FTP connection. `ensure_directory` walks a slash-delimited path
//! segment by segment, creating what is missing.

use crate::logging::info;
use std::fmt;
use std::io::Read;

/// Failure to establish an archive session
///
/// Causes are distinguished for logging only; every variant is treated
/// as transient by the engine and the connection is never retried
/// within an attempt.
#[derive(Debug)]
pub enum ConnectError {
    /// Server rejected the login credentials
    AuthRejected,
    /// Host could not be resolved or reached
    HostUnreachable,
    /// Connection attempt timed out
    TimedOut,
    /// Server actively refused the connection
    ConnectionRefused,
    /// Anything else, with detail for the log
    Unknown(String),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::AuthRejected => write!(f, "authentication rejected"),
            ConnectError::HostUnreachable => write!(f, "host unreachable"),
            ConnectError::TimedOut => write!(f, "connection timed out"),
            ConnectError::ConnectionRefused => write!(f, "connection refused"),
            ConnectError::Unknown(detail) => write!(f, "connection failed: {}", detail),
        }
    }
}

/// Failure of a single remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Target path or file does not exist (expected signal, not fatal)
    NotFound,
    /// Directory already exists (expected from mkd during a race)
    AlreadyExists,
    /// Server refused the operation
    PermissionDenied,
    /// Transport or protocol level failure, with detail for the log
    Protocol(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::NotFound => write!(f, "not found"),
            RemoteError::AlreadyExists => write!(f, "already exists"),
            RemoteError::PermissionDenied => write!(f, "permission denied"),
            RemoteError::Protocol(detail) => write!(f, "protocol error: {}", detail),
        }
    }
}

/// A single short-lived session against the remote archive
///
/// Owned exclusively by one upload attempt; `quit` is called on every
/// exit path and must be idempotent.
pub trait ArchiveSession {
    /// Change the remote working directory
    fn cwd(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Create a remote directory
    fn mkd(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Query the size of a remote file, used purely as an existence probe
    fn size(&mut self, name: &str) -> Result<usize, RemoteError>;

    /// Write a byte stream to a named remote file in the current directory
    fn store(&mut self, name: &str, reader: &mut dyn Read) -> Result<(), RemoteError>;

    /// Close the session; idempotent, never errors
    fn quit(&mut self);
}

/// Opens archive sessions; one session per upload attempt
pub trait Connector {
    fn connect(&self) -> Result<Box<dyn ArchiveSession>, ConnectError>;
}

/// Failure while materializing a remote directory path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirFailure {
    /// Absolute remote path of the segment that failed
    pub segment: String,
    pub cause: RemoteError,
}

impl fmt::Display for DirFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment {}: {}", self.segment, self.cause)
    }
}

/// Ensures every segment of a remote directory path exists
///
/// Always resets the cursor to the remote root first, then walks the
/// segments in order: cwd, and on NotFound mkd followed by cwd into
/// the new segment. AlreadyExists from mkd is tolerated (another
/// writer may have raced us); the follow-up cwd decides.
///
/// Idempotent: repeated calls with an existing path are a no-op
/// sequence of successful cwd calls, ending with the cursor in the
/// final segment.
///
/// # Errors
/// Reports the failing segment and cause; callers treat any failure
/// as transient for the current file.
pub fn ensure_directory(
    session: &mut dyn ArchiveSession,
    segments: &[String],
) -> Result<(), DirFailure> {
    // Defend against a previous call leaving the cursor elsewhere.
    session.cwd("/").map_err(|cause| DirFailure {
        segment: "/".to_string(),
        cause,
    })?;

    let mut current = String::new();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        current.push('/');
        current.push_str(segment);

        match session.cwd(&current) {
            Ok(()) => continue,
            Err(RemoteError::NotFound) => {
                match session.mkd(&current) {
                    Ok(()) | Err(RemoteError::AlreadyExists) => {}
                    Err(cause) => {
                        return Err(DirFailure {
                            segment: current.clone(),
                            cause,
                        });
                    }
                }
                session.cwd(&current).map_err(|cause| DirFailure {
                    segment: current.clone(),
                    cause,
                })?;
                let _ = info(&format!("Created remote directory {}", current));
            }
            Err(cause) => {
                return Err(DirFailure {
                    segment: current.clone(),
                    cause,
                });
            }
        }
    }

    Ok(())
}

/// Joins path segments into an absolute slash-delimited remote path
pub fn join_segments(segments: &[String]) -> String {
    let mut path = String::new();
    for segment in segments {
        if segment.is_empty() {
            continue;
        }
        path.push('/');
        path.push_str(segment);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}
