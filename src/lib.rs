//! Camera video FTP uploader daemon library
//!
//! Watches a directory a security camera records into and uploads each
//! completed video file to a remote FTP archive exactly once, without
//! touching files still being written. The core pieces are the local
//! file guard (age + exclusive-open checks), the remote path
//! materializer, the upload engine, and the pending-set tracker drained
//! on a fixed cycle.

pub mod cli;
pub mod config;
pub mod engine;
pub mod ftp;
pub mod guard;
pub mod instance;
pub mod layout;
pub mod logging;
pub mod pending;
pub mod remote;
pub mod shutdown;
pub mod watcher;
pub mod worker;

pub use cli::parse_args;
pub use config::{parse_config, Config, RemoteLayout};
pub use engine::{Engine, UploadOutcome};
pub use ftp::FtpConnector;
pub use guard::{Eligibility, FileGuard, FsGuard};
pub use instance::{check_single_instance, cleanup_lock_file};
pub use logging::{log, set_log_file, Level};
pub use pending::PendingSet;
pub use shutdown::{is_shutdown_requested, request_shutdown};

/// Name of the program used for process identification and the
/// PID lock file (/tmp/{PROGRAM_NAME}_{uid}.pid)
pub const PROGRAM_NAME: &str = "ftpcamd";

/// Current version of the program (from Cargo.toml)
/// Follows semantic versioning (MAJOR.MINOR.PATCH)
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");
