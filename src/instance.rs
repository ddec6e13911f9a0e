//! Single-instance enforcement and signal handling
//!
//! Two unattended copies watching the same directory would race each
//! other's uploads, so the daemon holds an exclusive flock on a PID
//! file for its whole lifetime. SIGINT/SIGTERM are translated into the
//! shared shutdown flag; the handler thread only touches atomics.

use crate::logging::log;
use crate::logging::Level;

use fs2::FileExt;
use once_cell::sync::Lazy;
use signal_hook::{consts::SIGINT, consts::SIGTERM, iterator::Signals};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Mutex;
use std::thread;

/// Global storage for the lock file handle (kept locked for program lifetime)
static LOCK_FILE_HANDLE: Lazy<Mutex<Option<std::fs::File>>> = Lazy::new(|| Mutex::new(None));

/// Returns the user-specific runtime directory for the lock file
///
/// Priority order:
/// 1. $XDG_RUNTIME_DIR (if set, e.g., /run/user/1000/)
/// 2. /tmp (fallback, with UID suffix added to filename)
fn get_runtime_dir() -> String {
    std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string())
}

/// Returns the PID file path for this user
///
/// - With XDG_RUNTIME_DIR: $XDG_RUNTIME_DIR/ftpcamd.pid
/// - Without XDG_RUNTIME_DIR: /tmp/ftpcamd_<uid>.pid
fn get_lock_path() -> String {
    let runtime_dir = get_runtime_dir();
    let program_name = crate::PROGRAM_NAME;

    if runtime_dir != "/tmp" {
        format!("{}/{}.pid", runtime_dir, program_name)
    } else {
        // /tmp is shared; add the UID for user isolation.
        let uid = unsafe { libc::getuid() };
        format!("/tmp/{}_{}.pid", program_name, uid)
    }
}

/// Ensures only one instance runs at a time using atomic file locking
///
/// The flock() system call is atomic: even if two processes execute
/// try_lock() simultaneously, only one succeeds. The file is opened
/// without truncate and truncated only after the lock is held, so a
/// losing process never wipes the winner's PID.
///
/// Also installs the SIGINT/SIGTERM handler thread that raises the
/// shared shutdown flag.
///
/// # Errors
/// - If another instance holds the lock (caller should exit)
/// - If the lock file cannot be created
pub fn check_single_instance() -> io::Result<()> {
    let pid_path = get_lock_path();

    let mut lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(&pid_path)
        .map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("Failed to open lock file {}: {}", pid_path, e),
            )
        })?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(io::Error::new(
            io::ErrorKind::AddrInUse,
            format!(
                "Another instance is already running (PID file {} is locked)",
                pid_path
            ),
        ));
    }

    // We hold the lock; now it is safe to replace the recorded PID.
    lock_file.set_len(0)?;
    lock_file.write_all(std::process::id().to_string().as_bytes())?;
    let _ = log(
        Level::Info,
        &format!(
            "Acquired exclusive lock on {}, PID {}",
            pid_path,
            std::process::id()
        ),
    );

    if let Ok(mut guard) = LOCK_FILE_HANDLE.lock() {
        *guard = Some(lock_file);
    }

    // NOTE: this handler is async-signal-safe, it only sets atomic
    // flags. Logging happens in the main thread.
    let mut signals = Signals::new([SIGINT, SIGTERM]).expect("Error setting signal handler");
    thread::spawn(move || {
        if let Some(sig) = signals.forever().next() {
            let signal_type = match sig {
                SIGINT => 1,
                SIGTERM => 2,
                _ => 1,
            };
            crate::shutdown::request_shutdown_with_signal(signal_type);
        }
    });

    Ok(())
}

/// Releases the lock and removes the PID file
///
/// Called on program exit via scopeguard in main.
pub fn cleanup_lock_file() {
    let pid_path = get_lock_path();

    // Dropping the File releases the flock.
    if let Ok(mut guard) = LOCK_FILE_HANDLE.lock() {
        *guard = None;
    }

    if let Err(e) = std::fs::remove_file(&pid_path) {
        if e.kind() != io::ErrorKind::NotFound {
            let _ = log(
                Level::Warning,
                &format!("Failed to remove pid file {}: {}", pid_path, e),
            );
        }
    }
}
