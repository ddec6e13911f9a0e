//! Local file eligibility checks
//!
//! A file is safe to upload only when it still exists, has not been
//! modified for the configured stability window, and no writer holds
//! it open. The in-use probe is an advisory exclusive-lock attempt,
//! a best-effort proxy for "is the recorder still appending".

use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Result of an eligibility check, in the order the checks run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Old enough and not held open; safe to transfer
    Eligible,
    /// File vanished; terminal, the pending entry is dropped
    NotFound,
    /// Stability window not yet met; retry next cycle
    TooRecent { age_seconds: u64 },
    /// A writer still holds the file; retry next cycle
    InUse,
}

/// Capability seam for eligibility checks
///
/// Tests inject fakes returning canned results instead of depending on
/// real OS file-locking behavior.
pub trait FileGuard {
    fn check_eligible(&self, path: &Path, min_age: Duration) -> Eligibility;
}

/// Seconds elapsed since the file was last modified
///
/// A modification time in the future (clock skew) reports zero age,
/// which keeps the file in the retry pool until the clock settles.
pub fn file_age(path: &Path) -> io::Result<Duration> {
    let modified = fs::metadata(path)?.modified()?;
    Ok(SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO))
}

/// Filesystem-backed implementation of the guard
pub struct FsGuard;

impl FileGuard for FsGuard {
    fn check_eligible(&self, path: &Path, min_age: Duration) -> Eligibility {
        // 1. Existence. Missing means there is nothing to wait for.
        let age = match file_age(path) {
            Ok(age) => age,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Eligibility::NotFound,
            // Unreadable metadata is indistinguishable from a busy
            // writer; keep the entry and retry.
            Err(_) => return Eligibility::InUse,
        };

        // 2. Stability window. The recorder may still be appending to a
        // file the filesystem already reports as created.
        if age < min_age {
            return Eligibility::TooRecent {
                age_seconds: age.as_secs(),
            };
        }

        // 3. Exclusive-access probe. An advisory lock conflict means a
        // writer is active; a clean lock is released immediately.
        match OpenOptions::new().read(true).open(path) {
            Ok(file) => match file.try_lock_exclusive() {
                Ok(()) => {
                    let _ = file.unlock();
                    Eligibility::Eligible
                }
                Err(_) => Eligibility::InUse,
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Eligibility::NotFound,
            Err(_) => Eligibility::InUse,
        }
    }
}
