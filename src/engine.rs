//! Upload decision and execution engine
//!
//! One `attempt_upload` call per pending file per cycle: eligibility
//! check, one scoped archive session, remote directory materialization,
//! an existence probe with an overwrite grace window, then a binary
//! store. Every failure is logged with path and cause and mapped to a
//! retryable-or-terminal outcome; nothing escapes to crash the worker.

use chrono::Local;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::guard::{file_age, Eligibility, FileGuard};
use crate::layout::derive_remote_dir;
use crate::logging::{error, info, warn};
use crate::remote::{ensure_directory, join_segments, ArchiveSession, Connector};

/// Result of a single upload attempt, computed per attempt and never
/// persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Transfer confirmed; the pending entry is removed
    Uploaded,
    /// Stability window unmet; retry next cycle
    SkippedTooRecent,
    /// A writer still holds the file; retry next cycle
    SkippedInUse,
    /// Remote copy exists and the local file is not yet stable enough
    /// to justify an overwrite; retry next cycle
    SkippedAlreadyPresent,
    /// Connection, directory, or transfer failure; retry next cycle
    FailedTransient,
    /// Local file vanished; the pending entry is dropped
    FailedPermanent,
}

impl UploadOutcome {
    /// Whether the pending entry is done with, successfully or not
    pub fn resolves_pending(self) -> bool {
        matches!(self, UploadOutcome::Uploaded | UploadOutcome::FailedPermanent)
    }
}

/// Per-file upload orchestration
///
/// Holds the immutable configuration plus the two injected seams: the
/// archive connector and the local file guard.
pub struct Engine {
    config: Arc<Config>,
    connector: Box<dyn Connector>,
    guard: Box<dyn FileGuard>,
}

impl Engine {
    pub fn new(config: Arc<Config>, connector: Box<dyn Connector>, guard: Box<dyn FileGuard>) -> Self {
        Engine {
            config,
            connector,
            guard,
        }
    }

    /// Decides whether a pending file is safe to upload and performs
    /// the transfer
    ///
    /// The archive session is acquired after the local checks pass and
    /// released on every exit path.
    pub fn attempt_upload(&self, path: &Path) -> UploadOutcome {
        let min_age = Duration::from_secs(self.config.min_age_seconds);

        match self.guard.check_eligible(path, min_age) {
            Eligibility::Eligible => {}
            Eligibility::NotFound => {
                let _ = warn(&format!(
                    "File not found, dropping from pending: {}",
                    path.display()
                ));
                return UploadOutcome::FailedPermanent;
            }
            Eligibility::TooRecent { age_seconds } => {
                let _ = info(&format!(
                    "Skipping {}, modified {} seconds ago, less than stability window of {} seconds",
                    path.display(),
                    age_seconds,
                    self.config.min_age_seconds
                ));
                return UploadOutcome::SkippedTooRecent;
            }
            Eligibility::InUse => {
                let _ = warn(&format!("File is in use, retrying later: {}", path.display()));
                return UploadOutcome::SkippedInUse;
            }
        }

        let mut session = match self.connector.connect() {
            Ok(session) => session,
            Err(e) => {
                let _ = error(&format!(
                    "Error connecting to archive {}:{}: {}",
                    self.config.host, self.config.port, e
                ));
                return UploadOutcome::FailedTransient;
            }
        };

        let outcome = self.upload_over(session.as_mut(), path);
        session.quit();
        outcome
    }

    /// Runs the remote half of an attempt over an open session
    fn upload_over(&self, session: &mut dyn ArchiveSession, path: &Path) -> UploadOutcome {
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => {
                let _ = error(&format!("Path has no file name: {}", path.display()));
                return UploadOutcome::FailedPermanent;
            }
        };

        let segments = derive_remote_dir(&self.config, path, Local::now());
        let target_dir = join_segments(&segments);

        if let Err(fail) = ensure_directory(session, &segments) {
            let _ = error(&format!(
                "Error materializing remote directory {} for {}: {}",
                target_dir,
                path.display(),
                fail
            ));
            return UploadOutcome::FailedTransient;
        }

        // Re-enter the target directory from the root before probing.
        if let Err(e) = session.cwd("/").and_then(|_| session.cwd(&target_dir)) {
            let _ = error(&format!(
                "Error changing into remote directory {}: {}",
                target_dir, e
            ));
            return UploadOutcome::FailedTransient;
        }

        match session.size(&file_name) {
            Err(crate::remote::RemoteError::NotFound) => {}
            Ok(_) => {
                // A previous attempt (or a concurrent run) already put
                // the file there, possibly partially. Overwrite only
                // once the local file has been stable for the full
                // window, so a still-settling file is never clobbered.
                match file_age(path) {
                    Ok(age) if age.as_secs() >= self.config.min_age_seconds => {
                        let _ = info(&format!(
                            "Remote file {}/{} exists, local file is stable, re-uploading",
                            target_dir, file_name
                        ));
                    }
                    Ok(_) => {
                        let _ = info(&format!(
                            "Remote file {}/{} exists and local file is not yet stable, skipping",
                            target_dir, file_name
                        ));
                        return UploadOutcome::SkippedAlreadyPresent;
                    }
                    Err(e) => {
                        let _ = warn(&format!(
                            "Error re-checking age of {}: {}",
                            path.display(),
                            e
                        ));
                        return UploadOutcome::FailedTransient;
                    }
                }
            }
            Err(e) => {
                let _ = error(&format!(
                    "Error probing remote file {}/{}: {}",
                    target_dir, file_name, e
                ));
                return UploadOutcome::FailedTransient;
            }
        }

        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                let _ = warn(&format!("Error opening {}: {}", path.display(), e));
                return UploadOutcome::FailedTransient;
            }
        };

        match session.store(&file_name, &mut file) {
            Ok(()) => {
                let _ = info(&format!(
                    "Upload complete: {} -> {}/{}",
                    path.display(),
                    target_dir,
                    file_name
                ));
                self.relocate_to_sent(path, &file_name);
                UploadOutcome::Uploaded
            }
            Err(e) => {
                // The partial remote file is left as-is; the next
                // successful attempt overwrites it with full contents.
                let _ = error(&format!(
                    "Error uploading {} to {}/{}: {}",
                    path.display(),
                    target_dir,
                    file_name,
                    e
                ));
                UploadOutcome::FailedTransient
            }
        }
    }

    /// Optional post-success hook: move the local file into a dated
    /// subdirectory of the sent archive
    ///
    /// A relocation failure is logged but never downgrades the
    /// outcome; the remote copy is authoritative.
    fn relocate_to_sent(&self, path: &Path, file_name: &str) {
        let sent_dir = match &self.config.sent_dir {
            Some(dir) => dir,
            None => return,
        };

        let bucket = Path::new(sent_dir).join(Local::now().format("%Y-%m-%d").to_string());
        let destination = bucket.join(file_name);

        let result = fs::create_dir_all(&bucket).and_then(|_| fs::rename(path, &destination));
        match result {
            Ok(()) => {
                let _ = info(&format!(
                    "Relocated {} to {}",
                    path.display(),
                    destination.display()
                ));
            }
            Err(e) => {
                let _ = warn(&format!(
                    "Error relocating {} to sent archive: {}",
                    path.display(),
                    e
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteLayout;
    use crate::guard::fake::FakeGuard;
    use crate::remote::mock::{MockSession, MockState};
    use crate::remote::{ConnectError, RemoteError};
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct MockConnector {
        state: Arc<Mutex<MockState>>,
        refuse: bool,
        connects: AtomicUsize,
    }

    impl MockConnector {
        fn new(state: Arc<Mutex<MockState>>) -> Self {
            MockConnector {
                state,
                refuse: false,
                connects: AtomicUsize::new(0),
            }
        }
    }

    impl Connector for MockConnector {
        fn connect(&self) -> Result<Box<dyn ArchiveSession>, ConnectError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.refuse {
                return Err(ConnectError::ConnectionRefused);
            }
            Ok(Box::new(MockSession::new(Arc::clone(&self.state))))
        }
    }

    fn test_config(video_dir: &str, min_age_seconds: u64) -> Config {
        Config {
            host: "archive.example.com".to_string(),
            port: 21,
            login: "cam".to_string(),
            password: "secret".to_string(),
            remote_base: "/archive".to_string(),
            video_dir: video_dir.to_string(),
            sent_dir: None,
            min_age_seconds,
            cycle_seconds: 60,
            connect_timeout_seconds: 5,
            extensions: vec!["mp4".to_string()],
            layout: RemoteLayout::MirrorTree,
        }
    }

    fn local_file(dir: &TempDir, relative: &str) -> std::path::PathBuf {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = File::create(&path).unwrap();
        file.write_all(b"video bytes").unwrap();
        path
    }

    fn engine_with(
        config: Config,
        state: Arc<Mutex<MockState>>,
        guard: Eligibility,
    ) -> Engine {
        Engine::new(
            Arc::new(config),
            Box::new(MockConnector::new(state)),
            Box::new(FakeGuard(guard)),
        )
    }

    #[test]
    fn test_uploaded_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "cam01/2024-05-01_120000.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        let config = test_config(dir.path().to_str().unwrap(), 0);
        let engine = engine_with(config, Arc::clone(&state), Eligibility::Eligible);

        let outcome = engine.attempt_upload(&path);
        assert_eq!(outcome, UploadOutcome::Uploaded);

        let state = state.lock().unwrap();
        // Directory tree materialized, one store, session released.
        assert_eq!(state.dirs, vec!["/archive", "/archive/cam01"]);
        assert_eq!(
            state.files.get("/archive/cam01/2024-05-01_120000.mp4"),
            Some(&11)
        );
        assert_eq!(
            state
                .calls
                .iter()
                .filter(|c| c.starts_with("store"))
                .count(),
            1
        );
        assert_eq!(state.quits, 1);
    }

    #[test]
    fn test_remote_present_and_local_unstable_is_transient_skip() {
        let dir = TempDir::new().unwrap();
        // File written just now: its real age is far below the window.
        let path = local_file(&dir, "cam01/clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        {
            let mut s = state.lock().unwrap();
            s.dirs = vec!["/archive".to_string(), "/archive/cam01".to_string()];
            s.files.insert("/archive/cam01/clip.mp4".to_string(), 999);
        }
        let config = test_config(dir.path().to_str().unwrap(), 3600);
        let engine = engine_with(config, Arc::clone(&state), Eligibility::Eligible);

        let outcome = engine.attempt_upload(&path);
        assert_eq!(outcome, UploadOutcome::SkippedAlreadyPresent);
        assert!(!outcome.resolves_pending());

        let state = state.lock().unwrap();
        assert!(!state.calls.iter().any(|c| c.starts_with("store")));
        assert_eq!(state.quits, 1);
    }

    #[test]
    fn test_remote_present_and_local_stable_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "cam01/clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        {
            let mut s = state.lock().unwrap();
            s.dirs = vec!["/archive".to_string(), "/archive/cam01".to_string()];
            // Partial remote leftover from an interrupted attempt.
            s.files.insert("/archive/cam01/clip.mp4".to_string(), 3);
        }
        let config = test_config(dir.path().to_str().unwrap(), 0);
        let engine = engine_with(config, Arc::clone(&state), Eligibility::Eligible);

        let outcome = engine.attempt_upload(&path);
        assert_eq!(outcome, UploadOutcome::Uploaded);
        assert_eq!(
            state.lock().unwrap().files.get("/archive/cam01/clip.mp4"),
            Some(&11)
        );
    }

    #[test]
    fn test_vanished_file_is_permanent_without_network() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        let config = test_config(dir.path().to_str().unwrap(), 0);
        let connector = MockConnector::new(Arc::clone(&state));
        let engine = Engine::new(
            Arc::new(config),
            Box::new(connector),
            Box::new(FakeGuard(Eligibility::NotFound)),
        );

        let outcome = engine.attempt_upload(&path);
        assert_eq!(outcome, UploadOutcome::FailedPermanent);
        assert!(outcome.resolves_pending());
        // No network call of any kind.
        assert!(state.lock().unwrap().calls.is_empty());
    }

    #[test]
    fn test_too_recent_and_in_use_are_transient() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));

        let engine = engine_with(
            test_config(dir.path().to_str().unwrap(), 3600),
            Arc::clone(&state),
            Eligibility::TooRecent { age_seconds: 5 },
        );
        assert_eq!(engine.attempt_upload(&path), UploadOutcome::SkippedTooRecent);

        let engine = engine_with(
            test_config(dir.path().to_str().unwrap(), 3600),
            Arc::clone(&state),
            Eligibility::InUse,
        );
        assert_eq!(engine.attempt_upload(&path), UploadOutcome::SkippedInUse);

        // Neither reached the network.
        assert!(state.lock().unwrap().calls.is_empty());
    }

    #[test]
    fn test_connect_failure_is_transient() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        let mut connector = MockConnector::new(Arc::clone(&state));
        connector.refuse = true;
        let engine = Engine::new(
            Arc::new(test_config(dir.path().to_str().unwrap(), 0)),
            Box::new(connector),
            Box::new(FakeGuard(Eligibility::Eligible)),
        );

        assert_eq!(engine.attempt_upload(&path), UploadOutcome::FailedTransient);
    }

    #[test]
    fn test_store_failure_is_transient_and_releases_session() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        state.lock().unwrap().deny_store = true;
        let engine = engine_with(
            test_config(dir.path().to_str().unwrap(), 0),
            Arc::clone(&state),
            Eligibility::Eligible,
        );

        assert_eq!(engine.attempt_upload(&path), UploadOutcome::FailedTransient);
        assert_eq!(state.lock().unwrap().quits, 1);
    }

    #[test]
    fn test_directory_failure_is_transient() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "cam01/clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        state.lock().unwrap().deny_mkd.push("/archive".to_string());
        let engine = engine_with(
            test_config(dir.path().to_str().unwrap(), 0),
            Arc::clone(&state),
            Eligibility::Eligible,
        );

        let outcome = engine.attempt_upload(&path);
        assert_eq!(outcome, UploadOutcome::FailedTransient);
        assert!(!state
            .lock()
            .unwrap()
            .calls
            .iter()
            .any(|c| c.starts_with("store")));
    }

    #[test]
    fn test_relocation_to_sent_archive() {
        let dir = TempDir::new().unwrap();
        let sent = TempDir::new().unwrap();
        let path = local_file(&dir, "clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        let mut config = test_config(dir.path().to_str().unwrap(), 0);
        config.sent_dir = Some(sent.path().to_str().unwrap().to_string());
        let engine = engine_with(config, Arc::clone(&state), Eligibility::Eligible);

        assert_eq!(engine.attempt_upload(&path), UploadOutcome::Uploaded);

        // Original gone, relocated copy under a dated bucket.
        assert!(!path.exists());
        let bucket = sent
            .path()
            .join(Local::now().format("%Y-%m-%d").to_string());
        assert!(bucket.join("clip.mp4").exists());
    }

    #[test]
    fn test_relocation_failure_keeps_uploaded_outcome() {
        let dir = TempDir::new().unwrap();
        let path = local_file(&dir, "clip.mp4");
        let state = Arc::new(Mutex::new(MockState::default()));
        let mut config = test_config(dir.path().to_str().unwrap(), 0);
        // A regular file where a directory is needed makes the
        // relocation fail.
        let blocker = dir.path().join("blocker");
        File::create(&blocker).unwrap();
        config.sent_dir = Some(blocker.to_str().unwrap().to_string());
        let engine = engine_with(config, Arc::clone(&state), Eligibility::Eligible);

        assert_eq!(engine.attempt_upload(&path), UploadOutcome::Uploaded);
        assert!(path.exists());
    }
}
