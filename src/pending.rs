//! Deduplicated work queue of files awaiting upload
//!
//! Filesystem events and the startup scan insert; the worker loop
//! snapshots, attempts, and removes resolved entries. Insert and
//! snapshot are mutually exclusive through one mutex, so an insert
//! landing during a drain is simply picked up next cycle.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Thread-safe set of file paths awaiting a successful upload
pub struct PendingSet {
    inner: Mutex<HashSet<PathBuf>>,
    /// Lowercased extension allow-list; everything else is ignored at
    /// detection time, not at upload time
    extensions: Vec<String>,
}

impl PendingSet {
    pub fn new(extensions: Vec<String>) -> Self {
        PendingSet {
            inner: Mutex::new(HashSet::new()),
            extensions,
        }
    }

    /// Whether a path carries one of the allowed video extensions
    /// (matched case-insensitively)
    pub fn is_video(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }

    /// Inserts a detected path if it is a video file
    ///
    /// # Returns
    /// `true` if the path was newly inserted
    pub fn on_detected(&self, path: &Path) -> bool {
        if !self.is_video(path) {
            return false;
        }
        self.inner.lock().unwrap().insert(path.to_path_buf())
    }

    /// Copies the current contents for a drain cycle
    ///
    /// The copy tolerates concurrent insertion while entries are being
    /// attempted; the live set is never iterated outside the lock.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().iter().cloned().collect()
    }

    /// Removes a path whose attempt resolved (uploaded or dropped)
    pub fn resolve(&self, path: &Path) {
        self.inner.lock().unwrap().remove(path);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
