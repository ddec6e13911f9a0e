//! Filesystem event source and startup scan
//!
//! A notify watcher on the (non-recursive) camera directory feeds
//! created/modified paths into the pending set; the startup scan seeds
//! it with files already present before the watch began. Neither ever
//! touches the network.

use notify::event::Event;
use notify::{recommended_watcher, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::logging::{info, warn};
use crate::pending::PendingSet;

/// Routes one filesystem event into the pending set
///
/// Only create and modify events are considered; directory paths and
/// non-video files are filtered out by the pending set itself.
pub fn handle_event(pending: &PendingSet, event: Event) {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) => {
            for path in event.paths {
                if pending.on_detected(&path) {
                    let _ = info(&format!("Detected video file: {}", path.display()));
                }
            }
        }
        _ => {}
    }
}

/// Starts watching the camera directory
///
/// The returned watcher must be kept alive for the watch to stay
/// registered. Callback errors are logged and never stop the watch.
pub fn spawn(dir: &Path, pending: Arc<PendingSet>) -> notify::Result<RecommendedWatcher> {
    let mut watcher = recommended_watcher(move |result: notify::Result<Event>| match result {
        Ok(event) => handle_event(&pending, event),
        Err(e) => {
            let _ = warn(&format!("Filesystem watcher error: {}", e));
        }
    })?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    let _ = info(&format!("Watching directory {}", dir.display()));
    Ok(watcher)
}

/// Seeds the pending set with video files already present
///
/// Runs once at startup, before events begin to arrive.
///
/// # Returns
/// Number of files seeded
pub fn scan_existing(dir: &Path, pending: &PendingSet) -> io::Result<usize> {
    let mut seeded = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if pending.on_detected(&entry.path()) {
            seeded += 1;
        }
    }
    Ok(seeded)
}
