//! Fixed-interval worker loop
//!
//! One logical worker drives all uploads: each cycle snapshots the
//! pending set and attempts every entry sequentially, one archive
//! session at a time. The loop observes the shared stop signal both
//! between files and during the inter-cycle sleep.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::logging::info;
use crate::pending::PendingSet;
use crate::shutdown::is_shutdown_requested;

/// Attempts every currently pending file once
///
/// Removes from the live set exactly those entries whose outcome
/// resolved them (uploaded or permanently dropped); transient failures
/// stay pending for the next cycle.
///
/// # Returns
/// Number of files uploaded this cycle
pub fn drain_cycle(engine: &Engine, pending: &PendingSet) -> usize {
    let snapshot = pending.snapshot();
    if snapshot.is_empty() {
        return 0;
    }

    let _ = info(&format!("Processing {} pending file(s)", snapshot.len()));

    let mut uploaded = 0;
    for path in snapshot {
        if is_shutdown_requested() {
            let _ = info("Shutdown requested, aborting remaining uploads");
            break;
        }

        let outcome = engine.attempt_upload(&path);
        if outcome == crate::engine::UploadOutcome::Uploaded {
            uploaded += 1;
        }
        if outcome.resolves_pending() {
            pending.resolve(&path);
        }
    }

    uploaded
}

/// Runs drain cycles at the configured interval until shutdown
///
/// The inter-cycle sleep is broken into sub-second steps so a stop
/// signal is observed within one cycle interval. The engine releases
/// its session per attempt, so no connection outlives the loop.
pub fn run(engine: &Engine, pending: &Arc<PendingSet>, cycle: Duration) {
    loop {
        if is_shutdown_requested() {
            break;
        }

        drain_cycle(engine, pending);

        if !sleep_interruptible(cycle) {
            break;
        }
    }
    let _ = info("Worker loop stopped");
}

/// Sleeps for the given duration in 500ms steps
///
/// # Returns
/// `false` if shutdown was requested during the sleep
fn sleep_interruptible(duration: Duration) -> bool {
    let step = Duration::from_millis(500);
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if is_shutdown_requested() {
            return false;
        }
        let slice = remaining.min(step);
        std::thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
    !is_shutdown_requested()
}
