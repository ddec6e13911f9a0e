//! Remote directory layout strategies
//!
//! The archive tree below the configured base either mirrors the local
//! directory structure or buckets everything by calendar day. Both are
//! expressed as configuration, not forked code paths.

use chrono::{DateTime, Local};
use std::path::{Component, Path};

use crate::config::{Config, RemoteLayout};

/// Splits a slash-delimited remote base path into segments
fn base_segments(remote_base: &str) -> Vec<String> {
    remote_base
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Derives the remote directory for a local file
///
/// MirrorTree appends the local file's directory components relative to
/// the watched root; a file directly inside the watched root maps to
/// the base itself. DateBucketed appends a single YYYY-MM-DD segment.
///
/// Paths outside the watched root (should not happen with a
/// non-recursive watch) fall back to the base directory alone.
pub fn derive_remote_dir(config: &Config, local_path: &Path, now: DateTime<Local>) -> Vec<String> {
    let mut segments = base_segments(&config.remote_base);

    match config.layout {
        RemoteLayout::MirrorTree => {
            let root = Path::new(&config.video_dir);
            if let Ok(relative) = local_path.strip_prefix(root) {
                if let Some(parent) = relative.parent() {
                    for component in parent.components() {
                        if let Component::Normal(part) = component {
                            segments.push(part.to_string_lossy().into_owned());
                        }
                    }
                }
            }
        }
        RemoteLayout::DateBucketed => {
            segments.push(now.format("%Y-%m-%d").to_string());
        }
    }

    segments
}
