//! Source-file freshness tracking.
//!
//! The store records each source's modification time at load and compares it
//! on every access with a single `stat` call, so the staleness gate adds
//! negligible latency to cached reads.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Outcome of a freshness check for one source path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// The recorded stamp matches the file on disk; cached state is valid.
    Fresh,
    /// The file changed (or was never recorded); cached state must be dropped
    /// and the source reloaded.
    Stale,
    /// The file existed at load time but is gone now; cached state must be
    /// dropped and replaced with the empty table.
    Missing,
}

/// Records per-path modification stamps observed at load time.
///
/// A `None` stamp means the path did not exist when observed, so a
/// still-missing file stays `Fresh` (the cached empty table remains valid)
/// and a file that appears later flips to `Stale`.
#[derive(Debug, Default)]
pub struct FreshnessTracker {
    stamps: HashMap<PathBuf, Option<SystemTime>>,
}

impl FreshnessTracker {
    /// Record the current on-disk stamp for `path`.
    pub fn observe(&mut self, path: &Path) {
        self.stamps.insert(path.to_path_buf(), mtime(path));
    }

    /// Compare the current on-disk stamp against the recorded one.
    pub fn check(&self, path: &Path) -> Freshness {
        let current = mtime(path);
        match self.stamps.get(path) {
            None => Freshness::Stale,
            Some(recorded) if *recorded == current => Freshness::Fresh,
            Some(recorded) if recorded.is_some() && current.is_none() => Freshness::Missing,
            Some(_) => Freshness::Stale,
        }
    }

    /// Drop the recorded stamp for `path`.
    pub fn forget(&mut self, path: &Path) {
        self.stamps.remove(path);
    }

    /// Drop all recorded stamps.
    pub fn clear(&mut self) {
        self.stamps.clear();
    }
}

/// Best-effort file modified time; `None` when the file is absent.
fn mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}
