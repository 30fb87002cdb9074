//! Modification-time staleness checks.
//!
//! A file whose modification time is not newer than the last fully
//! successful run can skip re-analysis altogether. This is an optimization
//! hint only: the content fingerprint stays authoritative, so a false
//! "changed" costs a cache lookup and never produces a wrong tree.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::cache::CacheStore;
use crate::error::CacheError;

/// Whether `path` may have changed since `last_good_run`.
///
/// Returns `true` when no checkpoint exists, when the modification time
/// cannot be read, or when it is strictly later than the checkpoint.
#[must_use]
pub fn has_changed(path: &Path, last_good_run: Option<DateTime<Utc>>) -> bool {
    let Some(checkpoint) = last_good_run else {
        return true;
    };

    match std::fs::metadata(path).and_then(|metadata| metadata.modified()) {
        Ok(modified) => DateTime::<Utc>::from(modified) > checkpoint,
        Err(e) => {
            tracing::trace!(
                path = %path.display(),
                error = %e,
                "Cannot read modification time, treating file as changed"
            );
            true
        }
    }
}

/// The process-wide "last good run" checkpoint.
///
/// Loaded once from the cache store at session start, consulted for every
/// file, and advanced after a fully successful analysis cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCheckpoint {
    last_good_run: Option<DateTime<Utc>>,
}

impl RunCheckpoint {
    /// Checkpoint with a known value.
    #[must_use]
    pub fn new(last_good_run: Option<DateTime<Utc>>) -> Self {
        Self { last_good_run }
    }

    /// Load the checkpoint recorded in `store`.
    ///
    /// An unreadable checkpoint is logged and treated as absent, which makes
    /// every file count as changed.
    #[must_use]
    pub fn load(store: &impl CacheStore) -> Self {
        match store.last_good_run() {
            Ok(last_good_run) => Self { last_good_run },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read last good run, assuming none");
                Self::default()
            }
        }
    }

    /// Recorded checkpoint, if any.
    #[must_use]
    pub fn last_good_run(&self) -> Option<DateTime<Utc>> {
        self.last_good_run
    }

    /// Whether `path` may have changed since the checkpoint.
    #[must_use]
    pub fn has_changed(&self, path: &Path) -> bool {
        has_changed(path, self.last_good_run)
    }

    /// The subset of `paths` that may have changed, in input order.
    #[must_use]
    pub fn stale_files<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<PathBuf> {
        paths
            .iter()
            .map(AsRef::as_ref)
            .filter(|path| self.has_changed(path))
            .map(Path::to_path_buf)
            .collect()
    }

    /// Persist `at` as the new checkpoint, then adopt it.
    ///
    /// The in-memory value only moves once the store accepted it.
    ///
    /// # Errors
    ///
    /// Returns the store's `CacheError` if the checkpoint cannot be written.
    pub fn advance(&mut self, store: &impl CacheStore, at: DateTime<Utc>) -> Result<(), CacheError> {
        store.record_good_run(at)?;
        tracing::debug!(at = %at.to_rfc3339(), "Advanced last good run");
        self.last_good_run = Some(at);
        Ok(())
    }
}
