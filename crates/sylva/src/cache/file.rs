//! File-system cache store.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── last_good_run                 RFC 3339 checkpoint
//! └── trees/
//!     └── <cache key>/
//!         └── <fingerprint>.json    one CacheRecord
//! ```
//!
//! # Atomicity
//!
//! Every file is written to a uniquely named temporary file in the same
//! directory and then renamed over the target. On POSIX systems the rename
//! is atomic, so readers see either the old record or the new one. A crash
//! can leave a temporary file behind but never a torn record.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{CacheRecord, CacheStore, RECORD_FORMAT_VERSION};
use crate::error::CacheError;
use crate::fingerprint::{CacheKey, Fingerprint};
use crate::tree::SyntaxTree;

const TREES_DIR: &str = "trees";
const CHECKPOINT_FILE: &str = "last_good_run";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Cache store persisting one JSON record per file on disk.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    root: PathBuf,
}

/// Borrowed form of [`CacheRecord`] so saving does not clone the tree.
#[derive(Serialize)]
struct RecordRef<'a> {
    format_version: u32,
    key: &'a CacheKey,
    fingerprint: Fingerprint,
    tree: &'a SyntaxTree,
}

impl FileCacheStore {
    /// Create a store rooted at `root`.
    ///
    /// Directories are created lazily on the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `key` and `fingerprint`.
    #[must_use]
    pub fn record_path(&self, key: &CacheKey, fingerprint: Fingerprint) -> PathBuf {
        self.root
            .join(TREES_DIR)
            .join(key.as_str())
            .join(format!("{fingerprint}.json"))
    }

    fn checkpoint_path(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE)
    }

    /// Remove every stored record. The checkpoint is kept.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` if the record directory cannot be removed.
    pub fn clear(&self) -> Result<(), CacheError> {
        let trees = self.root.join(TREES_DIR);
        match std::fs::remove_dir_all(&trees) {
            Ok(()) => {
                tracing::debug!(path = %trees.display(), "Cleared tree cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(trees, e)),
        }
    }
}

impl CacheStore for FileCacheStore {
    fn load(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
    ) -> Result<Option<SyntaxTree>, CacheError> {
        let path = self.record_path(key, fingerprint);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };

        let record: CacheRecord =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let mismatch = if record.format_version != RECORD_FORMAT_VERSION {
            Some(format!(
                "format version {} (expected {RECORD_FORMAT_VERSION})",
                record.format_version
            ))
        } else if &record.key != key {
            Some(format!("record belongs to key {}", record.key))
        } else if record.fingerprint != fingerprint {
            Some(format!("record has fingerprint {}", record.fingerprint))
        } else {
            None
        };
        if let Some(reason) = mismatch {
            return Err(CacheError::Corrupt { path, reason });
        }

        Ok(Some(record.tree))
    }

    fn save(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
        tree: &SyntaxTree,
    ) -> Result<(), CacheError> {
        let path = self.record_path(key, fingerprint);
        let bytes = serde_json::to_vec(&RecordRef {
            format_version: RECORD_FORMAT_VERSION,
            key,
            fingerprint,
            tree,
        })?;
        write_atomic(&path, &bytes)?;
        tracing::trace!(path = %path.display(), bytes = bytes.len(), "Wrote cache record");
        Ok(())
    }

    fn last_good_run(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        let path = self.checkpoint_path();
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };

        let text = String::from_utf8_lossy(&bytes);
        DateTime::parse_from_rfc3339(text.trim())
            .map(|at| Some(at.with_timezone(&Utc)))
            .map_err(|e| CacheError::Corrupt {
                path,
                reason: format!("invalid checkpoint timestamp: {e}"),
            })
    }

    fn record_good_run(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        let stamp = at.to_rfc3339_opts(SecondsFormat::Nanos, true);
        write_atomic(&self.checkpoint_path(), stamp.as_bytes())
    }
}

/// Read a file, mapping "not found" to `None`.
fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, CacheError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

/// Write `bytes` to `path` via a temporary file and rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
    }

    let temp_path = make_temp_path(path);
    if let Err(e) = write_temp_file(&temp_path, bytes) {
        // Best-effort cleanup of temp file
        let _ = std::fs::remove_file(&temp_path);
        return Err(CacheError::io(&temp_path, e));
    }

    std::fs::rename(&temp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        CacheError::io(path, e)
    })
}

/// Unique temporary path next to `path`.
///
/// Appends `.<pid>-<n>.tmp` so concurrent writers of the same record never
/// share a temporary file.
fn make_temp_path(path: &Path) -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(format!(".{}-{n}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn write_temp_file(temp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = std::fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
