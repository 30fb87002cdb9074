//! Cache store interface and bundled stores.
//!
//! The store persists parsed trees under a (cache key, fingerprint) pair and
//! remembers the "last good run" checkpoint. It decides nothing about
//! validity: [`crate::TreeProvider`] computes the fingerprint and rejects
//! unusable records.
//!
//! | Store | Backing | Use |
//! |-------|---------|-----|
//! | [`MemoryCacheStore`] | mutex-guarded map | interactive sessions, tests |
//! | [`FileCacheStore`] | one JSON file per record | batch runs across processes |

mod file;
mod memory;

pub use file::FileCacheStore;
pub use memory::MemoryCacheStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::fingerprint::{CacheKey, Fingerprint};
use crate::tree::SyntaxTree;

/// Version of the on-disk record envelope.
pub const RECORD_FORMAT_VERSION: u32 = 1;

/// Persistent storage for parsed trees.
///
/// Implementations must make each `save` atomic with respect to `load`:
/// a reader sees either the previous record or the new one, never a mix.
pub trait CacheStore {
    /// Load the tree stored for `key` and `fingerprint`.
    ///
    /// Returns `Ok(None)` when no such record exists.
    ///
    /// # Errors
    ///
    /// Returns a `CacheError` if the record exists but cannot be read.
    fn load(&self, key: &CacheKey, fingerprint: Fingerprint)
        -> Result<Option<SyntaxTree>, CacheError>;

    /// Store `tree` for `key` and `fingerprint`, replacing any previous
    /// record for the same pair.
    ///
    /// # Errors
    ///
    /// Returns a `CacheError` if the record cannot be written.
    fn save(&self, key: &CacheKey, fingerprint: Fingerprint, tree: &SyntaxTree)
        -> Result<(), CacheError>;

    /// The recorded "last good run" checkpoint, if any.
    ///
    /// # Errors
    ///
    /// Returns a `CacheError` if the checkpoint exists but cannot be read.
    fn last_good_run(&self) -> Result<Option<DateTime<Utc>>, CacheError>;

    /// Record a new "last good run" checkpoint.
    ///
    /// # Errors
    ///
    /// Returns a `CacheError` if the checkpoint cannot be written.
    fn record_good_run(&self, at: DateTime<Utc>) -> Result<(), CacheError>;
}

impl<S: CacheStore + ?Sized> CacheStore for &S {
    fn load(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
    ) -> Result<Option<SyntaxTree>, CacheError> {
        (**self).load(key, fingerprint)
    }

    fn save(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
        tree: &SyntaxTree,
    ) -> Result<(), CacheError> {
        (**self).save(key, fingerprint, tree)
    }

    fn last_good_run(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        (**self).last_good_run()
    }

    fn record_good_run(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        (**self).record_good_run(at)
    }
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    fn load(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
    ) -> Result<Option<SyntaxTree>, CacheError> {
        (**self).load(key, fingerprint)
    }

    fn save(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
        tree: &SyntaxTree,
    ) -> Result<(), CacheError> {
        (**self).save(key, fingerprint, tree)
    }

    fn last_good_run(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        (**self).last_good_run()
    }

    fn record_good_run(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        (**self).record_good_run(at)
    }
}

/// Envelope written by [`FileCacheStore`].
///
/// The key and fingerprint are repeated inside the record so a file that
/// ends up under the wrong name is detected instead of trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Envelope version, see [`RECORD_FORMAT_VERSION`]
    pub format_version: u32,
    /// Key of the file the tree belongs to
    pub key: CacheKey,
    /// Fingerprint of the text and mode the tree was built from
    pub fingerprint: Fingerprint,
    /// The tree itself
    pub tree: SyntaxTree,
}

impl CacheRecord {
    /// Wrap a tree in a current-version envelope.
    #[must_use]
    pub fn new(key: CacheKey, fingerprint: Fingerprint, tree: SyntaxTree) -> Self {
        Self {
            format_version: RECORD_FORMAT_VERSION,
            key,
            fingerprint,
            tree,
        }
    }
}
