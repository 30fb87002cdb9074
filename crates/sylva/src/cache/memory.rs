//! In-memory cache store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::CacheStore;
use crate::error::CacheError;
use crate::fingerprint::{CacheKey, Fingerprint};
use crate::tree::SyntaxTree;

type Records = HashMap<(CacheKey, Fingerprint), SyntaxTree>;

/// Cache store that keeps trees in process memory.
///
/// Suitable for a long-running interactive session, where the process
/// outlives many parses of the same files. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    records: Mutex<Records>,
    checkpoint: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records().map_or(0, |records| records.len())
    }

    /// Whether no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record exists for `key` and `fingerprint`.
    #[must_use]
    pub fn contains(&self, key: &CacheKey, fingerprint: Fingerprint) -> bool {
        self.records()
            .is_ok_and(|records| records.contains_key(&(key.clone(), fingerprint)))
    }

    fn records(&self) -> Result<MutexGuard<'_, Records>, CacheError> {
        self.records
            .lock()
            .map_err(|_| CacheError::Unavailable("record map lock poisoned".to_string()))
    }

    fn checkpoint(&self) -> Result<MutexGuard<'_, Option<DateTime<Utc>>>, CacheError> {
        self.checkpoint
            .lock()
            .map_err(|_| CacheError::Unavailable("checkpoint lock poisoned".to_string()))
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
    ) -> Result<Option<SyntaxTree>, CacheError> {
        Ok(self.records()?.get(&(key.clone(), fingerprint)).cloned())
    }

    fn save(
        &self,
        key: &CacheKey,
        fingerprint: Fingerprint,
        tree: &SyntaxTree,
    ) -> Result<(), CacheError> {
        self.records()?.insert((key.clone(), fingerprint), tree.clone());
        Ok(())
    }

    fn last_good_run(&self) -> Result<Option<DateTime<Utc>>, CacheError> {
        Ok(*self.checkpoint()?)
    }

    fn record_good_run(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        *self.checkpoint()? = Some(at);
        Ok(())
    }
}
