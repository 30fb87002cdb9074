//! Tree retrieval: cache lookup, parse on miss, augmentation, persistence.
//!
//! ```text
//! get_tree(file, mode)
//!   │
//!   ├─ fingerprint(mode, text) + cache key(path)
//!   ├─ store.load ──hit (valid, right mode)──────────────┐
//!   │     └─miss / load error / unusable record          │
//!   ├─ parser.parse (collect errors)                     │
//!   │     ├─ no tree + errors ──> Err(ParseError)        │
//!   │     └─ tree (or empty) ──> augment if interactive  │
//!   ├─ store.save (failures logged) <────────────────────┘
//!   └─ Ok(tree)
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::augment::augment;
use crate::cache::CacheStore;
use crate::error::ParseError;
use crate::fingerprint::{CacheKey, Fingerprint};
use crate::parser::{ParseOptions, ParseOutput, SourceParser};
use crate::tree::SyntaxTree;
use crate::types::{Mode, SourceFile};

/// Hands out syntax trees, reusing cached ones when the content allows.
#[derive(Debug)]
pub struct TreeProvider<P, S> {
    parser: P,
    store: S,
}

/// Outcome of [`TreeProvider::get_trees`].
#[derive(Debug)]
pub struct BatchReport {
    /// Trees that were retrieved, in input order
    pub parsed: Vec<(PathBuf, SyntaxTree)>,
    /// Files that failed to parse, in input order
    pub failed: Vec<ParseError>,
    /// Wall-clock time of the whole batch
    pub duration: Duration,
}

impl BatchReport {
    /// Whether every file produced a tree.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<P: SourceParser, S: CacheStore> TreeProvider<P, S> {
    /// Create a provider from a parser and a cache store.
    pub fn new(parser: P, store: S) -> Self {
        Self { parser, store }
    }

    /// The parser used on cache misses.
    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// The cache store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the syntax tree of `file` for `mode`.
    ///
    /// Cached trees are reused only for byte-identical text parsed in the
    /// same mode. Interactive trees are augmented before they are returned
    /// or stored. Cache failures never fail the call.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` with every collected syntax error when the
    /// parser produces no tree. Nothing is cached in that case.
    pub fn get_tree(&self, file: &SourceFile, mode: Mode) -> Result<SyntaxTree, ParseError> {
        let fingerprint = file.fingerprint(mode);
        let key = file.cache_key();

        let tree = match self.load_cached(file, &key, fingerprint, mode) {
            Some(tree) => tree,
            None => self.parse_fresh(file, mode)?,
        };

        if let Err(e) = self.store.save(&key, fingerprint, &tree) {
            warn!(
                path = %file.path.display(),
                key = %key,
                error = %e,
                "Failed to save tree to cache"
            );
        }

        Ok(tree)
    }

    fn load_cached(
        &self,
        file: &SourceFile,
        key: &CacheKey,
        fingerprint: Fingerprint,
        mode: Mode,
    ) -> Option<SyntaxTree> {
        match self.store.load(key, fingerprint) {
            Ok(Some(tree)) => match check_cached(&tree, mode) {
                Ok(()) => {
                    debug!(path = %file.path.display(), %mode, "Cache hit");
                    Some(tree)
                }
                Err(reason) => {
                    warn!(
                        path = %file.path.display(),
                        key = %key,
                        reason = %reason,
                        "Discarding unusable cached tree"
                    );
                    None
                }
            },
            Ok(None) => {
                debug!(path = %file.path.display(), %mode, "Cache miss");
                None
            }
            Err(e) => {
                warn!(
                    path = %file.path.display(),
                    key = %key,
                    error = %e,
                    "Failed to load cached tree, parsing instead"
                );
                None
            }
        }
    }

    fn parse_fresh(&self, file: &SourceFile, mode: Mode) -> Result<SyntaxTree, ParseError> {
        let ParseOutput { tree, errors } = self
            .parser
            .parse(&file.text, &ParseOptions::for_mode(mode));

        let mut tree = match tree {
            Some(tree) => {
                if !errors.is_empty() {
                    debug!(
                        path = %file.path.display(),
                        errors = errors.len(),
                        first = %errors[0],
                        "Parsed with recoverable errors"
                    );
                }
                tree
            }
            None if errors.is_empty() => SyntaxTree::new(mode),
            None => {
                debug!(
                    path = %file.path.display(),
                    errors = errors.len(),
                    "Parse produced no tree"
                );
                return Err(ParseError::new(file.path.clone(), errors));
            }
        };

        if let Some(encoding) = mode.column_encoding() {
            augment(&mut tree, &file.text, encoding);
        }
        Ok(tree)
    }
}

impl<P, S> TreeProvider<P, S>
where
    P: SourceParser + Sync,
    S: CacheStore + Sync,
{
    /// Get trees for many files in parallel.
    ///
    /// Each file is handled exactly as by [`Self::get_tree`]; one file's
    /// failure does not affect the others.
    pub fn get_trees(&self, files: &[SourceFile], mode: Mode) -> BatchReport {
        let start = Instant::now();

        let results: Vec<_> = files
            .par_iter()
            .map(|file| (file.path.clone(), self.get_tree(file, mode)))
            .collect();

        let mut parsed = Vec::new();
        let mut failed = Vec::new();
        for (path, result) in results {
            match result {
                Ok(tree) => parsed.push((path, tree)),
                Err(e) => failed.push(e),
            }
        }

        let report = BatchReport {
            parsed,
            failed,
            duration: start.elapsed(),
        };
        debug!(
            parsed = report.parsed.len(),
            failed = report.failed.len(),
            duration_ms = report.duration.as_millis(),
            "Batch complete"
        );
        report
    }
}

/// Why a cached tree cannot stand in for a fresh parse, if it cannot.
fn check_cached(tree: &SyntaxTree, mode: Mode) -> Result<(), String> {
    if tree.mode() != mode {
        return Err(format!("built for {} mode", tree.mode()));
    }
    tree.validate()?;
    if let Some(encoding) = mode.column_encoding()
        && tree.column_encoding() != Some(encoding)
    {
        return Err(format!("not augmented in {encoding}"));
    }
    Ok(())
}
