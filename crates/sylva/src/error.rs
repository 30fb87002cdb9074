//! Error types for Sylva operations.
//!
//! Errors fall into three groups:
//!
//! - **`ParseError`**: the parser produced no tree for a file. Carries every
//!   syntax error it collected and is always propagated to the caller.
//! - **`CacheError`**: the cache store failed to load or save. Never fatal to
//!   tree retrieval: load failures become misses and save failures are logged.
//! - **`Error`**: top-level failures of the surrounding machinery (I/O,
//!   configuration, parser construction) used by the CLI and setup code.
//!
//! A position that no node covers is not an error; lookups return `None`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Sylva operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Sylva operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache store operation failed
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// A source file could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Parser infrastructure failed (e.g. grammar could not be loaded)
    #[error("parser error: {0}")]
    Parser(String),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),
}

/// A single syntax error reported by the parser.
///
/// Lines are 1-based; offsets are byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} on line {line}")]
pub struct SyntaxError {
    /// Human-readable description
    pub message: String,
    /// 1-based line where the error starts
    pub line: u32,
    /// Byte offset where the error starts
    pub start_offset: u32,
    /// Byte offset one past the end of the error
    pub end_offset: u32,
}

impl SyntaxError {
    /// Create a new syntax error.
    #[must_use]
    pub fn new(message: impl Into<String>, line: u32, start_offset: u32, end_offset: u32) -> Self {
        Self {
            message: message.into(),
            line,
            start_offset,
            end_offset,
        }
    }
}

/// The parser produced no tree for a file and reported at least one error.
///
/// All collected errors are kept, in the order the parser reported them.
/// The first one is the primary cause and is exposed as the error `source`.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Path of the file that failed to parse
    pub path: PathBuf,
    /// Every syntax error collected during the parse (never empty)
    pub errors: Vec<SyntaxError>,
}

impl ParseError {
    /// Create a parse error for a file.
    #[must_use]
    pub fn new(path: PathBuf, errors: Vec<SyntaxError>) -> Self {
        debug_assert!(!errors.is_empty(), "ParseError requires at least one error");
        Self { path, errors }
    }

    /// The first error reported by the parser.
    #[must_use]
    pub fn primary(&self) -> Option<&SyntaxError> {
        self.errors.first()
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.path.display())?;
        match self.errors.split_first() {
            Some((first, [])) => write!(f, "{first}"),
            Some((first, rest)) => write!(f, "{first} (and {} more)", rest.len()),
            None => write!(f, "parse failed"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Error raised by a cache store.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing cache storage failed
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record exists but cannot be trusted
    #[error("corrupt cache record at {}: {reason}", path.display())]
    Corrupt {
        /// Path of the offending record
        path: PathBuf,
        /// Why the record was rejected
        reason: String,
    },

    /// The store is unavailable (e.g. a poisoned lock)
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

impl CacheError {
    /// Wrap an I/O error with the path it occurred at.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
