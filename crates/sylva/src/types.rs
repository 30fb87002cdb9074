//! Domain types shared across Sylva.
//!
//! - **`Mode`**: batch vs. interactive parsing, threaded through every call
//! - **`ColumnEncoding`**: the unit columns are counted in
//! - **`Position`**: a cursor location inside a source file
//! - **`SourceFile`**: a path and the text read from it for one parse cycle
//!
//! ## Position Convention
//!
//! | Field | Base | Unit |
//! |-------|------|------|
//! | `line` | 1 | lines, as reported on nodes by the parser |
//! | `column` | 0 | code units of the tree's `ColumnEncoding` (UTF-16 by default) |
//!
//! Editor protocol positions are 0-based in both fields; use
//! [`Position::from_lsp`] and [`Position::to_lsp`] at that boundary.

use std::path::{Path, PathBuf};

use lsp_types::PositionEncodingKind;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fingerprint::{CacheKey, Fingerprint, fingerprint};

/// Unit in which columns are counted.
///
/// Mirrors the position encodings an editor can negotiate. UTF-16 is the
/// protocol default and the one editors are guaranteed to support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColumnEncoding {
    /// Raw bytes of the UTF-8 source
    #[serde(rename = "utf-8")]
    Utf8,
    /// UTF-16 code units
    #[default]
    #[serde(rename = "utf-16")]
    Utf16,
    /// Unicode scalar values
    #[serde(rename = "utf-32")]
    Utf32,
}

impl ColumnEncoding {
    /// Protocol name of this encoding.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16 => "utf-16",
            Self::Utf32 => "utf-32",
        }
    }

    /// Parse a protocol name (`utf-8`, `utf-16`, `utf-32`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "utf-16" | "utf16" => Some(Self::Utf16),
            "utf-32" | "utf32" => Some(Self::Utf32),
            _ => None,
        }
    }

    /// Map a negotiated editor position encoding.
    ///
    /// Returns `None` for encodings Sylva does not know.
    #[must_use]
    pub fn from_lsp(kind: &PositionEncodingKind) -> Option<Self> {
        Self::from_name(kind.as_str())
    }

    /// The editor position encoding for this column encoding.
    #[must_use]
    pub fn to_lsp(self) -> PositionEncodingKind {
        match self {
            Self::Utf8 => PositionEncodingKind::UTF8,
            Self::Utf16 => PositionEncodingKind::UTF16,
            Self::Utf32 => PositionEncodingKind::UTF32,
        }
    }

    /// Number of code units `text` occupies in this encoding.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Lines longer than u32::MAX units are not supported
    pub fn measure(self, text: &str) -> u32 {
        match self {
            Self::Utf8 => text.len() as u32,
            Self::Utf16 => text.chars().map(|c| c.len_utf16() as u32).sum(),
            Self::Utf32 => text.chars().count() as u32,
        }
    }

    /// Number of code units a single character occupies in this encoding.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // A char is at most 4 units
    pub fn char_width(self, c: char) -> u32 {
        match self {
            Self::Utf8 => c.len_utf8() as u32,
            Self::Utf16 => c.len_utf16() as u32,
            Self::Utf32 => 1,
        }
    }
}

impl std::fmt::Display for ColumnEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing mode.
///
/// Interactive trees carry extra attributes (end lines, columns, parent and
/// sibling links) measured in a specific column encoding, so they are never
/// interchangeable with batch trees or with interactive trees measured in a
/// different encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One-shot analysis runs: no layout attributes
    Batch,
    /// Editor sessions: trees are augmented for position lookups
    Interactive(ColumnEncoding),
}

impl Mode {
    /// Interactive mode with the default (UTF-16) column encoding.
    #[must_use]
    pub fn interactive() -> Self {
        Self::Interactive(ColumnEncoding::default())
    }

    /// Returns `true` for interactive mode.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive(_))
    }

    /// Column encoding for interactive mode, `None` in batch mode.
    #[must_use]
    pub fn column_encoding(&self) -> Option<ColumnEncoding> {
        match self {
            Self::Batch => None,
            Self::Interactive(encoding) => Some(*encoding),
        }
    }

    /// Stable tag identifying this mode in fingerprints.
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::Batch => "batch".to_string(),
            Self::Interactive(encoding) => format!("interactive/{encoding}"),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.tag())
    }
}

/// A cursor location: 1-based line, 0-based column.
///
/// Ordering is by line, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    pub line: u32,
    /// 0-based column in code units of the tree's column encoding
    pub column: u32,
}

impl Position {
    /// Create a position from a 1-based line and 0-based column.
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Convert from an editor protocol position (0-based line).
    #[must_use]
    pub fn from_lsp(position: lsp_types::Position) -> Self {
        Self {
            line: position.line.saturating_add(1),
            column: position.character,
        }
    }

    /// Convert to an editor protocol position (0-based line).
    #[must_use]
    pub fn to_lsp(self) -> lsp_types::Position {
        lsp_types::Position {
            line: self.line.saturating_sub(1),
            character: self.column,
        }
    }
}

impl From<lsp_types::Position> for Position {
    fn from(position: lsp_types::Position) -> Self {
        Self::from_lsp(position)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source file read for one parse cycle.
///
/// The path is an opaque identifier: it is never canonicalized, so the same
/// file reached through two different paths gets two cache keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path the file was read from
    pub path: PathBuf,
    /// Full UTF-8 text
    pub text: String,
}

impl SourceFile {
    /// Create a source file from an in-memory buffer.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a source file from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read or is not valid UTF-8.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::new(path, text))
    }

    /// Content fingerprint of this file's text for the given mode.
    #[must_use]
    pub fn fingerprint(&self, mode: Mode) -> Fingerprint {
        fingerprint(mode, &self.text)
    }

    /// Cache key for this file's path.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_path(&self.path)
    }
}
