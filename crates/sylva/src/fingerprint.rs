//! Content fingerprints and cache keys.
//!
//! A [`Fingerprint`] identifies *what* was parsed: the schema tag, the mode
//! and the source text. A [`CacheKey`] identifies *which file* a record
//! belongs to. The cache holds one record per (key, fingerprint) pair, so a
//! record is only ever reused for byte-identical text parsed the same way.
//!
//! Both are deterministic across processes and platforms, which is what
//! makes cross-run reuse possible.

use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::Xxh3;

use crate::types::Mode;

/// Version tag of the cached tree schema.
///
/// Bump whenever the shape of [`crate::SyntaxTree`] or the attributes the
/// parser records change; every existing record then stops matching.
pub const TREE_SCHEMA: &str = "sylva-tree/1";

/// 128-bit content fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Raw digest value.
    #[must_use]
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(format!("fingerprint must be 32 hex digits, got {}", s.len()));
        }
        u128::from_str_radix(s, 16)
            .map(Self)
            .map_err(|e| format!("invalid fingerprint {s:?}: {e}"))
    }
}

impl From<Fingerprint> for String {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.to_string()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Compute the fingerprint of `text` parsed in `mode`.
///
/// The schema tag and mode tag are length-prefixed so that no choice of text
/// can make two different (mode, text) pairs hash the same input stream.
#[must_use]
pub fn fingerprint(mode: Mode, text: &str) -> Fingerprint {
    let mut hasher = Xxh3::new();
    write_field(&mut hasher, TREE_SCHEMA.as_bytes());
    write_field(&mut hasher, mode.tag().as_bytes());
    hasher.update(text.as_bytes());
    Fingerprint(hasher.digest128())
}

fn write_field(hasher: &mut Xxh3, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Stable cache key derived from a file path.
///
/// SHA-256 of the path with separators normalized to `/`. Collisions between
/// distinct paths would hand one file another file's tree, so a
/// cryptographic digest is used rather than a fast hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `path`.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let digest = Sha256::digest(normalize_path(path).as_bytes());
        let mut hex = String::with_capacity(64);
        for byte in digest {
            // Writing to a String cannot fail
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// Hex representation, safe to use as a file name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a file path to use forward slashes.
///
/// On Windows, `Path::to_string_lossy()` preserves backslashes from OS APIs,
/// while paths built in code often use forward slashes. Normalizing keeps
/// both spellings on the same key.
fn normalize_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ColumnEncoding;
    use proptest::prelude::*;

    #[test]
    fn fingerprint_renders_as_32_hex_digits() {
        let rendered = fingerprint(Mode::Batch, "fn main() {}").to_string();
        assert_eq!(rendered.len(), 32);
        assert!(rendered.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_parses_back_from_string() {
        let original = fingerprint(Mode::interactive(), "struct S;");
        let parsed: Fingerprint = original.to_string().parse().unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn fingerprint_rejects_malformed_strings() {
        assert!("abc".parse::<Fingerprint>().is_err());
        assert!("zz".repeat(16).parse::<Fingerprint>().is_err());
    }

    #[test]
    fn fingerprint_serializes_as_string() {
        let fp = fingerprint(Mode::Batch, "");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{fp}\""));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn empty_text_still_separates_modes() {
        assert_ne!(
            fingerprint(Mode::Batch, ""),
            fingerprint(Mode::interactive(), "")
        );
    }

    #[test]
    fn interactive_encodings_do_not_share_fingerprints() {
        let text = "fn main() {}";
        assert_ne!(
            fingerprint(Mode::Interactive(ColumnEncoding::Utf8), text),
            fingerprint(Mode::Interactive(ColumnEncoding::Utf16), text)
        );
    }

    #[test]
    fn cache_key_is_hex_sha256() {
        let key = CacheKey::for_path(Path::new("src/lib.rs"));
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn cache_key_is_stable_per_path() {
        assert_eq!(
            CacheKey::for_path(Path::new("src/lib.rs")),
            CacheKey::for_path(Path::new("src/lib.rs"))
        );
        assert_ne!(
            CacheKey::for_path(Path::new("src/lib.rs")),
            CacheKey::for_path(Path::new("src/main.rs"))
        );
    }

    proptest! {
        #[test]
        fn fingerprint_is_deterministic(text in ".*") {
            prop_assert_eq!(fingerprint(Mode::Batch, &text), fingerprint(Mode::Batch, &text));
            prop_assert_eq!(
                fingerprint(Mode::interactive(), &text),
                fingerprint(Mode::interactive(), &text)
            );
        }

        #[test]
        fn fingerprint_isolates_modes(text in ".+") {
            prop_assert_ne!(fingerprint(Mode::Batch, &text), fingerprint(Mode::interactive(), &text));
        }

        #[test]
        fn distinct_paths_get_distinct_keys(a in "[a-z/]{1,24}", b in "[a-z/]{1,24}") {
            prop_assume!(a != b);
            prop_assert_ne!(CacheKey::for_path(Path::new(&a)), CacheKey::for_path(Path::new(&b)));
        }
    }
}
