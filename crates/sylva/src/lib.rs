//! # Sylva: Reusable Syntax Trees
//!
//! Sylva sits between a static-analysis pipeline and its parser. It decides
//! when a previously computed syntax tree can be reused, parses when it
//! cannot, and prepares trees for editor sessions so that "which node is
//! under the cursor?" is a cheap query.
//!
//! ## Design Philosophy
//!
//! - **Content decides reuse** - A cached tree is reused only for
//!   byte-identical text parsed in the same mode; modification times are a
//!   hint, never the authority
//! - **Cache failures are not failures** - An unreadable or broken record
//!   is a miss, a failed write is a log line
//! - **Parser and store are plug-ins** - The core depends on the
//!   [`SourceParser`](parser::SourceParser) and [`CacheStore`](cache::CacheStore)
//!   traits only
//!
//! ## Quick Start
//!
//! ```no_run
//! use sylva::cache::MemoryCacheStore;
//! use sylva::parser::RustParser;
//! use sylva::{Mode, Position, SourceFile, TreeProvider, find_node_at};
//!
//! let provider = TreeProvider::new(RustParser::new()?, MemoryCacheStore::new());
//! let file = SourceFile::new("src/lib.rs", "fn a() {}\nfn b() {}\n");
//!
//! // Parsed once, then served from the cache
//! let tree = provider.get_tree(&file, Mode::interactive())?;
//!
//! let id = find_node_at(&tree, Position::new(2, 0)).expect("line 2 holds `fn b`");
//! println!("{}", tree.node(id).kind);
//! # Ok::<(), sylva::Error>(())
//! ```

pub mod cache;
pub mod config;
pub mod parser;

mod augment;
mod error;
mod fingerprint;
mod line_index;
mod locate;
mod provider;
mod staleness;
mod tree;
mod types;

pub use augment::augment;
pub use error::{CacheError, Error, ParseError, Result, SyntaxError};
pub use fingerprint::{CacheKey, Fingerprint, TREE_SCHEMA, fingerprint};
pub use line_index::LineIndex;
pub use locate::{ancestors_at, find_node_at, node_at};
pub use provider::{BatchReport, TreeProvider};
pub use staleness::{RunCheckpoint, has_changed};
pub use tree::{Comment, Node, NodeId, NodeLayout, SyntaxTree};
pub use types::{ColumnEncoding, Mode, Position, SourceFile};
