//! Parser interface.
//!
//! Sylva never parses source itself; it drives an implementation of
//! [`SourceParser`]. The bundled [`RustParser`] uses tree-sitter, and tests
//! plug in scripted parsers.
//!
//! ## Contract
//!
//! - With [`ErrorMode::Collect`] the parser keeps going past recoverable
//!   syntax errors and reports all of them.
//! - `tree: None` means no usable tree was produced. Paired with at least
//!   one error this is a parse failure; with no errors it is treated as an
//!   empty file.
//! - Nodes carry the attributes requested in [`AttributeSet`] and nothing
//!   more, so trees for the same mode always have the same shape.

pub mod rust;
mod tree_sitter_utils;

pub use rust::RustParser;

use crate::error::SyntaxError;
use crate::tree::SyntaxTree;
use crate::types::Mode;

/// How the parser reacts to syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Recover and report every error
    #[default]
    Collect,
    /// Stop at the first error and produce no tree
    FailFast,
}

/// Node attributes the parser should record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSet {
    /// Attach leading comments to nodes
    pub comments: bool,
    /// Record the line each node ends on
    pub end_line: bool,
}

impl AttributeSet {
    /// Attributes recorded for `mode`.
    ///
    /// Start lines and byte offsets are always recorded; end lines only in
    /// interactive mode.
    #[must_use]
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            comments: true,
            end_line: mode.is_interactive(),
        }
    }
}

/// Options for a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Mode the resulting tree is built for
    pub mode: Mode,
    /// Error handling strategy
    pub error_mode: ErrorMode,
    /// Attributes to record on nodes
    pub attributes: AttributeSet,
}

impl ParseOptions {
    /// Error-collecting options with the attribute set for `mode`.
    #[must_use]
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode,
            error_mode: ErrorMode::Collect,
            attributes: AttributeSet::for_mode(mode),
        }
    }

    /// Replace the error mode.
    #[must_use]
    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }
}

/// Result of a parse: an optional tree and the errors collected on the way.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    /// The tree, if one could be built
    pub tree: Option<SyntaxTree>,
    /// Syntax errors in the order they occur in the source
    pub errors: Vec<SyntaxError>,
}

impl ParseOutput {
    /// A tree with no errors.
    #[must_use]
    pub fn clean(tree: SyntaxTree) -> Self {
        Self {
            tree: Some(tree),
            errors: Vec::new(),
        }
    }

    /// No tree, only errors.
    #[must_use]
    pub fn failed(errors: Vec<SyntaxError>) -> Self {
        Self { tree: None, errors }
    }
}

/// A parser that turns source text into a [`SyntaxTree`].
pub trait SourceParser {
    /// Parse `text` according to `options`.
    fn parse(&self, text: &str, options: &ParseOptions) -> ParseOutput;
}

impl<P: SourceParser + ?Sized> SourceParser for &P {
    fn parse(&self, text: &str, options: &ParseOptions) -> ParseOutput {
        (**self).parse(text, options)
    }
}
