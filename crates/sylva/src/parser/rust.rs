//! Rust source parser backed by tree-sitter-rust.
//!
//! Lowers the concrete tree-sitter tree into a [`SyntaxTree`]:
//!
//! - named nodes become tree nodes, anonymous tokens are dropped
//! - comments attach to the next named sibling
//! - `ERROR` and `MISSING` nodes become [`SyntaxError`]s instead of nodes

use super::tree_sitter_utils::{byte_offsets, end_line, node_excerpt, node_text, start_line};
use super::{AttributeSet, ErrorMode, ParseOptions, ParseOutput, SourceParser};
use crate::error::{Error, Result, SyntaxError};
use crate::tree::{Comment, Node, NodeId, SyntaxTree};

/// Tree-sitter node kind constants for the Rust grammar.
mod node_kinds {
    pub const LINE_COMMENT: &str = "line_comment";
    pub const BLOCK_COMMENT: &str = "block_comment";
}

/// Parser for Rust source files.
///
/// Holds the grammar only; each call builds its own `tree_sitter::Parser`,
/// so one `RustParser` can be shared across threads.
#[derive(Clone)]
pub struct RustParser {
    language: tree_sitter::Language,
}

impl std::fmt::Debug for RustParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustParser").finish_non_exhaustive()
    }
}

impl RustParser {
    /// Load the Rust grammar.
    ///
    /// # Errors
    ///
    /// Returns `Error::Parser` if the grammar is incompatible with the
    /// linked tree-sitter runtime.
    pub fn new() -> Result<Self> {
        let language: tree_sitter::Language = tree_sitter_rust::LANGUAGE.into();
        tree_sitter::Parser::new()
            .set_language(&language)
            .map_err(|e| Error::Parser(e.to_string()))?;
        Ok(Self { language })
    }

    fn parse_concrete(&self, text: &str) -> std::result::Result<tree_sitter::Tree, String> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| format!("grammar unavailable: {e}"))?;
        parser
            .parse(text, None)
            .ok_or_else(|| "parser returned no tree".to_string())
    }
}

impl SourceParser for RustParser {
    fn parse(&self, text: &str, options: &ParseOptions) -> ParseOutput {
        let concrete = match self.parse_concrete(text) {
            Ok(tree) => tree,
            Err(message) => {
                tracing::warn!(error = %message, "tree-sitter parse failed");
                return ParseOutput::failed(vec![SyntaxError::new(message, 1, 0, 0)]);
            }
        };

        let content = text.as_bytes();
        let root = concrete.root_node();

        let mut errors = Vec::new();
        collect_errors(&root, content, &mut errors);

        if options.error_mode == ErrorMode::FailFast && !errors.is_empty() {
            errors.truncate(1);
            return ParseOutput::failed(errors);
        }

        if !has_usable_statements(&root) {
            tracing::trace!(errors = errors.len(), "No usable statements in source");
            return ParseOutput::failed(errors);
        }

        let mut lowering = Lowering {
            content,
            attributes: options.attributes,
            tree: SyntaxTree::new(options.mode),
        };
        for id in lowering.lower_children(&root) {
            lowering.tree.push_root(id);
        }

        tracing::trace!(
            nodes = lowering.tree.len(),
            statements = lowering.tree.roots().len(),
            errors = errors.len(),
            "Lowered tree-sitter tree"
        );

        ParseOutput {
            tree: Some(lowering.tree),
            errors,
        }
    }
}

/// Collect `ERROR` and `MISSING` nodes in document order.
///
/// Subtrees without errors are skipped entirely, and an `ERROR` node is
/// reported once rather than once per nested error. Walks with an explicit
/// stack, so nesting depth is bounded by the heap rather than the call stack.
fn collect_errors(root: &tree_sitter::Node, content: &[u8], errors: &mut Vec<SyntaxError>) {
    let mut stack = vec![*root];
    while let Some(node) = stack.pop() {
        let (start, end) = byte_offsets(&node);
        if node.is_error() {
            let excerpt = node_excerpt(&node, content);
            let message = if excerpt.is_empty() {
                "syntax error".to_string()
            } else {
                format!("unexpected `{excerpt}`")
            };
            errors.push(SyntaxError::new(message, start_line(&node), start, end));
            continue;
        }
        if node.is_missing() {
            errors.push(SyntaxError::new(
                format!("missing `{}`", node.kind()),
                start_line(&node),
                start,
                end,
            ));
            continue;
        }
        if !node.has_error() {
            continue;
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
}

/// Whether the root holds at least one statement that is not an error.
///
/// An empty file has no statements at all and still counts as usable.
fn has_usable_statements(root: &tree_sitter::Node) -> bool {
    if root.is_error() {
        return false;
    }
    let mut cursor = root.walk();
    let mut statements = root
        .named_children(&mut cursor)
        .filter(|child| !is_comment(child.kind()))
        .peekable();
    if statements.peek().is_none() {
        return true;
    }
    statements.any(|child| !child.is_error() && !child.is_missing())
}

fn is_comment(kind: &str) -> bool {
    matches!(kind, node_kinds::LINE_COMMENT | node_kinds::BLOCK_COMMENT)
}

struct Lowering<'a> {
    content: &'a [u8],
    attributes: AttributeSet,
    tree: SyntaxTree,
}

/// A tree-sitter node whose named children are still being lowered.
struct Frame<'t> {
    node: tree_sitter::Node<'t>,
    comments: Vec<Comment>,
    remaining: std::vec::IntoIter<tree_sitter::Node<'t>>,
    children: Vec<NodeId>,
    pending: Vec<Comment>,
}

impl<'t> Frame<'t> {
    fn new(node: tree_sitter::Node<'t>, comments: Vec<Comment>) -> Self {
        let mut cursor = node.walk();
        let named: Vec<_> = node.named_children(&mut cursor).collect();
        Self {
            node,
            comments,
            remaining: named.into_iter(),
            children: Vec::new(),
            pending: Vec::new(),
        }
    }
}

impl Lowering<'_> {
    /// Lower everything below `root`, returning the ids of its named
    /// children in document order.
    ///
    /// Nodes are pushed in post-order (children before their parent) from
    /// an explicit stack of frames, so deeply nested expressions cannot
    /// exhaust the call stack.
    fn lower_children(&mut self, root: &tree_sitter::Node) -> Vec<NodeId> {
        let mut stack = vec![Frame::new(*root, Vec::new())];

        while let Some(frame) = stack.last_mut() {
            if let Some(child) = frame.remaining.next() {
                if child.is_error() || child.is_missing() {
                    continue;
                }
                if is_comment(child.kind()) {
                    if self.attributes.comments {
                        let comment = self.comment(&child);
                        frame.pending.push(comment);
                    }
                    continue;
                }
                let comments = std::mem::take(&mut frame.pending);
                stack.push(Frame::new(child, comments));
                continue;
            }

            let Some(done) = stack.pop() else { break };
            if !done.pending.is_empty() {
                tracing::trace!(
                    count = done.pending.len(),
                    parent = %done.node.kind(),
                    "Dropping trailing comments with no following node"
                );
            }
            match stack.last_mut() {
                Some(parent) => {
                    let id = self.finish(done);
                    parent.children.push(id);
                }
                None => return done.children,
            }
        }

        Vec::new()
    }

    fn finish(&mut self, frame: Frame<'_>) -> NodeId {
        let node = &frame.node;
        let (start, end) = byte_offsets(node);

        let mut lowered = Node::new(node.kind(), start, end, start_line(node));
        if self.attributes.end_line {
            lowered.end_line = Some(end_line(node));
        }
        lowered.comments = frame.comments;
        lowered.children = frame.children;
        self.tree.push(lowered)
    }

    fn comment(&self, node: &tree_sitter::Node) -> Comment {
        let (start_offset, end_offset) = byte_offsets(node);
        Comment {
            text: node_text(node, self.content)
                .unwrap_or_default()
                .trim_end()
                .to_string(),
            line: start_line(node),
            start_offset,
            end_offset,
        }
    }
}
