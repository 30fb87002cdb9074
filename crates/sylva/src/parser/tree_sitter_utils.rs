//! Shared tree-sitter helpers.

// Tree-sitter returns usize for positions, but we store u32 for compactness.
// This is safe for practical source files (no file has 4 billion lines).
#![allow(clippy::cast_possible_truncation)]

/// Longest node excerpt quoted in error messages.
const EXCERPT_LIMIT: usize = 24;

/// Get text content of a tree-sitter node.
///
/// Returns `None` if the node's byte range contains invalid UTF-8.
pub fn node_text<'a>(node: &tree_sitter::Node, content: &'a [u8]) -> Option<&'a str> {
    let bytes = content.get(node.byte_range())?;
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::trace!(
                byte_range = ?node.byte_range(),
                error = %e,
                node_kind = %node.kind(),
                "Failed to decode node text as UTF-8"
            );
            None
        }
    }
}

/// Short, single-line excerpt of a node for diagnostics.
pub fn node_excerpt(node: &tree_sitter::Node, content: &[u8]) -> String {
    let text = node_text(node, content).unwrap_or_default();
    let first_line = text.lines().next().unwrap_or_default().trim();
    let mut excerpt: String = first_line.chars().take(EXCERPT_LIMIT).collect();
    if excerpt.len() < first_line.len() {
        excerpt.push('…');
    }
    excerpt
}

/// 1-based start line of a node.
///
/// Tree-sitter rows are 0-indexed; node lines are 1-indexed.
pub fn start_line(node: &tree_sitter::Node) -> u32 {
    node.start_position().row as u32 + 1
}

/// 1-based end line of a node.
pub fn end_line(node: &tree_sitter::Node) -> u32 {
    node.end_position().row as u32 + 1
}

/// Byte offsets of a node as `(start, end)`.
pub fn byte_offsets(node: &tree_sitter::Node) -> (u32, u32) {
    (node.start_byte() as u32, node.end_byte() as u32)
}
