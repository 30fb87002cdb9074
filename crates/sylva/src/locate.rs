//! Cursor position to syntax node lookup.
//!
//! Lookups start at the top-level statements and descend only into the node
//! that contains the position. At each level a binary search over the
//! children's start positions rules out every child starting after the
//! position; the remaining candidates are checked in document order.

use crate::tree::{Node, NodeId, SyntaxTree};
use crate::types::Position;

/// Find the innermost node whose range contains `position`.
///
/// Returns `None` when no top-level statement contains the position (blank
/// lines, trailing comments, positions past the end of the file) and for
/// trees that were never augmented. Should two siblings overlap, the first
/// in document order wins.
#[must_use]
pub fn find_node_at(tree: &SyntaxTree, position: Position) -> Option<NodeId> {
    if !tree.is_augmented() {
        return None;
    }

    let mut found = None;
    let mut level = tree.roots();
    while let Some(id) = containing_sibling(tree, level, position) {
        found = Some(id);
        level = tree.children(id);
    }
    found
}

/// Like [`find_node_at`], returning the node itself.
#[must_use]
pub fn node_at(tree: &SyntaxTree, position: Position) -> Option<&Node> {
    find_node_at(tree, position).and_then(|id| tree.get(id))
}

/// Chain of nodes from the top-level statement down to the innermost node
/// containing `position`.
#[must_use]
pub fn ancestors_at(tree: &SyntaxTree, position: Position) -> Vec<NodeId> {
    let mut chain = Vec::new();
    if !tree.is_augmented() {
        return chain;
    }

    let mut level = tree.roots();
    while let Some(id) = containing_sibling(tree, level, position) {
        chain.push(id);
        level = tree.children(id);
    }
    chain
}

fn containing_sibling(tree: &SyntaxTree, siblings: &[NodeId], position: Position) -> Option<NodeId> {
    let starts_at_or_before = |id: &NodeId| {
        tree.get(*id)
            .and_then(Node::start_position)
            .is_some_and(|start| start <= position)
    };
    let upper = siblings.partition_point(starts_at_or_before);

    // Any sibling starting at or before the position may contain it, and a
    // narrow or zero-width sibling must not hide a wider one before it.
    siblings[..upper]
        .iter()
        .copied()
        .find(|&id| tree.get(id).is_some_and(|node| node.contains(position)))
}
