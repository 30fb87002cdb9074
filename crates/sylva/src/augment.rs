//! Interactive-mode tree augmentation.
//!
//! Editors ask "which node is under the cursor?", which needs more than the
//! byte offsets and start lines a batch parse records. [`augment`] fills in
//! the rest, in place:
//!
//! 1. **Links**: parent, previous sibling and next sibling for every node.
//! 2. **Layout**: start column, end line and end column, derived from the
//!    byte offsets and the source text.
//!
//! The pass only adds attributes. Node ids, ranges and child order are left
//! untouched, and running it again recomputes the same values.

use crate::line_index::LineIndex;
use crate::tree::{NodeId, NodeLayout, SyntaxTree};
use crate::types::ColumnEncoding;

#[derive(Debug, Clone, Copy, Default)]
struct Links {
    parent: Option<NodeId>,
    previous: Option<NodeId>,
    next: Option<NodeId>,
}

/// Attach navigation links and layout columns to every node of `tree`.
///
/// `source` must be the text the tree was parsed from. Columns are counted
/// in `encoding` units and the tree remembers the encoding afterwards.
pub fn augment(tree: &mut SyntaxTree, source: &str, encoding: ColumnEncoding) {
    let links = compute_links(tree);
    let index = LineIndex::new(source);

    for (node, links) in tree.nodes_mut().iter_mut().zip(links) {
        let end = index.position_of(node.end_offset, encoding);
        node.end_line = Some(end.line);
        node.layout = Some(NodeLayout {
            column: index.column_of(node.start_offset, encoding),
            end_column: end.column,
            parent: links.parent,
            previous: links.previous,
            next: links.next,
        });
    }

    tree.set_column_encoding(encoding);
    tracing::trace!(nodes = tree.len(), %encoding, "Augmented syntax tree");
}

/// One pass over every child list, roots included.
fn compute_links(tree: &SyntaxTree) -> Vec<Links> {
    let mut links = vec![Links::default(); tree.len()];
    link_siblings(&mut links, tree.roots(), None);
    for (index, node) in tree.nodes().iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)] // Arena ids are u32
        let parent = NodeId(index as u32);
        link_siblings(&mut links, &node.children, Some(parent));
    }
    links
}

fn link_siblings(links: &mut [Links], siblings: &[NodeId], parent: Option<NodeId>) {
    for (position, &id) in siblings.iter().enumerate() {
        let Some(slot) = links.get_mut(id.index()) else {
            tracing::warn!(%id, "Child id outside the arena, skipping");
            continue;
        };
        slot.parent = parent;
        slot.previous = position.checked_sub(1).map(|i| siblings[i]);
        slot.next = siblings.get(position + 1).copied();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;
    use crate::types::{Mode, Position};
    use proptest::prelude::*;

    const SOURCE: &str = "fn a() { x; y; }\nfn b() {}\n";

    /// `fn a` with two children, then `fn b`.
    fn sample_tree() -> SyntaxTree {
        let mut tree = SyntaxTree::new(Mode::interactive());
        let x = tree.push(Node::new("x", 9, 11, 1));
        let y = tree.push(Node::new("y", 12, 14, 1));
        let mut a = Node::new("fn_a", 0, 16, 1);
        a.children = vec![x, y];
        let a = tree.push(a);
        let b = tree.push(Node::new("fn_b", 17, 26, 2));
        tree.push_root(a);
        tree.push_root(b);
        tree
    }

    fn layout(tree: &SyntaxTree, id: u32) -> NodeLayout {
        tree.node(NodeId(id)).layout.expect("node should be augmented")
    }

    #[test]
    fn roots_have_no_parent_and_are_linked_to_each_other() {
        let mut tree = sample_tree();
        augment(&mut tree, SOURCE, ColumnEncoding::Utf16);

        let a = layout(&tree, 2);
        let b = layout(&tree, 3);
        assert_eq!(a.parent, None);
        assert_eq!(a.previous, None);
        assert_eq!(a.next, Some(NodeId(3)));
        assert_eq!(b.parent, None);
        assert_eq!(b.previous, Some(NodeId(2)));
        assert_eq!(b.next, None);
    }

    #[test]
    fn children_point_at_parent_and_siblings() {
        let mut tree = sample_tree();
        augment(&mut tree, SOURCE, ColumnEncoding::Utf16);

        let x = layout(&tree, 0);
        let y = layout(&tree, 1);
        assert_eq!(x.parent, Some(NodeId(2)));
        assert_eq!(x.previous, None);
        assert_eq!(x.next, Some(NodeId(1)));
        assert_eq!(y.parent, Some(NodeId(2)));
        assert_eq!(y.previous, Some(NodeId(0)));
        assert_eq!(y.next, None);
    }

    #[test]
    fn columns_and_end_lines_come_from_offsets() {
        let mut tree = sample_tree();
        augment(&mut tree, SOURCE, ColumnEncoding::Utf16);

        let y = tree.node(NodeId(1));
        assert_eq!(y.start_position(), Some(Position::new(1, 12)));
        assert_eq!(y.end_position(), Some(Position::new(1, 14)));

        let b = tree.node(NodeId(3));
        assert_eq!(b.start_position(), Some(Position::new(2, 0)));
        assert_eq!(b.end_position(), Some(Position::new(2, 9)));
        assert_eq!(tree.column_encoding(), Some(ColumnEncoding::Utf16));
    }

    #[test]
    fn columns_use_requested_encoding() {
        let source = "let s = \"😀\"; z;";
        let z_start = source.find('z').unwrap() as u32;
        let mut tree = SyntaxTree::new(Mode::interactive());
        let z = tree.push(Node::new("z", z_start, z_start + 2, 1));
        tree.push_root(z);

        let mut utf8 = tree.clone();
        augment(&mut utf8, source, ColumnEncoding::Utf8);
        let mut utf16 = tree.clone();
        augment(&mut utf16, source, ColumnEncoding::Utf16);
        let mut utf32 = tree;
        augment(&mut utf32, source, ColumnEncoding::Utf32);

        assert_eq!(layout(&utf8, 0).column, 16);
        assert_eq!(layout(&utf16, 0).column, 14);
        assert_eq!(layout(&utf32, 0).column, 13);
    }

    #[test]
    fn augmentation_preserves_structure() {
        let original = sample_tree();
        let mut tree = original.clone();
        augment(&mut tree, SOURCE, ColumnEncoding::Utf16);

        assert_eq!(tree.roots(), original.roots());
        for (before, after) in original.nodes().iter().zip(tree.nodes()) {
            assert_eq!(before.kind, after.kind);
            assert_eq!(before.byte_range(), after.byte_range());
            assert_eq!(before.line, after.line);
            assert_eq!(before.children, after.children);
        }
    }

    #[test]
    fn empty_tree_augments_without_nodes() {
        let mut tree = SyntaxTree::new(Mode::interactive());
        augment(&mut tree, "", ColumnEncoding::Utf16);
        assert!(tree.is_empty());
        assert!(tree.is_augmented());
    }

    #[test]
    fn offsets_past_end_are_clamped() {
        let mut tree = SyntaxTree::new(Mode::interactive());
        let id = tree.push(Node::new("long", 0, 100, 1));
        tree.push_root(id);

        augment(&mut tree, "ab\ncd", ColumnEncoding::Utf16);
        assert_eq!(tree.node(id).end_position(), Some(Position::new(2, 2)));
    }

    /// Flat statements over arbitrary text, each covering a slice of it.
    fn arbitrary_tree() -> impl Strategy<Value = (String, SyntaxTree)> {
        ("[a-z😀é \n]{0,64}", proptest::collection::vec(any::<u8>(), 0..8)).prop_map(
            |(text, cuts)| {
                let len = text.len() as u32;
                let mut bounds: Vec<u32> = cuts
                    .into_iter()
                    .map(|c| u32::from(c) * len / 255)
                    .collect();
                bounds.sort_unstable();
                let mut tree = SyntaxTree::new(Mode::interactive());
                for pair in bounds.windows(2) {
                    let id = tree.push(Node::new("stmt", pair[0], pair[1], 1));
                    tree.push_root(id);
                }
                (text, tree)
            },
        )
    }

    proptest! {
        #[test]
        fn augmenting_twice_equals_augmenting_once((text, tree) in arbitrary_tree()) {
            let mut once = tree.clone();
            augment(&mut once, &text, ColumnEncoding::Utf16);
            let mut twice = once.clone();
            augment(&mut twice, &text, ColumnEncoding::Utf16);
            prop_assert_eq!(once, twice);
        }
    }
}
