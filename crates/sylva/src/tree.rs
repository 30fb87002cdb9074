//! Arena-backed syntax trees.
//!
//! A [`SyntaxTree`] owns every node in a flat `Vec`; nodes refer to each
//! other by [`NodeId`]. Child lists own the structure, while the parent and
//! sibling links in [`NodeLayout`] are plain ids used for navigation only.
//!
//! ## Attribute Sets
//!
//! | Attribute | Batch | Interactive |
//! |-----------|-------|-------------|
//! | kind, byte range, start line, comments, children | yes | yes |
//! | end line | no | yes |
//! | layout (columns, parent/sibling links) | no | yes, after augmentation |

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::types::{ColumnEncoding, Mode, Position};

/// Index of a node inside its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A comment attached to the node that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text including its delimiters
    pub text: String,
    /// 1-based line the comment starts on
    pub line: u32,
    /// Byte offset of the comment start
    pub start_offset: u32,
    /// Byte offset one past the comment end
    pub end_offset: u32,
}

/// Interactive-mode layout: columns and navigation links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeLayout {
    /// 0-based column of the start offset
    pub column: u32,
    /// 0-based column of the end offset
    pub end_column: u32,
    /// Enclosing node, `None` for top-level statements
    pub parent: Option<NodeId>,
    /// Preceding node in the parent's child list
    pub previous: Option<NodeId>,
    /// Following node in the parent's child list
    pub next: Option<NodeId>,
}

/// A syntax node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Grammar kind (e.g. `function_item`)
    pub kind: String,
    /// Byte offset of the first byte
    pub start_offset: u32,
    /// Byte offset one past the last byte
    pub end_offset: u32,
    /// 1-based line the node starts on
    pub line: u32,
    /// 1-based line the node ends on (interactive mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// Comments immediately preceding the node
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    /// Child nodes in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    /// Columns and links, present once the tree has been augmented
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<NodeLayout>,
}

impl Node {
    /// Create a leaf node with no optional attributes.
    #[must_use]
    pub fn new(kind: impl Into<String>, start_offset: u32, end_offset: u32, line: u32) -> Self {
        Self {
            kind: kind.into(),
            start_offset,
            end_offset,
            line,
            end_line: None,
            comments: Vec::new(),
            children: Vec::new(),
            layout: None,
        }
    }

    /// Byte range covered by this node.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.start_offset as usize..self.end_offset as usize
    }

    /// Start position, available once the tree is augmented.
    #[must_use]
    pub fn start_position(&self) -> Option<Position> {
        self.layout
            .map(|layout| Position::new(self.line, layout.column))
    }

    /// End position (exclusive), available once the tree is augmented.
    #[must_use]
    pub fn end_position(&self) -> Option<Position> {
        let layout = self.layout?;
        Some(Position::new(self.end_line?, layout.end_column))
    }

    /// Whether `position` falls in `[start, end)` of this node.
    ///
    /// Always `false` for unaugmented nodes and zero-width nodes.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        match (self.start_position(), self.end_position()) {
            (Some(start), Some(end)) => start <= position && position < end,
            _ => false,
        }
    }

    /// Enclosing node.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.layout.and_then(|layout| layout.parent)
    }

    /// Preceding sibling.
    #[must_use]
    pub fn previous_sibling(&self) -> Option<NodeId> {
        self.layout.and_then(|layout| layout.previous)
    }

    /// Following sibling.
    #[must_use]
    pub fn next_sibling(&self) -> Option<NodeId> {
        self.layout.and_then(|layout| layout.next)
    }

    /// Source text of this node, if the range is valid for `text`.
    #[must_use]
    pub fn text<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.byte_range())
    }
}

/// A parsed file: an arena of nodes plus its top-level statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    mode: Mode,
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column_encoding: Option<ColumnEncoding>,
}

impl SyntaxTree {
    /// Create an empty tree for `mode`.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            nodes: Vec::new(),
            roots: Vec::new(),
            column_encoding: None,
        }
    }

    /// Add a node to the arena and return its id.
    ///
    /// The node is not attached anywhere; list it in a parent's `children`
    /// or pass it to [`Self::push_root`].
    #[allow(clippy::cast_possible_truncation)] // Trees never approach u32::MAX nodes
    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Append a top-level statement.
    pub fn push_root(&mut self, id: NodeId) {
        self.roots.push(id);
    }

    /// Mode the tree was built for.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Top-level statements in document order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// All nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Get a node by id, `None` if out of bounds.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Mutable access to a node.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Children of a node in document order (empty for unknown ids).
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Total number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no top-level statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Encoding the layout columns are measured in, once augmented.
    #[must_use]
    pub fn column_encoding(&self) -> Option<ColumnEncoding> {
        self.column_encoding
    }

    /// Whether the tree carries layout attributes.
    #[must_use]
    pub fn is_augmented(&self) -> bool {
        self.column_encoding.is_some()
    }

    pub(crate) fn set_column_encoding(&mut self, encoding: ColumnEncoding) {
        self.column_encoding = Some(encoding);
    }

    /// Check the structural invariants navigation relies on.
    ///
    /// - every root and child id is in bounds
    /// - no node has two parents, and roots have none
    /// - byte ranges are well-formed and siblings are in document order
    ///
    /// Together these guarantee that walks starting at the roots terminate.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut has_parent = vec![false; self.nodes.len()];

        self.check_siblings(&self.roots, "roots")?;
        for &root in &self.roots {
            mark_parent(&mut has_parent, root, "roots")?;
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if node.start_offset > node.end_offset {
                return Err(format!(
                    "node #{index} has start {} after end {}",
                    node.start_offset, node.end_offset
                ));
            }
            let owner = format!("node #{index}");
            self.check_siblings(&node.children, &owner)?;
            for &child in &node.children {
                mark_parent(&mut has_parent, child, &owner)?;
            }
        }

        Ok(())
    }

    fn check_siblings(&self, ids: &[NodeId], owner: &str) -> std::result::Result<(), String> {
        let mut previous_start = 0;
        for &id in ids {
            let node = self
                .get(id)
                .ok_or_else(|| format!("{owner} references missing node {id}"))?;
            if node.start_offset < previous_start {
                return Err(format!("{owner} lists {id} out of document order"));
            }
            previous_start = node.start_offset;
        }
        Ok(())
    }
}

fn mark_parent(
    has_parent: &mut [bool],
    id: NodeId,
    owner: &str,
) -> std::result::Result<(), String> {
    let slot = has_parent
        .get_mut(id.index())
        .ok_or_else(|| format!("{owner} references missing node {id}"))?;
    if *slot {
        return Err(format!("node {id} is reachable from more than one parent"));
    }
    *slot = true;
    Ok(())
}
