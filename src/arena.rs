//! Arena storage for parse trees
//!
//! Rule bodies build their results here and hand around [`NodeId`]
//! references; the runtime itself never looks inside a node, only at
//! whether a rule produced one at all. Nodes live
//! in a single contiguous region with children packed into a shared
//! pool, so a node is a Copy value and the whole tree is dropped in one
//! deallocation at the end of the parse session.

use crate::cursor::Mark;

/// Reference to a node in a [`TreeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Index into the arena's node storage.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of a parse tree.
#[derive(Debug, Clone, Copy)]
pub enum TreeNode {
    /// A consumed token, referenced by its position in the cursor's
    /// buffer
    Leaf {
        /// Buffer index of the token
        token: u32,
    },
    /// An interior node labeled by the grammar rule that built it
    Branch {
        /// Static label, typically the rule or alternative name
        label: &'static str,
        /// Offset of the first child in the shared child pool
        children: u32,
        /// Number of children
        len: u32,
    },
}

/// Append-only storage for parse-tree nodes.
#[derive(Debug, Default)]
pub struct TreeArena {
    nodes: Vec<TreeNode>,
    children: Vec<NodeId>,
}

impl TreeArena {
    /// Create an empty arena.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create an arena with room for roughly `capacity` nodes.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            children: Vec::with_capacity(capacity),
        }
    }

    /// Allocate a leaf node for the token at buffer position `mark`.
    #[inline]
    pub fn leaf(&mut self, mark: Mark) -> NodeId {
        self.push(TreeNode::Leaf {
            token: mark.index() as u32,
        })
    }

    /// Allocate a branch node with the given label and children.
    pub fn branch(&mut self, label: &'static str, children: &[NodeId]) -> NodeId {
        let offset = self.children.len() as u32;
        self.children.extend_from_slice(children);
        self.push(TreeNode::Branch {
            label,
            children: offset,
            len: children.len() as u32,
        })
    }

    /// Read a node back.
    #[inline]
    pub fn get(&self, id: NodeId) -> TreeNode {
        self.nodes[id.index()]
    }

    /// The children of a branch node (empty for leaves).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.nodes[id.index()] {
            TreeNode::Leaf { .. } => &[],
            TreeNode::Branch { children, len, .. } => {
                &self.children[children as usize..(children + len) as usize]
            }
        }
    }

    /// Number of allocated nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    fn push(&mut self, node: TreeNode) -> NodeId {
        debug_assert!(self.nodes.len() < u32::MAX as usize);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }
}
