//! TypeTree data structures
//!
//! A [`TypeTree`] is an arena of [`TypeTreeNode`]s stored in pre-order.
//! Parent and child links are indices into the arena, so the tree can be
//! walked in both directions without reference cycles.

use crate::error::{BinaryError, Result};
use serde::{Deserialize, Serialize};

/// Index of a node inside its [`TypeTree`]
pub type NodeId = usize;

/// Meta flag requesting 4-byte alignment after the node is decoded
pub const ALIGN_BYTES_FLAG: u32 = 0x4000;

/// A node in the Unity TypeTree
///
/// Each node represents a field or type in the Unity object structure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeTreeNode {
    /// Version of this type
    pub version: u16,
    /// Depth level in the tree (root is 0)
    pub level: u8,
    /// Whether this node is an array wrapper
    pub is_array: bool,
    /// Type name (e.g., "int", "string", "GameObject")
    pub type_name: String,
    /// Field name (e.g., "m_Name", "m_IsActive")
    pub name: String,
    /// Size in bytes (-1 for variable size)
    pub byte_size: i32,
    /// Declaration index
    pub index: u32,
    /// Meta flags (alignment, etc.)
    pub meta_flags: u32,
    /// Reference type hash (format 19+)
    pub ref_type_hash: Option<u64>,
    /// Parent node, `None` for the root
    pub parent: Option<NodeId>,
    /// Child nodes in declaration order
    pub children: Vec<NodeId>,
}

impl TypeTreeNode {
    /// Create a new node with basic information
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, byte_size: i32) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            byte_size,
            ..Default::default()
        }
    }

    /// Check if decoding this node must be followed by 4-byte alignment
    pub fn is_aligned(&self) -> bool {
        self.meta_flags & ALIGN_BYTES_FLAG != 0
    }

    /// Check if this node has no children
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn detached(&self) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            ..self.clone()
        }
    }
}

/// Complete TypeTree structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TypeTree {
    nodes: Vec<TypeTreeNode>,
}

impl TypeTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node id, if any
    pub fn root_id(&self) -> Option<NodeId> {
        if self.nodes.is_empty() { None } else { Some(0) }
    }

    /// The root node
    pub fn root(&self) -> Option<&TypeTreeNode> {
        self.nodes.first()
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&TypeTreeNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut TypeTreeNode> {
        self.nodes.get_mut(id)
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> &[TypeTreeNode] {
        &self.nodes
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &TypeTreeNode)> + '_ {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |&child| self.nodes.get(child).map(|node| (child, node)))
    }

    /// Find a direct child by field name
    pub fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .find(|(_, node)| node.name == name)
            .map(|(child, _)| child)
    }

    /// Get the parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// Add a node below `parent` (or as the root when `parent` is `None`).
    ///
    /// The node's level is derived from its parent.
    pub fn push(&mut self, parent: Option<NodeId>, mut node: TypeTreeNode) -> Result<NodeId> {
        let id = self.nodes.len();
        match parent {
            None => {
                if !self.nodes.is_empty() {
                    return Err(BinaryError::invalid_data(0, "type tree already has a root"));
                }
                node.level = 0;
            }
            Some(parent_id) => {
                let parent_node = self.nodes.get_mut(parent_id).ok_or_else(|| {
                    BinaryError::invalid_data(0, format!("unknown parent node {}", parent_id))
                })?;
                node.level = parent_node.level.checked_add(1).ok_or_else(|| {
                    BinaryError::invalid_data(0, "type tree deeper than 255 levels")
                })?;
                parent_node.children.push(id);
            }
        }
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        Ok(id)
    }

    /// Rebuild a tree from a pre-order list of nodes whose `level` fields
    /// describe the nesting. Existing parent/child links are ignored.
    pub fn from_flat(flat: Vec<TypeTreeNode>) -> Result<Self> {
        let mut tree = TypeTree {
            nodes: Vec::with_capacity(flat.len()),
        };
        // stack[level] holds the most recent node seen at that level
        let mut stack: Vec<NodeId> = Vec::new();

        for (position, node) in flat.into_iter().enumerate() {
            let level = node.level as usize;
            if position == 0 {
                if level != 0 {
                    return Err(BinaryError::invalid_data(
                        0,
                        format!("type tree root has level {}", level),
                    ));
                }
                let id = tree.push(None, node)?;
                stack.push(id);
                continue;
            }
            if level == 0 || level > stack.len() {
                return Err(BinaryError::invalid_data(
                    0,
                    format!(
                        "type tree node {} has level {} after depth {}",
                        position,
                        level,
                        stack.len() - 1
                    ),
                ));
            }
            let parent = stack[level - 1];
            let id = tree.push(Some(parent), node)?;
            stack.truncate(level);
            stack.push(id);
        }

        Ok(tree)
    }

    /// Flatten into a pre-order list of detached nodes (levels set, links cleared)
    pub fn flatten(&self) -> Vec<TypeTreeNode> {
        let mut flat = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root_id() else {
            return flat;
        };
        let mut pending = vec![(root, 0u8)];
        while let Some((id, level)) = pending.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let mut record = node.detached();
            record.level = level;
            flat.push(record);
            for &child in node.children.iter().rev() {
                pending.push((child, level.saturating_add(1)));
            }
        }
        flat
    }

    /// Render the tree as an indented outline, one node per line
    pub fn dump(&self) -> String {
        self.flatten()
            .iter()
            .map(|node| {
                format!(
                    "{}{} {} // size={} flags={:#x}{}\n",
                    "  ".repeat(node.level as usize),
                    node.type_name,
                    node.name,
                    node.byte_size,
                    node.meta_flags,
                    if node.is_array { " array" } else { "" }
                )
            })
            .collect()
    }
}
