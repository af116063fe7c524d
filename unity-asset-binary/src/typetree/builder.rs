//! TypeTree builder
//!
//! Builds [`TypeTree`]s programmatically, e.g. to seed a schema registry for
//! files that ship without embedded type trees.

use super::types::{ALIGN_BYTES_FLAG, NodeId, TypeTree, TypeTreeNode};
use crate::error::{BinaryError, Result};
use unity_asset_core::type_names;

/// Fluent TypeTree builder
///
/// Nodes are appended in pre-order. `begin`/`begin_array` open a scope that
/// is closed again with `end`.
#[derive(Debug)]
pub struct TypeTreeBuilder {
    tree: TypeTree,
    open: Vec<NodeId>,
    scopes: Vec<usize>,
    last: Option<NodeId>,
    error: Option<BinaryError>,
}

impl TypeTreeBuilder {
    /// Start a tree whose root has the given type and field name
    pub fn new(type_name: &str, name: &str) -> Self {
        let mut builder = Self {
            tree: TypeTree::new(),
            open: Vec::new(),
            scopes: Vec::new(),
            last: None,
            error: None,
        };
        if let Some(root) = builder.push(TypeTreeNode::new(type_name, name, -1)) {
            builder.open.push(root);
        }
        builder
    }

    fn push(&mut self, node: TypeTreeNode) -> Option<NodeId> {
        if self.error.is_some() {
            return None;
        }
        let mut node = node;
        node.index = self.tree.len() as u32;
        match self.tree.push(self.open.last().copied(), node) {
            Ok(id) => {
                self.last = Some(id);
                Some(id)
            }
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }

    /// Add a primitive field, sized from its type name
    pub fn field(self, type_name: &str, name: &str) -> Self {
        let size = primitive_size(type_name).unwrap_or(-1);
        self.leaf(type_name, name, size)
    }

    /// Add a leaf with an explicit byte size
    pub fn leaf(mut self, type_name: &str, name: &str, byte_size: i32) -> Self {
        self.push(TypeTreeNode::new(type_name, name, byte_size));
        self
    }

    /// Open a nested struct
    pub fn begin(mut self, type_name: &str, name: &str) -> Self {
        if let Some(id) = self.push(TypeTreeNode::new(type_name, name, -1)) {
            self.open.push(id);
            self.scopes.push(1);
        }
        self
    }

    /// Open an array field whose elements are structs of `element_type`.
    /// The element's fields follow until the matching `end`.
    pub fn begin_array(mut self, container_type: &str, name: &str, element_type: &str) -> Self {
        let mut opened = 0;
        if let Some(id) = self.push(TypeTreeNode::new(container_type, name, -1)) {
            self.open.push(id);
            opened += 1;
        }
        if let Some(id) = self.push(array_node(type_names::ARRAY, type_names::ARRAY)) {
            self.open.push(id);
            opened += 1;
        }
        self.push(TypeTreeNode::new("int", "size", 4));
        if let Some(id) = self.push(TypeTreeNode::new(element_type, "data", -1)) {
            self.open.push(id);
            opened += 1;
        }
        self.scopes.push(opened);
        self
    }

    /// Close the innermost scope opened by `begin` or `begin_array`
    pub fn end(mut self) -> Self {
        match self.scopes.pop() {
            Some(count) => {
                let keep = self.open.len().saturating_sub(count);
                // later modifiers apply to the node that opened the scope
                if let Some(&opened) = self.open.get(keep) {
                    self.last = Some(opened);
                }
                self.open.truncate(keep);
            }
            None => {
                self.error.get_or_insert_with(|| {
                    BinaryError::invalid_data(0, "unbalanced TypeTreeBuilder::end")
                });
            }
        }
        self
    }

    /// Add an array of primitive elements (`vector` > `Array` > size/data)
    pub fn array(self, name: &str, element_type: &str) -> Self {
        let size = primitive_size(element_type).unwrap_or(-1);
        self.begin_array("vector", name, element_type)
            .end_with_element_size(size)
    }

    fn end_with_element_size(mut self, size: i32) -> Self {
        if let Some(data) = self.open.last().copied() {
            if let Some(node) = self.tree_node_mut(data) {
                node.byte_size = size;
            }
        }
        self.end()
    }

    /// Add a string field (`string` > aligned `Array` > size/char data)
    pub fn string(mut self, name: &str) -> Self {
        let Some(string) = self.push(TypeTreeNode::new(type_names::STRING, name, -1)) else {
            return self;
        };
        self.open.push(string);
        let mut array = array_node(type_names::ARRAY, type_names::ARRAY);
        array.meta_flags = ALIGN_BYTES_FLAG;
        if let Some(id) = self.push(array) {
            self.open.push(id);
            self.push(TypeTreeNode::new("int", "size", 4));
            self.push(TypeTreeNode::new("char", "data", 1));
            self.open.pop();
        }
        self.open.pop();
        self.last = Some(string);
        self
    }

    /// Add an opaque byte array field (`TypelessData` > size/UInt8 data)
    pub fn typeless(mut self, name: &str) -> Self {
        let Some(id) = self.push(array_node(type_names::TYPELESS_DATA, name)) else {
            return self;
        };
        self.open.push(id);
        self.push(TypeTreeNode::new("int", "size", 4));
        self.push(TypeTreeNode::new("UInt8", "data", 1));
        self.open.pop();
        self.last = Some(id);
        self
    }

    /// Request 4-byte alignment after the most recently added node
    pub fn aligned(self) -> Self {
        self.flags(ALIGN_BYTES_FLAG)
    }

    /// OR meta flags into the most recently added node
    pub fn flags(mut self, flags: u32) -> Self {
        if let Some(id) = self.last {
            if let Some(node) = self.tree_node_mut(id) {
                node.meta_flags |= flags;
            }
        }
        self
    }

    fn tree_node_mut(&mut self, id: NodeId) -> Option<&mut TypeTreeNode> {
        self.tree.node_mut(id)
    }

    /// Finish the tree
    pub fn build(self) -> Result<TypeTree> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if !self.scopes.is_empty() {
            return Err(BinaryError::invalid_data(
                0,
                format!("{} unclosed scopes in TypeTreeBuilder", self.scopes.len()),
            ));
        }
        Ok(self.tree)
    }
}

fn array_node(type_name: &str, name: &str) -> TypeTreeNode {
    TypeTreeNode {
        is_array: true,
        ..TypeTreeNode::new(type_name, name, -1)
    }
}

/// Get the size of primitive types
pub fn primitive_size(type_name: &str) -> Option<i32> {
    let size = match type_name {
        "bool" | "SInt8" | "UInt8" | "char" => 1,
        "SInt16" | "UInt16" | "short" | "unsigned short" => 2,
        "SInt32" | "UInt32" | "int" | "unsigned int" | "float" | "Type*" => 4,
        "SInt64" | "UInt64" | "long long" | "unsigned long long" | "double" | "FileSize" => 8,
        _ => return None,
    };
    Some(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_text_asset_schema() {
        let tree = TypeTreeBuilder::new("TextAsset", "Base")
            .string("m_Name")
            .string("m_Script")
            .build()
            .unwrap();

        let names: Vec<_> = tree.flatten().iter().map(|n| n.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                "Base", "m_Name", "Array", "size", "data", "m_Script", "Array", "size", "data"
            ]
        );
        let array = tree.node(2).unwrap();
        assert!(array.is_array);
        assert!(array.is_aligned());
        assert_eq!(tree.node(4).unwrap().level, 3);
    }

    #[test]
    fn test_struct_array() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .begin_array("vector", "m_Items", "Item")
            .field("int", "id")
            .end()
            .field("bool", "flag")
            .aligned()
            .build()
            .unwrap();

        let flat = tree.flatten();
        assert_eq!(flat[4].type_name, "Item");
        assert_eq!(flat[5].name, "id");
        assert_eq!(flat[5].level, 4);
        assert_eq!(flat[6].name, "flag");
        assert_eq!(flat[6].level, 1);
        assert!(flat[6].is_aligned());
    }

    #[test]
    fn test_aligned_after_end_targets_container() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .array("m_Indices", "UInt16")
            .aligned()
            .build()
            .unwrap();
        assert!(tree.node(1).unwrap().is_aligned());
        assert!(!tree.node(4).unwrap().is_aligned());
        assert_eq!(tree.node(4).unwrap().byte_size, 2);
    }

    #[test]
    fn test_unbalanced_end() {
        assert!(TypeTreeBuilder::new("Base", "Base").end().build().is_err());
        assert!(TypeTreeBuilder::new("Base", "Base").begin("S", "s").build().is_err());
    }

    #[test]
    fn test_primitive_array_element_size() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .array("m_Values", "float")
            .build()
            .unwrap();
        let data = tree.flatten().into_iter().find(|n| n.name == "data").unwrap();
        assert_eq!(data.byte_size, 4);
    }
}
