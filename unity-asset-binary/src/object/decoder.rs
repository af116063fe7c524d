//! Schema-driven object decoding
//!
//! [`ObjectDecoder`] walks a [`TypeTree`] against an object's bytes. Each node
//! is decoded as one of four shapes, checked in order:
//!
//! 1. leaf: a fixed-width scalar, or `byte_size` raw bytes for unknown types
//! 2. array: a `size` child followed by `size` elements of the `data` child
//! 3. transparent wrapper: a single `Array`/`Array` child, decoded in place
//! 4. struct: every child in declaration order
//!
//! Nodes with the alignment meta flag are followed by padding to the next
//! 4-byte boundary of the object.

use super::value::{ObjectValue, Payload, Scalar};
use crate::container::BlobIndex;
use crate::error::{BinaryError, Result};
use crate::options::ParseOptions;
use crate::reader::BinaryReader;
use crate::typetree::{NodeId, TypeTree, TypeTreeNode};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{trace, warn};
use unity_asset_core::type_names;

/// How a leaf node is read, keyed by its type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// Anything else: `byte_size` raw bytes
    Raw,
}

impl LeafKind {
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "bool" => LeafKind::Bool,
            "SInt8" => LeafKind::I8,
            "UInt8" => LeafKind::U8,
            "SInt16" | "short" => LeafKind::I16,
            "UInt16" | "unsigned short" => LeafKind::U16,
            "SInt32" | "int" => LeafKind::I32,
            "UInt32" | "unsigned int" | "Type*" => LeafKind::U32,
            "SInt64" | "long long" => LeafKind::I64,
            "UInt64" | "unsigned long long" | "FileSize" => LeafKind::U64,
            "float" => LeafKind::F32,
            "double" => LeafKind::F64,
            _ => LeafKind::Raw,
        }
    }

    fn read(self, reader: &mut BinaryReader, byte_size: i32) -> Result<Payload> {
        let scalar = match self {
            LeafKind::Bool => Scalar::Bool(reader.read_bool()?),
            LeafKind::I8 => Scalar::Int(reader.read_i8()? as i64),
            LeafKind::U8 => Scalar::UInt(reader.read_u8()? as u64),
            LeafKind::I16 => Scalar::Int(reader.read_i16()? as i64),
            LeafKind::U16 => Scalar::UInt(reader.read_u16()? as u64),
            LeafKind::I32 => Scalar::Int(reader.read_i32()? as i64),
            LeafKind::U32 => Scalar::UInt(reader.read_u32()? as u64),
            LeafKind::I64 => Scalar::Int(reader.read_i64()?),
            LeafKind::U64 => Scalar::UInt(reader.read_u64()?),
            LeafKind::F32 => Scalar::Float(reader.read_f32()? as f64),
            LeafKind::F64 => Scalar::Float(reader.read_f64()?),
            LeafKind::Raw => {
                let len = usize::try_from(byte_size).unwrap_or(0);
                return Ok(Payload::Bytes(Arc::from(reader.read_slice(len)?)));
            }
        };
        Ok(Payload::Scalar(scalar))
    }
}

/// Source of streamed payloads: the owning container's blobs
#[derive(Debug, Clone, Copy)]
struct StreamSource<'a> {
    owner: &'a str,
    blobs: &'a BlobIndex,
}

/// Decodes objects described by one TypeTree
#[derive(Debug, Clone)]
pub struct ObjectDecoder<'a> {
    tree: &'a TypeTree,
    options: &'a ParseOptions,
    streams: Option<StreamSource<'a>>,
}

impl<'a> ObjectDecoder<'a> {
    pub fn new(tree: &'a TypeTree, options: &'a ParseOptions) -> Self {
        Self {
            tree,
            options,
            streams: None,
        }
    }

    /// Resolve `StreamingInfo` values against `blobs`. `owner` is the name of
    /// the asset file being decoded; `archive:/<owner>/` prefixes are stripped
    /// from stream paths.
    pub fn with_streams(mut self, owner: &'a str, blobs: &'a BlobIndex) -> Self {
        self.streams = Some(StreamSource { owner, blobs });
        self
    }

    /// Decode a whole object starting at the reader's position
    pub fn decode(&self, reader: &mut BinaryReader) -> Result<ObjectValue> {
        let root = self
            .tree
            .root_id()
            .ok_or_else(|| BinaryError::invalid_data(reader.position(), "empty type tree"))?;
        self.decode_node(root, reader)
    }

    /// Decode the subtree rooted at `id`
    pub fn decode_node(&self, id: NodeId, reader: &mut BinaryReader) -> Result<ObjectValue> {
        let node = self.node(id, reader)?;
        trace!(
            offset = reader.position(),
            type_name = %node.type_name,
            name = %node.name,
            "decode node"
        );

        let value = if node.is_leaf() {
            self.decode_leaf(node, reader)?
        } else if node.is_array {
            self.decode_array(id, node, reader)?
        } else if let Some(inner) = self.wrapped_array(node) {
            let mut value = self.decode_node(inner, reader)?;
            value.name = node.name.clone();
            value.type_name = node.type_name.clone();
            value
        } else {
            self.decode_struct(id, node, reader)?
        };

        if node.is_aligned() {
            reader.align();
        }
        Ok(value)
    }

    fn node(&self, id: NodeId, reader: &BinaryReader) -> Result<&'a TypeTreeNode> {
        self.tree.node(id).ok_or_else(|| {
            BinaryError::invalid_data(reader.position(), format!("missing type tree node {}", id))
        })
    }

    fn empty_value(&self, node: &TypeTreeNode, reader: &BinaryReader) -> ObjectValue {
        ObjectValue::new(node.name.clone(), node.type_name.clone(), reader.byte_order())
    }

    fn decode_leaf(&self, node: &TypeTreeNode, reader: &mut BinaryReader) -> Result<ObjectValue> {
        let start = reader.position();
        let mut value = self.empty_value(node, reader);
        value.payload = LeafKind::from_type_name(&node.type_name).read(reader, node.byte_size)?;
        // declared width wins over the width of the typed read
        if node.byte_size >= 0 {
            reader.skip_to(start + node.byte_size as u64);
        }
        Ok(value)
    }

    /// The single `Array` child of a transparent wrapper node
    fn wrapped_array(&self, node: &TypeTreeNode) -> Option<NodeId> {
        let [only] = node.children.as_slice() else {
            return None;
        };
        let child = self.tree.node(*only)?;
        (child.is_array && child.type_name == type_names::ARRAY && child.name == type_names::ARRAY)
            .then_some(*only)
    }

    fn decode_array(
        &self,
        id: NodeId,
        node: &TypeTreeNode,
        reader: &mut BinaryReader,
    ) -> Result<ObjectValue> {
        let mut value = self.empty_value(node, reader);

        for (child_id, child) in self.tree.children(id) {
            if child.name != "data" {
                let decoded = self.decode_node(child_id, reader)?;
                value.fields.insert(child.name.clone(), decoded);
                continue;
            }

            let count = self.element_count(&value, reader)?;
            let payload = match self.read_flat_run(node, child, count, reader)? {
                Some(payload) => payload,
                None => self.read_elements(child_id, child, count, reader)?,
            };

            let mut data = ObjectValue::new(child.name.clone(), child.type_name.clone(), reader.byte_order());
            data.payload = payload.clone();
            value.fields.insert(child.name.clone(), data);
            value.payload = payload;
        }
        Ok(value)
    }

    /// Element count from the already decoded `size` child
    fn element_count(&self, array: &ObjectValue, reader: &BinaryReader) -> Result<usize> {
        let offset = reader.position();
        let size = array.field("size").ok_or_else(|| {
            BinaryError::invalid_data(
                offset,
                format!("array `{}` has no `size` before `data`", array.name),
            )
        })?;
        let raw = size.as_i64().ok_or_else(|| {
            BinaryError::invalid_data(offset, format!("array `{}` size is not an integer", array.name))
        })?;
        let count = usize::try_from(raw).map_err(|_| {
            BinaryError::invalid_data(offset, format!("array `{}` has negative size {}", array.name, raw))
        })?;
        if count > self.options.max_array_elements {
            return Err(BinaryError::resource_limit(format!(
                "array `{}` of {} elements exceeds limit {}",
                array.name, count, self.options.max_array_elements
            )));
        }
        Ok(count)
    }

    /// Read a byte or text run in one go when the element layout allows it
    fn read_flat_run(
        &self,
        array: &TypeTreeNode,
        data: &TypeTreeNode,
        count: usize,
        reader: &mut BinaryReader,
    ) -> Result<Option<Payload>> {
        if !data.is_leaf() {
            return Ok(None);
        }
        let aligned = reader.position() % 4 == 0 && data.byte_size % 4 == 0;
        if data.is_aligned() && !aligned {
            return Ok(None);
        }
        let is_bytes = array.type_name == type_names::TYPELESS_DATA;
        let is_text = data.type_name == "char";
        if !is_bytes && !is_text {
            return Ok(None);
        }

        let element_size = u64::try_from(data.byte_size).unwrap_or(0);
        let len = self
            .options
            .check_allocation((count as u64).saturating_mul(element_size), "byte run")?;
        let bytes = reader.read_slice(len)?;
        if is_bytes {
            return Ok(Some(Payload::Bytes(Arc::from(bytes))));
        }
        Ok(Some(match std::str::from_utf8(bytes) {
            Ok(text) => Payload::Text(Arc::from(text)),
            Err(_) => Payload::Bytes(Arc::from(bytes)),
        }))
    }

    fn read_elements(
        &self,
        data_id: NodeId,
        data: &TypeTreeNode,
        count: usize,
        reader: &mut BinaryReader,
    ) -> Result<Payload> {
        // elements of known width must fit in what is left
        if data.byte_size > 0 {
            let needed = count.saturating_mul(data.byte_size as usize);
            if needed > reader.remaining() {
                return Err(BinaryError::end_of_data(
                    reader.position(),
                    needed,
                    reader.remaining(),
                ));
            }
        }
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(self.decode_node(data_id, reader)?);
        }
        Ok(Payload::Array(items.into()))
    }

    fn decode_struct(
        &self,
        id: NodeId,
        node: &TypeTreeNode,
        reader: &mut BinaryReader,
    ) -> Result<ObjectValue> {
        let mut value = self.empty_value(node, reader);
        let mut fields = IndexMap::with_capacity(node.children.len());
        for (child_id, child) in self.tree.children(id) {
            fields.insert(child.name.clone(), self.decode_node(child_id, reader)?);
        }
        value.fields = fields;
        value.is_struct = true;

        if node.type_name == type_names::STREAMING_INFO {
            if let Some(bytes) = self.resolve_stream(&value) {
                value.payload = Payload::Bytes(bytes);
            }
        }
        Ok(value)
    }

    /// Slice a streamed payload out of the owning container's blobs.
    /// Unresolvable references leave the payload unset.
    fn resolve_stream(&self, info: &ObjectValue) -> Option<Arc<[u8]>> {
        let streams = self.streams?;
        let path = info.field("path")?.as_str()?;
        let offset = info.field("offset")?.as_u64()?;
        let size = info.field("size")?.as_u64()?;
        if path.is_empty() {
            return None;
        }

        let prefix = format!("archive:/{}/", streams.owner);
        let name = path.strip_prefix(prefix.as_str()).unwrap_or(path);
        let Some(blob) = streams.blobs.get(name) else {
            trace!(path, "streamed payload not found");
            return None;
        };
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(size).ok()?)?;
        match blob.get(start..end) {
            Some(slice) => Some(Arc::from(slice)),
            None => {
                warn!(
                    path,
                    offset,
                    size,
                    blob_len = blob.len(),
                    "streamed payload outside of its blob"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteOrder;
    use crate::typetree::TypeTreeBuilder;

    fn decode(tree: &TypeTree, data: &[u8], order: ByteOrder) -> Result<(ObjectValue, u64)> {
        let options = ParseOptions::default();
        let mut reader = BinaryReader::new(data, order);
        let value = ObjectDecoder::new(tree, &options).decode(&mut reader)?;
        Ok((value, reader.position()))
    }

    #[test]
    fn test_big_endian_int_leaf() {
        let tree = TypeTreeBuilder::new("int", "value").build().unwrap();
        let mut tree = tree;
        tree.node_mut(0).unwrap().byte_size = 4;
        let (value, end) = decode(&tree, &[0x00, 0x00, 0x00, 0x05], ByteOrder::Big).unwrap();
        assert_eq!(value.as_i64(), Some(5));
        assert_eq!(end, 4);
    }

    #[test]
    fn test_leaf_declared_width_wins() {
        // a bool declared as four bytes wide
        let tree = TypeTreeBuilder::new("Base", "Base")
            .leaf("bool", "flag", 4)
            .field("UInt8", "next")
            .build()
            .unwrap();
        let (value, end) = decode(&tree, &[1, 0xFF, 0xFF, 0xFF, 9], ByteOrder::Little).unwrap();
        assert_eq!(value.field("flag").unwrap().as_bool(), Some(true));
        assert_eq!(value.field("next").unwrap().as_u64(), Some(9));
        assert_eq!(end, 5);
    }

    #[test]
    fn test_unknown_leaf_reads_raw_bytes() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .leaf("GUIDish", "id", 3)
            .build()
            .unwrap();
        let (value, _) = decode(&tree, &[1, 2, 3], ByteOrder::Little).unwrap();
        assert_eq!(value.field("id").unwrap().as_bytes(), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_string_and_alignment() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .string("m_Name")
            .field("int", "after")
            .build()
            .unwrap();
        let data = [
            3, 0, 0, 0, b'a', b'b', b'c', 0, // string + padding
            42, 0, 0, 0,
        ];
        let (value, end) = decode(&tree, &data, ByteOrder::Little).unwrap();
        let name = value.field("m_Name").unwrap();
        assert_eq!(name.as_str(), Some("abc"));
        assert_eq!(name.type_name, "string");
        assert_eq!(name.name, "m_Name");
        assert_eq!(value.field("after").unwrap().as_i64(), Some(42));
        assert_eq!(end, 12);
    }

    #[test]
    fn test_array_value_and_data_child_agree() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .array("m_Values", "SInt16")
            .build()
            .unwrap();
        let data = [3, 0, 0, 0, 1, 0, 2, 0, 0xFF, 0xFF];
        let (value, _) = decode(&tree, &data, ByteOrder::Little).unwrap();
        let values = value.field("m_Values").unwrap();
        let items: Vec<_> = values.elements().iter().map(|v| v.as_i64().unwrap()).collect();
        assert_eq!(items, vec![1, 2, -1]);
        assert_eq!(values.field("data").unwrap().payload, values.payload);
        assert_eq!(values.field("size").unwrap().as_i64(), Some(3));
    }

    #[test]
    fn test_typeless_data_is_bytes() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .typeless("image data")
            .build()
            .unwrap();
        let data = [2, 0, 0, 0, 0xAB, 0xCD];
        let (value, end) = decode(&tree, &data, ByteOrder::Little).unwrap();
        assert_eq!(
            value.field("image data").unwrap().as_bytes(),
            Some(&[0xABu8, 0xCD][..])
        );
        assert_eq!(end, 6);
    }

    #[test]
    fn test_missing_size_fails_fast() {
        let mut tree = TypeTree::new();
        let root = tree
            .push(None, crate::typetree::TypeTreeNode::new("Base", "Base", -1))
            .unwrap();
        let array = tree
            .push(
                Some(root),
                crate::typetree::TypeTreeNode {
                    is_array: true,
                    ..crate::typetree::TypeTreeNode::new("Array", "Array", -1)
                },
            )
            .unwrap();
        tree.push(Some(array), crate::typetree::TypeTreeNode::new("UInt8", "data", 1))
            .unwrap();

        let err = decode(&tree, &[0u8; 8], ByteOrder::Little).unwrap_err();
        assert!(matches!(err, BinaryError::InvalidData { .. }));
    }

    #[test]
    fn test_overlong_array_is_end_of_data() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .array("m_Values", "int")
            .build()
            .unwrap();
        let data = [100, 0, 0, 0, 1, 0, 0, 0];
        let err = decode(&tree, &data, ByteOrder::Little).unwrap_err();
        assert!(matches!(err, BinaryError::EndOfData { .. }));
    }

    #[test]
    fn test_negative_array_size() {
        let tree = TypeTreeBuilder::new("Base", "Base")
            .array("m_Values", "int")
            .build()
            .unwrap();
        let data = (-1i32).to_le_bytes();
        assert!(decode(&tree, &data, ByteOrder::Little).is_err());
    }

    #[test]
    fn test_invalid_utf8_text_falls_back_to_bytes() {
        let tree = TypeTreeBuilder::new("Base", "Base").string("m_Script").build().unwrap();
        let data = [2, 0, 0, 0, 0xFF, 0xFE, 0, 0];
        let (value, _) = decode(&tree, &data, ByteOrder::Little).unwrap();
        let script = value.field("m_Script").unwrap();
        assert!(script.as_str().is_none());
        assert_eq!(script.as_bytes(), Some(&[0xFFu8, 0xFE][..]));
    }
}
