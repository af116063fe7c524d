//! TypeTree parser implementation
//!
//! Two encodings exist. Old files store the tree recursively, each node
//! followed by its children. Newer files (format 12+, and 10) store a flat
//! array of fixed-size node records followed by a shared string buffer.

use super::strings::{COMMON_STRING_FLAG, common_string};
use super::types::{NodeId, TypeTree, TypeTreeNode};
use crate::asset::{Field, FormatLayout};
use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;
use tracing::{trace, warn};

/// Size of one node record in the flat encoding, before format 19
const BLOB_NODE_SIZE: usize = 24;
/// Format 19 appends a 64-bit reference type hash to every record
const BLOB_NODE_SIZE_V19: usize = 32;
/// Minimal encoded size of a legacy node (two empty strings plus five ints)
const LEGACY_NODE_MIN_SIZE: usize = 2 + 4 * 5;

/// TypeTree parser
pub struct TypeTreeParser;

impl TypeTreeParser {
    /// Parse a TypeTree in the encoding used by the given file format
    pub fn from_reader(reader: &mut BinaryReader, layout: FormatLayout) -> Result<TypeTree> {
        if layout.has(Field::BlobTypeTree) {
            Self::from_reader_blob(reader, layout)
        } else {
            Self::from_reader_legacy(reader, layout)
        }
    }

    /// Parse the recursive encoding used by old formats
    pub fn from_reader_legacy(reader: &mut BinaryReader, layout: FormatLayout) -> Result<TypeTree> {
        let mut tree = TypeTree::new();
        Self::read_legacy_node(reader, layout, &mut tree, None)?;
        trace!(nodes = tree.len(), "parsed legacy type tree");
        Ok(tree)
    }

    fn read_legacy_node(
        reader: &mut BinaryReader,
        layout: FormatLayout,
        tree: &mut TypeTree,
        parent: Option<NodeId>,
    ) -> Result<()> {
        let start = reader.position();
        let type_name = reader.read_cstring()?;
        let name = reader.read_cstring()?;
        let mut node = TypeTreeNode::new(type_name, name, reader.read_i32()?);
        if layout.has(Field::LegacyNodeVariableCount) {
            // variable count, unused
            reader.read_i32()?;
        }
        let with_index_and_flags = layout.has(Field::LegacyNodeIndexAndFlags);
        if with_index_and_flags {
            node.index = reader.read_i32()? as u32;
        }
        node.is_array = reader.read_i32()? != 0;
        node.version = reader.read_i32()? as u16;
        if with_index_and_flags {
            node.meta_flags = reader.read_i32()? as u32;
        }

        let id = tree.push(parent, node).map_err(|_| {
            BinaryError::invalid_data(start, "legacy type tree nests deeper than 255 levels")
        })?;

        let child_count = reader.read_i32()?;
        let child_count = usize::try_from(child_count).map_err(|_| {
            BinaryError::invalid_data(
                reader.position() - 4,
                format!("negative type tree child count {}", child_count),
            )
        })?;
        if child_count.saturating_mul(LEGACY_NODE_MIN_SIZE) > reader.remaining() {
            return Err(BinaryError::end_of_data(
                reader.position(),
                child_count.saturating_mul(LEGACY_NODE_MIN_SIZE),
                reader.remaining(),
            ));
        }
        for _ in 0..child_count {
            Self::read_legacy_node(reader, layout, tree, Some(id))?;
        }
        Ok(())
    }

    /// Parse the flat encoding: node records, then the string buffer
    pub fn from_reader_blob(reader: &mut BinaryReader, layout: FormatLayout) -> Result<TypeTree> {
        let header_offset = reader.position();
        let node_count = read_count(reader, "type tree node count")?;
        let string_buffer_size = read_count(reader, "type tree string buffer size")?;

        let with_ref_hash = layout.has(Field::NodeRefTypeHash);
        let record_size = if with_ref_hash {
            BLOB_NODE_SIZE_V19
        } else {
            BLOB_NODE_SIZE
        };
        let needed = node_count
            .checked_mul(record_size)
            .and_then(|n| n.checked_add(string_buffer_size))
            .unwrap_or(usize::MAX);
        if needed > reader.remaining() {
            return Err(BinaryError::end_of_data(
                reader.position(),
                needed,
                reader.remaining(),
            ));
        }

        let mut records = Vec::with_capacity(node_count);
        for _ in 0..node_count {
            let mut node = TypeTreeNode {
                version: reader.read_u16()?,
                level: reader.read_u8()?,
                is_array: reader.read_u8()? & 1 != 0,
                ..Default::default()
            };
            let type_offset = reader.read_u32()?;
            let name_offset = reader.read_u32()?;
            node.byte_size = reader.read_i32()?;
            node.index = reader.read_u32()?;
            node.meta_flags = reader.read_u32()?;
            if with_ref_hash {
                node.ref_type_hash = Some(reader.read_u64()?);
            }
            records.push((node, type_offset, name_offset));
        }

        let buffer_offset = reader.position();
        let buffer = reader.read_slice(string_buffer_size)?;

        let mut flat = Vec::with_capacity(records.len());
        for (mut node, type_offset, name_offset) in records {
            node.type_name = resolve_string(buffer, buffer_offset, type_offset)?;
            node.name = resolve_string(buffer, buffer_offset, name_offset)?;
            flat.push(node);
        }

        let tree = TypeTree::from_flat(flat).map_err(|err| match err {
            BinaryError::InvalidData { message, .. } => {
                BinaryError::invalid_data(header_offset, message)
            }
            other => other,
        })?;
        trace!(nodes = tree.len(), strings = string_buffer_size, "parsed blob type tree");
        Ok(tree)
    }
}

fn read_count(reader: &mut BinaryReader, what: &str) -> Result<usize> {
    let offset = reader.position();
    let value = reader.read_i32()?;
    usize::try_from(value)
        .map_err(|_| BinaryError::invalid_data(offset, format!("negative {}: {}", what, value)))
}

/// Resolve a string reference from a flat node record.
///
/// References with the high bit set index the built-in string table; others
/// are byte offsets of NUL-terminated strings in the file-local buffer.
fn resolve_string(buffer: &[u8], buffer_offset: u64, raw: u32) -> Result<String> {
    if raw & COMMON_STRING_FLAG != 0 {
        let offset = raw & !COMMON_STRING_FLAG;
        return Ok(match common_string(offset) {
            Some(name) => name.to_string(),
            None => {
                warn!(offset, "type tree references unknown built-in string");
                offset.to_string()
            }
        });
    }

    let start = raw as usize;
    let tail = buffer.get(start..).ok_or_else(|| {
        BinaryError::invalid_data(
            buffer_offset,
            format!(
                "string offset {} outside string buffer of {} bytes",
                start,
                buffer.len()
            ),
        )
    })?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}
