//! SerializedFile metadata parser

use super::file::AssetFile;
use super::layout::{Field, FormatLayout};
use super::types::{Klass, LocalObjectId, ObjectEntry, Reference, SerializedFileHeader};
use crate::container::BlobIndex;
use crate::error::{BinaryError, Result};
use crate::options::ParseOptions;
use crate::reader::BinaryReader;
use crate::typetree::TypeTreeParser;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Smallest encodings, used to reject counts the buffer cannot hold
const MIN_KLASS_SIZE: usize = 4;
const MIN_OBJECT_SIZE: usize = 20;
const MIN_LOCAL_ID_SIZE: usize = 8;
const MIN_REFERENCE_SIZE: usize = 1;

impl AssetFile {
    /// Parse a standalone SerializedFile with default options
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        Self::parse(name, data, &ParseOptions::default(), None)
    }

    /// Parse a SerializedFile.
    ///
    /// `blobs` are the opaque entries of the owning container, used to
    /// resolve streamed payloads during decoding.
    pub fn parse(
        name: impl Into<String>,
        data: &[u8],
        options: &ParseOptions,
        blobs: Option<Arc<BlobIndex>>,
    ) -> Result<Self> {
        let name = name.into();
        let mut reader = BinaryReader::new(data, crate::reader::ByteOrder::Big);
        let header = SerializedFileHeader::from_reader(&mut reader)?;
        let layout = header.layout();
        debug!(
            name = %name,
            format = header.format,
            byte_order = ?header.byte_order,
            "parsing serialized file"
        );

        let generator_version = if layout.has(Field::GeneratorVersion) {
            Some(reader.read_cstring()?)
        } else {
            None
        };
        let target_platform = if layout.has(Field::TargetPlatform) {
            Some(reader.read_i32()?)
        } else {
            None
        };
        let has_type_trees = if layout.has(Field::TypeTreeFlag) {
            reader.read_bool()?
        } else {
            true
        };

        let klass_count = read_count(&mut reader, MIN_KLASS_SIZE, "class")?;
        let mut klasses = Vec::with_capacity(klass_count);
        for _ in 0..klass_count {
            klasses.push(read_klass(&mut reader, layout, has_type_trees, false, options)?);
        }

        let wide_path_ids = layout.has(Field::WidePathIds)
            || (layout.has(Field::PathIdWidthProbe) && reader.read_i32()? != 0);

        let object_count = read_count(&mut reader, MIN_OBJECT_SIZE, "object")?;
        let mut objects: IndexMap<i64, ObjectEntry> = IndexMap::with_capacity(object_count);
        for _ in 0..object_count {
            let record_offset = reader.position();
            let entry = read_object(&mut reader, layout, wide_path_ids)?;
            if objects.contains_key(&entry.path_id) {
                return Err(BinaryError::invalid_data(
                    record_offset,
                    format!("duplicate path id {}", entry.path_id),
                ));
            }
            objects.insert(entry.path_id, entry);
        }

        let mut local_ids = Vec::new();
        if layout.has(Field::LocalIds) {
            let count = read_count(&mut reader, MIN_LOCAL_ID_SIZE, "local id")?;
            local_ids.reserve(count);
            for _ in 0..count {
                if layout.has(Field::ObjectAlignment) {
                    reader.align();
                }
                let file_id = reader.read_u32()?;
                let local_id = read_path_id(&mut reader, wide_path_ids)?;
                local_ids.push(LocalObjectId { file_id, local_id });
            }
        }

        let reference_count = read_count(&mut reader, MIN_REFERENCE_SIZE, "reference")?;
        let mut references = Vec::with_capacity(reference_count);
        for _ in 0..reference_count {
            references.push(read_reference(&mut reader, layout)?);
        }

        let mut ref_types = Vec::new();
        if layout.has(Field::RefTypes) {
            let count = read_count(&mut reader, MIN_KLASS_SIZE, "reference type")?;
            ref_types.reserve(count);
            for _ in 0..count {
                ref_types.push(read_klass(&mut reader, layout, has_type_trees, true, options)?);
            }
        }

        let user_information = if layout.has(Field::UserInformation) {
            Some(reader.read_cstring()?)
        } else {
            None
        };

        for entry in objects.values_mut() {
            load_payload(&reader, &header, entry, options)?;
            entry.klass = resolve_klass(&klasses, entry);
        }

        debug!(
            name = %name,
            classes = klasses.len(),
            objects = objects.len(),
            references = references.len(),
            "parsed serialized file"
        );

        Ok(AssetFile {
            name,
            header,
            generator_version,
            target_platform,
            has_type_trees,
            klasses,
            objects,
            local_ids,
            references,
            ref_types,
            user_information,
            blobs,
            options: options.clone(),
        })
    }
}

/// Read a non-negative count and check that the buffer can hold that many
/// records of at least `min_size` bytes
fn read_count(reader: &mut BinaryReader, min_size: usize, what: &str) -> Result<usize> {
    let offset = reader.position();
    let raw = reader.read_i32()?;
    let count = usize::try_from(raw)
        .map_err(|_| BinaryError::invalid_data(offset, format!("negative {} count {}", what, raw)))?;
    let needed = count.saturating_mul(min_size);
    if needed > reader.remaining() {
        return Err(BinaryError::end_of_data(
            reader.position(),
            needed,
            reader.remaining(),
        ));
    }
    Ok(count)
}

fn read_path_id(reader: &mut BinaryReader, wide: bool) -> Result<i64> {
    if wide {
        reader.read_i64()
    } else {
        Ok(reader.read_i32()? as i64)
    }
}

fn read_klass(
    reader: &mut BinaryReader,
    layout: FormatLayout,
    has_type_trees: bool,
    is_ref_type: bool,
    options: &ParseOptions,
) -> Result<Klass> {
    let mut klass = Klass::new(reader.read_i32()?);
    if layout.has(Field::StrippedType) {
        klass.stripped = Some(reader.read_bool()?);
    }
    if layout.has(Field::ScriptTypeIndex) {
        klass.script_index = Some(reader.read_i16()?);
    }
    let hash_len = layout.type_hash_len(klass.class_id, is_ref_type, klass.script_index);
    klass.hash = reader.read_bytes(hash_len)?;

    if has_type_trees {
        let tree = TypeTreeParser::from_reader(reader, layout)?;
        klass.type_tree = Some(Arc::new(tree));
        klass.embedded_type_tree = true;
        if layout.has(Field::TypeDependencies) {
            if is_ref_type {
                klass.class_name = Some(reader.read_cstring()?);
                klass.namespace = Some(reader.read_cstring()?);
                klass.assembly_name = Some(reader.read_cstring()?);
            } else {
                let count = read_count(reader, 4, "type dependency")?;
                klass.type_dependencies.reserve(count);
                for _ in 0..count {
                    klass.type_dependencies.push(reader.read_i32()?);
                }
            }
        }
    } else if !is_ref_type {
        klass.type_tree = options.default_schemas.lookup(klass.class_id, &klass.hash);
        if klass.type_tree.is_none() {
            debug!(class_id = klass.class_id, "no default schema for class");
        }
    }

    trace!(
        class_id = klass.class_id,
        nodes = klass.type_tree.as_ref().map(|t| t.len()).unwrap_or(0),
        "read class"
    );
    Ok(klass)
}

fn read_object(reader: &mut BinaryReader, layout: FormatLayout, wide_path_ids: bool) -> Result<ObjectEntry> {
    if layout.has(Field::ObjectAlignment) {
        reader.align();
    }
    let path_id = read_path_id(reader, wide_path_ids)?;

    let mut entry = ObjectEntry {
        path_id,
        byte_start: 0,
        byte_size: 0,
        type_id: None,
        class_id: None,
        class_index: None,
        destroyed: false,
        stripped: None,
        klass: None,
        data: Vec::new(),
    };

    entry.byte_start = if layout.has(Field::LargeObjectOffset) {
        reader.read_u64()?
    } else {
        reader.read_u32()? as u64
    };
    entry.byte_size = reader.read_u32()?;

    if layout.has(Field::LegacyObjectIds) {
        entry.type_id = Some(reader.read_i32()?);
        entry.class_id = Some(reader.read_i16()?);
        entry.destroyed = reader.read_i16()? == 1;
    }
    if layout.has(Field::ClassIndex) {
        entry.class_index = Some(reader.read_u32()?);
    }
    if layout.has(Field::StrippedObject) {
        entry.stripped = Some(reader.read_bool()?);
    }
    Ok(entry)
}

fn read_reference(reader: &mut BinaryReader, layout: FormatLayout) -> Result<Reference> {
    let temp_path = if layout.has(Field::ReferenceTempPath) {
        Some(reader.read_cstring()?)
    } else {
        None
    };
    let (guid, reference_type) = if layout.has(Field::ReferenceGuid) {
        (Some(reader.read_guid()?), Some(reader.read_i32()?))
    } else {
        (None, None)
    };
    Ok(Reference {
        temp_path,
        guid,
        reference_type,
        file_path: reader.read_cstring()?,
    })
}

fn load_payload(
    reader: &BinaryReader,
    header: &SerializedFileHeader,
    entry: &mut ObjectEntry,
    options: &ParseOptions,
) -> Result<()> {
    let size = options.check_allocation(entry.byte_size as u64, "object payload")?;
    let start = header
        .data_offset
        .checked_add(entry.byte_start)
        .ok_or_else(|| {
            BinaryError::invalid_data(
                header.data_offset,
                format!("object {} offset overflows", entry.path_id),
            )
        })?;
    let end = start.checked_add(size as u64).unwrap_or(u64::MAX);
    if end > header.file_size {
        return Err(BinaryError::invalid_data(
            start,
            format!(
                "object {} range {}..{} beyond file size {}",
                entry.path_id, start, end, header.file_size
            ),
        ));
    }
    entry.data = reader.peek_at(start, size)?.to_vec();
    Ok(())
}

/// Class index when present, else the first class whose id matches the
/// object's class id, then its type id
fn resolve_klass(klasses: &[Klass], entry: &ObjectEntry) -> Option<usize> {
    if let Some(index) = entry.class_index {
        let index = index as usize;
        if index < klasses.len() {
            return Some(index);
        }
        warn!(
            path_id = entry.path_id,
            index,
            classes = klasses.len(),
            "object class index out of range"
        );
        return None;
    }
    entry
        .class_id
        .and_then(|class_id| klasses.iter().position(|k| k.class_id == class_id as i32))
        .or_else(|| {
            entry
                .type_id
                .and_then(|type_id| klasses.iter().position(|k| k.class_id == type_id))
        })
}
