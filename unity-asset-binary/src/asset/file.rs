//! Parsed SerializedFile

use super::types::{ContainerInfo, Klass, LocalObjectId, ObjectEntry, Reference, SerializedFileHeader};
use crate::container::BlobIndex;
use crate::error::{BinaryError, Result};
use crate::object::{ObjectDecoder, ObjectKind, ObjectValue, UnityObject};
use crate::options::ParseOptions;
use crate::reader::{BinaryReader, ByteOrder};
use crate::typetree::TypeTree;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;
use unity_asset_core::{UnityValue, class_ids};

/// One serialized object database: class table, object directory and
/// external references
#[derive(Debug, Clone)]
pub struct AssetFile {
    pub name: String,
    pub header: SerializedFileHeader,
    pub generator_version: Option<String>,
    pub target_platform: Option<i32>,
    pub has_type_trees: bool,
    pub klasses: Vec<Klass>,
    pub(crate) objects: IndexMap<i64, ObjectEntry>,
    pub local_ids: Vec<LocalObjectId>,
    pub references: Vec<Reference>,
    pub ref_types: Vec<Klass>,
    pub user_information: Option<String>,
    /// Blobs of the owning container, for streamed payloads
    pub(crate) blobs: Option<Arc<BlobIndex>>,
    pub(crate) options: ParseOptions,
}

impl AssetFile {
    /// Format version of the file
    pub fn format(&self) -> u32 {
        self.header.format
    }

    /// Byte order of the metadata and objects
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// All object entries in directory order
    pub fn objects(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.objects.values()
    }

    /// Number of objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Path ids in directory order
    pub fn path_ids(&self) -> Vec<i64> {
        self.objects.keys().copied().collect()
    }

    /// Look up an object entry
    pub fn object(&self, path_id: i64) -> Option<&ObjectEntry> {
        self.objects.get(&path_id)
    }

    /// The class declaration of an object
    pub fn klass_of(&self, entry: &ObjectEntry) -> Option<&Klass> {
        entry.klass.and_then(|index| self.klasses.get(index))
    }

    /// Effective class id of an object
    pub fn class_id_of(&self, entry: &ObjectEntry) -> Option<i32> {
        self.klass_of(entry)
            .map(|klass| klass.class_id)
            .or(entry.class_id.map(i32::from))
    }

    /// Root type name of an object's schema
    pub fn object_type(&self, path_id: i64) -> Option<&str> {
        self.object(path_id)
            .and_then(|entry| self.klass_of(entry))
            .and_then(|klass| klass.type_name())
    }

    /// Check whether an object has a schema to decode it with
    pub fn is_decodable(&self, path_id: i64) -> bool {
        self.object(path_id)
            .and_then(|entry| self.klass_of(entry))
            .is_some_and(Klass::has_type_tree)
    }

    fn type_tree_of(&self, entry: &ObjectEntry) -> Result<&Arc<TypeTree>> {
        self.klass_of(entry)
            .and_then(|klass| klass.type_tree.as_ref())
            .ok_or_else(|| BinaryError::UnknownSchema {
                class_id: self.class_id_of(entry).unwrap_or(-1),
                path_id: entry.path_id,
            })
    }

    /// Decode an object into a [`ObjectValue`] tree.
    ///
    /// Objects whose class has no TypeTree fail with
    /// [`BinaryError::UnknownSchema`], which marks them undecodable without
    /// affecting other objects.
    pub fn parse_object(&self, path_id: i64) -> Result<ObjectValue> {
        let entry = self
            .object(path_id)
            .ok_or(BinaryError::ObjectNotFound(path_id))?;
        let tree = self.type_tree_of(entry)?;
        let mut decoder = ObjectDecoder::new(tree, &self.options);
        if let Some(blobs) = &self.blobs {
            decoder = decoder.with_streams(&self.name, blobs);
        }
        let mut reader = BinaryReader::new(&entry.data, self.byte_order());
        decoder.decode(&mut reader).map_err(|err| {
            debug!(path_id, error = %err, "object decode failed");
            err
        })
    }

    /// Decode an object and project it onto plain values
    pub fn parse_object_simple(&self, path_id: i64) -> Result<UnityValue> {
        Ok(self.parse_object(path_id)?.simplify())
    }

    /// Decode an object and tag it with its [`ObjectKind`]
    pub fn unity_object(&self, path_id: i64) -> Result<UnityObject> {
        let value = self.parse_object(path_id)?;
        let class_id = self
            .object(path_id)
            .and_then(|entry| self.class_id_of(entry))
            .unwrap_or(-1);
        let kind = ObjectKind::resolve(&value.type_name, class_id);
        Ok(UnityObject {
            path_id,
            class_id,
            kind,
            value,
        })
    }

    /// Decode every object, keeping per-object failures separate
    pub fn parse_all(&self) -> Vec<(i64, Result<ObjectValue>)> {
        self.objects
            .keys()
            .map(|&path_id| (path_id, self.parse_object(path_id)))
            .collect()
    }

    /// Asset paths listed by the AssetBundle object (path id 1), if present
    pub fn containers(&self) -> Result<Vec<ContainerInfo>> {
        let Some(entry) = self.object(1) else {
            return Ok(Vec::new());
        };
        let is_bundle = self.class_id_of(entry) == Some(class_ids::ASSET_BUNDLE)
            || self.object_type(1) == Some("AssetBundle");
        if !is_bundle {
            return Ok(Vec::new());
        }

        let value = self.parse_object(1)?;
        let Some(container) = value.field("m_Container") else {
            return Ok(Vec::new());
        };

        let mut infos = Vec::new();
        for pair in container.elements() {
            let (Some(first), Some(second)) = (pair.field("first"), pair.field("second")) else {
                continue;
            };
            let asset = second.field("asset");
            infos.push(ContainerInfo {
                name: first.as_str().unwrap_or_default().to_string(),
                preload_index: int_field(second, "preloadIndex") as i32,
                preload_size: int_field(second, "preloadSize") as i32,
                file_id: asset.map(|a| int_field(a, "m_FileID")).unwrap_or(0) as i32,
                path_id: asset.map(|a| int_field(a, "m_PathID")).unwrap_or(0),
            });
        }
        Ok(infos)
    }
}

fn int_field(value: &ObjectValue, name: &str) -> i64 {
    value
        .field(name)
        .and_then(ObjectValue::as_i64)
        .unwrap_or(0)
}
