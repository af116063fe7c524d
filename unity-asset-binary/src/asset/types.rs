//! SerializedFile data structures

use crate::reader::ByteOrder;
use crate::typetree::TypeTree;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Header of a Unity SerializedFile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedFileHeader {
    /// Size of the metadata section
    pub metadata_size: u32,
    /// Total file size
    pub file_size: u64,
    /// File format version
    pub format: u32,
    /// Offset to the object data section
    pub data_offset: u64,
    /// Byte order of everything after the header
    pub byte_order: ByteOrder,
}

/// Class declaration of a SerializedFile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Klass {
    pub class_id: i32,
    pub stripped: Option<bool>,
    pub script_index: Option<i16>,
    /// Identity hash: 16 bytes, or 32 (script id then type hash) for
    /// script-backed classes
    pub hash: Vec<u8>,
    /// Schema for objects of this class. `None` means they cannot be decoded.
    #[serde(skip)]
    pub type_tree: Option<Arc<TypeTree>>,
    /// Whether `type_tree` came from the file itself
    pub embedded_type_tree: bool,
    pub type_dependencies: Vec<i32>,
    /// Only set for reference types (format 21+)
    pub class_name: Option<String>,
    pub namespace: Option<String>,
    pub assembly_name: Option<String>,
}

impl Klass {
    pub fn new(class_id: i32) -> Self {
        Self {
            class_id,
            ..Default::default()
        }
    }

    /// Check if this class can be decoded
    pub fn has_type_tree(&self) -> bool {
        self.type_tree.is_some()
    }

    /// Type name from the TypeTree root, if any
    pub fn type_name(&self) -> Option<&str> {
        self.type_tree
            .as_ref()
            .and_then(|tree| tree.root())
            .map(|root| root.type_name.as_str())
    }
}

/// An object record of a SerializedFile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Unique identifier within the file
    pub path_id: i64,
    /// Byte offset relative to the data section
    pub byte_start: u64,
    pub byte_size: u32,
    /// Legacy (format < 16) type id
    pub type_id: Option<i32>,
    /// Legacy (format < 16) class id
    pub class_id: Option<i16>,
    /// Index into the class table (format 16+)
    pub class_index: Option<u32>,
    pub destroyed: bool,
    pub stripped: Option<bool>,
    /// Resolved index into [`super::AssetFile::klasses`]
    pub klass: Option<usize>,
    /// Raw object bytes
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl ObjectEntry {
    /// Absolute offset of the object inside its file
    pub fn absolute_start(&self, data_offset: u64) -> u64 {
        data_offset + self.byte_start
    }
}

/// Entry of the local object identifier table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalObjectId {
    pub file_id: u32,
    pub local_id: i64,
}

/// Reference to an external file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub temp_path: Option<String>,
    pub guid: Option<[u8; 16]>,
    pub reference_type: Option<i32>,
    pub file_path: String,
}

impl Reference {
    /// Get GUID as hex string
    pub fn guid_string(&self) -> Option<String> {
        self.guid
            .map(|guid| guid.iter().map(|b| format!("{:02x}", b)).collect())
    }
}

/// One `m_Container` entry of an AssetBundle object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    /// Asset path as seen by the game, e.g. `assets/ui/logo.png`
    pub name: String,
    pub preload_index: i32,
    pub preload_size: i32,
    pub file_id: i32,
    pub path_id: i64,
}
