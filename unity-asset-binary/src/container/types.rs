//! Container data structures

use crate::asset::AssetFile;
use crate::compression::CompressionType;
use crate::error::{BinaryError, Diagnostic};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::header::ContainerHeader;

/// Opaque container entries keyed by entry name
pub type BlobIndex = IndexMap<String, Vec<u8>>;

/// Entry status marking a serialized file in FS containers
pub const ASSET_ENTRY_STATUS: u32 = 4;

/// Smallest size an entry of a raw container needs to count as an asset file
pub const MIN_ASSET_ENTRY_SIZE: u64 = 16;

/// Layout family selected by the container signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFamily {
    /// `UnityRaw` and `UnityWeb`: one block holding a flat directory
    Raw,
    /// `UnityFS`: compressed index plus a sequence of data blocks
    Fs,
}

impl ContainerFamily {
    pub fn from_signature(signature: &str) -> Option<Self> {
        match signature {
            "UnityFS" => Some(ContainerFamily::Fs),
            "UnityRaw" | "UnityWeb" => Some(ContainerFamily::Raw),
            _ => None,
        }
    }
}

/// Data block descriptor from the FS index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub flags: u16,
}

impl BlockInfo {
    pub fn compression(&self) -> CompressionType {
        CompressionType::from_flags(self.flags as u32)
    }
}

/// Directory entry, addressing the decompressed container storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub name: String,
    pub offset: u64,
    pub size: u64,
    /// Entry status (FS containers only)
    pub status: Option<u32>,
    pub is_asset: bool,
}

impl EntryInfo {
    /// Classify a raw-container entry by extension and size
    pub(crate) fn raw(name: String, offset: u64, size: u64) -> Self {
        let extension = name.rfind('.').map(|dot| &name[dot..]).unwrap_or("");
        let is_asset = matches!(extension, "" | ".assets") && size > MIN_ASSET_ENTRY_SIZE;
        Self {
            name,
            offset,
            size,
            status: None,
            is_asset,
        }
    }

    /// Classify an FS-container entry by status
    pub(crate) fn fs(name: String, offset: u64, size: u64, status: u32) -> Self {
        Self {
            name,
            offset,
            size,
            status: Some(status),
            is_asset: status == ASSET_ENTRY_STATUS,
        }
    }
}

/// An asset entry that could not be parsed
#[derive(Debug)]
pub struct EntryFailure {
    pub name: String,
    pub error: BinaryError,
}

/// A parsed Unity container
///
/// Asset entries are parsed into [`AssetFile`]s, everything else is kept as
/// named blobs. Each asset entry is parsed on its own; one that fails is
/// recorded in `failures` and does not affect its siblings.
#[derive(Debug)]
pub struct AssetContainer {
    pub header: ContainerHeader,
    /// Index GUID (FS containers only)
    pub guid: Option<[u8; 16]>,
    pub blocks: Vec<BlockInfo>,
    pub entries: Vec<EntryInfo>,
    pub assets: Vec<AssetFile>,
    pub blobs: Arc<BlobIndex>,
    pub failures: Vec<EntryFailure>,
    /// Non-fatal conditions noticed while reading the container
    pub diagnostics: Vec<Diagnostic>,
}

impl AssetContainer {
    pub fn signature(&self) -> &str {
        &self.header.signature
    }

    pub fn family(&self) -> ContainerFamily {
        self.header.family
    }

    /// Look up a blob entry by name
    pub fn blob(&self, name: &str) -> Option<&[u8]> {
        self.blobs.get(name).map(Vec::as_slice)
    }

    /// Look up a parsed asset file by entry name
    pub fn asset(&self, name: &str) -> Option<&AssetFile> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    /// Names of all entries in directory order
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }
}
