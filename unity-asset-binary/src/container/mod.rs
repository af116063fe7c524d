//! Unity containers (`UnityFS`, `UnityRaw`, `UnityWeb`)
//!
//! A container bundles serialized files together with opaque resource blobs.
//! Parsing decompresses the directory and data, parses every asset entry into
//! an [`AssetFile`](crate::asset::AssetFile) and indexes the rest by name so
//! that streamed payloads can be resolved while decoding objects.

pub mod header;
pub mod parser;
pub mod types;

pub use header::ContainerHeader;
pub use types::{
    ASSET_ENTRY_STATUS, AssetContainer, BlobIndex, BlockInfo, ContainerFamily, EntryFailure,
    EntryInfo, MIN_ASSET_ENTRY_SIZE,
};
