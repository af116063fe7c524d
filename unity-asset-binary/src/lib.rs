//! Unity Binary Asset Reader
//!
//! This crate reads Unity's binary formats without running Unity:
//! - Containers (`UnityFS`, `UnityRaw`, `UnityWeb`)
//! - Serialized asset files (`.assets`, `CAB-*` entries)
//! - TypeTree schemas, embedded or supplied by a [`SchemaCache`]
//!
//! Objects are decoded by walking their TypeTree over the object's bytes,
//! producing an [`ObjectValue`] tree that can be simplified to a plain
//! [`UnityValue`](unity_asset_core::UnityValue).
//!
//! ## Feature Flags
//!
//! - `texture`: pixel decoding for uncompressed texture formats
//!
//! # Example
//!
//! ```rust,no_run
//! use unity_asset_binary::AssetContainer;
//! use std::fs;
//!
//! let data = fs::read("example.bundle")?;
//! let container = AssetContainer::from_bytes(&data)?;
//!
//! for asset in &container.assets {
//!     println!("Asset: {} (format {})", asset.name, asset.format());
//!     for path_id in asset.path_ids() {
//!         match asset.parse_object(path_id) {
//!             Ok(value) => println!("  {} {}", path_id, value.type_name),
//!             Err(err) => println!("  {} <{}>", path_id, err),
//!         }
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod asset;
pub mod compression;
pub mod container;
pub mod error;
pub mod object;
pub mod options;
pub mod reader;
pub mod typetree;

// Feature-gated modules
#[cfg(feature = "texture")]
pub mod texture;

// Re-export core types
pub use asset::{AssetFile, ContainerInfo, Klass, ObjectEntry, Reference, SerializedFileHeader};
pub use compression::{CompressionType, decompress_block};
pub use container::{AssetContainer, BlobIndex, ContainerFamily, ContainerHeader, EntryFailure};
pub use error::{BinaryError, Diagnostic, ErrorCategory, Result};
pub use object::{ObjectDecoder, ObjectKind, ObjectValue, Payload, Scalar, UnityObject};
pub use options::ParseOptions;
pub use reader::{BinaryReader, ByteOrder};
pub use typetree::{SchemaCache, SchemaRegistry, TypeTree, TypeTreeBuilder, TypeTreeNode};

#[cfg(feature = "texture")]
pub use texture::{RawTextureDecoder, TextureDecoder, TextureFormat};
