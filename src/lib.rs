//! Unity Asset Reader
//!
//! Schema-driven parsing of Unity asset containers and serialized files.
//! This crate re-exports the workspace crates under one roof.
//!
//! # Examples
//!
//! ```rust,no_run
//! use unity_asset_reader::{AssetContainer, ParseOptions};
//!
//! let data = std::fs::read("characters.bundle")?;
//! let container = AssetContainer::parse(&data, &ParseOptions::strict())?;
//!
//! for asset in &container.assets {
//!     for (path_id, value) in asset.parse_all() {
//!         if let Ok(value) = value {
//!             println!("{}: {}", path_id, value.simplify());
//!         }
//!     }
//! }
//!
//! # Ok::<(), unity_asset_reader::BinaryError>(())
//! ```

pub use unity_asset_binary as binary;
pub use unity_asset_core as model;

pub use unity_asset_binary::{
    AssetContainer, AssetFile, BinaryError, ByteOrder, Diagnostic, ErrorCategory, ObjectKind,
    ObjectValue, ParseOptions, Result, SchemaCache, SchemaRegistry, TypeTree, UnityObject,
};
pub use unity_asset_core::{UnityValue, class_ids};
