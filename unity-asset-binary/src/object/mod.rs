//! Object decoding
//!
//! [`ObjectDecoder`] walks a TypeTree over an object's bytes and produces an
//! [`ObjectValue`] tree. [`UnityObject`] adds typed views for a few well known
//! object kinds.

pub mod decoder;
pub mod value;
pub mod views;

pub use decoder::{LeafKind, ObjectDecoder};
pub use value::{ObjectValue, Payload, Scalar};
pub use views::{ObjectKind, TextAsset, Texture2D, UnityObject};
