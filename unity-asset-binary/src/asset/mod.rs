//! Unity SerializedFile (asset file) parsing
//!
//! An asset file holds a class table with one TypeTree per class, a directory
//! of objects pointing into its data section, and references to other files.

pub mod file;
pub mod header;
pub mod layout;
pub mod parser;
pub mod types;

pub use file::AssetFile;
pub use header::{MAX_SUPPORTED_FORMAT, MIN_SUPPORTED_FORMAT};
pub use layout::{Field, FormatLayout};
pub use types::{ContainerInfo, Klass, LocalObjectId, ObjectEntry, Reference, SerializedFileHeader};
