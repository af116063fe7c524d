//! Unity TypeTree processing
//!
//! A TypeTree is the schema Unity embeds next to serialized objects. It is
//! parsed once per class and shared by every object of that class.

pub mod builder;
pub mod cache;
pub mod parser;
pub mod strings;
pub mod types;

pub use builder::{TypeTreeBuilder, primitive_size};
pub use cache::{EmptySchemaCache, SchemaCache, SchemaRegistry};
pub use parser::TypeTreeParser;
pub use strings::{COMMON_STRING_FLAG, common_string};
pub use types::{ALIGN_BYTES_FLAG, NodeId, TypeTree, TypeTreeNode};
