//! Default schema lookup
//!
//! Files built without embedded type trees rely on schemas shipped elsewhere,
//! keyed by class id and the class's identity hash. A lookup miss is not an
//! error: objects of that class simply cannot be decoded.

use super::types::TypeTree;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Source of TypeTrees for files that do not embed them
pub trait SchemaCache: Send + Sync + fmt::Debug {
    /// Find the schema for a class. `hash` is the raw 16- or 32-byte
    /// identity hash declared by the file.
    fn lookup(&self, class_id: i32, hash: &[u8]) -> Option<Arc<TypeTree>>;
}

/// A cache that never has anything
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySchemaCache;

impl SchemaCache for EmptySchemaCache {
    fn lookup(&self, _class_id: i32, _hash: &[u8]) -> Option<Arc<TypeTree>> {
        None
    }
}

/// In-memory schema registry
///
/// Exact `(class_id, hash)` registrations win over hash-only ones.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    by_class: HashMap<(i32, Vec<u8>), Arc<TypeTree>>,
    by_hash: HashMap<Vec<u8>, Arc<TypeTree>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema for a class id and hash
    pub fn insert(&mut self, class_id: i32, hash: &[u8], tree: TypeTree) -> &mut Self {
        self.by_class.insert((class_id, hash.to_vec()), Arc::new(tree));
        self
    }

    /// Register a schema by hash alone
    pub fn insert_hash(&mut self, hash: &[u8], tree: TypeTree) -> &mut Self {
        self.by_hash.insert(hash.to_vec(), Arc::new(tree));
        self
    }

    pub fn len(&self) -> usize {
        self.by_class.len() + self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchemaCache for SchemaRegistry {
    fn lookup(&self, class_id: i32, hash: &[u8]) -> Option<Arc<TypeTree>> {
        self.by_class
            .get(&(class_id, hash.to_vec()))
            .or_else(|| self.by_hash.get(hash))
            .cloned()
    }
}
