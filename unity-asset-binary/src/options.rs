//! Parse configuration

use crate::typetree::{EmptySchemaCache, SchemaCache};
use std::sync::Arc;

/// Options shared by container, asset file and object parsing
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Upper bound for any single declared size (decompressed block,
    /// object payload, byte run), checked before allocating
    pub max_allocation: usize,
    /// Upper bound for decoded array element counts
    pub max_array_elements: usize,
    /// Schemas for files that ship without embedded type trees
    pub default_schemas: Arc<dyn SchemaCache>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_allocation: 1024 * 1024 * 1024, // 1GB default limit
            max_array_elements: 16 * 1024 * 1024,
            default_schemas: Arc::new(EmptySchemaCache),
        }
    }
}

impl ParseOptions {
    /// Create options with tight limits for untrusted input
    pub fn strict() -> Self {
        Self {
            max_allocation: 64 * 1024 * 1024,
            max_array_elements: 1024 * 1024,
            ..Self::default()
        }
    }

    /// Use the given schema source for files without embedded type trees
    pub fn with_schema_cache(mut self, cache: Arc<dyn SchemaCache>) -> Self {
        self.default_schemas = cache;
        self
    }

    /// Fail with `ResourceLimitExceeded` when `size` is above `max_allocation`
    pub(crate) fn check_allocation(&self, size: u64, what: &str) -> crate::Result<usize> {
        match usize::try_from(size) {
            Ok(size) if size <= self.max_allocation => Ok(size),
            _ => Err(crate::BinaryError::resource_limit(format!(
                "{} of {} bytes exceeds limit {}",
                what, size, self.max_allocation
            ))),
        }
    }
}
