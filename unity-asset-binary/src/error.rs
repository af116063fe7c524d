//! Error types for Unity binary parsing

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Unity binary operations
pub type Result<T> = std::result::Result<T, BinaryError>;

/// Errors that can occur during Unity binary parsing
#[derive(Error, Debug)]
pub enum BinaryError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Read past the end of the buffer
    #[error("Unexpected end of data at offset {offset}: requested {requested} bytes, {remaining} remaining")]
    EndOfData {
        offset: u64,
        requested: usize,
        remaining: usize,
    },

    /// Invalid signature
    #[error("Invalid signature: expected {expected}, got {actual}")]
    InvalidSignature { expected: String, actual: String },

    /// Unsupported combination of format fields
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Structural contract violated by the input
    #[error("Invalid data at offset {offset}: {message}")]
    InvalidData { offset: u64, message: String },

    /// No schema available for a class
    #[error("No type tree for class {class_id} (path id {path_id})")]
    UnknownSchema { class_id: i32, path_id: i64 },

    /// Object not present in the asset file
    #[error("Object not found: path id {0}")]
    ObjectNotFound(i64),

    /// Decompression failed
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    /// Resource limit exceeded
    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),
}

/// Coarse classification of [`BinaryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Unrecognized signature or broken layout
    Structural,
    /// Read past the end of a buffer
    EndOfData,
    /// No TypeTree for a class
    UnknownSchema,
    /// Unknown compression flag, reported as a diagnostic
    UnsupportedCompression,
    /// Compressed stream was malformed
    Decompression,
    /// Declared size above the configured limits
    ResourceLimit,
    /// Underlying I/O failure
    Io,
}

impl BinaryError {
    /// Create a new end-of-data error
    pub fn end_of_data(offset: u64, requested: usize, remaining: usize) -> Self {
        Self::EndOfData {
            offset,
            requested,
            remaining,
        }
    }

    /// Create a new invalid data error
    pub fn invalid_data<S: Into<String>>(offset: u64, msg: S) -> Self {
        Self::InvalidData {
            offset,
            message: msg.into(),
        }
    }

    /// Create a new invalid signature error
    pub fn invalid_signature<S: Into<String>>(expected: S, actual: S) -> Self {
        Self::InvalidSignature {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create a new decompression failed error
    pub fn decompression_failed<S: Into<String>>(msg: S) -> Self {
        Self::DecompressionFailed(msg.into())
    }

    /// Create a new resource limit error
    pub fn resource_limit<S: Into<String>>(msg: S) -> Self {
        Self::ResourceLimitExceeded(msg.into())
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            BinaryError::Io(_) => ErrorCategory::Io,
            BinaryError::EndOfData { .. } => ErrorCategory::EndOfData,
            BinaryError::InvalidSignature { .. }
            | BinaryError::UnsupportedFormat(_)
            | BinaryError::InvalidData { .. }
            | BinaryError::ObjectNotFound(_) => ErrorCategory::Structural,
            BinaryError::UnknownSchema { .. } => ErrorCategory::UnknownSchema,
            BinaryError::DecompressionFailed(_) => ErrorCategory::Decompression,
            BinaryError::ResourceLimitExceeded(_) => ErrorCategory::ResourceLimit,
        }
    }

    /// Byte offset at which the failure was detected, when known
    pub fn offset(&self) -> Option<u64> {
        match self {
            BinaryError::EndOfData { offset, .. } | BinaryError::InvalidData { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }

    /// Check if this error is confined to a single object or entry.
    ///
    /// Recoverable errors let the caller continue with sibling objects of the
    /// same asset file; the rest invalidate the enclosing parse unit.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BinaryError::Io(_) => false,
            BinaryError::InvalidSignature { .. } => false,
            BinaryError::UnsupportedFormat(_) => false,
            BinaryError::EndOfData { .. } => true,
            BinaryError::InvalidData { .. } => true,
            BinaryError::UnknownSchema { .. } => true,
            BinaryError::ObjectNotFound(_) => true,
            BinaryError::DecompressionFailed(_) => true,
            BinaryError::ResourceLimitExceeded(_) => true,
        }
    }
}

// Conversion from other error types
impl From<lz4_flex::block::DecompressError> for BinaryError {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        Self::decompression_failed(format!("LZ4 decompression failed: {}", err))
    }
}

impl From<lzma_rs::error::Error> for BinaryError {
    fn from(err: lzma_rs::error::Error) -> Self {
        Self::decompression_failed(format!("LZMA decompression failed: {}", err))
    }
}

impl From<std::string::FromUtf8Error> for BinaryError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::invalid_data(0, format!("Invalid UTF-8 string: {}", err))
    }
}

impl From<std::str::Utf8Error> for BinaryError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::invalid_data(0, format!("Invalid UTF-8 string: {}", err))
    }
}

/// A non-fatal condition noticed while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: ErrorCategory,
    pub message: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(category: ErrorCategory, message: S) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.category, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_data_error() {
        let err = BinaryError::end_of_data(12, 4, 1);
        assert_eq!(err.category(), ErrorCategory::EndOfData);
        assert_eq!(err.offset(), Some(12));
        assert_eq!(
            err.to_string(),
            "Unexpected end of data at offset 12: requested 4 bytes, 1 remaining"
        );
    }

    #[test]
    fn test_invalid_signature_error() {
        let err = BinaryError::invalid_signature("UnityFS", "UnityXYZ");
        assert_eq!(err.category(), ErrorCategory::Structural);
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "Invalid signature: expected UnityFS, got UnityXYZ"
        );
    }

    #[test]
    fn test_unknown_schema_is_recoverable() {
        let err = BinaryError::UnknownSchema {
            class_id: 114,
            path_id: 3,
        };
        assert!(err.is_recoverable());
        assert_eq!(err.category(), ErrorCategory::UnknownSchema);
    }
}
