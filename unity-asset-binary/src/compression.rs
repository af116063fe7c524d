//! Compression support for Unity binary files
//!
//! Blocks are tagged with a flags word whose low 6 bits select the codec.
//! Unknown codecs are passed through untouched with a [`Diagnostic`] so that
//! containers written by newer Unity versions still open.

use crate::error::{BinaryError, Diagnostic, ErrorCategory, Result};
use std::io::Cursor;
use tracing::{trace, warn};

/// Size of the LZMA properties byte plus the 32-bit dictionary size
pub const LZMA_PROPS_SIZE: usize = 5;

/// Compression types supported by Unity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// No compression
    None,
    /// LZMA compression
    Lzma,
    /// LZ4 compression
    Lz4,
    /// LZ4HC (High Compression) compression
    Lz4Hc,
    /// Any value this reader does not know how to decode
    Unknown(u32),
}

impl CompressionType {
    /// Create compression type from block flags (low 6 bits)
    pub fn from_flags(flags: u32) -> Self {
        match flags & ArchiveFlags::COMPRESSION_TYPE_MASK {
            0 => CompressionType::None,
            1 => CompressionType::Lzma,
            2 => CompressionType::Lz4,
            3 => CompressionType::Lz4Hc,
            other => CompressionType::Unknown(other),
        }
    }

    /// Get the name of the compression type
    pub fn name(self) -> &'static str {
        match self {
            CompressionType::None => "None",
            CompressionType::Lzma => "LZMA",
            CompressionType::Lz4 => "LZ4",
            CompressionType::Lz4Hc => "LZ4HC",
            CompressionType::Unknown(_) => "Unknown",
        }
    }
}

/// UnityFS archive flags
pub struct ArchiveFlags;

impl ArchiveFlags {
    pub const COMPRESSION_TYPE_MASK: u32 = 0x3F;
    pub const BLOCKS_INFO_AT_THE_END: u32 = 0x80;
    pub const BLOCK_INFO_NEEDS_PADDING_AT_START: u32 = 0x200;
}

/// Output of [`decompress_block`]
#[derive(Debug, Clone)]
pub struct BlockData {
    pub data: Vec<u8>,
    /// Set when the block was passed through because its codec is unknown
    pub diagnostic: Option<Diagnostic>,
}

/// Decompress one block given its flags and declared output size.
///
/// `max_allocation` bounds the declared size before anything is allocated.
pub fn decompress_block(
    data: &[u8],
    flags: u32,
    uncompressed_size: usize,
    max_allocation: usize,
) -> Result<BlockData> {
    let compression = CompressionType::from_flags(flags);
    trace!(
        codec = compression.name(),
        compressed = data.len(),
        uncompressed = uncompressed_size,
        "decompressing block"
    );

    if matches!(
        compression,
        CompressionType::Lzma | CompressionType::Lz4 | CompressionType::Lz4Hc
    ) {
        check_limit(uncompressed_size, max_allocation)?;
    }

    let data = match compression {
        CompressionType::None => data.to_vec(),
        CompressionType::Lzma => decompress_lzma(data, uncompressed_size)?,
        CompressionType::Lz4 | CompressionType::Lz4Hc => decompress_lz4(data, uncompressed_size)?,
        CompressionType::Unknown(kind) => {
            let message = format!(
                "unknown compression type {} ({} bytes passed through)",
                kind,
                data.len()
            );
            warn!("{}", message);
            return Ok(BlockData {
                data: data.to_vec(),
                diagnostic: Some(Diagnostic::new(
                    ErrorCategory::UnsupportedCompression,
                    message,
                )),
            });
        }
    };

    Ok(BlockData {
        data,
        diagnostic: None,
    })
}

fn check_limit(size: usize, max_allocation: usize) -> Result<()> {
    if size > max_allocation {
        return Err(BinaryError::resource_limit(format!(
            "declared block size {} exceeds limit {}",
            size, max_allocation
        )));
    }
    Ok(())
}

/// Decompress an LZ4 block to exactly `uncompressed_size` bytes
pub fn decompress_lz4(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    let output = lz4_flex::block::decompress(data, uncompressed_size)?;
    if output.len() != uncompressed_size {
        return Err(BinaryError::decompression_failed(format!(
            "LZ4 produced {} bytes, expected {}",
            output.len(),
            uncompressed_size
        )));
    }
    Ok(output)
}

/// Decompress a raw LZMA stream: properties byte, 32-bit dictionary size, then
/// the range-coded data. The output size is supplied by the caller.
pub fn decompress_lzma(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    if data.len() < LZMA_PROPS_SIZE {
        return Err(BinaryError::end_of_data(0, LZMA_PROPS_SIZE, data.len()));
    }
    run_lzma(
        data,
        lzma_rs::decompress::UnpackedSize::UseProvided(Some(uncompressed_size as u64)),
        uncompressed_size,
    )
}

/// Decompress an LZMA stream whose header carries an explicit 64-bit output
/// length after the dictionary size (the layout used by `UnityWeb` files).
pub fn decompress_lzma_with_length(data: &[u8], max_allocation: usize) -> Result<Vec<u8>> {
    let header = data.get(..LZMA_PROPS_SIZE + 8).ok_or_else(|| {
        BinaryError::end_of_data(0, LZMA_PROPS_SIZE + 8, data.len())
    })?;
    let mut length = [0u8; 8];
    length.copy_from_slice(&header[LZMA_PROPS_SIZE..]);
    let length = u64::from_le_bytes(length);
    let size = usize::try_from(length).unwrap_or(usize::MAX);
    check_limit(size, max_allocation)?;
    run_lzma(
        data,
        lzma_rs::decompress::UnpackedSize::ReadHeaderButUseProvided(Some(length)),
        size,
    )
}

fn run_lzma(
    data: &[u8],
    unpacked_size: lzma_rs::decompress::UnpackedSize,
    expected: usize,
) -> Result<Vec<u8>> {
    let options = lzma_rs::decompress::Options {
        unpacked_size,
        memlimit: None,
        allow_incomplete: false,
    };
    let mut input = Cursor::new(data);
    let mut output = Vec::with_capacity(expected);
    lzma_rs::lzma_decompress_with_options(&mut input, &mut output, &options)?;
    if output.len() != expected {
        return Err(BinaryError::decompression_failed(format!(
            "LZMA produced {} bytes, expected {}",
            output.len(),
            expected
        )));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lzma_block(input: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let options = lzma_rs::compress::Options {
            unpacked_size: lzma_rs::compress::UnpackedSize::SkipWritingToHeader,
        };
        lzma_rs::lzma_compress_with_options(&mut Cursor::new(input), &mut out, &options).unwrap();
        out
    }

    #[test]
    fn test_compression_type_from_flags() {
        assert_eq!(CompressionType::from_flags(0), CompressionType::None);
        assert_eq!(CompressionType::from_flags(1), CompressionType::Lzma);
        assert_eq!(CompressionType::from_flags(2), CompressionType::Lz4);
        assert_eq!(CompressionType::from_flags(0x43), CompressionType::Lz4Hc);
        assert_eq!(CompressionType::from_flags(4), CompressionType::Unknown(4));
    }

    #[test]
    fn test_passthrough() {
        let block = decompress_block(b"plain", 0, 5, usize::MAX).unwrap();
        assert_eq!(block.data, b"plain");
        assert!(block.diagnostic.is_none());
    }

    #[test]
    fn test_unknown_kind_passes_through_with_diagnostic() {
        let input = [9u8, 8, 7, 6];
        let block = decompress_block(&input, 4, 100, usize::MAX).unwrap();
        assert_eq!(block.data, input);
        let diagnostic = block.diagnostic.expect("diagnostic");
        assert_eq!(diagnostic.category, ErrorCategory::UnsupportedCompression);
    }

    #[test]
    fn test_lz4_exact_size() {
        let input = b"lz4 lz4 lz4 lz4 lz4 lz4 lz4 lz4 payload".repeat(8);
        let compressed = lz4_flex::block::compress(&input);
        let block = decompress_block(&compressed, 2, input.len(), usize::MAX).unwrap();
        assert_eq!(block.data, input);

        assert!(decompress_block(&compressed, 3, input.len() + 10, usize::MAX).is_err());
    }

    #[test]
    fn test_lzma_props_then_stream() {
        let input = b"the quick brown fox jumps over the lazy dog ".repeat(20);
        let compressed = lzma_block(&input);
        assert_eq!(compressed[0], 0x5D);
        let block = decompress_block(&compressed, 1, input.len(), usize::MAX).unwrap();
        assert_eq!(block.data, input);
    }

    #[test]
    fn test_lzma_with_explicit_length() {
        let input = b"unity web stream ".repeat(10);
        let mut compressed = Vec::new();
        let options = lzma_rs::compress::Options {
            unpacked_size: lzma_rs::compress::UnpackedSize::WriteToHeader(Some(
                input.len() as u64,
            )),
        };
        lzma_rs::lzma_compress_with_options(&mut Cursor::new(&input[..]), &mut compressed, &options)
            .unwrap();
        assert_eq!(decompress_lzma_with_length(&compressed, usize::MAX).unwrap(), input);
        assert!(decompress_lzma_with_length(&compressed, 4).is_err());
    }

    #[test]
    fn test_declared_size_over_limit() {
        let err = decompress_block(&[0u8; 4], 2, 1 << 20, 1024).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ResourceLimit);
    }
}
