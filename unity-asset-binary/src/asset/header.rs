//! SerializedFile header parsing
//!
//! The classic header is four big-endian 32-bit words. Format 9 moved the
//! endianness byte next to it, format 22 widened sizes and offsets to 64 bits.

use super::layout::{Field, FormatLayout};
use super::types::SerializedFileHeader;
use crate::error::{BinaryError, Result};
use crate::reader::{BinaryReader, ByteOrder};

/// Oldest format with a known layout
pub const MIN_SUPPORTED_FORMAT: u32 = 2;
/// Formats above this are rejected rather than guessed at
pub const MAX_SUPPORTED_FORMAT: u32 = 30;

impl SerializedFileHeader {
    /// Parse the header. On success the reader is positioned at the first
    /// metadata field and uses the file's byte order.
    pub fn from_reader(reader: &mut BinaryReader) -> Result<Self> {
        reader.set_byte_order(ByteOrder::Big);
        let mut metadata_size = reader.read_u32()?;
        let mut file_size = reader.read_u32()? as u64;
        let format = reader.read_u32()?;
        let mut data_offset = reader.read_u32()? as u64;

        if !(MIN_SUPPORTED_FORMAT..=MAX_SUPPORTED_FORMAT).contains(&format) {
            return Err(BinaryError::unsupported_format(format!(
                "SerializedFile format {}",
                format
            )));
        }
        let layout = FormatLayout::new(format);

        let endian = if layout.has(Field::EndianInHeader) {
            let endian = reader.read_u8()?;
            reader.advance(3)?;
            endian
        } else {
            // metadata trails the object data and starts with the endian byte
            let metadata_start = file_size.checked_sub(metadata_size as u64).ok_or_else(|| {
                BinaryError::invalid_data(
                    4,
                    format!(
                        "metadata size {} larger than file size {}",
                        metadata_size, file_size
                    ),
                )
            })?;
            reader.set_position(metadata_start)?;
            reader.read_u8()?
        };

        if layout.has(Field::LargeHeader) {
            metadata_size = reader.read_u32()?;
            file_size = reader.read_u64()?;
            data_offset = reader.read_u64()?;
            reader.advance(8)?; // reserved
        }

        if data_offset > file_size {
            return Err(BinaryError::invalid_data(
                12,
                format!(
                    "data offset {} beyond file size {}",
                    data_offset, file_size
                ),
            ));
        }

        let byte_order = if endian == 0 {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        reader.set_byte_order(byte_order);

        Ok(Self {
            metadata_size,
            file_size,
            format,
            data_offset,
            byte_order,
        })
    }

    /// Get the layout selector for this file's format
    pub fn layout(&self) -> FormatLayout {
        FormatLayout::new(self.format)
    }
}
