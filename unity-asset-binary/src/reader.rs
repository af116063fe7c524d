//! Binary data reader for Unity files
//!
//! [`BinaryReader`] is a random-access cursor over an immutable buffer. The
//! byte order is mutable because several Unity formats switch endianness after
//! reading a directive byte.

use crate::error::{BinaryError, Result};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Byte order for reading binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Big endian (network byte order)
    Big,
    /// Little endian (most common on x86/x64)
    #[default]
    Little,
}

macro_rules! read_endian {
    ($(#[$doc:meta] $name:ident => $ty:ty, $size:expr;)*) => {
        $(
            #[$doc]
            pub fn $name(&mut self) -> Result<$ty> {
                self.ensure($size)?;
                let value = match self.byte_order {
                    ByteOrder::Big => self.cursor.$name::<BigEndian>()?,
                    ByteOrder::Little => self.cursor.$name::<LittleEndian>()?,
                };
                Ok(value)
            }
        )*
    };
}

/// Binary reader for Unity file formats
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    cursor: Cursor<&'a [u8]>,
    byte_order: ByteOrder,
}

impl<'a> BinaryReader<'a> {
    /// Create a new binary reader from byte slice
    pub fn new(data: &'a [u8], byte_order: ByteOrder) -> Self {
        Self {
            cursor: Cursor::new(data),
            byte_order,
        }
    }

    /// The whole underlying buffer
    pub fn data(&self) -> &'a [u8] {
        self.cursor.get_ref()
    }

    /// Get current position in the stream
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// Seek to an absolute position. Seeking to the very end is allowed.
    pub fn set_position(&mut self, pos: u64) -> Result<()> {
        if pos > self.len() as u64 {
            return Err(BinaryError::end_of_data(
                pos,
                0,
                self.remaining(),
            ));
        }
        self.cursor.set_position(pos);
        Ok(())
    }

    /// Advance the cursor by `count` bytes
    pub fn advance(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.cursor.set_position(self.position() + count as u64);
        Ok(())
    }

    /// Get the current byte order
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Switch the byte order for all following reads
    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    /// Get the total length of the data
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// Check if the reader is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get remaining bytes from current position
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position() as usize)
    }

    /// Check if we have at least `count` bytes remaining
    pub fn has_bytes(&self, count: usize) -> bool {
        self.remaining() >= count
    }

    fn ensure(&self, count: usize) -> Result<()> {
        if self.has_bytes(count) {
            Ok(())
        } else {
            Err(BinaryError::end_of_data(
                self.position(),
                count,
                self.remaining(),
            ))
        }
    }

    /// Move the cursor to `pos`, which may lie past the end of the buffer.
    /// Only a following read reports `EndOfData`.
    pub fn skip_to(&mut self, pos: u64) {
        self.cursor.set_position(pos);
    }

    /// Align to the next 4-byte boundary
    pub fn align(&mut self) {
        self.align_to(4)
    }

    /// Align to the specified byte boundary (relative to the buffer start).
    /// Padding missing at the end of the buffer is not an error.
    pub fn align_to(&mut self, alignment: u64) {
        let pos = self.position();
        self.skip_to(pos.div_ceil(alignment) * alignment);
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    /// Read a boolean (as u8, 0 = false, non-zero = true)
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a signed 8-bit integer
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    read_endian! {
        /// Read an unsigned 16-bit integer
        read_u16 => u16, 2;
        /// Read a signed 16-bit integer
        read_i16 => i16, 2;
        /// Read an unsigned 32-bit integer
        read_u32 => u32, 4;
        /// Read a signed 32-bit integer
        read_i32 => i32, 4;
        /// Read an unsigned 64-bit integer
        read_u64 => u64, 8;
        /// Read a signed 64-bit integer
        read_i64 => i64, 8;
        /// Read a 32-bit float
        read_f32 => f32, 4;
        /// Read a 64-bit float
        read_f64 => f64, 8;
    }

    /// Borrow the next `count` bytes and advance past them
    pub fn read_slice(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let start = usize::try_from(self.position()).unwrap_or(usize::MAX);
        let data: &'a [u8] = self.cursor.get_ref();
        let slice = start
            .checked_add(count)
            .and_then(|end| data.get(start..end))
            .unwrap_or_default();
        self.cursor.set_position(self.position() + count as u64);
        Ok(slice)
    }

    /// Read exactly `count` bytes into a new buffer
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.read_slice(count)?.to_vec())
    }

    /// Borrow `count` bytes at an absolute offset without moving the cursor
    pub fn peek_at(&self, offset: u64, count: usize) -> Result<&'a [u8]> {
        let data: &'a [u8] = self.cursor.get_ref();
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        match start.checked_add(count) {
            Some(end) if end <= data.len() => Ok(&data[start..end]),
            _ => Err(BinaryError::end_of_data(
                offset,
                count,
                data.len().saturating_sub(start),
            )),
        }
    }

    /// Read a null-terminated string
    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.position() as usize;
        let data: &'a [u8] = self.cursor.get_ref();
        let tail = data.get(start..).unwrap_or_default();
        let Some(end) = tail.iter().position(|&b| b == 0) else {
            return Err(BinaryError::end_of_data(
                self.position(),
                tail.len() + 1,
                tail.len(),
            ));
        };
        let text = String::from_utf8_lossy(&tail[..end]).into_owned();
        self.cursor.set_position((start + end + 1) as u64);
        Ok(text)
    }

    /// Read a string of fixed length
    pub fn read_string(&mut self, len: usize) -> Result<String> {
        let bytes = self.read_slice(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a 16-byte GUID
    pub fn read_guid(&mut self) -> Result<[u8; 16]> {
        let mut guid = [0u8; 16];
        guid.copy_from_slice(self.read_slice(16)?);
        Ok(guid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_basic_types() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);

        assert_eq!(reader.read_u8().unwrap(), 0x01);
        assert_eq!(reader.read_u16().unwrap(), 0x0302);
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.remaining(), 5);
    }

    #[test]
    fn test_byte_order_switch() {
        let data = [0x00, 0x00, 0x00, 0x05, 0x05, 0x00, 0x00, 0x00];
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        assert_eq!(reader.read_i32().unwrap(), 5);
        reader.set_byte_order(ByteOrder::Little);
        assert_eq!(reader.read_i32().unwrap(), 5);
    }

    #[test]
    fn test_end_of_data_reports_offset() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);
        reader.read_u8().unwrap();
        match reader.read_u32() {
            Err(BinaryError::EndOfData {
                offset,
                requested,
                remaining,
            }) => {
                assert_eq!(offset, 1);
                assert_eq!(requested, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // A failed read must not move the cursor
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_align() {
        let data = [0u8; 16];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);
        reader.advance(1).unwrap();
        reader.align();
        assert_eq!(reader.position(), 4);
        reader.align();
        assert_eq!(reader.position(), 4);
        reader.align_to(16);
        assert_eq!(reader.position(), 16);
    }

    #[test]
    fn test_align_past_end_fails_only_on_read() {
        let data = [7u8, 0, 0, 0, 1];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);
        reader.advance(5).unwrap();
        reader.align();
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.remaining(), 0);
        assert!(matches!(
            reader.read_u8(),
            Err(BinaryError::EndOfData { offset: 8, .. })
        ));
        assert!(reader.read_cstring().is_err());
        assert!(reader.read_slice(0).unwrap().is_empty());
    }

    #[test]
    fn test_cstring() {
        let data = b"hello\0world\0";
        let mut reader = BinaryReader::new(data, ByteOrder::Little);
        assert_eq!(reader.read_cstring().unwrap(), "hello");
        assert_eq!(reader.read_cstring().unwrap(), "world");
        assert!(reader.read_cstring().is_err());
    }

    #[test]
    fn test_peek_at_does_not_move() {
        let data = [1u8, 2, 3, 4, 5];
        let mut reader = BinaryReader::new(&data, ByteOrder::Little);
        reader.advance(1).unwrap();
        assert_eq!(reader.peek_at(3, 2).unwrap(), &[4, 5]);
        assert_eq!(reader.position(), 1);
        assert!(reader.peek_at(4, 2).is_err());
        assert!(reader.peek_at(u64::MAX, 1).is_err());
    }
}
