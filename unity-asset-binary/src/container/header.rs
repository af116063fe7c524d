//! Container header parsing

use super::types::ContainerFamily;
use crate::compression::ArchiveFlags;
use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;
use serde::{Deserialize, Serialize};

/// Container header information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHeader {
    /// Signature (`UnityFS`, `UnityWeb` or `UnityRaw`)
    pub signature: String,
    pub family: ContainerFamily,
    /// Container format version
    pub format: u32,
    /// Unity version that created this container
    pub unity_version: String,
    /// Generator version string
    pub generator_version: String,
    /// Declared total size
    pub file_size: u64,
    /// Size of the header (raw family only)
    pub header_size: u32,
    /// Compressed index size (FS family only)
    pub compressed_index_size: u32,
    /// Uncompressed index size (FS family only)
    pub uncompressed_index_size: u32,
    /// Archive flags (FS family only)
    pub flags: u32,
}

impl ContainerHeader {
    /// Parse the header. The reader must be big-endian and at the start of
    /// the container.
    pub fn from_reader(reader: &mut BinaryReader) -> Result<Self> {
        let signature = reader.read_cstring()?;
        let family = ContainerFamily::from_signature(&signature).ok_or_else(|| {
            BinaryError::invalid_signature("UnityFS, UnityWeb or UnityRaw", signature.as_str())
        })?;
        let format = reader.read_u32()?;
        let unity_version = reader.read_cstring()?;
        let generator_version = reader.read_cstring()?;

        let mut header = Self {
            signature,
            family,
            format,
            unity_version,
            generator_version,
            file_size: 0,
            header_size: 0,
            compressed_index_size: 0,
            uncompressed_index_size: 0,
            flags: 0,
        };

        match family {
            ContainerFamily::Raw => {
                header.file_size = reader.read_u32()? as u64;
                header.header_size = reader.read_u32()?;
            }
            ContainerFamily::Fs => {
                header.file_size = reader.read_u64()?;
                header.compressed_index_size = reader.read_u32()?;
                header.uncompressed_index_size = reader.read_u32()?;
                header.flags = reader.read_u32()?;
            }
        }
        Ok(header)
    }

    /// Check if the index block is stored at the end of the file
    pub fn index_at_end(&self) -> bool {
        self.flags & ArchiveFlags::BLOCKS_INFO_AT_THE_END != 0
    }

    /// Check if data blocks start on a 16-byte boundary
    pub fn needs_padding_at_start(&self) -> bool {
        self.flags & ArchiveFlags::BLOCK_INFO_NEEDS_PADDING_AT_START != 0
    }

    /// Whether the index block is LZMA-compressed with an explicit length
    /// (`UnityWeb`) rather than stored
    pub fn is_web(&self) -> bool {
        self.signature == "UnityWeb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteOrder;

    #[test]
    fn test_fs_header() {
        let mut data = b"UnityFS\0".to_vec();
        data.extend_from_slice(&7u32.to_be_bytes());
        data.extend_from_slice(b"5.x.x\02019.4.0f1\0");
        data.extend_from_slice(&1000u64.to_be_bytes());
        data.extend_from_slice(&30u32.to_be_bytes());
        data.extend_from_slice(&60u32.to_be_bytes());
        data.extend_from_slice(&0x242u32.to_be_bytes());

        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let header = ContainerHeader::from_reader(&mut reader).unwrap();
        assert_eq!(header.family, ContainerFamily::Fs);
        assert_eq!(header.format, 7);
        assert_eq!(header.generator_version, "2019.4.0f1");
        assert_eq!(header.file_size, 1000);
        assert_eq!(header.compressed_index_size, 30);
        assert_eq!(header.uncompressed_index_size, 60);
        assert!(!header.index_at_end());
        assert!(header.needs_padding_at_start());
    }

    #[test]
    fn test_unknown_signature() {
        let data = b"UnityArchive\0\0\0\0\x01";
        let mut reader = BinaryReader::new(data, ByteOrder::Big);
        let err = ContainerHeader::from_reader(&mut reader).unwrap_err();
        assert!(matches!(err, BinaryError::InvalidSignature { .. }));
    }
}
