//! Container parsing
//!
//! Both families end up with one decompressed storage buffer plus a list of
//! entries addressing it. Splitting that storage into asset files and blobs is
//! shared.

use super::header::ContainerHeader;
use super::types::{AssetContainer, BlobIndex, BlockInfo, ContainerFamily, EntryFailure, EntryInfo};
use crate::asset::AssetFile;
use crate::compression::{self, BlockData};
use crate::error::{BinaryError, Diagnostic, Result};
use crate::options::ParseOptions;
use crate::reader::{BinaryReader, ByteOrder};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decompressed directory and data of a container
#[derive(Default)]
struct Storage {
    guid: Option<[u8; 16]>,
    blocks: Vec<BlockInfo>,
    entries: Vec<EntryInfo>,
    data: Vec<u8>,
    diagnostics: Vec<Diagnostic>,
}

impl Storage {
    fn keep(&mut self, block: BlockData) -> Vec<u8> {
        if let Some(diagnostic) = block.diagnostic {
            self.diagnostics.push(diagnostic);
        }
        block.data
    }
}

impl AssetContainer {
    /// Parse a container with default options
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(data, &ParseOptions::default())
    }

    /// Parse a container and every asset file inside it
    pub fn parse(data: &[u8], options: &ParseOptions) -> Result<Self> {
        let mut reader = BinaryReader::new(data, ByteOrder::Big);
        let header = ContainerHeader::from_reader(&mut reader)?;
        debug!(
            signature = %header.signature,
            format = header.format,
            unity_version = %header.unity_version,
            "reading container"
        );

        let storage = match header.family {
            ContainerFamily::Raw => read_raw(&header, &mut reader, options)?,
            ContainerFamily::Fs => read_fs(&header, &mut reader, options)?,
        };
        Ok(split_entries(header, storage, options))
    }
}

fn read_raw(
    header: &ContainerHeader,
    reader: &mut BinaryReader,
    options: &ParseOptions,
) -> Result<Storage> {
    reader.set_position(header.header_size as u64)?;
    // the declared total size bounds the block when it is usable
    let end = if header.file_size > reader.position() && header.file_size <= reader.len() as u64 {
        header.file_size
    } else {
        reader.len() as u64
    };
    let block = reader.read_slice((end - reader.position()) as usize)?;

    let mut storage = Storage {
        data: if header.is_web() {
            compression::decompress_lzma_with_length(block, options.max_allocation)?
        } else {
            block.to_vec()
        },
        ..Storage::default()
    };

    let mut directory = BinaryReader::new(&storage.data, ByteOrder::Big);
    // name terminator plus offset and size
    let count = read_count(&mut directory, 9, "directory entries")?;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let name = directory.read_cstring()?;
        let offset = directory.read_u32()? as u64;
        let size = directory.read_u32()? as u64;
        entries.push(EntryInfo::raw(name, offset, size));
    }
    debug!(entries = entries.len(), "read raw container directory");
    storage.entries = entries;
    Ok(storage)
}

fn read_fs(
    header: &ContainerHeader,
    reader: &mut BinaryReader,
    options: &ParseOptions,
) -> Result<Storage> {
    if header.format >= 7 {
        reader.align_to(16);
    }

    let compressed_size = header.compressed_index_size as usize;
    let index = if header.index_at_end() {
        let offset = header
            .file_size
            .checked_sub(compressed_size as u64)
            .ok_or_else(|| {
                BinaryError::invalid_data(
                    reader.position(),
                    format!(
                        "index of {} bytes does not fit a file of {} bytes",
                        compressed_size, header.file_size
                    ),
                )
            })?;
        reader.peek_at(offset, compressed_size)?
    } else {
        reader.read_slice(compressed_size)?
    };

    let mut storage = Storage::default();
    let index = compression::decompress_block(
        index,
        header.flags,
        header.uncompressed_index_size as usize,
        options.max_allocation,
    )?;
    let index = storage.keep(index);

    let mut index_reader = BinaryReader::new(&index, ByteOrder::Big);
    storage.guid = Some(index_reader.read_guid()?);

    // uncompressed size, compressed size and flags
    let block_count = read_count(&mut index_reader, 10, "blocks")?;
    let mut blocks = Vec::with_capacity(block_count);
    let mut total: u64 = 0;
    for _ in 0..block_count {
        let block = BlockInfo {
            uncompressed_size: index_reader.read_u32()?,
            compressed_size: index_reader.read_u32()?,
            flags: index_reader.read_u16()?,
        };
        total += block.uncompressed_size as u64;
        blocks.push(block);
    }
    let total = options.check_allocation(total, "container data")?;

    // offset, size, status and name terminator
    let entry_count = read_count(&mut index_reader, 21, "directory entries")?;
    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let position = index_reader.position();
        let offset = index_reader.read_i64()?;
        let size = index_reader.read_i64()?;
        let status = index_reader.read_u32()?;
        let name = index_reader.read_cstring()?;
        let (Ok(offset), Ok(size)) = (u64::try_from(offset), u64::try_from(size)) else {
            return Err(BinaryError::invalid_data(
                position,
                format!("entry `{}` has negative offset or size", name),
            ));
        };
        entries.push(EntryInfo::fs(name, offset, size, status));
    }
    debug!(
        blocks = blocks.len(),
        entries = entries.len(),
        data_size = total,
        "read container index"
    );

    if header.needs_padding_at_start() {
        reader.align_to(16);
    }

    let mut data = Vec::with_capacity(total);
    for block in &blocks {
        let compressed = reader.read_slice(block.compressed_size as usize)?;
        let decompressed = compression::decompress_block(
            compressed,
            block.flags as u32,
            block.uncompressed_size as usize,
            options.max_allocation,
        )?;
        data.extend_from_slice(&storage.keep(decompressed));
    }

    storage.blocks = blocks;
    storage.entries = entries;
    storage.data = data;
    Ok(storage)
}

/// Read a record count, rejecting counts the remaining bytes cannot hold
fn read_count(reader: &mut BinaryReader, min_record_size: usize, what: &str) -> Result<usize> {
    let position = reader.position();
    let count = reader.read_u32()? as usize;
    if count.saturating_mul(min_record_size) > reader.remaining() {
        return Err(BinaryError::invalid_data(
            position,
            format!(
                "{} {} do not fit in the remaining {} bytes",
                count,
                what,
                reader.remaining()
            ),
        ));
    }
    Ok(count)
}

fn entry_bytes<'a>(storage: &'a [u8], entry: &EntryInfo) -> Result<&'a [u8]> {
    let reader = BinaryReader::new(storage, ByteOrder::Big);
    let size = usize::try_from(entry.size).unwrap_or(usize::MAX);
    reader.peek_at(entry.offset, size)
}

fn split_entries(header: ContainerHeader, storage: Storage, options: &ParseOptions) -> AssetContainer {
    let Storage {
        guid,
        blocks,
        entries,
        data,
        mut diagnostics,
    } = storage;
    let mut failures = Vec::new();

    let mut blobs = BlobIndex::new();
    for entry in entries.iter().filter(|entry| !entry.is_asset) {
        match entry_bytes(&data, entry) {
            Ok(bytes) => {
                blobs.insert(entry.name.clone(), bytes.to_vec());
            }
            Err(error) => record_failure(&mut failures, &mut diagnostics, &entry.name, error),
        }
    }
    let blobs = Arc::new(blobs);

    let mut assets = Vec::new();
    for entry in entries.iter().filter(|entry| entry.is_asset) {
        let parsed = entry_bytes(&data, entry).and_then(|bytes| {
            AssetFile::parse(entry.name.clone(), bytes, options, Some(Arc::clone(&blobs)))
        });
        match parsed {
            Ok(asset) => assets.push(asset),
            Err(error) => record_failure(&mut failures, &mut diagnostics, &entry.name, error),
        }
    }
    debug!(
        assets = assets.len(),
        blobs = blobs.len(),
        failures = failures.len(),
        "container entries split"
    );

    AssetContainer {
        header,
        guid,
        blocks,
        entries,
        assets,
        blobs,
        failures,
        diagnostics,
    }
}

fn record_failure(
    failures: &mut Vec<EntryFailure>,
    diagnostics: &mut Vec<Diagnostic>,
    name: &str,
    error: BinaryError,
) {
    warn!(entry = name, error = %error, "skipping unparseable container entry");
    diagnostics.push(Diagnostic::new(
        error.category(),
        format!("entry `{}`: {}", name, error),
    ));
    failures.push(EntryFailure {
        name: name.to_string(),
        error,
    });
}
