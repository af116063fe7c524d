//! Byte-level builders for synthetic Unity files
//!
//! Everything here writes the formats the way Unity does so that parsing can
//! be tested without shipping sample assets.

#![allow(dead_code)]

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::collections::HashMap;
use std::io::Cursor;
use unity_asset_binary::asset::{Field, FormatLayout};
use unity_asset_binary::typetree::{NodeId, TypeTree};

/// Endian-switchable byte writer
pub struct Writer {
    pub buf: Vec<u8>,
    pub big_endian: bool,
}

impl Writer {
    pub fn new(big_endian: bool) -> Self {
        Self {
            buf: Vec::new(),
            big_endian,
        }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        if self.big_endian {
            self.buf.write_u16::<BigEndian>(value).unwrap();
        } else {
            self.buf.write_u16::<LittleEndian>(value).unwrap();
        }
        self
    }

    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.u16(value as u16)
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        if self.big_endian {
            self.buf.write_u32::<BigEndian>(value).unwrap();
        } else {
            self.buf.write_u32::<LittleEndian>(value).unwrap();
        }
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.u32(value as u32)
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        if self.big_endian {
            self.buf.write_u64::<BigEndian>(value).unwrap();
        } else {
            self.buf.write_u64::<LittleEndian>(value).unwrap();
        }
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.u64(value as u64)
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.u32(value.to_bits())
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(value);
        self
    }

    pub fn cstr(&mut self, value: &str) -> &mut Self {
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
        self
    }

    /// Length-prefixed string padded to 4 bytes, as objects store them
    pub fn string(&mut self, value: &str) -> &mut Self {
        self.i32(value.len() as i32);
        self.bytes(value.as_bytes());
        self.align(4)
    }

    pub fn align(&mut self, alignment: usize) -> &mut Self {
        while self.buf.len() % alignment != 0 {
            self.buf.push(0);
        }
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Encode a tree in the flat record encoding with a local string buffer
pub fn write_blob_type_tree(tree: &TypeTree, format: u32, out: &mut Writer) {
    let mut strings: Vec<u8> = Vec::new();
    let mut offsets: HashMap<String, u32> = HashMap::new();
    let mut intern = |value: &str| -> u32 {
        if let Some(&offset) = offsets.get(value) {
            return offset;
        }
        let offset = strings.len() as u32;
        strings.extend_from_slice(value.as_bytes());
        strings.push(0);
        offsets.insert(value.to_string(), offset);
        offset
    };

    let flat = tree.flatten();
    let mut records = Writer::new(out.big_endian);
    for node in &flat {
        records
            .u16(node.version)
            .u8(node.level)
            .u8(node.is_array as u8)
            .u32(intern(&node.type_name))
            .u32(intern(&node.name))
            .i32(node.byte_size)
            .u32(node.index)
            .u32(node.meta_flags);
        if format >= 19 {
            records.u64(node.ref_type_hash.unwrap_or(0));
        }
    }

    out.i32(flat.len() as i32)
        .i32(strings.len() as i32)
        .bytes(&records.buf)
        .bytes(&strings);
}

/// Encode a tree in the recursive encoding of old formats
pub fn write_legacy_type_tree(tree: &TypeTree, format: u32, out: &mut Writer) {
    fn write_node(tree: &TypeTree, id: NodeId, format: u32, out: &mut Writer) {
        let node = tree.node(id).unwrap();
        out.cstr(&node.type_name).cstr(&node.name).i32(node.byte_size);
        if format == 2 {
            out.i32(0);
        }
        if format != 3 {
            out.u32(node.index);
        }
        out.i32(node.is_array as i32).i32(node.version as i32);
        if format != 3 {
            out.u32(node.meta_flags);
        }
        out.i32(node.children.len() as i32);
        for &child in &node.children {
            write_node(tree, child, format, out);
        }
    }
    write_node(tree, 0, format, out);
}

pub struct TestClass {
    pub class_id: i32,
    pub tree: TypeTree,
    pub hash: [u8; 16],
}

pub struct TestObject {
    pub path_id: i64,
    pub class_index: usize,
    pub data: Vec<u8>,
}

/// Builder for SerializedFiles
pub struct AssetFileBuilder {
    pub format: u32,
    pub big_endian: bool,
    pub embed_type_trees: bool,
    pub classes: Vec<TestClass>,
    pub objects: Vec<TestObject>,
    pub references: Vec<String>,
}

impl AssetFileBuilder {
    pub fn new(format: u32) -> Self {
        Self {
            format,
            big_endian: false,
            embed_type_trees: true,
            classes: Vec::new(),
            objects: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn without_type_trees(mut self) -> Self {
        self.embed_type_trees = false;
        self
    }

    /// Declare a class, returning its index in the class table
    pub fn class(&mut self, class_id: i32, tree: TypeTree) -> usize {
        let mut hash = [0u8; 16];
        hash[..4].copy_from_slice(&class_id.to_le_bytes());
        self.classes.push(TestClass {
            class_id,
            tree,
            hash,
        });
        self.classes.len() - 1
    }

    pub fn object(&mut self, path_id: i64, class_index: usize, data: Vec<u8>) -> &mut Self {
        self.objects.push(TestObject {
            path_id,
            class_index,
            data,
        });
        self
    }

    pub fn reference(&mut self, path: &str) -> &mut Self {
        self.references.push(path.to_string());
        self
    }

    fn metadata(&self, data_starts: &[u64]) -> Vec<u8> {
        let format = self.format;
        let mut meta = Writer::new(self.big_endian);
        if format >= 7 {
            meta.cstr("2019.4.40f1");
        }
        if format >= 8 {
            meta.i32(19);
        }
        if format >= 13 {
            meta.u8(self.embed_type_trees as u8);
        }

        meta.i32(self.classes.len() as i32);
        for class in &self.classes {
            meta.i32(class.class_id);
            if format >= 16 {
                meta.u8(0);
            }
            if format >= 17 {
                meta.i16(-1);
            }
            if format >= 13 {
                if format >= 16 && class.class_id == 114 {
                    meta.bytes(&[0u8; 16]);
                }
                meta.bytes(&class.hash);
            }
            if self.embed_type_trees {
                if FormatLayout::new(format).has(Field::BlobTypeTree) {
                    write_blob_type_tree(&class.tree, format, &mut meta);
                } else {
                    write_legacy_type_tree(&class.tree, format, &mut meta);
                }
                if format >= 21 {
                    meta.i32(0);
                }
            }
        }

        if (7..=13).contains(&format) {
            meta.i32(0);
        }

        meta.i32(self.objects.len() as i32);
        for (object, &start) in self.objects.iter().zip(data_starts) {
            if format >= 14 {
                meta.align(4);
                meta.i64(object.path_id);
            } else {
                meta.i32(object.path_id as i32);
            }
            if format >= 22 {
                meta.u64(start);
            } else {
                meta.u32(start as u32);
            }
            meta.u32(object.data.len() as u32);
            if format >= 16 {
                meta.u32(object.class_index as u32);
            } else {
                let class_id = self.classes[object.class_index].class_id;
                meta.i32(class_id).i16(class_id as i16).i16(0);
            }
            if (15..=16).contains(&format) {
                meta.u8(0);
            }
        }

        if format >= 11 {
            meta.i32(0);
        }

        meta.i32(self.references.len() as i32);
        for path in &self.references {
            if format >= 6 {
                meta.cstr("");
            }
            if format >= 5 {
                meta.bytes(&[0xAB; 16]).i32(2);
            }
            meta.cstr(path);
        }

        if format >= 20 {
            meta.i32(0);
        }
        if format >= 5 {
            meta.cstr("");
        }
        meta.finish()
    }

    fn object_data(&self) -> (Vec<u8>, Vec<u64>) {
        let mut data = Vec::new();
        let mut starts = Vec::new();
        for object in &self.objects {
            while data.len() % 8 != 0 {
                data.push(0);
            }
            starts.push(data.len() as u64);
            data.extend_from_slice(&object.data);
        }
        (data, starts)
    }

    pub fn build(&self) -> Vec<u8> {
        let (data, starts) = self.object_data();
        let meta = self.metadata(&starts);
        let endian = self.big_endian as u8;
        let mut out = Writer::new(true);

        if self.format < 9 {
            // header, object data, then metadata led by the endian byte
            let data_offset = 16u32;
            let metadata_size = meta.len() as u32 + 1;
            let file_size = data_offset + data.len() as u32 + metadata_size;
            out.u32(metadata_size)
                .u32(file_size)
                .u32(self.format)
                .u32(data_offset)
                .bytes(&data)
                .u8(endian)
                .bytes(&meta);
            return out.finish();
        }

        let header_size = if self.format >= 22 { 48 } else { 20 };
        let data_offset = (header_size + meta.len()).div_ceil(16) * 16;
        let file_size = data_offset + data.len();

        if self.format >= 22 {
            out.u32(0).u32(0).u32(self.format).u32(0);
            out.u8(endian).bytes(&[0; 3]);
            out.u32(meta.len() as u32)
                .u64(file_size as u64)
                .u64(data_offset as u64)
                .u64(0);
        } else {
            out.u32(meta.len() as u32)
                .u32(file_size as u32)
                .u32(self.format)
                .u32(data_offset as u32);
            out.u8(endian).bytes(&[0; 3]);
        }
        out.bytes(&meta);
        out.align(16);
        out.bytes(&data);
        out.finish()
    }
}

/// Compress a block the way the given flags say
pub fn compress(flags: u32, data: &[u8]) -> Vec<u8> {
    match flags & 0x3F {
        0 => data.to_vec(),
        1 => {
            let mut out = Vec::new();
            let options = lzma_rs::compress::Options {
                unpacked_size: lzma_rs::compress::UnpackedSize::SkipWritingToHeader,
            };
            lzma_rs::lzma_compress_with_options(&mut Cursor::new(data), &mut out, &options)
                .unwrap();
            out
        }
        2 | 3 => lz4_flex::block::compress(data),
        // unknown codecs are stored as is
        _ => data.to_vec(),
    }
}

pub struct TestEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub status: u32,
}

/// Builder for `UnityFS` containers
pub struct FsContainerBuilder {
    pub format: u32,
    pub index_compression: u32,
    pub block_compression: u16,
    pub block_size: usize,
    pub index_at_end: bool,
    pub pad_data: bool,
    pub entries: Vec<TestEntry>,
}

impl FsContainerBuilder {
    pub fn new() -> Self {
        Self {
            format: 7,
            index_compression: 2,
            block_compression: 2,
            block_size: 0x20000,
            index_at_end: false,
            pad_data: false,
            entries: Vec::new(),
        }
    }

    pub fn asset(mut self, name: &str, data: Vec<u8>) -> Self {
        self.entries.push(TestEntry {
            name: name.to_string(),
            data,
            status: 4,
        });
        self
    }

    pub fn blob(mut self, name: &str, data: Vec<u8>) -> Self {
        self.entries.push(TestEntry {
            name: name.to_string(),
            data,
            status: 0,
        });
        self
    }

    /// The uncompressed index block
    pub fn index(&self, blocks: &[(u32, u32)]) -> Vec<u8> {
        let mut index = Writer::new(true);
        index.bytes(&[0x11; 16]);
        index.u32(blocks.len() as u32);
        for &(uncompressed, compressed) in blocks {
            index
                .u32(uncompressed)
                .u32(compressed)
                .u16(self.block_compression);
        }
        index.u32(self.entries.len() as u32);
        let mut offset = 0u64;
        for entry in &self.entries {
            index
                .i64(offset as i64)
                .i64(entry.data.len() as i64)
                .u32(entry.status)
                .cstr(&entry.name);
            offset += entry.data.len() as u64;
        }
        index.finish()
    }

    pub fn build(&self) -> Vec<u8> {
        let storage: Vec<u8> = self
            .entries
            .iter()
            .flat_map(|entry| entry.data.iter().copied())
            .collect();
        let mut blocks = Vec::new();
        let mut block_data = Vec::new();
        for chunk in storage.chunks(self.block_size.max(1)) {
            let compressed = compress(self.block_compression as u32, chunk);
            blocks.push((chunk.len() as u32, compressed.len() as u32));
            block_data.extend_from_slice(&compressed);
        }

        let index = self.index(&blocks);
        let compressed_index = compress(self.index_compression, &index);
        let mut flags = self.index_compression;
        if self.index_at_end {
            flags |= 0x80;
        }
        if self.pad_data {
            flags |= 0x200;
        }

        let mut out = Writer::new(true);
        out.cstr("UnityFS")
            .u32(self.format)
            .cstr("5.x.x")
            .cstr("2019.4.40f1");
        let size_at = out.buf.len();
        out.u64(0)
            .u32(compressed_index.len() as u32)
            .u32(index.len() as u32)
            .u32(flags);
        if self.format >= 7 {
            out.align(16);
        }
        if !self.index_at_end {
            out.bytes(&compressed_index);
        }
        if self.pad_data {
            out.align(16);
        }
        out.bytes(&block_data);
        if self.index_at_end {
            out.bytes(&compressed_index);
        }

        let mut data = out.finish();
        let file_size = data.len() as u64;
        data[size_at..size_at + 8].copy_from_slice(&file_size.to_be_bytes());
        data
    }
}

/// Build a `UnityRaw` or (when `web`) LZMA-compressed `UnityWeb` container
pub fn raw_container(web: bool, entries: &[(&str, &[u8])]) -> Vec<u8> {
    let names_len: usize = entries.iter().map(|(name, _)| name.len() + 9).sum();
    let mut directory = Writer::new(true);
    directory.u32(entries.len() as u32);
    let mut offset = 4 + names_len;
    for (name, bytes) in entries {
        directory.cstr(name).u32(offset as u32).u32(bytes.len() as u32);
        offset += bytes.len();
    }
    for (_, bytes) in entries {
        directory.bytes(bytes);
    }
    let directory = directory.finish();

    let block = if web {
        let mut out = Vec::new();
        let options = lzma_rs::compress::Options {
            unpacked_size: lzma_rs::compress::UnpackedSize::WriteToHeader(Some(
                directory.len() as u64,
            )),
        };
        lzma_rs::lzma_compress_with_options(&mut Cursor::new(&directory), &mut out, &options)
            .unwrap();
        out
    } else {
        directory
    };

    let mut out = Writer::new(true);
    out.cstr(if web { "UnityWeb" } else { "UnityRaw" })
        .u32(3)
        .cstr("3.x.x")
        .cstr("4.7.2f1");
    let header_size = out.buf.len() + 8;
    out.u32((header_size + block.len()) as u32)
        .u32(header_size as u32)
        .bytes(&block);
    out.finish()
}
