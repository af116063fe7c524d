//! Basic texture format decoders
//!
//! Handles uncompressed pixel layouts. Multi-byte pixels are read in the byte
//! order of the serialized file they came from. Unity stores rows bottom-up,
//! so decoded images are flipped to put the first row on top.

use super::{TextureDecoder, create_rgba_image, validate_dimensions};
use crate::error::{BinaryError, Result};
use crate::reader::ByteOrder;
use crate::texture::formats::TextureFormat;
use image::RgbaImage;
use image::imageops::flip_vertical_in_place;

/// Decoder for uncompressed texture formats
#[derive(Debug, Clone, Copy, Default)]
pub struct RawTextureDecoder;

impl RawTextureDecoder {
    /// Create a new basic decoder
    pub fn new() -> Self {
        Self
    }
}

impl TextureDecoder for RawTextureDecoder {
    fn decode(
        &self,
        width: u32,
        height: u32,
        format_code: i32,
        data: &[u8],
        byte_order: ByteOrder,
    ) -> Result<Option<RgbaImage>> {
        let format = TextureFormat::from(format_code);
        let Some(bytes_per_pixel) = format.bytes_per_pixel() else {
            return Ok(None);
        };
        validate_dimensions(width, height)?;

        let pixel_count = width as usize * height as usize;
        let required = pixel_count * bytes_per_pixel;
        if data.len() < required {
            return Err(BinaryError::end_of_data(0, required, data.len()));
        }

        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for pixel in data[..required].chunks_exact(bytes_per_pixel) {
            rgba.extend_from_slice(&decode_pixel(format, pixel, byte_order));
        }
        let mut image = create_rgba_image(rgba, width, height)?;
        flip_vertical_in_place(&mut image);
        Ok(Some(image))
    }
}

fn read_u16(pixel: &[u8], byte_order: ByteOrder) -> u16 {
    let bytes = [pixel[0], pixel[1]];
    match byte_order {
        ByteOrder::Big => u16::from_be_bytes(bytes),
        ByteOrder::Little => u16::from_le_bytes(bytes),
    }
}

/// Expand a 4-bit channel to 8 bits
fn expand4(value: u16) -> u8 {
    let nibble = (value & 0xF) as u8;
    (nibble << 4) | nibble
}

fn decode_pixel(format: TextureFormat, pixel: &[u8], byte_order: ByteOrder) -> [u8; 4] {
    match format {
        TextureFormat::Alpha8 => [255, 255, 255, pixel[0]],
        TextureFormat::R8 => [pixel[0], 0, 0, 255],
        TextureFormat::RG16 => [pixel[0], pixel[1], 0, 255],
        TextureFormat::R16 => {
            let value = (read_u16(pixel, byte_order) >> 8) as u8;
            [value, 0, 0, 255]
        }
        TextureFormat::RGB24 => [pixel[0], pixel[1], pixel[2], 255],
        TextureFormat::RGBA32 => [pixel[0], pixel[1], pixel[2], pixel[3]],
        TextureFormat::ARGB32 => [pixel[1], pixel[2], pixel[3], pixel[0]],
        TextureFormat::BGRA32 => [pixel[2], pixel[1], pixel[0], pixel[3]],
        TextureFormat::RGB565 => {
            let value = read_u16(pixel, byte_order);
            let r = ((value >> 11) & 0x1F) as u8;
            let g = ((value >> 5) & 0x3F) as u8;
            let b = (value & 0x1F) as u8;
            [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), 255]
        }
        TextureFormat::ARGB4444 => {
            let value = read_u16(pixel, byte_order);
            [expand4(value >> 8), expand4(value >> 4), expand4(value), expand4(value >> 12)]
        }
        TextureFormat::RGBA4444 => {
            let value = read_u16(pixel, byte_order);
            [expand4(value >> 12), expand4(value >> 8), expand4(value >> 4), expand4(value)]
        }
        _ => [0, 0, 0, 255],
    }
}
