//! Texture decoder interface
//!
//! A decoder turns a texture's raw pixel bytes into an RGBA image. Returning
//! `Ok(None)` means the format is not handled by that decoder.

mod basic;

pub use basic::RawTextureDecoder;

use crate::error::{BinaryError, Result};
use crate::reader::ByteOrder;
use image::RgbaImage;

/// Largest accepted texture edge
pub const MAX_TEXTURE_DIMENSION: u32 = 16384;

/// Pixel codec collaborator
pub trait TextureDecoder {
    /// Decode `data` laid out as `format_code` into a `width` x `height` image
    fn decode(
        &self,
        width: u32,
        height: u32,
        format_code: i32,
        data: &[u8],
        byte_order: ByteOrder,
    ) -> Result<Option<RgbaImage>>;
}

/// Validate texture dimensions
pub(crate) fn validate_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_TEXTURE_DIMENSION || height > MAX_TEXTURE_DIMENSION {
        return Err(BinaryError::invalid_data(
            0,
            format!("invalid texture dimensions {}x{}", width, height),
        ));
    }
    Ok(())
}

/// Wrap RGBA pixel data into an image
pub(crate) fn create_rgba_image(data: Vec<u8>, width: u32, height: u32) -> Result<RgbaImage> {
    RgbaImage::from_raw(width, height, data).ok_or_else(|| {
        BinaryError::invalid_data(0, format!("pixel buffer does not match {}x{}", width, height))
    })
}
