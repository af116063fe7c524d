//! Texture format definitions
//!
//! Values match Unity's internal TextureFormat enum. Only the uncompressed
//! formats are decoded by this crate; block-compressed ones are listed so that
//! callers can name them when plugging in their own codecs.

use serde::{Deserialize, Serialize};

/// Unity texture formats
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(i32)]
pub enum TextureFormat {
    // Basic formats
    Alpha8 = 1,
    ARGB4444 = 2,
    RGB24 = 3,
    RGBA32 = 4,
    ARGB32 = 5,
    RGB565 = 7,
    R16 = 9,
    RGBA4444 = 13,
    BGRA32 = 14,
    RG16 = 62,
    R8 = 63,

    // Compressed formats
    DXT1 = 10,
    DXT5 = 12,
    BC7 = 25,
    DXT1Crunched = 28,
    DXT5Crunched = 29,
    PVRTC_RGB4 = 32,
    PVRTC_RGBA4 = 33,
    ETC_RGB4 = 34,
    ETC2_RGB = 45,
    ETC2_RGBA8 = 47,
    ASTC_RGB_4x4 = 48,
    ASTC_RGBA_4x4 = 54,

    // Unknown format
    #[default]
    Unknown = -1,
}

impl From<i32> for TextureFormat {
    fn from(value: i32) -> Self {
        match value {
            1 => TextureFormat::Alpha8,
            2 => TextureFormat::ARGB4444,
            3 => TextureFormat::RGB24,
            4 => TextureFormat::RGBA32,
            5 => TextureFormat::ARGB32,
            7 => TextureFormat::RGB565,
            9 => TextureFormat::R16,
            13 => TextureFormat::RGBA4444,
            14 => TextureFormat::BGRA32,
            62 => TextureFormat::RG16,
            63 => TextureFormat::R8,
            10 => TextureFormat::DXT1,
            12 => TextureFormat::DXT5,
            25 => TextureFormat::BC7,
            28 => TextureFormat::DXT1Crunched,
            29 => TextureFormat::DXT5Crunched,
            32 => TextureFormat::PVRTC_RGB4,
            33 => TextureFormat::PVRTC_RGBA4,
            34 => TextureFormat::ETC_RGB4,
            45 => TextureFormat::ETC2_RGB,
            47 => TextureFormat::ETC2_RGBA8,
            48 => TextureFormat::ASTC_RGB_4x4,
            54 => TextureFormat::ASTC_RGBA_4x4,
            _ => TextureFormat::Unknown,
        }
    }
}

impl TextureFormat {
    /// Bytes per pixel for uncompressed formats
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            TextureFormat::Alpha8 | TextureFormat::R8 => Some(1),
            TextureFormat::ARGB4444
            | TextureFormat::RGBA4444
            | TextureFormat::RGB565
            | TextureFormat::R16
            | TextureFormat::RG16 => Some(2),
            TextureFormat::RGB24 => Some(3),
            TextureFormat::RGBA32 | TextureFormat::ARGB32 | TextureFormat::BGRA32 => Some(4),
            _ => None,
        }
    }
}
