//! Texture pixel decoding
//!
//! Texture2D objects carry raw pixel bytes in `image data` or in a streamed
//! resource. This module turns those bytes into RGBA images for the
//! uncompressed formats; block-compressed formats are left to external codecs
//! implementing [`TextureDecoder`].

pub mod decoders;
pub mod formats;

pub use decoders::{MAX_TEXTURE_DIMENSION, RawTextureDecoder, TextureDecoder};
pub use formats::TextureFormat;
