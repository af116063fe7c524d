//! Typed views over decoded objects
//!
//! A small static table maps type names and class ids to the object kinds
//! that get dedicated accessors. Everything else stays [`ObjectKind::Generic`].

use super::value::ObjectValue;
#[cfg(feature = "texture")]
use crate::error::{BinaryError, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use unity_asset_core::class_ids;

/// Object kinds with dedicated views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    TextAsset,
    Texture2D,
    Generic,
}

static KINDS_BY_NAME: Lazy<HashMap<&'static str, ObjectKind>> = Lazy::new(|| {
    HashMap::from([
        ("TextAsset", ObjectKind::TextAsset),
        ("Texture2D", ObjectKind::Texture2D),
    ])
});

static KINDS_BY_CLASS: Lazy<HashMap<i32, ObjectKind>> = Lazy::new(|| {
    HashMap::from([
        (class_ids::TEXT_ASSET, ObjectKind::TextAsset),
        (class_ids::TEXTURE_2D, ObjectKind::Texture2D),
    ])
});

impl ObjectKind {
    /// Look up the kind by root type name first, then by class id
    pub fn resolve(type_name: &str, class_id: i32) -> Self {
        KINDS_BY_NAME
            .get(type_name)
            .or_else(|| KINDS_BY_CLASS.get(&class_id))
            .copied()
            .unwrap_or(ObjectKind::Generic)
    }
}

/// A decoded object tagged with its kind
#[derive(Debug, Clone)]
pub struct UnityObject {
    pub path_id: i64,
    pub class_id: i32,
    pub kind: ObjectKind,
    pub value: ObjectValue,
}

impl UnityObject {
    /// Object name from `m_Name`, if present
    pub fn name(&self) -> Option<&str> {
        self.value.field("m_Name")?.as_str()
    }

    pub fn as_text_asset(&self) -> Option<TextAsset<'_>> {
        (self.kind == ObjectKind::TextAsset).then_some(TextAsset { value: &self.value })
    }

    pub fn as_texture_2d(&self) -> Option<Texture2D<'_>> {
        (self.kind == ObjectKind::Texture2D).then_some(Texture2D { value: &self.value })
    }
}

/// View over a TextAsset
#[derive(Debug, Clone, Copy)]
pub struct TextAsset<'a> {
    value: &'a ObjectValue,
}

impl<'a> TextAsset<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.value.field("m_Name")?.as_str()
    }

    /// Script contents as text; `None` when they are not valid UTF-8
    pub fn text(&self) -> Option<&'a str> {
        self.value.field("m_Script")?.as_str()
    }

    /// Script contents as raw bytes
    pub fn bytes(&self) -> Option<&'a [u8]> {
        self.value.field("m_Script")?.as_bytes()
    }
}

/// View over a Texture2D
#[derive(Debug, Clone, Copy)]
pub struct Texture2D<'a> {
    value: &'a ObjectValue,
}

impl<'a> Texture2D<'a> {
    pub fn name(&self) -> Option<&'a str> {
        self.value.field("m_Name")?.as_str()
    }

    pub fn width(&self) -> Option<u32> {
        self.int_field("m_Width")
    }

    pub fn height(&self) -> Option<u32> {
        self.int_field("m_Height")
    }

    /// Raw `m_TextureFormat` code
    pub fn texture_format(&self) -> Option<i32> {
        self.value
            .field("m_TextureFormat")?
            .as_i64()
            .and_then(|code| i32::try_from(code).ok())
    }

    pub fn mip_count(&self) -> Option<u32> {
        self.int_field("m_MipCount")
    }

    /// Pixel bytes, inline or resolved from `m_StreamData`
    pub fn image_data(&self) -> Option<&'a [u8]> {
        let inline = self
            .value
            .field("image data")
            .and_then(ObjectValue::as_bytes)
            .filter(|bytes| !bytes.is_empty());
        inline.or_else(|| self.value.field("m_StreamData")?.as_bytes())
    }

    /// Decode the first mip level with `decoder`. `Ok(None)` means the
    /// decoder does not handle this texture's format.
    #[cfg(feature = "texture")]
    pub fn decode_image(
        &self,
        decoder: &dyn crate::texture::TextureDecoder,
    ) -> Result<Option<image::RgbaImage>> {
        let missing = |field: &str| BinaryError::invalid_data(0, format!("Texture2D without {}", field));
        let width = self.width().ok_or_else(|| missing("m_Width"))?;
        let height = self.height().ok_or_else(|| missing("m_Height"))?;
        let format = self.texture_format().ok_or_else(|| missing("m_TextureFormat"))?;
        let data = self.image_data().ok_or_else(|| missing("image data"))?;
        decoder.decode(width, height, format, data, self.value.byte_order)
    }

    fn int_field(&self, name: &str) -> Option<u32> {
        self.value
            .field(name)?
            .as_i64()
            .and_then(|value| u32::try_from(value).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::value::{Payload, Scalar};
    use crate::reader::ByteOrder;
    use std::sync::Arc;

    fn leaf(name: &str, type_name: &str, payload: Payload) -> ObjectValue {
        let mut value = ObjectValue::new(name, type_name, ByteOrder::Little);
        value.payload = payload;
        value
    }

    fn object(type_name: &str, fields: Vec<ObjectValue>) -> ObjectValue {
        let mut value = ObjectValue::new("Base", type_name, ByteOrder::Little);
        value.is_struct = true;
        value.fields = fields.into_iter().map(|field| (field.name.clone(), field)).collect();
        value
    }

    #[test]
    fn test_resolve_kind() {
        assert_eq!(ObjectKind::resolve("TextAsset", 0), ObjectKind::TextAsset);
        assert_eq!(ObjectKind::resolve("Whatever", 28), ObjectKind::Texture2D);
        assert_eq!(ObjectKind::resolve("GameObject", 1), ObjectKind::Generic);
    }

    #[test]
    fn test_text_asset_view() {
        let value = object(
            "TextAsset",
            vec![
                leaf("m_Name", "string", Payload::Text(Arc::from("notes"))),
                leaf("m_Script", "string", Payload::Bytes(Arc::from(&[0xFFu8, 0x00][..]))),
            ],
        );
        let object = UnityObject {
            path_id: 7,
            class_id: 49,
            kind: ObjectKind::TextAsset,
            value,
        };
        let text = object.as_text_asset().unwrap();
        assert_eq!(text.name(), Some("notes"));
        assert_eq!(text.text(), None);
        assert_eq!(text.bytes(), Some(&[0xFFu8, 0x00][..]));
        assert!(object.as_texture_2d().is_none());
    }

    #[test]
    fn test_texture_view_prefers_inline_data() {
        let mut stream = object("StreamingInfo", vec![]);
        stream.name = "m_StreamData".to_string();
        stream.payload = Payload::Bytes(Arc::from(&[9u8, 9, 9, 9][..]));
        let value = object(
            "Texture2D",
            vec![
                leaf("m_Width", "int", Payload::Scalar(Scalar::Int(1))),
                leaf("m_Height", "int", Payload::Scalar(Scalar::Int(1))),
                leaf("m_TextureFormat", "int", Payload::Scalar(Scalar::Int(4))),
                leaf("m_MipCount", "int", Payload::Scalar(Scalar::Int(1))),
                leaf("image data", "TypelessData", Payload::Bytes(Arc::from(&[0u8; 0][..]))),
                stream,
            ],
        );
        let object = UnityObject {
            path_id: 1,
            class_id: 28,
            kind: ObjectKind::Texture2D,
            value,
        };
        let texture = object.as_texture_2d().unwrap();
        assert_eq!((texture.width(), texture.height()), (Some(1), Some(1)));
        assert_eq!(texture.texture_format(), Some(4));
        assert_eq!(texture.mip_count(), Some(1));
        // empty inline data falls back to the stream
        assert_eq!(texture.image_data(), Some(&[9u8, 9, 9, 9][..]));

        #[cfg(feature = "texture")]
        {
            let image = texture
                .decode_image(&crate::texture::RawTextureDecoder::new())
                .unwrap()
                .unwrap();
            assert_eq!(image.as_raw(), &vec![9, 9, 9, 9]);
        }
    }
}
