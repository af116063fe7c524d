//! Constants shared across the Unity readers
//!
//! Only the handful of class ids that the readers treat specially live here;
//! a full class-id-to-name table is intentionally left to callers.

/// Well-known Unity class ids
pub mod class_ids {
    pub const OBJECT: i32 = 0;
    pub const GAME_OBJECT: i32 = 1;
    pub const COMPONENT: i32 = 2;
    pub const TRANSFORM: i32 = 4;
    pub const TEXTURE_2D: i32 = 28;
    pub const TEXT_ASSET: i32 = 49;
    pub const MONO_BEHAVIOUR: i32 = 114;
    pub const MONO_SCRIPT: i32 = 115;
    pub const ASSET_BUNDLE: i32 = 142;
}

/// Built-in type names that carry special decoding rules
pub mod type_names {
    /// Wrapper used by Unity for every array field
    pub const ARRAY: &str = "Array";
    /// Opaque byte array marker
    pub const TYPELESS_DATA: &str = "TypelessData";
    /// Struct pointing at payload bytes stored in a side resource file
    pub const STREAMING_INFO: &str = "StreamingInfo";
    pub const STRING: &str = "string";
    pub const PAIR: &str = "pair";
    pub const MAP: &str = "map";
}

/// Get the name of a well-known class id
pub fn known_class_name(class_id: i32) -> Option<&'static str> {
    match class_id {
        class_ids::OBJECT => Some("Object"),
        class_ids::GAME_OBJECT => Some("GameObject"),
        class_ids::COMPONENT => Some("Component"),
        class_ids::TRANSFORM => Some("Transform"),
        class_ids::TEXTURE_2D => Some("Texture2D"),
        class_ids::TEXT_ASSET => Some("TextAsset"),
        class_ids::MONO_BEHAVIOUR => Some("MonoBehaviour"),
        class_ids::MONO_SCRIPT => Some("MonoScript"),
        class_ids::ASSET_BUNDLE => Some("AssetBundle"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_class_names() {
        assert_eq!(known_class_name(28), Some("Texture2D"));
        assert_eq!(known_class_name(142), Some("AssetBundle"));
        assert_eq!(known_class_name(-1), None);
    }
}
