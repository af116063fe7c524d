//! Built-in string table
//!
//! Unity serializes the names of common types and fields as offsets into a
//! string buffer that ships with the engine. A TypeTree string reference with
//! the high bit set points into this buffer instead of the file-local one.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Marker bit for offsets into the built-in buffer
pub const COMMON_STRING_FLAG: u32 = 0x8000_0000;

/// Entries of the engine string buffer, in buffer order. Each entry's key is
/// the byte offset it has in the NUL-separated buffer.
const COMMON_STRINGS: &[&str] = &[
    "AABB",
    "AnimationClip",
    "AnimationCurve",
    "AnimationState",
    "Array",
    "Base",
    "BitField",
    "bitset",
    "bool",
    "char",
    "ColorRGBA",
    "Component",
    "data",
    "deque",
    "double",
    "dynamic_array",
    "FastPropertyName",
    "first",
    "float",
    "Font",
    "GameObject",
    "Generic Mono",
    "GradientNEW",
    "GUID",
    "GUIStyle",
    "int",
    "list",
    "long long",
    "map",
    "Matrix4x4f",
    "MdFour",
    "MonoBehaviour",
    "MonoScript",
    "m_ByteSize",
    "m_Curve",
    "m_EditorClassIdentifier",
    "m_EditorHideFlags",
    "m_Enabled",
    "m_ExtensionPtr",
    "m_GameObject",
    "m_Index",
    "m_IsArray",
    "m_IsStatic",
    "m_MetaFlag",
    "m_Name",
    "m_ObjectHideFlags",
    "m_PrefabInternal",
    "m_PrefabParentObject",
    "m_Script",
    "m_StaticEditorFlags",
    "m_Type",
    "m_Version",
    "Object",
    "pair",
    "PPtr<Component>",
    "PPtr<GameObject>",
    "PPtr<Material>",
    "PPtr<MonoBehaviour>",
    "PPtr<MonoScript>",
    "PPtr<Object>",
    "PPtr<Prefab>",
    "PPtr<Sprite>",
    "PPtr<TextAsset>",
    "PPtr<Texture>",
    "PPtr<Texture2D>",
    "PPtr<Transform>",
    "Prefab",
    "Quaternionf",
    "Rectf",
    "RectInt",
    "RectOffset",
    "second",
    "set",
    "short",
    "size",
    "SInt16",
    "SInt32",
    "SInt64",
    "SInt8",
    "staticvector",
    "string",
    "TextAsset",
    "TextMesh",
    "Texture",
    "Texture2D",
    "Transform",
    "TypelessData",
    "UInt16",
    "UInt32",
    "UInt64",
    "UInt8",
    "unsigned int",
    "unsigned long long",
    "unsigned short",
    "vector",
    "Vector2f",
    "Vector3f",
    "Vector4f",
    "m_ScriptingClassIdentifier",
    "Gradient",
    "Type*",
    "int2_storage",
    "int3_storage",
    "BoundsInt",
    "m_CorrespondingSourceObject",
    "m_PrefabInstance",
    "m_PrefabAsset",
];

static STRING_TABLE: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    let mut table = HashMap::with_capacity(COMMON_STRINGS.len());
    let mut offset = 0u32;
    for name in COMMON_STRINGS {
        table.insert(offset, *name);
        offset += name.len() as u32 + 1;
    }
    table
});

/// Look up a built-in string by its (already masked) offset
pub fn common_string(offset: u32) -> Option<&'static str> {
    STRING_TABLE.get(&offset).copied()
}

/// Check whether a raw TypeTree string reference points at the built-in table
pub fn is_common_reference(raw: u32) -> bool {
    raw & COMMON_STRING_FLAG != 0
}

/// Number of entries in the built-in table
pub fn common_string_count() -> usize {
    COMMON_STRINGS.len()
}
