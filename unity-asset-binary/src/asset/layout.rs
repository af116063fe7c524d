//! Version-gated layout of SerializedFile metadata
//!
//! Every optional metadata field is listed once with the format versions that
//! carry it. Parsers ask [`FormatLayout::has`] instead of comparing version
//! numbers inline.

use std::ops::RangeInclusive;

/// An optional piece of SerializedFile metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Endianness byte right after the header (older files keep it at the
    /// start of the trailing metadata block)
    EndianInHeader,
    /// 64-bit file size and data offset after the classic header
    LargeHeader,
    /// Unity version string that produced the file
    GeneratorVersion,
    /// Build target platform
    TargetPlatform,
    /// Explicit "type trees embedded" flag
    TypeTreeFlag,
    /// Per-class stripped flag
    StrippedType,
    /// Per-class script type index
    ScriptTypeIndex,
    /// Per-class identity hash
    TypeHash,
    /// Extra variable-count integer on every legacy TypeTree node
    LegacyNodeVariableCount,
    /// Index and meta flags on every legacy TypeTree node
    LegacyNodeIndexAndFlags,
    /// Flat (record array + string buffer) TypeTree encoding
    BlobTypeTree,
    /// 64-bit reference type hash on every flat TypeTree node
    NodeRefTypeHash,
    /// Per-class dependency list, or names for reference types
    TypeDependencies,
    /// Path id width decided by an extra integer
    PathIdWidthProbe,
    /// Path ids are always 64-bit
    WidePathIds,
    /// Object records aligned to 4 bytes
    ObjectAlignment,
    /// Object records reference classes by index
    ClassIndex,
    /// Legacy object records carry type id, class id and destroyed flag
    LegacyObjectIds,
    /// 64-bit object byte offsets
    LargeObjectOffset,
    /// Per-object stripped flag
    StrippedObject,
    /// Local object identifier table
    LocalIds,
    /// Reference "temp path" string
    ReferenceTempPath,
    /// Reference GUID and type
    ReferenceGuid,
    /// Reference type table
    RefTypes,
    /// Free-form user information string
    UserInformation,
}

const ANY_LATER: u32 = u32::MAX;

/// Format ranges in which each field is present
const GATES: &[(Field, RangeInclusive<u32>)] = &[
    (Field::EndianInHeader, 9..=ANY_LATER),
    (Field::LargeHeader, 22..=ANY_LATER),
    (Field::GeneratorVersion, 7..=ANY_LATER),
    (Field::TargetPlatform, 8..=ANY_LATER),
    (Field::TypeTreeFlag, 13..=ANY_LATER),
    (Field::StrippedType, 16..=ANY_LATER),
    (Field::ScriptTypeIndex, 17..=ANY_LATER),
    (Field::TypeHash, 13..=ANY_LATER),
    (Field::LegacyNodeVariableCount, 2..=2),
    (Field::LegacyNodeIndexAndFlags, 0..=2),
    (Field::LegacyNodeIndexAndFlags, 4..=ANY_LATER),
    (Field::BlobTypeTree, 10..=10),
    (Field::BlobTypeTree, 12..=ANY_LATER),
    (Field::NodeRefTypeHash, 19..=ANY_LATER),
    (Field::TypeDependencies, 21..=ANY_LATER),
    (Field::PathIdWidthProbe, 7..=13),
    (Field::WidePathIds, 14..=ANY_LATER),
    (Field::ObjectAlignment, 14..=ANY_LATER),
    (Field::ClassIndex, 16..=ANY_LATER),
    (Field::LegacyObjectIds, 0..=15),
    (Field::LargeObjectOffset, 22..=ANY_LATER),
    (Field::StrippedObject, 15..=16),
    (Field::LocalIds, 11..=ANY_LATER),
    (Field::ReferenceTempPath, 6..=ANY_LATER),
    (Field::ReferenceGuid, 5..=ANY_LATER),
    (Field::RefTypes, 20..=ANY_LATER),
    (Field::UserInformation, 5..=ANY_LATER),
];

/// Layout selector for one SerializedFile format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatLayout {
    format: u32,
}

impl FormatLayout {
    pub fn new(format: u32) -> Self {
        Self { format }
    }

    pub fn format(self) -> u32 {
        self.format
    }

    /// Check whether files of this format carry `field`
    pub fn has(self, field: Field) -> bool {
        GATES
            .iter()
            .any(|(gated, range)| *gated == field && range.contains(&self.format))
    }

    /// Length of a class identity hash.
    ///
    /// 32 bytes (script id followed by type hash) for script-backed classes:
    /// negative class ids in old formats, MonoBehaviour in new ones, and
    /// reference types with a script. 16 bytes otherwise, 0 before format 13.
    pub fn type_hash_len(self, class_id: i32, is_ref_type: bool, script_index: Option<i16>) -> usize {
        if !self.has(Field::TypeHash) {
            return 0;
        }
        let script_backed = (self.format < 16 && class_id < 0)
            || (self.format >= 16 && class_id == unity_asset_core::class_ids::MONO_BEHAVIOUR)
            || (is_ref_type && script_index.is_some_and(|index| index >= 0));
        if script_backed { 32 } else { 16 }
    }
}
