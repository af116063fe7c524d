//! Decoded object values

use crate::reader::ByteOrder;
use indexmap::IndexMap;
use std::sync::Arc;
use unity_asset_core::{UnityValue, type_names};

/// A fixed-width scalar read from a leaf node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Scalar {
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Scalar::Bool(b) => Some(b as i64),
            Scalar::Int(i) => Some(i),
            Scalar::UInt(u) => i64::try_from(u).ok(),
            Scalar::Float(_) => None,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Bool(b) => b as i64 as f64,
            Scalar::Int(i) => i as f64,
            Scalar::UInt(u) => u as f64,
            Scalar::Float(f) => f,
        }
    }

    fn simplify(self) -> UnityValue {
        match self {
            Scalar::Bool(b) => UnityValue::Bool(b),
            Scalar::Int(i) => UnityValue::Integer(i),
            Scalar::UInt(u) => UnityValue::from(u),
            Scalar::Float(f) => UnityValue::Float(f),
        }
    }
}

/// The non-field content of a value.
///
/// Sequences, byte runs and text are reference counted so that an array node
/// and its `data` child share one buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    None,
    Scalar(Scalar),
    Array(Arc<[ObjectValue]>),
    Bytes(Arc<[u8]>),
    Text(Arc<str>),
}

/// A decoded node: a scalar, a sequence, or a struct of named fields
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub name: String,
    pub type_name: String,
    pub byte_order: ByteOrder,
    pub payload: Payload,
    pub fields: IndexMap<String, ObjectValue>,
    /// `true` for a struct of fields, `false` for a wrapped scalar or sequence
    pub is_struct: bool,
}

impl ObjectValue {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, byte_order: ByteOrder) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            byte_order,
            payload: Payload::None,
            fields: IndexMap::new(),
            is_struct: false,
        }
    }

    /// Look up a named child
    pub fn field(&self, name: &str) -> Option<&ObjectValue> {
        self.fields.get(name)
    }

    /// Follow a dotted field path, e.g. `"m_StreamData.path"`
    pub fn path(&self, path: &str) -> Option<&ObjectValue> {
        path.split('.')
            .try_fold(self, |value, segment| value.field(segment))
    }

    /// Field names in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn scalar(&self) -> Option<Scalar> {
        match self.payload {
            Payload::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.scalar().and_then(Scalar::as_i64)
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.scalar()? {
            Scalar::UInt(u) => Some(u),
            other => other.as_i64().and_then(|i| u64::try_from(i).ok()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.scalar().map(Scalar::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.scalar()? {
            Scalar::Bool(b) => Some(b),
            other => other.as_i64().map(|i| i != 0),
        }
    }

    /// Text payload (strings decode to this when they are valid UTF-8)
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(text) => Some(&text[..]),
            _ => None,
        }
    }

    /// Raw byte payload; text payloads are returned as their UTF-8 bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Bytes(bytes) => Some(&bytes[..]),
            Payload::Text(text) => Some(text.as_bytes()),
            _ => None,
        }
    }

    /// Sequence elements; empty for non-sequence values
    pub fn elements(&self) -> &[ObjectValue] {
        match &self.payload {
            Payload::Array(items) => &items[..],
            _ => &[],
        }
    }

    /// Check if the value holds a sequence
    pub fn is_array(&self) -> bool {
        matches!(self.payload, Payload::Array(_))
    }

    /// Project onto plain nested containers.
    ///
    /// `pair` becomes a two-element array; `map` becomes an object when all
    /// keys are strings, otherwise an array of `[key, value]` pairs; a
    /// `StreamingInfo` whose payload was resolved becomes its bytes.
    pub fn simplify(&self) -> UnityValue {
        if self.type_name == type_names::PAIR {
            if let (Some(first), Some(second)) = (self.field("first"), self.field("second")) {
                return UnityValue::Array(vec![first.simplify(), second.simplify()]);
            }
        }
        if self.type_name == type_names::MAP && self.is_array() {
            return simplify_map(self.elements());
        }
        if self.is_struct {
            if let Payload::Bytes(bytes) = &self.payload {
                return UnityValue::Bytes(bytes.to_vec());
            }
            return UnityValue::Object(
                self.fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.simplify()))
                    .collect(),
            );
        }
        match &self.payload {
            Payload::None => UnityValue::Null,
            Payload::Scalar(scalar) => scalar.simplify(),
            Payload::Array(items) => UnityValue::Array(items.iter().map(Self::simplify).collect()),
            Payload::Bytes(bytes) => UnityValue::Bytes(bytes.to_vec()),
            Payload::Text(text) => UnityValue::String(text.to_string()),
        }
    }
}

fn simplify_map(entries: &[ObjectValue]) -> UnityValue {
    let pairs: Vec<(UnityValue, UnityValue)> = entries
        .iter()
        .map(|entry| {
            let key = entry.field("first").map(ObjectValue::simplify).unwrap_or(UnityValue::Null);
            let value = entry.field("second").map(ObjectValue::simplify).unwrap_or(UnityValue::Null);
            (key, value)
        })
        .collect();

    if pairs.iter().all(|(key, _)| matches!(key, UnityValue::String(_))) {
        let mut object = IndexMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            if let UnityValue::String(key) = key {
                object.insert(key, value);
            }
        }
        UnityValue::Object(object)
    } else {
        UnityValue::Array(
            pairs
                .into_iter()
                .map(|(key, value)| UnityValue::Array(vec![key, value]))
                .collect(),
        )
    }
}
