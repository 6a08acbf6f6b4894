//! Typed attribute values and their tagged JSON form.
//!
//! On the wire a value is an object with a single type tag, `{"N": "42"}`.
//! Numbers travel as strings so no precision is lost, binary travels as
//! standard base64.

use std::collections::HashMap;
use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A stored item: attribute name to attribute value.
pub type Item = HashMap<String, AttributeValue>;

const TAGS: &[&str] = &["S", "N", "B", "SS", "NS", "BS", "BOOL", "NULL", "L", "M"];

/// One attribute of an item.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    S(String),
    /// Decimal text, kept verbatim.
    N(String),
    B(Bytes),
    Ss(Vec<String>),
    Ns(Vec<String>),
    Bs(Vec<Bytes>),
    Bool(bool),
    /// Always `true` when produced by the store.
    Null(bool),
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// `NULL: true`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(true))
    }

    /// The empty string cannot be stored as a non-key attribute.
    #[must_use]
    pub fn is_empty_string(&self) -> bool {
        matches!(self, Self::S(s) if s.is_empty())
    }

    #[must_use]
    pub fn as_s(&self) -> Option<&str> {
        if let Self::S(s) = self { Some(s) } else { None }
    }

    #[must_use]
    pub fn as_n(&self) -> Option<&str> {
        if let Self::N(n) = self { Some(n) } else { None }
    }

    /// The wire tag of this value, which is also its JSON key.
    #[must_use]
    pub fn type_descriptor(&self) -> &'static str {
        let index = match self {
            Self::S(_) => 0,
            Self::N(_) => 1,
            Self::B(_) => 2,
            Self::Ss(_) => 3,
            Self::Ns(_) => 4,
            Self::Bs(_) => 5,
            Self::Bool(_) => 6,
            Self::Null(_) => 7,
            Self::L(_) => 8,
            Self::M(_) => 9,
        };
        TAGS[index]
    }

    /// Convert into plain JSON, dropping the type tags.
    ///
    /// Numbers become JSON numbers when they parse as `i64` or finite `f64`
    /// and stay strings otherwise. Binary values become base64 strings.
    #[must_use]
    pub fn to_plain_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            Self::S(s) => Value::String(s.clone()),
            Self::N(n) => number_to_json(n),
            Self::B(b) => Value::String(BASE64.encode(b)),
            Self::Ss(v) => Value::Array(v.iter().cloned().map(Value::String).collect()),
            Self::Ns(v) => Value::Array(v.iter().map(|n| number_to_json(n)).collect()),
            Self::Bs(v) => Value::Array(v.iter().map(|b| Value::String(BASE64.encode(b))).collect()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Null(_) => Value::Null,
            Self::L(v) => Value::Array(v.iter().map(Self::to_plain_json).collect()),
            Self::M(m) => Value::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), v.to_plain_json()))
                    .collect(),
            ),
        }
    }
}

fn number_to_json(n: &str) -> serde_json::Value {
    if let Ok(i) = n.parse::<i64>() {
        return serde_json::Value::from(i);
    }
    n.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(
            || serde_json::Value::String(n.to_owned()),
            serde_json::Value::Number,
        )
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::S(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Bytes> for AttributeValue {
    fn from(value: Bytes) -> Self {
        Self::B(value)
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        Self::L(value)
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    Self::N(value.to_string())
                }
            }
        )*
    };
}

number_from!(i32, i64, u64, f64);

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tag = self.type_descriptor();
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::S(text) | Self::N(text) => map.serialize_entry(tag, text)?,
            Self::B(b) => map.serialize_entry(tag, &BASE64.encode(b))?,
            Self::Ss(set) | Self::Ns(set) => map.serialize_entry(tag, set)?,
            Self::Bs(set) => {
                let encoded: Vec<String> = set.iter().map(|b| BASE64.encode(b)).collect();
                map.serialize_entry(tag, &encoded)?;
            }
            Self::Bool(flag) | Self::Null(flag) => map.serialize_entry(tag, flag)?,
            Self::L(list) => map.serialize_entry(tag, list)?,
            Self::M(m) => map.serialize_entry(tag, m)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TaggedValue)
    }
}

fn decode_binary<E: de::Error>(encoded: &str) -> Result<Bytes, E> {
    BASE64.decode(encoded).map(Bytes::from).map_err(E::custom)
}

struct TaggedValue;

impl<'de> Visitor<'de> for TaggedValue {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an object with exactly one attribute type tag")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let tag: String = map
            .next_key()?
            .ok_or_else(|| <M::Error as de::Error>::invalid_length(0, &self))?;

        let value = match tag.as_str() {
            "S" => AttributeValue::S(map.next_value()?),
            "N" => AttributeValue::N(map.next_value()?),
            "B" => AttributeValue::B(decode_binary::<M::Error>(&map.next_value::<String>()?)?),
            "SS" => AttributeValue::Ss(map.next_value()?),
            "NS" => AttributeValue::Ns(map.next_value()?),
            "BS" => AttributeValue::Bs(
                map.next_value::<Vec<String>>()?
                    .iter()
                    .map(|encoded| decode_binary(encoded))
                    .collect::<Result<_, M::Error>>()?,
            ),
            "BOOL" => AttributeValue::Bool(map.next_value()?),
            "NULL" => AttributeValue::Null(map.next_value()?),
            "L" => AttributeValue::L(map.next_value()?),
            "M" => AttributeValue::M(map.next_value()?),
            other => return Err(de::Error::unknown_field(other, TAGS)),
        };

        if map.next_key::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(2, &self));
        }
        Ok(value)
    }
}
