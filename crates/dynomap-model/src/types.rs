//! Enums and small documents shared by several requests and responses.
//!
//! Enum variants carry their `SCREAMING_SNAKE_CASE` wire spelling through
//! `#[serde(rename)]`.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute_value::{AttributeValue, Item};

/// Type a key attribute is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarAttributeType {
    /// `S`
    S,
    /// `N`
    N,
    /// `B`
    B,
}

impl ScalarAttributeType {
    fn tag(self) -> &'static str {
        match self {
            Self::S => "S",
            Self::N => "N",
            Self::B => "B",
        }
    }

    /// Whether `value` is tagged with this type.
    #[must_use]
    pub fn matches(self, value: &AttributeValue) -> bool {
        value.type_descriptor() == self.tag()
    }
}

impl fmt::Display for ScalarAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Item image a write hands back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReturnValue {
    #[default]
    #[serde(rename = "NONE")]
    None,
    /// The whole item before the write.
    #[serde(rename = "ALL_OLD")]
    AllOld,
    /// Only the touched attributes, before the write.
    #[serde(rename = "UPDATED_OLD")]
    UpdatedOld,
    /// The whole item after the write.
    #[serde(rename = "ALL_NEW")]
    AllNew,
    /// Only the touched attributes, after the write.
    #[serde(rename = "UPDATED_NEW")]
    UpdatedNew,
}

/// Detail level of capacity accounting in a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReturnConsumedCapacity {
    /// Per table and per index.
    #[serde(rename = "INDEXES")]
    Indexes,
    /// A single total.
    #[serde(rename = "TOTAL")]
    Total,
    #[default]
    #[serde(rename = "NONE")]
    None,
}

/// What a `Query` or `Scan` page carries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Select {
    #[default]
    #[serde(rename = "ALL_ATTRIBUTES")]
    AllAttributes,
    /// Whatever the index projects.
    #[serde(rename = "ALL_PROJECTED_ATTRIBUTES")]
    AllProjectedAttributes,
    /// Whatever `ProjectionExpression` names.
    #[serde(rename = "SPECIFIC_ATTRIBUTES")]
    SpecificAttributes,
    /// Counts only; pages come back without items.
    #[serde(rename = "COUNT")]
    Count,
}

/// Capacity one call used, reported on request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsumedCapacity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_units: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_capacity_units: Option<f64>,
}

/// Keys of one table in a `BatchGetItem`, with the read options that apply
/// to all of them. Also the shape of `UnprocessedKeys` in the response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeysAndAttributes {
    pub keys: Vec<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_expression: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub expression_attribute_names: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
}
