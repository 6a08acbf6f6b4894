//! DynamoDB response documents.
//!
//! Stores frequently omit fields, so every collection defaults to empty and
//! every scalar is optional.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::attribute_value::Item;
use crate::types::{ConsumedCapacity, KeysAndAttributes};

// ---------------------------------------------------------------------------
// Item CRUD
// ---------------------------------------------------------------------------

/// Output for the `GetItem` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    /// The item, absent when no item matched the key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,

    /// The capacity units consumed by the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<ConsumedCapacity>,
}

/// Output for the `PutItem` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemOutput {
    /// The attribute values as they appeared before the put, when requested.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: Item,
}

/// Output for the `UpdateItem` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemOutput {
    /// The attribute values selected by `ReturnValues`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: Item,
}

/// Output for the `DeleteItem` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemOutput {
    /// The attribute values as they appeared before the delete, when requested.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: Item,
}

// ---------------------------------------------------------------------------
// Query & Scan
// ---------------------------------------------------------------------------

/// One page returned by `Query` or `Scan`.
///
/// Both operations share the same response shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageOutput {
    /// The items matching the request.
    #[serde(default)]
    pub items: Vec<Item>,

    /// The number of items in the response.
    #[serde(default)]
    pub count: i64,

    /// The number of items evaluated before any filter was applied.
    #[serde(default)]
    pub scanned_count: i64,

    /// The primary key of the item where the operation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_key: Option<Item>,

    /// The capacity units consumed by the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<ConsumedCapacity>,
}

impl PageOutput {
    /// The continuation cursor, treating an empty key map as no cursor.
    #[must_use]
    pub fn cursor(&self) -> Option<&Item> {
        self.last_evaluated_key.as_ref().filter(|key| !key.is_empty())
    }
}

/// Output for the `Query` operation.
pub type QueryOutput = PageOutput;

/// Output for the `Scan` operation.
pub type ScanOutput = PageOutput;

// ---------------------------------------------------------------------------
// Batch operations
// ---------------------------------------------------------------------------

/// Output for the `BatchGetItem` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchGetItemOutput {
    /// A map of table name to the list of items retrieved.
    #[serde(default)]
    pub responses: HashMap<String, Vec<Item>>,

    /// Keys that were not processed, keyed by table name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub unprocessed_keys: HashMap<String, KeysAndAttributes>,

    /// The capacity units consumed, one entry per table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumed_capacity: Vec<ConsumedCapacity>,
}
