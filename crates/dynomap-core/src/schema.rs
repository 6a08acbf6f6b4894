//! Table schema capability.
//!
//! The engines only need key names, declared key types, index keys, and the
//! default/validation hooks. [`TableSchema`] is a ready-made implementation
//! built with [`TableSchemaBuilder`].

use std::collections::HashMap;
use std::fmt;

use dynomap_model::types::ScalarAttributeType;
use dynomap_model::{AttributeValue, Item};

use crate::error::{MapperError, MapperResult};

/// Key attributes of a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeys {
    /// Partition key attribute of the index.
    pub hash_key: String,
    /// Sort key attribute of the index, if any.
    pub range_key: Option<String>,
}

/// What a table handle needs to know about its items.
pub trait Schema: Send + Sync + fmt::Debug {
    /// The partition key attribute.
    fn hash_key(&self) -> &str;

    /// The sort key attribute, if the table has one.
    fn range_key(&self) -> Option<&str>;

    /// Declared wire type of an attribute.
    fn attribute_type(&self, name: &str) -> Option<ScalarAttributeType>;

    /// Key attributes of a secondary index.
    fn index_keys(&self, index: &str) -> Option<IndexKeys>;

    /// Fill in default values before an item is written.
    fn apply_defaults(&self, item: Item) -> Item {
        item
    }

    /// Reject an item before it is written.
    fn validate(&self, _item: &Item) -> MapperResult<()> {
        Ok(())
    }

    /// Whether `name` is the hash or range key of the table.
    fn is_key_attribute(&self, name: &str) -> bool {
        self.hash_key() == name || self.range_key() == Some(name)
    }

    /// Build a primary key map, checking values against the declared key types.
    fn build_key(
        &self,
        hash: &AttributeValue,
        range: Option<&AttributeValue>,
    ) -> MapperResult<Item> {
        let mut key = Item::with_capacity(2);
        check_type(self, self.hash_key(), hash)?;
        key.insert(self.hash_key().to_owned(), hash.clone());

        match (self.range_key(), range) {
            (Some(name), Some(value)) => {
                check_type(self, name, value)?;
                key.insert(name.to_owned(), value.clone());
            }
            (Some(name), None) => {
                return Err(MapperError::validation(format!(
                    "missing range key '{name}'"
                )));
            }
            (None, Some(_)) => {
                return Err(MapperError::validation(format!(
                    "table keyed on '{}' has no range key",
                    self.hash_key()
                )));
            }
            (None, None) => {}
        }
        Ok(key)
    }

    /// Extract the primary key from a full item.
    fn key_from_item(&self, item: &Item) -> MapperResult<Item> {
        let hash = item.get(self.hash_key()).ok_or_else(|| {
            MapperError::validation(format!("missing hash key '{}'", self.hash_key()))
        })?;
        let range = match self.range_key() {
            Some(name) => Some(
                item.get(name)
                    .ok_or_else(|| MapperError::validation(format!("missing range key '{name}'")))?,
            ),
            None => None,
        };
        self.build_key(hash, range)
    }
}

fn check_type<S: Schema + ?Sized>(
    schema: &S,
    name: &str,
    value: &AttributeValue,
) -> MapperResult<()> {
    match schema.attribute_type(name) {
        Some(expected) if !expected.matches(value) => Err(MapperError::validation(format!(
            "key '{name}' must be of type {expected}, got {}",
            value.type_descriptor()
        ))),
        _ => Ok(()),
    }
}

/// Declarative schema for one table.
#[derive(Debug, Clone)]
pub struct TableSchema {
    hash_key: String,
    range_key: Option<String>,
    attributes: HashMap<String, ScalarAttributeType>,
    indexes: HashMap<String, IndexKeys>,
    defaults: Item,
    required: Vec<String>,
}

impl TableSchema {
    /// Start a schema keyed on `hash_key`.
    #[must_use]
    pub fn builder(hash_key: impl Into<String>, key_type: ScalarAttributeType) -> TableSchemaBuilder {
        let hash_key = hash_key.into();
        let mut attributes = HashMap::new();
        attributes.insert(hash_key.clone(), key_type);
        TableSchemaBuilder {
            schema: Self {
                hash_key,
                range_key: None,
                attributes,
                indexes: HashMap::new(),
                defaults: Item::new(),
                required: Vec::new(),
            },
        }
    }
}

impl Schema for TableSchema {
    fn hash_key(&self) -> &str {
        &self.hash_key
    }

    fn range_key(&self) -> Option<&str> {
        self.range_key.as_deref()
    }

    fn attribute_type(&self, name: &str) -> Option<ScalarAttributeType> {
        self.attributes.get(name).copied()
    }

    fn index_keys(&self, index: &str) -> Option<IndexKeys> {
        self.indexes.get(index).cloned()
    }

    fn apply_defaults(&self, mut item: Item) -> Item {
        for (name, value) in &self.defaults {
            item.entry(name.clone()).or_insert_with(|| value.clone());
        }
        item
    }

    fn validate(&self, item: &Item) -> MapperResult<()> {
        self.key_from_item(item)?;
        for name in &self.required {
            if item.get(name).is_none_or(AttributeValue::is_null) {
                return Err(MapperError::validation(format!(
                    "attribute '{name}' is required"
                )));
            }
        }
        for (name, value) in item {
            if let Some(expected) = self.attributes.get(name) {
                if !value.is_null() && !expected.matches(value) {
                    return Err(MapperError::validation(format!(
                        "attribute '{name}' must be of type {expected}, got {}",
                        value.type_descriptor()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`TableSchema`].
#[derive(Debug)]
pub struct TableSchemaBuilder {
    schema: TableSchema,
}

impl TableSchemaBuilder {
    /// Declare the sort key.
    #[must_use]
    pub fn range_key(mut self, name: impl Into<String>, key_type: ScalarAttributeType) -> Self {
        let name = name.into();
        self.schema.attributes.insert(name.clone(), key_type);
        self.schema.range_key = Some(name);
        self
    }

    /// Declare the type of a non-key attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, attr_type: ScalarAttributeType) -> Self {
        self.schema.attributes.insert(name.into(), attr_type);
        self
    }

    /// Declare a secondary index.
    #[must_use]
    pub fn index(
        mut self,
        name: impl Into<String>,
        hash_key: impl Into<String>,
        range_key: Option<&str>,
    ) -> Self {
        self.schema.indexes.insert(
            name.into(),
            IndexKeys {
                hash_key: hash_key.into(),
                range_key: range_key.map(str::to_owned),
            },
        );
        self
    }

    /// Value written when an item omits the attribute.
    #[must_use]
    pub fn default_value(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.schema.defaults.insert(name.into(), value.into());
        self
    }

    /// Reject items that omit the attribute.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.schema.required.push(name.into());
        self
    }

    /// Finish the schema.
    #[must_use]
    pub fn build(self) -> TableSchema {
        self.schema
    }
}
