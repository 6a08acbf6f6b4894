//! Items returned to callers.

use dynomap_model::{AttributeValue, Item};

/// One stored item, as handed back by table operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    item: Item,
}

impl Record {
    /// Wrap a raw item. Used as the default factory for reads.
    #[must_use]
    pub fn from_item(item: Item) -> Self {
        Self { item }
    }

    /// Attribute value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.item.get(name)
    }

    /// Replace an attribute value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.item.insert(name.into(), value.into());
    }

    /// Drop an attribute, returning its old value.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.item.remove(name)
    }

    /// The underlying item.
    #[must_use]
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Consume the record, returning the underlying item.
    #[must_use]
    pub fn into_item(self) -> Item {
        self.item
    }

    /// Plain JSON object view of the item.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .item
            .iter()
            .map(|(k, v)| (k.clone(), v.to_plain_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl From<Item> for Record {
    fn from(item: Item) -> Self {
        Self::from_item(item)
    }
}

impl From<Record> for Item {
    fn from(record: Record) -> Self {
        record.item
    }
}
