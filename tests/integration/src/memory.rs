//! In-memory gateway backed by [`DashMap`].
//!
//! Items are keyed by their rendered primary key. `Query` and `Scan` order
//! items by key the way the store does, honor `Limit`, `ExclusiveStartKey`,
//! `Segment`, and `Select`, and report `LastEvaluatedKey` when a page stops
//! early. Failures and unprocessed batch keys can be injected to exercise the
//! retry paths.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use dashmap::DashMap;
use dynomap_core::Gateway;
use dynomap_core::expression::{UpdateKeyword, parse_update};
use dynomap_model::input::{
    BatchGetItemInput, DeleteItemInput, GetItemInput, PutItemInput, QueryInput, ScanInput,
    UpdateItemInput,
};
use dynomap_model::output::{
    BatchGetItemOutput, DeleteItemOutput, GetItemOutput, PageOutput, PutItemOutput,
    UpdateItemOutput,
};
use dynomap_model::types::{
    ConsumedCapacity, KeysAndAttributes, ReturnConsumedCapacity, ReturnValue, Select,
};
use dynomap_model::{AttributeValue, DynamoDBError, DynamoDBOperation, Item};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::predicate::{self, Aliases};

#[derive(Debug, Clone)]
struct KeyNames {
    hash: String,
    range: Option<String>,
}

impl KeyNames {
    fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash.as_str()).chain(self.range.as_deref())
    }
}

/// A single table held in memory.
pub struct MemoryGateway {
    table: String,
    keys: KeyNames,
    indexes: HashMap<String, KeyNames>,
    items: DashMap<String, Item>,
    faults: Mutex<VecDeque<(DynamoDBOperation, DynamoDBError)>>,
    withheld: AtomicUsize,
    calls: DashMap<DynamoDBOperation, usize>,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MemoryGateway {
    /// An empty table keyed on `hash_key`.
    #[must_use]
    pub fn new(table: &str, hash_key: &str) -> Self {
        Self {
            table: table.to_owned(),
            keys: KeyNames {
                hash: hash_key.to_owned(),
                range: None,
            },
            indexes: HashMap::new(),
            items: DashMap::new(),
            faults: Mutex::new(VecDeque::new()),
            withheld: AtomicUsize::new(0),
            calls: DashMap::new(),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Add a range key to the primary key.
    #[must_use]
    pub fn with_range_key(mut self, range_key: &str) -> Self {
        self.keys.range = Some(range_key.to_owned());
        self
    }

    /// Declare a secondary index.
    #[must_use]
    pub fn with_index(mut self, name: &str, hash_key: &str, range_key: Option<&str>) -> Self {
        self.indexes.insert(
            name.to_owned(),
            KeyNames {
                hash: hash_key.to_owned(),
                range: range_key.map(ToOwned::to_owned),
            },
        );
        self
    }

    /// Store an item directly, bypassing the request path.
    pub fn seed(&self, item: Item) -> Result<(), DynamoDBError> {
        let label = self.label(&item)?;
        self.items.insert(label, item);
        Ok(())
    }

    /// Fail the next request of `operation` with `error`.
    pub fn fail_next(&self, operation: DynamoDBOperation, error: DynamoDBError) {
        self.faults.lock().push_back((operation, error));
    }

    /// Report the next `count` requested batch keys as unprocessed.
    pub fn withhold_batch_keys(&self, count: usize) {
        self.withheld.store(count, AtomicOrdering::SeqCst);
    }

    /// How many requests of `operation` were received.
    #[must_use]
    pub fn calls(&self, operation: DynamoDBOperation) -> usize {
        self.calls.get(&operation).map_or(0, |count| *count)
    }

    /// Number of keys in every `BatchGetItem` request, in arrival order.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().clone()
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn take_fault(&self, operation: DynamoDBOperation) -> Option<DynamoDBError> {
        let mut faults = self.faults.lock();
        let position = faults.iter().position(|(op, _)| *op == operation)?;
        faults.remove(position).map(|(_, error)| error)
    }

    fn label(&self, item: &Item) -> Result<String, DynamoDBError> {
        let mut parts = Vec::with_capacity(2);
        for name in self.keys.names() {
            let value = item.get(name).ok_or_else(|| {
                DynamoDBError::validation(format!("missing key attribute {name}"))
            })?;
            parts.push(
                serde_json::to_string(value)
                    .map_err(|e| DynamoDBError::serialization_exception(e.to_string()))?,
            );
        }
        Ok(parts.join("|"))
    }

    fn key_names(&self, index: Option<&str>) -> Result<&KeyNames, DynamoDBError> {
        match index {
            None => Ok(&self.keys),
            Some(name) => self
                .indexes
                .get(name)
                .ok_or_else(|| DynamoDBError::validation(format!("unknown index {name}"))),
        }
    }

    fn check_table(&self, table: &str) -> Result<(), DynamoDBError> {
        if table == self.table {
            Ok(())
        } else {
            Err(DynamoDBError::resource_not_found(format!(
                "Requested resource not found: Table: {table} not found"
            )))
        }
    }

    fn capacity(&self, level: Option<&ReturnConsumedCapacity>) -> Option<ConsumedCapacity> {
        match level {
            None | Some(ReturnConsumedCapacity::None) => None,
            Some(_) => Some(ConsumedCapacity {
                table_name: Some(self.table.clone()),
                capacity_units: Some(1.0),
                read_capacity_units: None,
            }),
        }
    }

    /// Items in key order of `keys`, then table key order.
    fn ordered(&self, keys: &KeyNames) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .items
            .iter()
            .filter(|entry| entry.value().contains_key(&keys.hash))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| {
            compare_by(a, b, keys.names()).then_with(|| compare_by(a, b, self.keys.names()))
        });
        items
    }

    fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, DynamoDBError> {
        self.check_table(&input.table_name)?;
        let label = self.label(&input.key)?;
        let item = self.items.get(&label).map(|entry| entry.value().clone());
        let item = match item {
            Some(item) => Some(project(
                item,
                input.projection_expression.as_deref(),
                &input.expression_attribute_names,
            )?),
            None => None,
        };
        Ok(GetItemOutput {
            item,
            consumed_capacity: None,
        })
    }

    fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, DynamoDBError> {
        self.check_table(&input.table_name)?;
        let label = self.label(&input.item)?;
        let existing = self.items.get(&label).map(|entry| entry.value().clone());
        check_condition(
            input.condition_expression.as_deref(),
            existing.as_ref(),
            Aliases {
                names: &input.expression_attribute_names,
                values: &input.expression_attribute_values,
            },
        )?;
        self.items.insert(label, input.item);
        let attributes = match (input.return_values, existing) {
            (Some(ReturnValue::AllOld), Some(old)) => old,
            _ => Item::new(),
        };
        Ok(PutItemOutput { attributes })
    }

    fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, DynamoDBError> {
        self.check_table(&input.table_name)?;
        let label = self.label(&input.key)?;
        let existing = self.items.get(&label).map(|entry| entry.value().clone());
        check_condition(
            input.condition_expression.as_deref(),
            existing.as_ref(),
            Aliases {
                names: &input.expression_attribute_names,
                values: &input.expression_attribute_values,
            },
        )?;
        let removed = self.items.remove(&label).map(|(_, item)| item);
        let attributes = match (input.return_values, removed) {
            (Some(ReturnValue::AllOld), Some(old)) => old,
            _ => Item::new(),
        };
        Ok(DeleteItemOutput { attributes })
    }

    fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, DynamoDBError> {
        self.check_table(&input.table_name)?;
        let label = self.label(&input.key)?;
        let aliases = Aliases {
            names: &input.expression_attribute_names,
            values: &input.expression_attribute_values,
        };
        let existing = self.items.get(&label).map(|entry| entry.value().clone());
        check_condition(input.condition_expression.as_deref(), existing.as_ref(), aliases)?;

        let mut updated = existing.clone().unwrap_or_else(|| input.key.clone());
        let touched = match input.update_expression.as_deref() {
            Some(expression) => apply_update(&mut updated, expression, aliases)?,
            None => Vec::new(),
        };
        self.items.insert(label, updated.clone());

        let attributes = match input.return_values {
            Some(ReturnValue::AllNew) => updated,
            Some(ReturnValue::AllOld) => existing.unwrap_or_default(),
            Some(ReturnValue::UpdatedNew) => pick(&updated, &touched),
            Some(ReturnValue::UpdatedOld) => pick(&existing.unwrap_or_default(), &touched),
            Some(ReturnValue::None) | None => Item::new(),
        };
        Ok(UpdateItemOutput { attributes })
    }

    fn query(&self, input: QueryInput) -> Result<PageOutput, DynamoDBError> {
        self.check_table(&input.table_name)?;
        let keys = self.key_names(input.index_name.as_deref())?.clone();
        let aliases = Aliases {
            names: &input.expression_attribute_names,
            values: &input.expression_attribute_values,
        };
        if input.key_condition_expression.is_none() {
            return Err(DynamoDBError::validation(
                "Query requires a KeyConditionExpression",
            ));
        }

        let mut candidates = Vec::new();
        for item in self.ordered(&keys) {
            if predicate::matches(input.key_condition_expression.as_deref(), &item, aliases)? {
                candidates.push(item);
            }
        }
        if input.scan_index_forward == Some(false) {
            candidates.reverse();
        }

        self.page(
            candidates,
            &keys,
            &PageRequest {
                start: input.exclusive_start_key.as_ref(),
                limit: input.limit,
                filter: input.filter_expression.as_deref(),
                projection: input.projection_expression.as_deref(),
                select: input.select.as_ref(),
                capacity: input.return_consumed_capacity.as_ref(),
            },
            aliases,
        )
    }

    fn scan(&self, input: ScanInput) -> Result<PageOutput, DynamoDBError> {
        self.check_table(&input.table_name)?;
        let keys = self.key_names(input.index_name.as_deref())?.clone();
        let aliases = Aliases {
            names: &input.expression_attribute_names,
            values: &input.expression_attribute_values,
        };

        let mut candidates = self.ordered(&keys);
        if let (Some(segment), Some(total)) = (input.segment, input.total_segments) {
            let (segment, total) = (to_usize(segment), to_usize(total).max(1));
            candidates = candidates
                .into_iter()
                .enumerate()
                .filter(|(i, _)| i % total == segment)
                .map(|(_, item)| item)
                .collect();
        }

        self.page(
            candidates,
            &keys,
            &PageRequest {
                start: input.exclusive_start_key.as_ref(),
                limit: input.limit,
                filter: input.filter_expression.as_deref(),
                projection: input.projection_expression.as_deref(),
                select: input.select.as_ref(),
                capacity: input.return_consumed_capacity.as_ref(),
            },
            aliases,
        )
    }

    fn page(
        &self,
        candidates: Vec<Item>,
        keys: &KeyNames,
        request: &PageRequest<'_>,
        aliases: Aliases<'_>,
    ) -> Result<PageOutput, DynamoDBError> {
        let start = request.start.map_or(0, |start| {
            candidates
                .iter()
                .position(|item| start.iter().all(|(k, v)| item.get(k) == Some(v)))
                .map_or(0, |i| i + 1)
        });
        let limit = request.limit.map_or(usize::MAX, to_usize);
        let evaluated: Vec<&Item> = candidates.iter().skip(start).take(limit).collect();
        let has_more = start.saturating_add(limit) < candidates.len();

        let last_evaluated_key = if has_more {
            evaluated.last().map(|item| {
                keys.names()
                    .chain(self.keys.names())
                    .filter_map(|name| item.get(name).map(|v| (name.to_owned(), v.clone())))
                    .collect::<Item>()
            })
        } else {
            None
        };

        let mut items = Vec::new();
        for item in &evaluated {
            if predicate::matches(request.filter, item, aliases)? {
                items.push(project((*item).clone(), request.projection, aliases.names)?);
            }
        }
        let count = i64::try_from(items.len()).unwrap_or(i64::MAX);
        if request.select == Some(&Select::Count) {
            items.clear();
        }

        Ok(PageOutput {
            items,
            count,
            scanned_count: i64::try_from(evaluated.len()).unwrap_or(i64::MAX),
            last_evaluated_key,
            consumed_capacity: self.capacity(request.capacity),
        })
    }

    fn batch_get_item(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, DynamoDBError> {
        let mut output = BatchGetItemOutput::default();
        for (table, request) in input.request_items {
            self.check_table(&table)?;
            self.batch_sizes.lock().push(request.keys.len());

            let withhold = self
                .withheld
                .fetch_update(AtomicOrdering::SeqCst, AtomicOrdering::SeqCst, |left| {
                    Some(left.saturating_sub(request.keys.len()))
                })
                .map_or(0, |left| left.min(request.keys.len()));
            let served = request.keys.len() - withhold;

            let mut found = Vec::new();
            for key in &request.keys[..served] {
                let label = self.label(key)?;
                if let Some(item) = self.items.get(&label) {
                    found.push(project(
                        item.value().clone(),
                        request.projection_expression.as_deref(),
                        &request.expression_attribute_names,
                    )?);
                }
            }
            if withhold > 0 {
                output.unprocessed_keys.insert(
                    table.clone(),
                    KeysAndAttributes {
                        keys: request.keys[served..].to_vec(),
                        ..request.clone()
                    },
                );
            }
            if let Some(capacity) = self.capacity(input.return_consumed_capacity.as_ref()) {
                output.consumed_capacity.push(capacity);
            }
            output.responses.insert(table, found);
        }
        Ok(output)
    }
}

struct PageRequest<'a> {
    start: Option<&'a Item>,
    limit: Option<i32>,
    filter: Option<&'a str>,
    projection: Option<&'a str>,
    select: Option<&'a Select>,
    capacity: Option<&'a ReturnConsumedCapacity>,
}

impl fmt::Debug for MemoryGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryGateway")
            .field("table", &self.table)
            .field("keys", &self.keys)
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    fn table_name(&self) -> &str {
        &self.table
    }

    async fn send_request(
        &self,
        operation: DynamoDBOperation,
        request: Value,
    ) -> Result<Value, DynamoDBError> {
        *self.calls.entry(operation).or_insert(0) += 1;
        if let Some(error) = self.take_fault(operation) {
            debug!(%operation, code = %error.code, "injected failure");
            return Err(error);
        }
        match operation {
            DynamoDBOperation::GetItem => handle(request, |input| self.get_item(input)),
            DynamoDBOperation::PutItem => handle(request, |input| self.put_item(input)),
            DynamoDBOperation::UpdateItem => handle(request, |input| self.update_item(input)),
            DynamoDBOperation::DeleteItem => handle(request, |input| self.delete_item(input)),
            DynamoDBOperation::Query => handle(request, |input| self.query(input)),
            DynamoDBOperation::Scan => handle(request, |input| self.scan(input)),
            DynamoDBOperation::BatchGetItem => handle(request, |input| self.batch_get_item(input)),
        }
    }
}

fn handle<I, O, F>(request: Value, f: F) -> Result<Value, DynamoDBError>
where
    I: DeserializeOwned,
    O: Serialize,
    F: FnOnce(I) -> Result<O, DynamoDBError>,
{
    let input = serde_json::from_value(request)
        .map_err(|e| DynamoDBError::serialization_exception(e.to_string()))?;
    let output = f(input)?;
    serde_json::to_value(output).map_err(|e| DynamoDBError::internal_error(e.to_string()))
}

fn check_condition(
    condition: Option<&str>,
    existing: Option<&Item>,
    aliases: Aliases<'_>,
) -> Result<(), DynamoDBError> {
    let empty = Item::new();
    if predicate::matches(condition, existing.unwrap_or(&empty), aliases)? {
        Ok(())
    } else {
        Err(DynamoDBError::conditional_check_failed(
            "The conditional request failed",
        ))
    }
}

fn compare_by<'n>(a: &Item, b: &Item, names: impl Iterator<Item = &'n str>) -> Ordering {
    for name in names {
        let ordering = match (a.get(name), b.get(name)) {
            (Some(x), Some(y)) => predicate::compare(x, y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn project(
    item: Item,
    projection: Option<&str>,
    names: &HashMap<String, String>,
) -> Result<Item, DynamoDBError> {
    let Some(projection) = projection else {
        return Ok(item);
    };
    let values = HashMap::new();
    let aliases = Aliases {
        names,
        values: &values,
    };
    let mut kept = Item::new();
    for path in projection.split(',') {
        let path = aliases.path(path)?;
        if let Some(top) = path.first() {
            if let Some(value) = item.get(top) {
                kept.insert(top.clone(), value.clone());
            }
        }
    }
    Ok(kept)
}

fn pick(item: &Item, names: &[String]) -> Item {
    names
        .iter()
        .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

/// Apply an update expression, returning the touched attribute names.
fn apply_update(
    item: &mut Item,
    expression: &str,
    aliases: Aliases<'_>,
) -> Result<Vec<String>, DynamoDBError> {
    let parsed = parse_update(expression).map_err(|e| DynamoDBError::validation(e.to_string()))?;
    let mut touched = Vec::new();

    for keyword in UpdateKeyword::ALL {
        for action in parsed.bucket(keyword) {
            let (path, operand) = match keyword {
                UpdateKeyword::Set => action
                    .split_once('=')
                    .map(|(p, v)| (p.trim(), Some(v.trim())))
                    .ok_or_else(|| DynamoDBError::validation(format!("malformed SET {action}")))?,
                UpdateKeyword::Remove => (action.trim(), None),
                UpdateKeyword::Add | UpdateKeyword::Delete => action
                    .trim()
                    .split_once(' ')
                    .map(|(p, v)| (p, Some(v.trim())))
                    .ok_or_else(|| {
                        DynamoDBError::validation(format!("malformed {keyword} {action}"))
                    })?,
            };
            let name = top_level(aliases, path)?;
            let operand = operand
                .map(|alias| {
                    aliases.values.get(alias).cloned().ok_or_else(|| {
                        DynamoDBError::validation(format!("undefined value alias {alias}"))
                    })
                })
                .transpose()?;

            match (keyword, operand) {
                (UpdateKeyword::Set, Some(value)) => {
                    item.insert(name.clone(), value);
                }
                (UpdateKeyword::Remove, _) => {
                    item.remove(&name);
                }
                (UpdateKeyword::Add, Some(value)) => {
                    let merged = match item.remove(&name) {
                        Some(current) => add(current, value)?,
                        None => value,
                    };
                    item.insert(name.clone(), merged);
                }
                (UpdateKeyword::Delete, Some(value)) => {
                    if let Some(current) = item.remove(&name) {
                        if let Some(left) = subtract(current, &value) {
                            item.insert(name.clone(), left);
                        }
                    }
                }
                _ => {}
            }
            touched.push(name);
        }
    }
    Ok(touched)
}

fn top_level(aliases: Aliases<'_>, path: &str) -> Result<String, DynamoDBError> {
    let mut segments = aliases.path(path)?;
    if segments.len() != 1 {
        return Err(DynamoDBError::validation(format!(
            "nested update paths are not supported: {path}"
        )));
    }
    Ok(segments.remove(0))
}

fn add(current: AttributeValue, value: AttributeValue) -> Result<AttributeValue, DynamoDBError> {
    match (current, value) {
        (AttributeValue::N(a), AttributeValue::N(b)) => Ok(AttributeValue::N(add_numbers(&a, &b)?)),
        (AttributeValue::Ss(mut a), AttributeValue::Ss(b)) => {
            a.extend(b.into_iter().filter(|v| !a.contains(v)).collect::<Vec<_>>());
            Ok(AttributeValue::Ss(a))
        }
        (AttributeValue::Ns(mut a), AttributeValue::Ns(b)) => {
            a.extend(b.into_iter().filter(|v| !a.contains(v)).collect::<Vec<_>>());
            Ok(AttributeValue::Ns(a))
        }
        (current, value) => Err(DynamoDBError::validation(format!(
            "ADD cannot combine {} with {}",
            current.type_descriptor(),
            value.type_descriptor()
        ))),
    }
}

fn add_numbers(a: &str, b: &str) -> Result<String, DynamoDBError> {
    if let (Ok(a), Ok(b)) = (a.parse::<i128>(), b.parse::<i128>()) {
        return Ok((a + b).to_string());
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a), Ok(b)) => Ok((a + b).to_string()),
        _ => Err(DynamoDBError::validation(format!("invalid numbers {a}, {b}"))),
    }
}

fn subtract(current: AttributeValue, value: &AttributeValue) -> Option<AttributeValue> {
    let left = match (current, value) {
        (AttributeValue::Ss(a), AttributeValue::Ss(b)) => {
            AttributeValue::Ss(a.into_iter().filter(|v| !b.contains(v)).collect())
        }
        (AttributeValue::Ns(a), AttributeValue::Ns(b)) => {
            AttributeValue::Ns(a.into_iter().filter(|v| !b.contains(v)).collect())
        }
        (current, _) => return Some(current),
    };
    match &left {
        AttributeValue::Ss(v) | AttributeValue::Ns(v) if v.is_empty() => None,
        _ => Some(left),
    }
}

fn to_usize(value: i32) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn gateway() -> MemoryGateway {
        let gateway = MemoryGateway::new("events", "user").with_range_key("ts");
        for (user, ts) in [("u1", 3), ("u1", 1), ("u2", 5), ("u1", 2)] {
            let mut item = Item::new();
            item.insert("user".to_owned(), user.into());
            item.insert("ts".to_owned(), i64::from(ts).into());
            gateway.seed(item).unwrap();
        }
        gateway
    }

    #[tokio::test]
    async fn test_should_page_query_in_range_order() {
        let gateway = gateway();
        let request = json!({
            "TableName": "events",
            "KeyConditionExpression": "(#user = :user)",
            "ExpressionAttributeNames": {"#user": "user"},
            "ExpressionAttributeValues": {":user": {"S": "u1"}},
            "Limit": 2
        });
        let page = gateway
            .send_request(DynamoDBOperation::Query, request)
            .await
            .unwrap();
        assert_eq!(page["Count"], 2);
        assert_eq!(page["Items"][0]["ts"], json!({"N": "1"}));
        assert_eq!(
            page["LastEvaluatedKey"],
            json!({"user": {"S": "u1"}, "ts": {"N": "2"}})
        );
    }

    #[tokio::test]
    async fn test_should_serve_injected_failure_once() {
        let gateway = gateway();
        gateway.fail_next(
            DynamoDBOperation::Scan,
            DynamoDBError::throughput_exceeded("slow down"),
        );
        let request = json!({"TableName": "events"});
        let err = gateway
            .send_request(DynamoDBOperation::Scan, request.clone())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        let page = gateway
            .send_request(DynamoDBOperation::Scan, request)
            .await
            .unwrap();
        assert_eq!(page["Count"], 4);
        assert_eq!(gateway.calls(DynamoDBOperation::Scan), 2);
    }

    #[test]
    fn test_should_apply_update_buckets() {
        let mut item = Item::new();
        item.insert("visits".to_owned(), 1_i64.into());
        item.insert("old".to_owned(), true.into());
        let names: HashMap<String, String> = [("#visits", "visits"), ("#old", "old"), ("#tags", "tags")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        let values: HashMap<String, AttributeValue> = [
            (":one".to_owned(), AttributeValue::from(1_i64)),
            (":tags".to_owned(), AttributeValue::Ss(vec!["x".to_owned()])),
        ]
        .into_iter()
        .collect();
        let touched = apply_update(
            &mut item,
            "ADD #visits :one, #tags :tags REMOVE #old",
            Aliases {
                names: &names,
                values: &values,
            },
        )
        .unwrap();
        assert_eq!(touched, vec!["visits", "tags", "old"]);
        assert_eq!(item.get("visits"), Some(&AttributeValue::N("2".to_owned())));
        assert!(!item.contains_key("old"));
    }
}
