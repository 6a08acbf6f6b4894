//! Batched-key reads.
//!
//! Keys are split into buckets of at most [`BATCH_GET_BUCKET_SIZE`], buckets
//! run with bounded concurrency, and each bucket keeps re-requesting its
//! `UnprocessedKeys` until the store has answered for every key.

use std::collections::HashMap;
use std::sync::Arc;

use dynomap_model::input::BatchGetItemInput;
use dynomap_model::output::BatchGetItemOutput;
use dynomap_model::types::{KeysAndAttributes, ReturnConsumedCapacity};
use dynomap_model::{AttributeValue, DynamoDBOperation, Item};
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, warn};

use crate::config::BATCH_GET_BUCKET_SIZE;
use crate::error::MapperResult;
use crate::expression::compile_projection;
use crate::gateway::{Gateway, decode, encode};
use crate::schema::Schema;

/// A primary key as given by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyInput {
    /// Hash key only.
    Hash(AttributeValue),
    /// Hash and range key.
    Composite {
        /// Hash key value.
        hash: AttributeValue,
        /// Range key value.
        range: AttributeValue,
    },
}

impl KeyInput {
    /// Serialize through the schema's key builder.
    pub fn to_key(&self, schema: &dyn Schema) -> MapperResult<Item> {
        match self {
            Self::Hash(hash) => schema.build_key(hash, None),
            Self::Composite { hash, range } => schema.build_key(hash, Some(range)),
        }
    }
}

impl From<AttributeValue> for KeyInput {
    fn from(hash: AttributeValue) -> Self {
        Self::Hash(hash)
    }
}

impl From<&str> for KeyInput {
    fn from(hash: &str) -> Self {
        Self::Hash(hash.into())
    }
}

impl From<String> for KeyInput {
    fn from(hash: String) -> Self {
        Self::Hash(hash.into())
    }
}

impl<H: Into<AttributeValue>, R: Into<AttributeValue>> From<(H, R)> for KeyInput {
    fn from((hash, range): (H, R)) -> Self {
        Self::Composite {
            hash: hash.into(),
            range: range.into(),
        }
    }
}

/// Read options applied to every bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchGetOptions {
    /// Use strongly consistent reads.
    pub consistent_read: Option<bool>,
    /// Attributes to project; all attributes when `None`.
    pub attributes: Option<Vec<String>>,
    /// Level of consumed-capacity detail to request.
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

impl BatchGetOptions {
    fn template(&self) -> MapperResult<KeysAndAttributes> {
        let mut template = KeysAndAttributes {
            consistent_read: self.consistent_read,
            ..KeysAndAttributes::default()
        };
        if let Some(attributes) = &self.attributes {
            let clause = compile_projection(attributes, &HashMap::new())?;
            template.projection_expression = Some(clause.statement);
            template.expression_attribute_names = clause.attribute_names;
        }
        Ok(template)
    }
}

/// Fetch every key, handing each returned item to `factory`.
///
/// Neither `keys` nor `options` is modified. No correspondence between the
/// order of `keys` and the order of the result is guaranteed.
pub async fn get_items<T, F>(
    gateway: &Arc<dyn Gateway>,
    schema: &dyn Schema,
    keys: &[KeyInput],
    options: &BatchGetOptions,
    concurrency: usize,
    factory: F,
) -> MapperResult<Vec<T>>
where
    F: Fn(Item) -> T,
{
    let serialized = keys
        .iter()
        .map(|key| key.to_key(schema))
        .collect::<MapperResult<Vec<_>>>()?;
    if serialized.is_empty() {
        return Ok(Vec::new());
    }

    let template = options.template()?;
    let buckets: Vec<Vec<Item>> = serialized
        .chunks(BATCH_GET_BUCKET_SIZE)
        .map(<[Item]>::to_vec)
        .collect();
    let concurrency = concurrency.clamp(1, buckets.len());
    debug!(
        table = gateway.table_name(),
        keys = serialized.len(),
        buckets = buckets.len(),
        concurrency,
        "batch get"
    );

    let items = stream::iter(buckets.into_iter().map(|bucket| {
        fetch_bucket(
            gateway,
            &template,
            options.return_consumed_capacity.clone(),
            bucket,
        )
    }))
    .buffer_unordered(concurrency)
    .try_fold(Vec::new(), |mut acc, items| async move {
        acc.extend(items);
        Ok(acc)
    })
    .await?;

    Ok(items.into_iter().map(factory).collect())
}

/// Run one bucket to completion, following `UnprocessedKeys`.
async fn fetch_bucket(
    gateway: &Arc<dyn Gateway>,
    template: &KeysAndAttributes,
    return_consumed_capacity: Option<ReturnConsumedCapacity>,
    keys: Vec<Item>,
) -> MapperResult<Vec<Item>> {
    let table = gateway.table_name().to_owned();
    let mut items = Vec::new();
    let mut pending = keys;
    let mut round = 0_usize;

    while !pending.is_empty() {
        debug!(table = %table, round, keys = pending.len(), "batch get bucket");
        // Caller options apply to every round, not only the first.
        let input = BatchGetItemInput {
            request_items: HashMap::from([(
                table.clone(),
                KeysAndAttributes {
                    keys: pending,
                    ..template.clone()
                },
            )]),
            return_consumed_capacity: return_consumed_capacity.clone(),
        };
        let request = encode(&input)?;

        let mut output: BatchGetItemOutput = loop {
            match gateway
                .send_request(DynamoDBOperation::BatchGetItem, request.clone())
                .await
            {
                Ok(response) => break decode(response)?,
                Err(e) if e.is_retryable() => {
                    warn!(table = %table, round, error = %e, "retrying batch get");
                }
                Err(e) => return Err(e.into()),
            }
        };

        items.extend(output.responses.remove(&table).unwrap_or_default());
        pending = output
            .unprocessed_keys
            .remove(&table)
            .map(|unprocessed| unprocessed.keys)
            .unwrap_or_default();
        round += 1;
    }

    Ok(items)
}
