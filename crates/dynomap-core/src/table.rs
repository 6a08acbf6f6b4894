//! Table handle: wires the gateway, schema, config, and hooks of one table to
//! the builders and engines.

use std::collections::HashMap;
use std::sync::Arc;

use dynomap_model::input::{DeleteItemInput, GetItemInput, PutItemInput, UpdateItemInput};
use dynomap_model::output::{DeleteItemOutput, GetItemOutput, PutItemOutput, UpdateItemOutput};
use dynomap_model::types::ReturnValue;
use dynomap_model::{AttributeValue, DynamoDBOperation, Item};
use tracing::debug;

use crate::batch::{self, BatchGetOptions, KeyInput};
use crate::config::ClientConfig;
use crate::error::{MapperError, MapperResult};
use crate::expression::{
    Clause, Expected, UpdateData, UpdateValue, compile_expected, compile_projection,
    compile_update, merge_update,
};
use crate::gateway::{Gateway, call};
use crate::hooks::Hooks;
use crate::query::QueryBuilder;
use crate::record::Record;
use crate::scan::ScanBuilder;
use crate::schema::Schema;

/// Options for [`Table::get`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetOptions {
    /// Use a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// Attributes to project; all attributes when `None`.
    pub attributes: Option<Vec<String>>,
}

/// Options for [`Table::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOptions {
    /// Replace an existing item with the same key. When `false`, the put is
    /// guarded with `attribute_not_exists` on the key attributes.
    pub overwrite: bool,
    /// Extra guards, compiled after the overwrite guards.
    pub expected: Expected,
    /// `ReturnValues` of the put.
    pub return_values: Option<ReturnValue>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            expected: Expected::default(),
            return_values: None,
        }
    }
}

/// Options for [`Table::update`].
///
/// Derived actions and aliases come first; the caller's
/// `update_expression` actions are appended per keyword and the caller's
/// names and values replace derived entries on alias collision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Guards on the stored item.
    pub expected: Expected,
    /// Extra update actions, merged after the derived ones.
    pub update_expression: Option<String>,
    /// Extra condition, combined with the guards using `AND`.
    pub condition_expression: Option<String>,
    /// Aliases referenced by the caller's expressions.
    pub expression_attribute_names: HashMap<String, String>,
    /// Values referenced by the caller's expressions.
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    /// `ReturnValues` of the update; `ALL_NEW` when `None`.
    pub return_values: Option<ReturnValue>,
}

/// Options for [`Table::destroy`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestroyOptions {
    /// Guards on the stored item.
    pub expected: Expected,
    /// `ReturnValues` of the delete.
    pub return_values: Option<ReturnValue>,
}

#[derive(Debug, Clone)]
struct TableInner {
    gateway: Arc<dyn Gateway>,
    schema: Arc<dyn Schema>,
    config: ClientConfig,
    hooks: Hooks,
}

/// A handle on one table. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Create a handle with the default configuration.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, schema: Arc<dyn Schema>) -> Self {
        Self {
            inner: Arc::new(TableInner {
                gateway,
                schema,
                config: ClientConfig::default(),
                hooks: Hooks::default(),
            }),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        Arc::make_mut(&mut self.inner).config = config;
        self
    }

    /// Mutable access to the hook pipelines.
    ///
    /// Handles cloned earlier keep the hooks they were cloned with.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut Arc::make_mut(&mut self.inner).hooks
    }

    /// The table name reported by the gateway.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.gateway.table_name()
    }

    /// The table schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<dyn Schema> {
        &self.inner.schema
    }

    /// The gateway requests are sent through.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.inner.gateway
    }

    /// The execution settings.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Start a query for one hash key value.
    #[must_use]
    pub fn query(&self, hash: impl Into<AttributeValue>) -> QueryBuilder {
        QueryBuilder::new(self.clone(), hash.into())
    }

    /// Start a scan.
    #[must_use]
    pub fn scan(&self) -> ScanBuilder {
        ScanBuilder::new(self.clone())
    }

    /// Start a scan split into `total_segments` concurrently read segments.
    #[must_use]
    pub fn parallel_scan(&self, total_segments: i32) -> ScanBuilder {
        ScanBuilder::parallel(self.clone(), total_segments)
    }

    /// Fetch many items by key.
    pub async fn get_items(
        &self,
        keys: &[KeyInput],
        options: &BatchGetOptions,
    ) -> MapperResult<Vec<Record>> {
        self.get_items_with(keys, options, Record::from_item).await
    }

    /// Fetch many items by key, building each result with `factory`.
    pub async fn get_items_with<T, F>(
        &self,
        keys: &[KeyInput],
        options: &BatchGetOptions,
        factory: F,
    ) -> MapperResult<Vec<T>>
    where
        F: Fn(Item) -> T,
    {
        batch::get_items(
            self.gateway(),
            self.schema().as_ref(),
            keys,
            options,
            self.config().batch_get_concurrency,
            factory,
        )
        .await
    }

    /// Fetch one item by key.
    pub async fn get(
        &self,
        key: impl Into<KeyInput>,
        options: &GetOptions,
    ) -> MapperResult<Option<Record>> {
        let key = key.into().to_key(self.schema().as_ref())?;
        let mut input = GetItemInput {
            table_name: self.name().to_owned(),
            key,
            consistent_read: options.consistent_read,
            ..GetItemInput::default()
        };
        if let Some(attributes) = &options.attributes {
            let clause = compile_projection(attributes, &HashMap::new())?;
            input.projection_expression = Some(clause.statement);
            input.expression_attribute_names = clause.attribute_names;
        }

        let output: GetItemOutput = call(self.gateway(), DynamoDBOperation::GetItem, &input).await?;
        Ok(output.item.map(Record::from_item))
    }

    /// Put an item.
    ///
    /// Defaults are applied, the before-create hooks run, and the schema
    /// validates the result before anything is sent.
    pub async fn create(&self, item: Item, options: &CreateOptions) -> MapperResult<Record> {
        let schema = self.schema();
        let item = schema.apply_defaults(item);
        let item = self.inner.hooks.before_create.run(item)?;
        schema.validate(&item)?;

        let mut expected = Expected::new();
        if !options.overwrite {
            expected = expected.not_exists(schema.hash_key());
            if let Some(range_key) = schema.range_key() {
                expected = expected.not_exists(range_key);
            }
        }
        for (attribute, expectation) in options.expected.iter() {
            expected = expected.with(attribute.clone(), expectation.clone());
        }
        let condition = conditional(&expected)?;

        let input = PutItemInput {
            table_name: self.name().to_owned(),
            item: item.clone(),
            condition_expression: condition.as_ref().map(|c| c.statement.clone()),
            expression_attribute_names: condition
                .as_ref()
                .map(|c| c.attribute_names.clone())
                .unwrap_or_default(),
            expression_attribute_values: condition
                .map(|c| c.attribute_values)
                .unwrap_or_default(),
            return_values: options.return_values.clone(),
        };
        let _: PutItemOutput = call(self.gateway(), DynamoDBOperation::PutItem, &input).await?;
        debug!(table = self.name(), "item created");

        self.inner.hooks.after_create.run(Record::from_item(item))
    }

    /// Update one item.
    ///
    /// The key is taken from the hash and range attributes of `data`, which
    /// must be [`UpdateValue::Set`]. Returns the record selected by
    /// `ReturnValues`, or `None` when the store returned no attributes.
    pub async fn update(
        &self,
        data: UpdateData,
        options: &UpdateOptions,
    ) -> MapperResult<Option<Record>> {
        let data = self.inner.hooks.before_update.run(data)?;
        let schema = self.schema();
        let key = self.key_from_update(&data)?;

        let derived = compile_update(schema.as_ref(), &data)?;
        let mut merged = merge_update(
            derived,
            options.update_expression.as_deref(),
            &options.expression_attribute_names,
            &options.expression_attribute_values,
        )?;

        let guards = conditional_against(
            &options.expected,
            &merged.attribute_names,
            &merged.attribute_values,
        )?;
        let condition_expression = match (options.condition_expression.as_deref(), guards) {
            (Some(caller), Some(guards)) => {
                merged.attribute_names.extend(guards.attribute_names);
                merged.attribute_values.extend(guards.attribute_values);
                Some(format!("({caller}) AND {}", guards.statement))
            }
            (None, Some(guards)) => {
                merged.attribute_names.extend(guards.attribute_names);
                merged.attribute_values.extend(guards.attribute_values);
                Some(guards.statement)
            }
            (Some(caller), None) => Some(caller.to_owned()),
            (None, None) => None,
        };

        let input = UpdateItemInput {
            table_name: self.name().to_owned(),
            key,
            update_expression: merged.update_expression(),
            condition_expression,
            expression_attribute_names: merged.attribute_names,
            expression_attribute_values: merged.attribute_values,
            return_values: Some(options.return_values.clone().unwrap_or(ReturnValue::AllNew)),
        };
        let output: UpdateItemOutput =
            call(self.gateway(), DynamoDBOperation::UpdateItem, &input).await?;

        if output.attributes.is_empty() {
            return Ok(None);
        }
        self.inner
            .hooks
            .after_update
            .run(Record::from_item(output.attributes))
            .map(Some)
    }

    /// Delete one item.
    ///
    /// Returns the deleted record when `ReturnValues` asked for it.
    pub async fn destroy(
        &self,
        key: impl Into<KeyInput>,
        options: &DestroyOptions,
    ) -> MapperResult<Option<Record>> {
        let key = key.into().to_key(self.schema().as_ref())?;
        let condition = conditional(&options.expected)?;
        let input = DeleteItemInput {
            table_name: self.name().to_owned(),
            key,
            condition_expression: condition.as_ref().map(|c| c.statement.clone()),
            expression_attribute_names: condition
                .as_ref()
                .map(|c| c.attribute_names.clone())
                .unwrap_or_default(),
            expression_attribute_values: condition
                .map(|c| c.attribute_values)
                .unwrap_or_default(),
            return_values: options.return_values.clone(),
        };
        let output: DeleteItemOutput =
            call(self.gateway(), DynamoDBOperation::DeleteItem, &input).await?;

        if output.attributes.is_empty() {
            return Ok(None);
        }
        self.inner
            .hooks
            .after_destroy
            .run(Record::from_item(output.attributes))
            .map(Some)
    }

    fn key_from_update(&self, data: &UpdateData) -> MapperResult<Item> {
        let schema = self.schema();
        let set_value = |name: &str| match data.get(name) {
            Some(UpdateValue::Set(value)) => Ok(value),
            _ => Err(MapperError::validation(format!(
                "update requires a value for key attribute '{name}'"
            ))),
        };
        let hash = set_value(schema.hash_key())?;
        let range = schema.range_key().map(set_value).transpose()?;
        schema.build_key(hash, range)
    }
}

fn conditional(expected: &Expected) -> MapperResult<Option<Clause>> {
    conditional_against(expected, &HashMap::new(), &HashMap::new())
}

fn conditional_against(
    expected: &Expected,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> MapperResult<Option<Clause>> {
    if expected.is_empty() {
        return Ok(None);
    }
    Ok(Some(compile_expected(expected, names, values)?))
}
