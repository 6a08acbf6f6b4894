//! Query builder.

use dynomap_model::input::QueryInput;
use dynomap_model::output::PageOutput;
use dynomap_model::types::{ReturnConsumedCapacity, Select};
use dynomap_model::{AttributeValue, DynamoDBOperation, Item};
use futures::StreamExt;
use futures::stream::BoxStream;

use crate::builder::Condition;
use crate::error::{MapperError, MapperResult};
use crate::expression::{
    Comparison, ExpressionError, and_statements, compile_condition, compile_projection,
};
use crate::gateway::runner;
use crate::paginate::{Aggregate, Paged, paginate, paginate_stream};
use crate::record::Record;
use crate::table::Table;

/// Accumulates a `Query` against one hash key value.
///
/// Key conditions added with [`QueryBuilder::where_`] land in
/// `KeyConditionExpression`; predicates added with [`QueryBuilder::filter`]
/// land in `FilterExpression`. Misuse is remembered and reported by
/// [`QueryBuilder::exec`] before anything is sent.
#[derive(Debug)]
pub struct QueryBuilder {
    table: Table,
    hash_value: AttributeValue,
    hash_key: String,
    range_key: Option<String>,
    input: QueryInput,
    key_conditions: Vec<String>,
    range_condition: bool,
    filters: Vec<String>,
    projection: Option<Vec<String>>,
    load_all: bool,
    error: Option<MapperError>,
}

impl QueryBuilder {
    pub(crate) fn new(table: Table, hash_value: AttributeValue) -> Self {
        let schema = table.schema();
        let hash_key = schema.hash_key().to_owned();
        let range_key = schema.range_key().map(str::to_owned);
        let input = QueryInput {
            table_name: table.name().to_owned(),
            ..QueryInput::default()
        };
        Self {
            table,
            hash_value,
            hash_key,
            range_key,
            input,
            key_conditions: Vec::new(),
            range_condition: false,
            filters: Vec::new(),
            projection: None,
            load_all: false,
            error: None,
        }
    }

    /// Add the key condition on the (index) range key.
    ///
    /// Only `equals`, `lte`, `lt`, `gte`, `gt`, `begins_with` and `between`
    /// are accepted, at most once per query. The hash key is already fixed by
    /// [`Table::query`].
    pub fn where_(self, attribute: impl Into<String>) -> Condition<Self> {
        Condition::new(self, attribute.into(), Self::push_key_condition)
    }

    /// Add a filter applied after the key condition.
    pub fn filter(self, attribute: impl Into<String>) -> Condition<Self> {
        Condition::new(self, attribute.into(), Self::push_filter)
    }

    /// Query a secondary index instead of the table.
    #[must_use]
    pub fn using_index(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let keys = self.table.schema().index_keys(&name);
        match keys {
            Some(keys) => {
                self.hash_key = keys.hash_key;
                self.range_key = keys.range_key;
                self.input.index_name = Some(name);
            }
            None => self.fail(MapperError::validation(format!("unknown index '{name}'"))),
        }
        self
    }

    /// Return items in ascending range key order.
    #[must_use]
    pub fn ascending(mut self) -> Self {
        self.input.scan_index_forward = Some(true);
        self
    }

    /// Return items in descending range key order.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.input.scan_index_forward = Some(false);
        self
    }

    /// Evaluate at most `limit` items per page.
    #[must_use]
    pub fn limit(mut self, limit: i32) -> Self {
        if limit < 1 {
            self.fail(MapperError::validation("limit must be at least 1"));
        } else {
            self.input.limit = Some(limit);
        }
        self
    }

    /// Only return the given attributes. A later call replaces the list.
    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Choose which attributes are returned.
    #[must_use]
    pub fn select(mut self, select: Select) -> Self {
        self.input.select = Some(select);
        self
    }

    /// Ask the store to report consumed capacity.
    #[must_use]
    pub fn return_consumed_capacity(mut self, level: ReturnConsumedCapacity) -> Self {
        self.input.return_consumed_capacity = Some(level);
        self
    }

    /// Use strongly consistent reads.
    #[must_use]
    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.input.consistent_read = Some(consistent);
        self
    }

    /// Resume from a cursor returned by an earlier call.
    #[must_use]
    pub fn start_key(mut self, key: Item) -> Self {
        self.input.exclusive_start_key = Some(key);
        self
    }

    /// Follow cursors until every matching item has been read.
    #[must_use]
    pub fn load_all(mut self) -> Self {
        self.load_all = true;
        self
    }

    /// The request document the first page would be fetched with.
    pub fn request(&self) -> MapperResult<QueryInput> {
        if let Some(e) = &self.error {
            return Err(MapperError::validation(e.to_string()));
        }
        self.build_input()
    }

    /// Fetch the pages and merge them.
    pub async fn exec(self) -> MapperResult<Aggregate<Record>> {
        let (source, table) = self.into_source()?;
        let run = runner(table.gateway().clone(), DynamoDBOperation::Query);
        let aggregate = paginate(source, run).await?;
        Ok(aggregate.map_items(Record::from_item))
    }

    /// Fetch the pages one at a time.
    pub fn exec_stream(self) -> MapperResult<BoxStream<'static, MapperResult<PageOutput>>> {
        let (source, table) = self.into_source()?;
        let run = runner(table.gateway().clone(), DynamoDBOperation::Query);
        Ok(paginate_stream(source, run, table.config().stream_retry_delay).boxed())
    }

    fn into_source(mut self) -> MapperResult<(Paged<QueryInput>, Table)> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        let input = self.build_input()?;
        Ok((
            Paged {
                input,
                load_all: self.load_all,
            },
            self.table,
        ))
    }

    fn build_input(&self) -> MapperResult<QueryInput> {
        if let Some(expected) = self.table.schema().attribute_type(&self.hash_key) {
            if !expected.matches(&self.hash_value) {
                return Err(MapperError::validation(format!(
                    "hash key '{}' must be of type {expected}, got {}",
                    self.hash_key,
                    self.hash_value.type_descriptor()
                )));
            }
        }

        let mut input = self.input.clone();
        let hash = compile_condition(
            &self.hash_key,
            &Comparison::Eq(self.hash_value.clone()),
            &input.expression_attribute_names,
            &input.expression_attribute_values,
        )?;
        input.expression_attribute_names.extend(hash.attribute_names);
        input.expression_attribute_values.extend(hash.attribute_values);

        if let Some(attributes) = &self.projection {
            let clause = compile_projection(attributes, &input.expression_attribute_names)?;
            input.expression_attribute_names.extend(clause.attribute_names);
            input.projection_expression = Some(clause.statement);
        }

        let mut key_conditions = Vec::with_capacity(self.key_conditions.len() + 1);
        key_conditions.push(hash.statement);
        key_conditions.extend(self.key_conditions.iter().cloned());
        input.key_condition_expression = and_statements(&key_conditions);
        input.filter_expression = and_statements(&self.filters);
        Ok(input)
    }

    fn push_key_condition(mut self, attribute: String, comparison: Comparison) -> Self {
        if attribute == self.hash_key {
            self.fail(MapperError::validation(format!(
                "hash key '{attribute}' is already fixed by the query"
            )));
            return self;
        }
        if self.range_key.as_deref() != Some(&attribute) {
            self.fail(MapperError::validation(format!(
                "'{attribute}' is not a key attribute; use filter() instead"
            )));
            return self;
        }
        if self.range_condition {
            self.fail(MapperError::validation(format!(
                "range key '{attribute}' already has a key condition; use between() for a range"
            )));
            return self;
        }
        if !comparison.is_key_operator() {
            self.fail(MapperError::validation(format!(
                "operator '{}' is not allowed in a key condition",
                comparison.operator_name()
            )));
            return self;
        }
        match self.compile(&attribute, &comparison) {
            Ok(statement) => {
                self.key_conditions.push(statement);
                self.range_condition = true;
            }
            Err(e) => self.fail(e.into()),
        }
        self
    }

    fn push_filter(mut self, attribute: String, comparison: Comparison) -> Self {
        match self.compile(&attribute, &comparison) {
            Ok(statement) => self.filters.push(statement),
            Err(e) => self.fail(e.into()),
        }
        self
    }

    fn compile(&mut self, attribute: &str, comparison: &Comparison) -> Result<String, ExpressionError> {
        let clause = compile_condition(
            attribute,
            comparison,
            &self.input.expression_attribute_names,
            &self.input.expression_attribute_values,
        )?;
        self.input.expression_attribute_names.extend(clause.attribute_names);
        self.input.expression_attribute_values.extend(clause.attribute_values);
        Ok(clause.statement)
    }

    fn fail(&mut self, error: MapperError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
