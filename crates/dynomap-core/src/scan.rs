//! Scan builder, including parallel scans.

use dynomap_model::input::ScanInput;
use dynomap_model::output::PageOutput;
use dynomap_model::types::{ReturnConsumedCapacity, Select};
use dynomap_model::{DynamoDBOperation, Item};
use futures::stream::{self, BoxStream};
use futures::{StreamExt, future};
use tracing::debug;

use crate::builder::Condition;
use crate::error::{MapperError, MapperResult};
use crate::expression::{Comparison, and_statements, compile_condition, compile_projection};
use crate::gateway::runner;
use crate::paginate::{Aggregate, Paged, paginate, paginate_stream};
use crate::record::Record;
use crate::table::Table;

/// Accumulates a `Scan`.
///
/// Every predicate lands in `FilterExpression`. A builder obtained from
/// [`Table::parallel_scan`] runs one cursor loop per segment concurrently and
/// merges the results in segment order.
#[derive(Debug)]
pub struct ScanBuilder {
    table: Table,
    input: ScanInput,
    filters: Vec<String>,
    projection: Option<Vec<String>>,
    load_all: bool,
    parallel: Option<i32>,
    error: Option<MapperError>,
}

impl ScanBuilder {
    pub(crate) fn new(table: Table) -> Self {
        let input = ScanInput {
            table_name: table.name().to_owned(),
            ..ScanInput::default()
        };
        Self {
            table,
            input,
            filters: Vec::new(),
            projection: None,
            load_all: false,
            parallel: None,
            error: None,
        }
    }

    pub(crate) fn parallel(table: Table, total_segments: i32) -> Self {
        let mut builder = Self::new(table);
        if total_segments < 1 {
            builder.fail(MapperError::validation("total segments must be at least 1"));
        } else {
            builder.parallel = Some(total_segments);
        }
        builder
    }

    /// Add a filter predicate.
    pub fn where_(self, attribute: impl Into<String>) -> Condition<Self> {
        Condition::new(self, attribute.into(), Self::push_filter)
    }

    /// Scan a secondary index instead of the table.
    #[must_use]
    pub fn using_index(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if self.table.schema().index_keys(&name).is_none() {
            self.fail(MapperError::validation(format!("unknown index '{name}'")));
        } else {
            self.input.index_name = Some(name);
        }
        self
    }

    /// Scan only `segment` of `total` segments.
    #[must_use]
    pub fn segments(mut self, segment: i32, total: i32) -> Self {
        if self.parallel.is_some() {
            self.fail(MapperError::validation(
                "segments cannot be set on a parallel scan",
            ));
        } else if total < 1 || segment < 0 || segment >= total {
            self.fail(MapperError::validation(format!(
                "segment {segment} is out of range for {total} segments"
            )));
        } else {
            self.input.segment = Some(segment);
            self.input.total_segments = Some(total);
        }
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
        if self.parallel.is_some() {
            self.fail(MapperError::validation(
                "start_key cannot be set on a parallel scan",
            ));
        } else {
            self.input.exclusive_start_key = Some(key);
        }
        self
    }

    /// Follow cursors until the whole table (or segment) has been read.
    #[must_use]
    pub fn load_all(mut self) -> Self {
        self.load_all = true;
        self
    }

    /// The request document the first page would be fetched with.
    ///
    /// For a parallel scan this is the template shared by every segment.
    pub fn request(&self) -> MapperResult<ScanInput> {
        if let Some(e) = &self.error {
            return Err(MapperError::validation(e.to_string()));
        }
        self.build_input()
    }

    /// Fetch the pages (of every segment) and merge them.
    pub async fn exec(self) -> MapperResult<Aggregate<Record>> {
        let (sources, table) = self.into_sources()?;
        let gateway = table.gateway();
        if sources.len() > 1 {
            debug!(table = table.name(), segments = sources.len(), "parallel scan");
        }
        let segments = future::try_join_all(sources.into_iter().map(|source| {
            paginate(source, runner(gateway.clone(), DynamoDBOperation::Scan))
        }))
        .await?;
        Ok(Aggregate::concat(segments).map_items(Record::from_item))
    }

    /// Fetch the pages one at a time. Pages of a parallel scan are yielded as
    /// they arrive from any segment.
    pub fn exec_stream(self) -> MapperResult<BoxStream<'static, MapperResult<PageOutput>>> {
        let (sources, table) = self.into_sources()?;
        let delay = table.config().stream_retry_delay;
        let streams = sources.into_iter().map(|source| {
            let run = runner(table.gateway().clone(), DynamoDBOperation::Scan);
            paginate_stream(source, run, delay).boxed()
        });
        Ok(stream::select_all(streams).boxed())
    }

    fn into_sources(mut self) -> MapperResult<(Vec<Paged<ScanInput>>, Table)> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        let input = self.build_input()?;
        let sources = match self.parallel {
            Some(total) => (0..total)
                .map(|segment| Paged {
                    input: ScanInput {
                        segment: Some(segment),
                        total_segments: Some(total),
                        ..input.clone()
                    },
                    load_all: self.load_all,
                })
                .collect(),
            None => vec![Paged {
                input,
                load_all: self.load_all,
            }],
        };
        Ok((sources, self.table))
    }

    fn build_input(&self) -> MapperResult<ScanInput> {
        let mut input = self.input.clone();
        if let Some(attributes) = &self.projection {
            let clause = compile_projection(attributes, &input.expression_attribute_names)?;
            input.expression_attribute_names.extend(clause.attribute_names);
            input.projection_expression = Some(clause.statement);
        }
        input.filter_expression = and_statements(&self.filters);
        Ok(input)
    }

    fn push_filter(mut self, attribute: String, comparison: Comparison) -> Self {
        let compiled = compile_condition(
            &attribute,
            &comparison,
            &self.input.expression_attribute_names,
            &self.input.expression_attribute_values,
        );
        match compiled {
            Ok(clause) => {
                self.input.expression_attribute_names.extend(clause.attribute_names);
                self.input.expression_attribute_values.extend(clause.attribute_values);
                self.filters.push(clause.statement);
            }
            Err(e) => self.fail(e.into()),
        }
        self
    }

    fn fail(&mut self, error: MapperError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
