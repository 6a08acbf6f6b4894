//! Cursor-driven execution of `Query` and `Scan`.
//!
//! [`paginate`] follows `LastEvaluatedKey` until the store stops returning one
//! (or after the first page when `load_all` is off) and folds every page into
//! one [`Aggregate`]. [`paginate_stream`] applies the same rules but yields
//! each page as it arrives.
//!
//! Retryable gateway failures resend the identical request without advancing
//! the cursor. Any other failure ends the call and discards merged pages.

use std::future::Future;
use std::time::Duration;

use dynomap_model::input::{QueryInput, ScanInput};
use dynomap_model::output::PageOutput;
use dynomap_model::types::ConsumedCapacity;
use dynomap_model::{DynamoDBError, DynamoDBOperation, Item};
use futures::Stream;
use futures::stream;
use tracing::{debug, warn};

use crate::error::MapperResult;
use crate::gateway::{decode, encode};

/// A request that can be resumed from a cursor.
pub trait PageSource {
    /// The operation every page is fetched with.
    fn operation(&self) -> DynamoDBOperation;

    /// Render the request document for the next page.
    fn build_request(&self) -> MapperResult<serde_json::Value>;

    /// Resume from `key` on the next page.
    fn start_key(&mut self, key: Item);

    /// Forget the cursor.
    fn clear_start_key(&mut self);

    /// Whether to keep following cursors past the first page.
    fn load_all(&self) -> bool;
}

/// A typed request paired with its pagination mode.
#[derive(Debug, Clone, Default)]
pub struct Paged<I> {
    /// The request document.
    pub input: I,
    /// Follow cursors until the last page.
    pub load_all: bool,
}

impl PageSource for Paged<QueryInput> {
    fn operation(&self) -> DynamoDBOperation {
        DynamoDBOperation::Query
    }

    fn build_request(&self) -> MapperResult<serde_json::Value> {
        encode(&self.input)
    }

    fn start_key(&mut self, key: Item) {
        self.input.exclusive_start_key = Some(key);
    }

    fn clear_start_key(&mut self) {
        self.input.exclusive_start_key = None;
    }

    fn load_all(&self) -> bool {
        self.load_all
    }
}

impl PageSource for Paged<ScanInput> {
    fn operation(&self) -> DynamoDBOperation {
        DynamoDBOperation::Scan
    }

    fn build_request(&self) -> MapperResult<serde_json::Value> {
        encode(&self.input)
    }

    fn start_key(&mut self, key: Item) {
        self.input.exclusive_start_key = Some(key);
    }

    fn clear_start_key(&mut self) {
        self.input.exclusive_start_key = None;
    }

    fn load_all(&self) -> bool {
        self.load_all
    }
}

/// Merged result of one or more pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate<T = Item> {
    /// Items of every page, in page order.
    pub items: Vec<T>,
    /// Sum of `Count`.
    pub count: i64,
    /// Sum of `ScannedCount`, `None` when it is zero.
    pub scanned_count: Option<i64>,
    /// Summed consumed capacity, `None` when it is zero.
    pub consumed_capacity: Option<ConsumedCapacity>,
    /// Cursor of the last page, if it had one.
    pub last_evaluated_key: Option<Item>,
}

impl<T> Default for Aggregate<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            scanned_count: None,
            consumed_capacity: None,
            last_evaluated_key: None,
        }
    }
}

impl<T> Aggregate<T> {
    /// Convert every item, keeping the counters.
    #[must_use]
    pub fn map_items<U, F: FnMut(T) -> U>(self, f: F) -> Aggregate<U> {
        Aggregate {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            scanned_count: self.scanned_count,
            consumed_capacity: self.consumed_capacity,
            last_evaluated_key: self.last_evaluated_key,
        }
    }

    /// Merge aggregates in order using the same rules as for pages.
    #[must_use]
    pub fn concat(parts: Vec<Self>) -> Self {
        let mut acc = Accumulator::default();
        for part in parts {
            acc.add(
                part.count,
                part.scanned_count.unwrap_or(0),
                part.consumed_capacity,
                part.last_evaluated_key,
            );
            acc.items.extend(part.items);
        }
        acc.finish()
    }
}

#[derive(Debug)]
struct Accumulator<T> {
    items: Vec<T>,
    count: i64,
    scanned_count: i64,
    capacity_units: f64,
    capacity_table: Option<String>,
    last_evaluated_key: Option<Item>,
}

impl<T> Default for Accumulator<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            scanned_count: 0,
            capacity_units: 0.0,
            capacity_table: None,
            last_evaluated_key: None,
        }
    }
}

impl<T> Accumulator<T> {
    fn add(
        &mut self,
        count: i64,
        scanned_count: i64,
        capacity: Option<ConsumedCapacity>,
        cursor: Option<Item>,
    ) {
        self.count += count;
        self.scanned_count += scanned_count;
        if let Some(capacity) = capacity {
            self.capacity_units += capacity.capacity_units.unwrap_or(0.0);
            if capacity.table_name.is_some() {
                self.capacity_table = capacity.table_name;
            }
        }
        self.last_evaluated_key = cursor.filter(|key| !key.is_empty());
    }

    #[allow(clippy::float_cmp)]
    fn finish(self) -> Aggregate<T> {
        let consumed_capacity = (self.capacity_units != 0.0).then(|| ConsumedCapacity {
            table_name: self.capacity_table,
            capacity_units: Some(self.capacity_units),
            read_capacity_units: None,
        });
        Aggregate {
            items: self.items,
            count: self.count,
            scanned_count: (self.scanned_count != 0).then_some(self.scanned_count),
            consumed_capacity,
            last_evaluated_key: self.last_evaluated_key,
        }
    }
}

impl Accumulator<Item> {
    fn absorb(&mut self, page: PageOutput) {
        self.add(
            page.count,
            page.scanned_count,
            page.consumed_capacity,
            page.last_evaluated_key,
        );
        self.items.extend(page.items);
    }
}

/// Fetch pages until the source is exhausted and merge them.
pub async fn paginate<S, F, Fut>(mut source: S, mut run: F) -> MapperResult<Aggregate>
where
    S: PageSource,
    F: FnMut(serde_json::Value) -> Fut,
    Fut: Future<Output = Result<serde_json::Value, DynamoDBError>>,
{
    let operation = source.operation();
    let mut acc = Accumulator::default();
    let mut page_number = 0_usize;

    loop {
        let request = source.build_request()?;
        let page: PageOutput = loop {
            match run(request.clone()).await {
                Ok(response) => break decode(response)?,
                Err(e) if e.is_retryable() => {
                    warn!(operation = %operation, page = page_number, error = %e, "retrying page");
                }
                Err(e) => return Err(e.into()),
            }
        };
        page_number += 1;

        let cursor = page.cursor().cloned();
        acc.absorb(page);
        match cursor {
            Some(key) if source.load_all() => source.start_key(key),
            _ => {
                source.clear_start_key();
                break;
            }
        }
    }

    debug!(operation = %operation, pages = page_number, items = acc.items.len(), "pagination done");
    Ok(acc.finish())
}

/// Yield pages one at a time as they arrive.
///
/// Retryable failures wait `retry_delay` before resending the same request.
/// The stream ends after a fatal error has been yielded.
pub fn paginate_stream<S, F, Fut>(
    source: S,
    run: F,
    retry_delay: Duration,
) -> impl Stream<Item = MapperResult<PageOutput>>
where
    S: PageSource,
    F: FnMut(serde_json::Value) -> Fut,
    Fut: Future<Output = Result<serde_json::Value, DynamoDBError>>,
{
    stream::unfold(Some((source, run)), move |state| async move {
        let (mut source, mut run) = state?;
        let operation = source.operation();
        let request = match source.build_request() {
            Ok(request) => request,
            Err(e) => return Some((Err(e), None)),
        };

        loop {
            match run(request.clone()).await {
                Ok(response) => {
                    let page: PageOutput = match decode(response) {
                        Ok(page) => page,
                        Err(e) => return Some((Err(e), None)),
                    };
                    let next = match page.cursor() {
                        Some(key) if source.load_all() => {
                            source.start_key(key.clone());
                            Some((source, run))
                        }
                        _ => {
                            debug!(operation = %operation, "stream done");
                            None
                        }
                    };
                    return Some((Ok(page), next));
                }
                Err(e) if e.is_retryable() => {
                    warn!(operation = %operation, error = %e, delay_ms = retry_delay.as_millis(), "retrying streamed page");
                    tokio::time::sleep(retry_delay).await;
                }
                Err(e) => return Some((Err(e.into()), None)),
            }
        }
    })
}
