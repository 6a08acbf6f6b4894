//! Data-mapping layer over a DynamoDB-style gateway.
//!
//! A [`Table`] binds a [`Gateway`] to a [`Schema`]. From there, single-item
//! operations, fluent [`QueryBuilder`]/[`ScanBuilder`] requests, cursor
//! pagination and batched key lookups all compile their predicates and
//! updates through the [`expression`] module.
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod batch;
pub mod builder;
pub mod config;
pub mod error;
pub mod expression;
pub mod gateway;
pub mod hooks;
pub mod paginate;
pub mod query;
pub mod record;
pub mod scan;
pub mod schema;
pub mod table;


pub use batch::{BatchGetOptions, KeyInput};
pub use config::{BATCH_GET_BUCKET_SIZE, ClientConfig};
pub use error::{MapperError, MapperResult};
pub use expression::{Expectation, Expected, UpdateData, UpdateValue};
pub use gateway::Gateway;
pub use hooks::{Hooks, Pipeline};
pub use paginate::Aggregate;
pub use query::QueryBuilder;
pub use record::Record;
pub use scan::ScanBuilder;
pub use schema::{IndexKeys, Schema, TableSchema, TableSchemaBuilder};
pub use table::{CreateOptions, DestroyOptions, GetOptions, Table, UpdateOptions};
