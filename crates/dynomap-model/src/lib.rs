//! DynamoDB wire types for dynomap.
//!
//! These are the request and response documents exchanged with a gateway. All
//! structs serialize with the `PascalCase` key names of the DynamoDB JSON
//! protocol, so a gateway can forward them to any compatible endpoint.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use attribute_value::{AttributeValue, Item};
pub use error::{DynamoDBError, DynamoDBErrorCode};
pub use operations::DynamoDBOperation;
