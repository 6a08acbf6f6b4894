//! Gateway capability: the single seam to the remote store.

use std::sync::Arc;

use async_trait::async_trait;
use dynomap_model::{DynamoDBError, DynamoDBOperation};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::MapperResult;

/// Sends request documents to a DynamoDB-compatible store.
///
/// Failures carry a retryable flag; the engines resend the identical document
/// when it is set and give up otherwise.
#[async_trait]
pub trait Gateway: Send + Sync + std::fmt::Debug {
    /// The table every request from this gateway targets.
    fn table_name(&self) -> &str;

    /// Send one request document and return the response document.
    async fn send_request(
        &self,
        operation: DynamoDBOperation,
        request: serde_json::Value,
    ) -> Result<serde_json::Value, DynamoDBError>;
}

/// Serialize a typed input into a request document.
pub(crate) fn encode<I: Serialize>(input: &I) -> MapperResult<serde_json::Value> {
    Ok(serde_json::to_value(input)?)
}

/// Decode a response document into a typed output.
pub(crate) fn decode<O: DeserializeOwned>(response: serde_json::Value) -> MapperResult<O> {
    Ok(serde_json::from_value(response)?)
}

/// Send a typed input once and decode the typed output.
pub(crate) async fn call<I, O>(
    gateway: &Arc<dyn Gateway>,
    operation: DynamoDBOperation,
    input: &I,
) -> MapperResult<O>
where
    I: Serialize + Sync,
    O: DeserializeOwned,
{
    let request = encode(input)?;
    tracing::debug!(
        operation = %operation,
        table = gateway.table_name(),
        "dispatching request"
    );
    let response = gateway.send_request(operation, request).await?;
    decode(response)
}

/// Bind a gateway and operation into the `run` function the engines drive.
pub(crate) fn runner(
    gateway: Arc<dyn Gateway>,
    operation: DynamoDBOperation,
) -> impl FnMut(serde_json::Value) -> BoxFuture<'static, Result<serde_json::Value, DynamoDBError>>
+ Send
+ 'static {
    move |request| {
        let gateway = gateway.clone();
        async move {
            tracing::debug!(
                operation = %operation,
                table = gateway.table_name(),
                "dispatching request"
            );
            gateway.send_request(operation, request).await
        }
        .boxed()
    }
}
