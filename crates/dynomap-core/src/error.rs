//! Core error type for mapper operations.

use dynomap_model::error::DynamoDBError;

use crate::expression::ExpressionError;

/// Errors returned by table operations, builders, and execution engines.
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// The gateway reported a failure.
    #[error(transparent)]
    Gateway(#[from] DynamoDBError),
    /// An expression could not be compiled or parsed.
    #[error("Invalid expression: {0}")]
    Expression(#[from] ExpressionError),
    /// A request could not be encoded or a response could not be decoded.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Input rejected before reaching the gateway.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// A hook step rejected the payload.
    #[error("Hook rejected: {0}")]
    Hook(String),
}

impl MapperError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a hook rejection.
    #[must_use]
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook(message.into())
    }

    /// Whether the failed request may be resent unmodified.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway(e) if e.is_retryable())
    }
}

/// Result alias for mapper operations.
pub type MapperResult<T> = Result<T, MapperError>;
