//! DynamoDB error types.
//!
//! A gateway reports every failed call as a [`DynamoDBError`]. The `retryable`
//! flag decides whether the execution engines resend the same request or give
//! up on the whole call.

use std::fmt;

/// Well-known DynamoDB error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum DynamoDBErrorCode {
    /// Table not found.
    ResourceNotFoundException,
    /// Condition check failed.
    ConditionalCheckFailedException,
    /// Provisioned throughput exceeded.
    ProvisionedThroughputExceededException,
    /// Request limit exceeded.
    RequestLimitExceeded,
    /// Request throttled.
    ThrottlingException,
    /// Validation error.
    #[default]
    ValidationException,
    /// Serialization error.
    SerializationException,
    /// Internal server error.
    InternalServerError,
    /// Service temporarily unavailable.
    ServiceUnavailable,
    /// Access denied.
    AccessDeniedException,
    /// Transport-level failure reported by the gateway.
    NetworkingError,
}

impl DynamoDBErrorCode {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::ConditionalCheckFailedException => "ConditionalCheckFailedException",
            Self::ProvisionedThroughputExceededException => {
                "ProvisionedThroughputExceededException"
            }
            Self::RequestLimitExceeded => "RequestLimitExceeded",
            Self::ThrottlingException => "ThrottlingException",
            Self::ValidationException => "ValidationException",
            Self::SerializationException => "SerializationException",
            Self::InternalServerError => "InternalServerError",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::AccessDeniedException => "AccessDeniedException",
            Self::NetworkingError => "NetworkingError",
        }
    }

    /// Parse the short code, or the fully-qualified `__type` form
    /// (`com.amazonaws.dynamodb.v20120810#Code`).
    #[must_use]
    pub fn from_type(error_type: &str) -> Option<Self> {
        let short = error_type.rsplit('#').next().unwrap_or(error_type);
        match short {
            "ResourceNotFoundException" => Some(Self::ResourceNotFoundException),
            "ConditionalCheckFailedException" => Some(Self::ConditionalCheckFailedException),
            "ProvisionedThroughputExceededException" => {
                Some(Self::ProvisionedThroughputExceededException)
            }
            "RequestLimitExceeded" => Some(Self::RequestLimitExceeded),
            "ThrottlingException" => Some(Self::ThrottlingException),
            "ValidationException" => Some(Self::ValidationException),
            "SerializationException" => Some(Self::SerializationException),
            "InternalServerError" => Some(Self::InternalServerError),
            "ServiceUnavailable" => Some(Self::ServiceUnavailable),
            "AccessDeniedException" => Some(Self::AccessDeniedException),
            "NetworkingError" => Some(Self::NetworkingError),
            _ => None,
        }
    }

    /// Whether a failure with this code is safe to resend unmodified when the
    /// gateway does not say otherwise.
    #[must_use]
    pub fn is_retryable_by_default(&self) -> bool {
        matches!(
            self,
            Self::ProvisionedThroughputExceededException
                | Self::RequestLimitExceeded
                | Self::ThrottlingException
                | Self::InternalServerError
                | Self::ServiceUnavailable
                | Self::NetworkingError
        )
    }
}

impl fmt::Display for DynamoDBErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed gateway call.
#[derive(Debug)]
pub struct DynamoDBError {
    /// The error code.
    pub code: DynamoDBErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// Whether the identical request may be sent again.
    pub retryable: bool,
    /// The underlying source error, if any.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for DynamoDBError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DynamoDBError({}): {}", self.code, self.message)
    }
}

impl std::error::Error for DynamoDBError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl DynamoDBError {
    /// Create a new `DynamoDBError` from an error code.
    #[must_use]
    pub fn new(code: DynamoDBErrorCode) -> Self {
        Self {
            message: code.as_str().to_owned(),
            retryable: code.is_retryable_by_default(),
            code,
            source: None,
        }
    }

    /// Create a new `DynamoDBError` with a custom message.
    #[must_use]
    pub fn with_message(code: DynamoDBErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: code.is_retryable_by_default(),
            code,
            source: None,
        }
    }

    /// Override the retryable flag.
    #[must_use]
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Set the source error.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the failed request may be resent unmodified.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    // -- Convenience constructors --

    /// Table or resource not found.
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ResourceNotFoundException, message)
    }

    /// Condition expression evaluated to false.
    #[must_use]
    pub fn conditional_check_failed(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ConditionalCheckFailedException, message)
    }

    /// Throughput exceeded; retryable.
    #[must_use]
    pub fn throughput_exceeded(message: impl Into<String>) -> Self {
        Self::with_message(
            DynamoDBErrorCode::ProvisionedThroughputExceededException,
            message,
        )
    }

    /// Validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ValidationException, message)
    }

    /// Serialization error.
    #[must_use]
    pub fn serialization_exception(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::SerializationException, message)
    }

    /// Internal server error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::InternalServerError, message)
    }
}

/// Create a `DynamoDBError` from an error code.
///
/// # Examples
///
/// ```
/// use dynomap_model::dynamodb_error;
/// use dynomap_model::error::DynamoDBErrorCode;
///
/// let err = dynamodb_error!(ValidationException);
/// assert_eq!(err.code, DynamoDBErrorCode::ValidationException);
/// assert!(!err.is_retryable());
///
/// let err = dynamodb_error!(ThrottlingException, "slow down");
/// assert_eq!(err.message, "slow down");
/// assert!(err.is_retryable());
/// ```
#[macro_export]
macro_rules! dynamodb_error {
    ($code:ident) => {
        $crate::error::DynamoDBError::new($crate::error::DynamoDBErrorCode::$code)
    };
    ($code:ident, $msg:expr) => {
        $crate::error::DynamoDBError::with_message($crate::error::DynamoDBErrorCode::$code, $msg)
    };
}
