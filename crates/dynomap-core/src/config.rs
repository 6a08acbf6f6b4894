//! Client configuration.

use std::env;
use std::time::Duration;

/// Maximum number of keys the store accepts in one `BatchGetItem` request.
pub const BATCH_GET_BUCKET_SIZE: usize = 100;

const DEFAULT_BATCH_GET_CONCURRENCY: usize = 10;
const DEFAULT_STREAM_RETRY_DELAY_MS: u64 = 1000;

/// Execution settings shared by every table handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// How many batch-get buckets may be in flight at once.
    pub batch_get_concurrency: usize,
    /// Delay before a streamed page is re-requested after a retryable failure.
    pub stream_retry_delay: Duration,
}

impl ClientConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            batch_get_concurrency: env_usize(
                "DYNOMAP_BATCH_GET_CONCURRENCY",
                DEFAULT_BATCH_GET_CONCURRENCY,
            )
            .max(1),
            stream_retry_delay: Duration::from_millis(env_u64(
                "DYNOMAP_STREAM_RETRY_DELAY_MS",
                DEFAULT_STREAM_RETRY_DELAY_MS,
            )),
        }
    }

    /// Override the batch-get concurrency cap (at least one).
    #[must_use]
    pub fn with_batch_get_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_get_concurrency = concurrency.max(1);
        self
    }

    /// Override the streaming retry delay.
    #[must_use]
    pub fn with_stream_retry_delay(mut self, delay: Duration) -> Self {
        self.stream_retry_delay = delay;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            batch_get_concurrency: DEFAULT_BATCH_GET_CONCURRENCY,
            stream_retry_delay: Duration::from_millis(DEFAULT_STREAM_RETRY_DELAY_MS),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
