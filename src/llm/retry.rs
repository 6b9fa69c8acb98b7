use crate::llm::{ExtractClient, LlmError};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry bounds for one extraction call. Waits grow linearly: with a 10s
/// base the sequence is 10s, 20s, ...
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_wait_secs: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_wait: Duration::from_secs_f64(base_wait_secs.max(0.0)),
        }
    }
}

/// Runs one extraction call under the retry policy.
///
/// Only `RateLimited` is retried; transient transport problems and permanent
/// failures are not worth waiting on mid-run and simply yield no result for
/// this chunk. `None` means the caller should count an LLM error and move on
/// to the next chunk — a failed model call never aborts the run.
pub async fn extract_with_retry(
    client: &dyn ExtractClient,
    chunk: &str,
    today: NaiveDate,
    policy: &RetryPolicy,
) -> Option<String> {
    for attempt in 1..=policy.max_attempts {
        match client.extract(chunk, today).await {
            Ok(raw) => return Some(raw),
            Err(LlmError::RateLimited) if attempt < policy.max_attempts => {
                let wait = policy.base_wait * attempt;
                debug!(attempt, wait_secs = wait.as_secs_f64(), "rate limited, backing off");
                tokio::time::sleep(wait).await;
            }
            Err(LlmError::RateLimited) => {
                warn!(attempts = policy.max_attempts, "rate limit persisted, dropping chunk");
                return None;
            }
            Err(error) => {
                warn!(%error, "model call failed, dropping chunk");
                return None;
            }
        }
    }
    None
}
