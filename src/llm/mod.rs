pub mod gemini;
pub mod parse;
pub mod retry;

use chrono::NaiveDate;
use thiserror::Error;

/// Failure classes at the model-client boundary.
///
/// The retry controller dispatches on these variants; clients are required
/// to classify their own transport errors so nothing downstream ever
/// substring-matches an error message to decide whether to retry.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model endpoint rate-limited the call")]
    RateLimited,

    #[error("transient model call failure: {0}")]
    Transient(String),

    #[error("permanent model call failure: {0}")]
    Permanent(String),
}

/// The external extraction collaborator: takes one chunk of article text and
/// a "today" anchor, returns raw text expected to contain a JSON array of
/// event objects. May be slow, rate-limited and unreliable; the pipeline
/// treats the response as untrusted semi-structured data.
#[async_trait::async_trait]
pub trait ExtractClient: Send + Sync {
    async fn extract(&self, chunk: &str, today: NaiveDate) -> Result<String, LlmError>;
}
