//! Semantic evaluator error types.
//!
//! Every variant is recovered by the answer evaluator, which falls back to
//! deterministic matching. They exist so the failure reason can be logged and
//! classified without string matching.

use thiserror::Error;

/// Errors that can occur when asking a semantic evaluator to judge an answer.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The call did not finish in time.
    #[error("evaluation timed out after {0}ms")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The response did not have the exact `{isCorrect, feedback}` shape.
    #[error("malformed evaluation response: {0}")]
    MalformedResponse(String),

    /// The response carried no content to parse.
    #[error("empty evaluation response")]
    EmptyResponse,
}

impl EvaluatorError {
    /// Returns `true` if this error will recur on every call until the
    /// configuration changes.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            EvaluatorError::AuthenticationFailed(_)
                | EvaluatorError::ApiError {
                    status: 400 | 403 | 404,
                    ..
                }
        )
    }
}
