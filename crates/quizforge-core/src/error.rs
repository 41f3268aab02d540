//! Error types.
//!
//! `GeneratorError` is defined here rather than in `quizforge-providers` so
//! the generation cache can downcast and classify failures for retry
//! decisions without string matching.

use thiserror::Error;

use crate::model::{ItemId, SessionId};

/// Errors that can occur when calling a content generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl GeneratorError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            GeneratorError::AuthenticationFailed(_) | GeneratorError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            GeneratorError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the engine to its callers.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Request rejected before any state was touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The session does not exist or belongs to someone else.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("session not active: {0}")]
    SessionNotActive(SessionId),

    /// Every item in the session has been answered already.
    #[error("session {0} has no unanswered items")]
    SessionExhausted(SessionId),

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type QuizResult<T> = std::result::Result<T, QuizError>;
