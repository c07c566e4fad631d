use thiserror::Error;

/// Main error type for the comment insight service
#[derive(Debug, Error)]
pub enum InsightError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Channel or video absent upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Admission denied by the rate limiter
    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimitExceeded {
        /// Seconds until the window resets or the cooldown ends
        retry_after: u64,
    },

    /// Comment source paging failure other than "comments disabled"
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Comments are disabled on the video; never surfaced to callers,
    /// the pipeline maps it to an all-zero result
    #[error("Comments disabled")]
    CommentsDisabled,

    /// Classifier oracle failed on a batch; recovered locally as all-neutral
    #[error("Classification failure: {0}")]
    ClassificationFailure(String),

    /// Cache backend operation error; recovered locally (fail-open)
    #[error("Cache backend error: {0}")]
    CacheBackend(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InsightError {
    /// True for faults the pipeline recovers from without surfacing
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            InsightError::CommentsDisabled
                | InsightError::ClassificationFailure(_)
                | InsightError::CacheBackend(_)
        )
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            InsightError::InvalidRequest(_) => 400,
            InsightError::NotFound(_) => 404,
            InsightError::RateLimitExceeded { .. } => 429,
            InsightError::UpstreamUnavailable(_) => 502,
            InsightError::Timeout => 504,
            InsightError::CommentsDisabled => 500,
            InsightError::ClassificationFailure(_) => 500,
            InsightError::CacheBackend(_) => 500,
            InsightError::ConfigError(_) => 500,
            InsightError::IoError(_) => 500,
            InsightError::SerializationError(_) => 500,
            InsightError::Internal(_) => 500,
        }
    }
}

/// Result type alias for insight operations
pub type InsightResult<T> = Result<T, InsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(InsightError::NotFound("x".into()).status_code(), 404);
        assert_eq!(
            InsightError::RateLimitExceeded { retry_after: 30 }.status_code(),
            429
        );
        assert_eq!(
            InsightError::UpstreamUnavailable("quota".into()).status_code(),
            502
        );
        assert_eq!(InsightError::Timeout.status_code(), 504);
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(InsightError::CommentsDisabled.is_recoverable());
        assert!(InsightError::ClassificationFailure("boom".into()).is_recoverable());
        assert!(!InsightError::NotFound("x".into()).is_recoverable());
    }
}
