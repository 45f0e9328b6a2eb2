use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for presence.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// A page or API payload did not contain what the extractor needs.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Caller-supplied input was rejected (bad URL, empty list, oversized request).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration value missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Persisting a batch of records failed.
    #[error("Sink error: {0}")]
    SinkError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Timeout after `limit`, in whole seconds rounded up so sub-second
    /// limits never read as zero.
    pub fn timeout(limit: Duration) -> Self {
        AppError::Timeout(limit.as_millis().div_ceil(1000) as u64)
    }

    /// Returns true if this error comes from a flaky transport rather than
    /// from the content itself. Nothing retries on it; it is logged so that
    /// operators can tell outages from extraction misses.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout")
                    || msg.contains("connect")
                    || msg.contains("reset")
                    || msg.contains("HTTP 429")
                    || msg.contains("HTTP 5")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(AppError::NetworkError("reset".into()).is_transient());
        assert!(AppError::Timeout(30).is_transient());
        assert!(AppError::HttpError("HTTP 503 for https://example.com".into()).is_transient());
        assert!(AppError::HttpError("HTTP 429 for https://example.com".into()).is_transient());
    }

    #[test]
    fn test_content_errors_are_not_transient() {
        assert!(!AppError::ParseError("no title".into()).is_transient());
        assert!(!AppError::HttpError("HTTP 404 for https://example.com".into()).is_transient());
        assert!(!AppError::InvalidInput("empty".into()).is_transient());
    }

    #[test]
    fn test_timeout_rounds_up_to_whole_seconds() {
        assert_eq!(
            AppError::timeout(Duration::from_millis(500)).to_string(),
            "Request timed out after 1 seconds"
        );
        assert!(matches!(
            AppError::timeout(Duration::from_millis(30_000)),
            AppError::Timeout(30)
        ));
        assert!(matches!(
            AppError::timeout(Duration::from_millis(1_001)),
            AppError::Timeout(2)
        ));
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AppError::Timeout(30).to_string(),
            "Request timed out after 30 seconds"
        );
        assert_eq!(
            AppError::InvalidInput("No valid URLs provided".into()).to_string(),
            "Invalid input: No valid URLs provided"
        );
    }
}
