//! Error types for oracle calls.

use thiserror::Error;

/// Errors that can occur when calling the oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle rejected the request due to rate limiting (HTTP 429).
    /// The same request may be retried after a backoff.
    #[error("oracle rate limited: {message}")]
    RateLimited {
        /// Error body returned by the service.
        message: String,
    },

    /// The oracle rejected the request for any other reason.
    #[error("oracle request failed with status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the service.
        message: String,
    },

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The streaming response could not be read or parsed.
    #[error("stream error: {0}")]
    Stream(String),

    /// The oracle finished without producing any text.
    #[error("oracle returned an empty completion")]
    EmptyCompletion,

    /// No API key was configured.
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

impl OracleError {
    /// True for the one failure class that is retried automatically.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type alias for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit() {
        let err = OracleError::RateLimited {
            message: "slow down".to_string(),
        };
        assert!(err.is_rate_limit());

        let err = OracleError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_rate_limit());

        assert!(!OracleError::EmptyCompletion.is_rate_limit());
    }
}
