//! Error types for the insight pipeline.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single text-generation call.
///
/// Every transport, auth, quota or decoding problem surfaces as one of these
/// variants so the caller never observes partial output.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response contained no text")]
    EmptyResponse,
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
    #[error("generator unavailable: {0}")]
    Unavailable(String),
}

impl GenerationError {
    /// Whether a retry at the client boundary could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Transport(_)
                | GenerationError::RateLimited(_)
                | GenerationError::Timeout(_)
                | GenerationError::Api { status: 500..=599, .. }
        )
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationError::Malformed(err.to_string())
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

/// Errors raised by the normalizer, configuration and aggregation layers.
///
/// None of these are fatal to the surrounding process: the engine degrades
/// each of them into a structurally valid result.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no parseable rows for any known metric")]
    EmptyDataset,
    #[error("dataset does not match the requested shape: {0}")]
    ShapeMismatch(String),
    #[error("text-generation credential missing: {0}")]
    CredentialMissing(String),
    #[error("all {attempted} metric generations failed")]
    AllGenerationsFailed { attempted: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_not_retryable() {
        assert!(!GenerationError::Auth("bad key".into()).is_retryable());
        assert!(!GenerationError::EmptyResponse.is_retryable());
    }

    #[test]
    fn server_side_api_errors_are_retryable() {
        let err = GenerationError::Api {
            status: 503,
            message: "overloaded".into(),
        };
        assert!(err.is_retryable());
        let err = GenerationError::Api {
            status: 400,
            message: "bad request".into(),
        };
        assert!(!err.is_retryable());
    }
}
