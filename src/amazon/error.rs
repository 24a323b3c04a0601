//! Failure taxonomy for upstream GetItems calls.

use crate::amazon::signer::SigningError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 429 or a throttling error code.
    #[error("rate limited by PA-API: {0}")]
    RateLimited(String),

    /// Non-success response that is not throttling.
    #[error("PA-API returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// The response body could not be read as a GetItems response.
    #[error("malformed GetItems response: {0}")]
    Malformed(String),

    #[error("network failure: {0}")]
    Network(String),

    #[error("request signing failed: {0}")]
    Signing(#[from] SigningError),
}

impl ApiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited(_))
    }
}

impl From<wreq::Error> for ApiError {
    fn from(err: wreq::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ApiError::Provider { status: 400, message: "InvalidParameterValue".to_string() };
        assert_eq!(err.to_string(), "PA-API returned 400: InvalidParameterValue");

        let err = ApiError::from(SigningError::InvalidKey);
        assert!(err.to_string().contains("signing failed"));
    }

    #[test]
    fn test_is_rate_limited() {
        assert!(ApiError::RateLimited("TooManyRequests".to_string()).is_rate_limited());
        assert!(!ApiError::Network("reset".to_string()).is_rate_limited());
    }
}
