// Error types for the booking API client
//
// Only failures that prevent a response from reaching the caller live here.
// Status codes returned by the service are never turned into errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Token request rejected: {status} - {reason}")]
    TokenRejected { status: u16, reason: String },

    #[error("Could not decode response body (status {status}): {message}")]
    Decode { status: u16, message: String },

    #[error("Could not serialize request payload: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}
