//! Error types shared by the transport, API and service layers.

use serde_json::Value;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// A non-success HTTP response returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Canonical reason phrase ("Not Found", "Unauthorized", ...)
    pub status_text: String,
    /// Decoded response body, `Value::Null` when empty or not JSON
    pub data: Value,
}

impl ApiError {
    pub fn new(status: u16, status_text: impl Into<String>, data: Value) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            data,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.status_text.is_empty() {
            write!(f, "request failed with status {}", self.status)
        } else {
            write!(f, "{} {}", self.status, self.status_text)
        }
    }
}

/// Error type for client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("API error: {0}")]
    Api(ApiError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Failed to decode response at {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// The backend response behind this error, if any.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(e) => Some(e),
            _ => None,
        }
    }

    /// HTTP status of the backend response behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        self.api().map(|e| e.status)
    }
}

impl From<ApiError> for ClientError {
    fn from(err: ApiError) -> Self {
        ClientError::Api(err)
    }
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ClientError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        ClientError::Decode {
            path: err.path().to_string(),
            message: err.inner().to_string(),
        }
    }
}

/// Decode a JSON value into `T`, reporting the path of the first mismatch.
pub fn decode_value<T: serde::de::DeserializeOwned>(value: Value) -> ClientResult<T> {
    Ok(serde_path_to_error::deserialize(value)?)
}
