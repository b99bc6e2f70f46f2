//! BeDrive API error types
//!
//! Maps HTTP status codes to the semantic errors the repository and its
//! callers act on. No retry logic lives here; a failed call fails the
//! operation.

/// Errors produced by the BeDrive API client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("The url is invalid")]
    InvalidUrl,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid name or an item with this name already exists.")]
    InvalidNameOrDuplicate,

    #[error("Authentication failed. Check your username and password.")]
    AuthenticationFailed,

    #[error("The item doesn't exist.")]
    ItemNotFound,

    #[error("Could not decode the server response: {0}")]
    Decode(String),

    #[error("Unexpected server response ({0})")]
    Unexpected(u16),
}

impl ApiError {
    /// Map a non-success HTTP status code to its semantic error
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiError::InvalidNameOrDuplicate,
            403 => ApiError::AuthenticationFailed,
            404 => ApiError::ItemNotFound,
            other => ApiError::Unexpected(other),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            ApiError::Decode(error.to_string())
        } else {
            ApiError::Network(error.to_string())
        }
    }
}
