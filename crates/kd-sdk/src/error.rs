//! Error types for the Kodopo SDK

use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Kodopo SDK
#[derive(Error, Debug)]
pub enum Error {
    /// No response was received (offline, DNS, timeout)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401 that the session layer could not recover from
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 403
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// 400 / 422 business or validation rejection
    #[error("Validation error ({status}): {message}")]
    Validation { status: u16, message: String },

    /// 5xx
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The token refresh this request depended on failed
    #[error("Token refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential store could not be read or written
    #[error("Credential storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an error from an HTTP status code and response body
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => Error::Unauthorized(message),
            403 => Error::Forbidden(message),
            404 => Error::NotFound(message),
            code @ (400 | 422) => Error::Validation { status: code, message },
            code @ 500..=599 => Error::Server { status: code, message },
            code => Error::Status { status: code, message },
        }
    }

    /// The HTTP status that produced this error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Unauthorized(_) => Some(401),
            Error::Forbidden(_) => Some(403),
            Error::NotFound(_) => Some(404),
            Error::Validation { status, .. }
            | Error::Server { status, .. }
            | Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// True when the request never produced a response
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(e) if e.status().is_none())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Why a token refresh failed.
///
/// Cloned to every request that queued behind the refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no refresh token available")]
    MissingRefreshToken,

    #[error("refresh endpoint returned {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("could not persist refreshed tokens: {0}")]
    Storage(String),

    #[error("refresh was abandoned before it settled")]
    Abandoned,
}
