//! Error types for catbox-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for catbox-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for catbox-core
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed caller input (missing file name, bad URL, bad identifier)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation needs a userhash and none is configured
    #[error("Userhash required: {0}")]
    Unauthenticated(String),

    /// The request was sent (or attempted) and did not succeed
    #[error("Upload failed: {0}")]
    UploadFailed(#[from] UploadFailure),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),
}

/// Why a request to the service failed.
///
/// The service has no structured error format, so the raw status and body
/// are kept for diagnosis.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// Connection, TLS or protocol failure before a response arrived
    #[error("network error: {message}")]
    Transport { message: String },

    /// The request exceeded the configured timeout
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Non-2xx HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// 2xx status but the body is not what the operation returns on success
    #[error("unexpected response (HTTP {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },
}

impl Error {
    /// HTTP status of the failed exchange, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UploadFailed(UploadFailure::Status { status, .. })
            | Error::UploadFailed(UploadFailure::UnexpectedResponse { status, .. }) => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Raw response body of the failed exchange, when a response was received
    pub fn body(&self) -> Option<&str> {
        match self {
            Error::UploadFailed(UploadFailure::Status { body, .. })
            | Error::UploadFailed(UploadFailure::UnexpectedResponse { body, .. }) => {
                Some(body.as_str())
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UploadFailure::Timeout {
                message: err.to_string(),
            }
            .into()
        } else {
            UploadFailure::Transport {
                message: err.to_string(),
            }
            .into()
        }
    }
}
