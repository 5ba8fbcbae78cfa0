//! Error types for request execution.
//!
//! Network and status failures reach the caller through the pending result.
//! `Serialization` is the only error raised while configuring a request.

use crate::transport::TransportError;

/// Errors produced by a logical request.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// No response was received; `attempts` counts every attempt made.
    #[error("transport failure after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The server answered with a status code of 400 or above.
    #[error("invalid status code: {status}")]
    Status { status: u16, body: bytes::Bytes },

    /// A JSON request body could not be encoded.
    #[error("failed to serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The task driving the request panicked or was cancelled by the runtime.
    #[error("request task aborted: {0}")]
    Aborted(String),
}

impl HttpError {
    /// Status code of a protocol failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request failed without receiving a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, HttpError::Transport { .. })
    }

    /// Number of attempts made before a transport failure was surfaced.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            HttpError::Transport { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Body of the error response, lossily decoded.
    pub fn body_text(&self) -> Option<String> {
        match self {
            HttpError::Status { body, .. } => Some(String::from_utf8_lossy(body).into_owned()),
            _ => None,
        }
    }
}

/// Errors produced by the on-demand views of a `Response`.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("response body is not valid UTF-8 (status {status}): {source}")]
    Decoding {
        status: u16,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("failed to parse JSON (status {status}): {message}")]
    Parse { status: u16, message: String },
}

/// Result alias for request execution.
pub type Result<T> = std::result::Result<T, HttpError>;
