//! Completed HTTP responses.
//!
//! A [`Response`] owns the buffered body of a successful logical request.
//! The text and JSON views are computed on demand; a body that fails to
//! decode only fails the accessor that was asked for it.

use std::sync::OnceLock;

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ResponseError;
use crate::transport::TransportReply;

/// Immutable response of a successful logical request.
#[derive(Debug)]
pub struct Response {
    status: u16,
    url: Url,
    headers: HeaderMap,
    raw: Bytes,
    json: OnceLock<Result<serde_json::Value, String>>,
}

impl Response {
    pub(crate) fn from_reply(reply: TransportReply) -> Self {
        Self::new(reply.status, reply.url, reply.headers, reply.body)
    }

    /// Assemble a response from its parts.
    pub fn new(status: u16, url: Url, headers: HeaderMap, raw: Bytes) -> Self {
        Self {
            status,
            url,
            headers,
            raw,
            json: OnceLock::new(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Final URL after redirects.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Value of a header, if present and printable.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.raw
    }

    pub fn into_bytes(self) -> Bytes {
        self.raw
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, ResponseError> {
        std::str::from_utf8(&self.raw).map_err(|source| ResponseError::Decoding {
            status: self.status,
            source,
        })
    }

    /// The body parsed as JSON. Parsed at most once.
    pub fn json(&self) -> Result<&serde_json::Value, ResponseError> {
        let parsed = self
            .json
            .get_or_init(|| serde_json::from_slice(&self.raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(value) => Ok(value),
            Err(message) => {
                tracing::debug!(status = self.status, %message, "response body is not JSON");
                Err(ResponseError::Parse {
                    status: self.status,
                    message: message.clone(),
                })
            }
        }
    }

    /// The body decoded into a typed value.
    pub fn json_as<T: DeserializeOwned>(&self) -> Result<T, ResponseError> {
        serde_json::from_slice(&self.raw).map_err(|e| ResponseError::Parse {
            status: self.status,
            message: e.to_string(),
        })
    }
}
