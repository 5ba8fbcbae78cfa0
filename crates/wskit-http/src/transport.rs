//! The transport seam between the retrying executor and the network.
//!
//! A [`Transport`] performs exactly one exchange and reports either a reply
//! (for any status code) or a [`TransportError`]. Status classification and
//! retries live in the executor, so fakes only need to script outcomes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, Method};
use url::Url;

use crate::config::HttpConfig;

/// A single attempt's worth of request state.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: String,
    pub url: Url,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    /// Deadline for this attempt only.
    pub timeout: Duration,
}

/// Whatever the server sent back, regardless of status.
#[derive(Debug, Clone)]
pub struct TransportReply {
    pub status: u16,
    /// Final URL after redirects.
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure to complete an exchange. No response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(String),

    /// The request can never be sent as configured.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Whether a later attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::InvalidRequest(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_builder() {
            TransportError::InvalidRequest(e.to_string())
        } else {
            TransportError::Request(e)
        }
    }
}

/// Something that can perform one HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportError>;
}

/// Build a configured reqwest client.
pub fn build_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let builder = ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent);

    builder.gzip(config.gzip).build()
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: Client,
}

impl ReqwestTransport {
    /// Create a transport with the given config.
    pub fn with_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            inner: build_client(config)?,
        })
    }

    /// Wrap an existing client.
    pub fn from_client(inner: Client) -> Self {
        Self { inner }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name = HeaderName::try_from(name.as_str())
            .map_err(|e| TransportError::InvalidRequest(format!("header name {name:?}: {e}")))?;
        let header_value = HeaderValue::try_from(value.as_str())
            .map_err(|e| TransportError::InvalidRequest(format!("header {name:?} value: {e}")))?;
        // Names differing only in case are distinct entries; send them all.
        map.append(header_name, header_value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportReply, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            TransportError::InvalidRequest(format!("method {:?}: {e}", request.method))
        })?;
        let headers = header_map(&request.headers)?;

        let mut builder = self
            .inner
            .request(method, request.url)
            .headers(headers)
            .timeout(request.timeout);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().clone();
        let headers = response.headers().clone();

        // Buffered; a body cut short counts as a transport failure.
        let body = response.bytes().await?;

        Ok(TransportReply {
            status,
            url,
            headers,
            body,
        })
    }
}
