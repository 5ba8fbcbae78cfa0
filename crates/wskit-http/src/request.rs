//! Fluent request builder.
//!
//! A builder is configured, then consumed by exactly one terminal call
//! (`get`, `post`, `post_text` or `execute`) which returns a
//! [`PendingResponse`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::config::{HttpConfig, DEFAULT_MAX_ATTEMPTS, GET_MAX_ATTEMPTS};
use crate::error::{HttpError, Result};
use crate::retry::{PendingResponse, RetryPolicy};
use crate::transport::{Transport, TransportRequest};

/// Common HTTP headers.
pub mod headers {
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const CONTENT_TYPE_JSON: &str = "application/json";
}

/// Accumulates method, URL, headers and body for one logical request.
pub struct RequestBuilder {
    transport: Arc<dyn Transport>,
    url: String,
    method: String,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    max_attempts: u32,
    timeout: Duration,
    retry_delay: Duration,
}

impl RequestBuilder {
    /// Create a GET request to `url` over `transport`.
    pub fn new(transport: Arc<dyn Transport>, url: impl Into<String>, config: &HttpConfig) -> Self {
        Self {
            transport,
            url: url.into(),
            method: "GET".to_string(),
            headers: HashMap::new(),
            body: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: config.request_timeout,
            retry_delay: config.retry_delay,
        }
    }

    /// Set the request method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Merge headers; later values win for the same name.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a single header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body to UTF-8 text.
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Bytes::from(body.into()));
        self
    }

    /// Set the body to a JSON document and the content type to match.
    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body).map_err(HttpError::Serialization)?;
        self.body = Some(Bytes::from(bytes));
        self.headers.insert(
            headers::CONTENT_TYPE.to_string(),
            headers::CONTENT_TYPE_JSON.to_string(),
        );
        Ok(self)
    }

    /// Limit on attempts used by [`execute`](Self::execute).
    ///
    /// `get`, `post` and `post_text` replace this with their own limit.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Deadline for each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a GET, retrying transport failures up to five attempts.
    pub fn get(mut self) -> PendingResponse {
        self.max_attempts = GET_MAX_ATTEMPTS;
        self.method("GET").execute()
    }

    /// Send a POST with `body` as text. Never retried.
    pub fn post_text(self, body: impl Into<String>) -> PendingResponse {
        self.text_body(body).post()
    }

    /// Send a POST with the body set earlier. Never retried.
    pub fn post(mut self) -> PendingResponse {
        self.max_attempts = DEFAULT_MAX_ATTEMPTS;
        self.method("POST").execute()
    }

    /// Send the request exactly as configured.
    pub fn execute(self) -> PendingResponse {
        let url = match Url::parse(&self.url) {
            Ok(url) => url,
            Err(source) => {
                return PendingResponse::failed(HttpError::InvalidUrl {
                    url: self.url,
                    source,
                })
            }
        };

        let request = TransportRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        };
        let policy = RetryPolicy::new(self.max_attempts).with_delay(self.retry_delay);

        PendingResponse::run(self.transport, request, policy)
    }
}

impl fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Bytes::len))
            .field("max_attempts", &self.max_attempts)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
