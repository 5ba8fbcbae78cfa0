//! Entry point for building requests.

use std::fmt;
use std::sync::Arc;

use crate::config::HttpConfig;
use crate::error::{HttpError, Result};
use crate::request::RequestBuilder;
use crate::transport::{ReqwestTransport, Transport};

/// Hands out [`RequestBuilder`]s that share one transport.
///
/// Cloning is cheap; clones share the transport and config.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: Arc<HttpConfig>,
}

impl Client {
    /// Create a client backed by reqwest with default config.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a client backed by reqwest with custom config.
    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_config(&config).map_err(HttpError::ClientBuild)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Create a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: HttpConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Start a request to `url`.
    pub fn url(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Arc::clone(&self.transport), url, &self.config)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish_non_exhaustive()
    }
}
