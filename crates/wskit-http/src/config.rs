//! HTTP client configuration.

use std::time::Duration;

/// Attempt limit applied by `RequestBuilder::get`.
pub const GET_MAX_ATTEMPTS: u32 = 5;

/// Attempt limit applied by `RequestBuilder::post` and new builders.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// HTTP client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Deadline of a single attempt, not of the whole retry sequence.
    pub request_timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip decompression.
    pub gzip: bool,
    /// Pause between a transport failure and the next attempt.
    pub retry_delay: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("wskit/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            retry_delay: Duration::ZERO,
        }
    }
}

impl HttpConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparseable variables keep their default value.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("WSKIT_HTTP_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = env_parse::<u64>("WSKIT_HTTP_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Ok(user_agent) = std::env::var("WSKIT_HTTP_USER_AGENT") {
            if !user_agent.trim().is_empty() {
                config.user_agent = user_agent;
            }
        }

        if let Ok(gzip) = std::env::var("WSKIT_HTTP_GZIP") {
            config.gzip = gzip.to_lowercase() == "true" || gzip == "1";
        }

        if let Some(ms) = env_parse::<u64>("WSKIT_HTTP_RETRY_DELAY_MS") {
            config.retry_delay = Duration::from_millis(ms);
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring invalid configuration value");
            None
        }
    }
}
