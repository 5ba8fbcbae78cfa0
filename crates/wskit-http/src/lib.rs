//! Fluent asynchronous HTTP requests with retry of idempotent GETs.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = wskit_http::Client::new()?;
//! let response = client.url("https://httpbin.org/get").get().await?;
//! println!("{}", response.json()?["url"]);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

pub use client::Client;
pub use config::{HttpConfig, DEFAULT_MAX_ATTEMPTS, GET_MAX_ATTEMPTS};
pub use error::{HttpError, ResponseError, Result};
pub use request::{headers, RequestBuilder};
pub use response::Response;
pub use retry::{PendingResponse, RetryPolicy};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportReply, TransportRequest};
