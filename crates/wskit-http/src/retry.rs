//! The retrying executor.
//!
//! One logical request is a strictly sequential series of attempts. Only a
//! transport failure leads to another attempt; any reply from the server
//! ends the request, successful or not.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::Instrument;
use wskit_log::spans::{record_outcome, request_span};

use crate::error::{HttpError, Result};
use crate::response::Response;
use crate::transport::{Transport, TransportError, TransportReply, TransportRequest};

/// How many attempts a logical request may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Upper bound on attempts, at least 1.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause before resubmitting after a transport failure.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Outcome of a single attempt.
#[derive(Debug)]
enum Attempt {
    Succeeded(Response),
    FailedStatus(HttpError),
    FailedTransport(TransportError),
}

fn classify(result: std::result::Result<TransportReply, TransportError>) -> Attempt {
    match result {
        Ok(reply) if reply.status < 400 => Attempt::Succeeded(Response::from_reply(reply)),
        Ok(reply) => Attempt::FailedStatus(HttpError::Status {
            status: reply.status,
            body: reply.body,
        }),
        Err(e) => Attempt::FailedTransport(e),
    }
}

/// Drive one logical request to its single final outcome.
///
/// The attempt counter is local to this call, so every execution starts
/// from zero and retries of the same request share it.
pub async fn execute(
    transport: Arc<dyn Transport>,
    request: TransportRequest,
    policy: RetryPolicy,
) -> Result<Response> {
    let max_attempts = policy.max_attempts();
    let mut attempts: u32 = 0;

    loop {
        tracing::debug!(attempt = attempts + 1, "sending request");

        let result = match tokio::time::timeout(request.timeout, transport.send(request.clone()))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        };

        match classify(result) {
            Attempt::Succeeded(response) => {
                record_outcome("success");
                tracing::debug!(status = response.status(), attempts = attempts + 1, "request succeeded");
                return Ok(response);
            }
            Attempt::FailedStatus(error) => {
                record_outcome("status");
                tracing::debug!(status = ?error.status(), "request rejected by server");
                return Err(error);
            }
            Attempt::FailedTransport(source) => {
                attempts += 1;

                if !source.is_retryable() || attempts >= max_attempts {
                    record_outcome("transport");
                    tracing::debug!(attempts, error = %source, "giving up");
                    return Err(HttpError::Transport { attempts, source });
                }

                tracing::warn!(attempts, max_attempts, error = %source, "transport failure, retrying");
                if !policy.delay().is_zero() {
                    tokio::time::sleep(policy.delay()).await;
                }
            }
        }
    }
}

/// Handle to a logical request running in the background.
///
/// Resolves exactly once with the final outcome. Dropping the handle does
/// not stop the request.
#[derive(Debug)]
pub struct PendingResponse {
    handle: JoinHandle<Result<Response>>,
}

impl PendingResponse {
    /// Start `future` on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = Result<Response>> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    pub(crate) fn run(
        transport: Arc<dyn Transport>,
        request: TransportRequest,
        policy: RetryPolicy,
    ) -> Self {
        let span = request_span(&request.method, request.url.as_str(), policy.max_attempts());
        Self::spawn(execute(transport, request, policy).instrument(span))
    }

    pub(crate) fn failed(error: HttpError) -> Self {
        Self::spawn(async move { Err(error) })
    }
}

impl Future for PendingResponse {
    type Output = Result<Response>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(HttpError::Aborted(e.to_string()))),
            Poll::Pending => Poll::Pending,
        }
    }
}
