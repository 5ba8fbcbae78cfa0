//! Spans for request tracing.

use tracing::{field, info_span, Span};

/// Span covering one logical request and all of its attempts.
///
/// `outcome` starts empty and is filled in by [`record_outcome`].
pub fn request_span(method: &str, url: &str, max_attempts: u32) -> Span {
    info_span!(
        "request",
        method = %method,
        url = %url,
        max_attempts,
        outcome = field::Empty,
    )
}

/// Record how the current request ended.
pub fn record_outcome(outcome: &str) {
    Span::current().record("outcome", outcome);
}
