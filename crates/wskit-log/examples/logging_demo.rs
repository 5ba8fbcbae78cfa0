//! Logs a few events in the configured format.

use wskit_log::{debug, info, init, spans, warn, LogConfig, LogFormat, LogLevel};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = LogConfig {
        level: LogLevel::Debug,
        format: LogFormat::Compact,
        span_events: true,
        ..LogConfig::from_env()
    };
    init(config)?;

    let span = spans::request_span("GET", "http://example/get", 5);
    let _guard = span.enter();

    debug!(attempt = 1, "sending request");
    warn!(attempts = 1, "transport failure, retrying");
    spans::record_outcome("success");
    info!("done");

    Ok(())
}
