//! Structured logging initialization.
//!
//! Two output formats: human-readable lines for development, and
//! newline-delimited JSON for production log aggregation. The filter can
//! be overridden at runtime via `RUST_LOG`; otherwise the configured
//! level string is used (e.g. `"info"`, `"debug,tally_mirror=trace"`).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber. `format` is `"json"` or
/// anything else for human output.
pub fn init(format: &str, level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
