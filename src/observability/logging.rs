//! Structured logging.
//!
//! `RUST_LOG` wins over the configured default filter. When debug mode is on
//! the returned sink also receives this crate's events for `/debug/logs`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{DebugConfig, ObservabilityConfig};
use crate::observability::log_sink::{LogSink, SinkLayer};

/// Install the global subscriber. Returns the debug sink when enabled.
pub fn init_logging(observability: &ObservabilityConfig, debug: &DebugConfig) -> Option<LogSink> {
    let sink = debug.enabled.then(|| LogSink::new(debug.max_entries));

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| observability.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(sink.clone().map(|sink| SinkLayer::new(sink, debug.level)))
        .init();

    sink
}
