//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relays and server produce:
//!     → logging.rs (structured tracing events, fmt to stdout)
//!     → log_sink.rs (bounded copy for /debug/logs, debug mode only)
//!     → metrics.rs (counters and histograms per relay)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape endpoint (optional)
//!     → debug endpoints on the relay itself
//! ```
//!
//! # Design Decisions
//! - Request ID (x-request-id) is attached to every relay log line
//! - Every upstream target URL, status and error is logged
//! - The debug sink is owned by the server, not a global

pub mod log_sink;
pub mod logging;
pub mod metrics;

pub use log_sink::{LogEntry, LogLevel, LogSink, SinkLayer, SubscriptionId};
