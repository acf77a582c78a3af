//! Form relay library.
//!
//! Serves a third-party form from this origin: the form page is fetched and
//! rewritten so its assets and submissions flow back through local routes.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod rewrite;
pub mod security;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
