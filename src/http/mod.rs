//! HTTP surface of the relay.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request ID, trace, timeout, security headers)
//!     → shell.rs  (GET /, the embedding page)
//!     → relay::*  (form page, submissions, assets)
//!     → debug.rs  (log sink views, debug mode only)
//! ```

pub mod debug;
pub mod server;
pub mod shell;

pub use server::{AppState, HttpServer, StartupError};
