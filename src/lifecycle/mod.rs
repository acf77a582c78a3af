//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Init logging/metrics → Build server → Bind
//!
//! Shutdown:
//!     Signal or trigger → stop accepting → drain in-flight relays → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
