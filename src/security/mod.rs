//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Every response:
//!     → headers.rs (framing, CSP, nosniff, referrer policy)
//! Inbound bodies:
//!     → server-level body limit (security.max_body_size)
//! ```

pub mod headers;
