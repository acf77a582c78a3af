//! The three stateless relays between the embedding page and the form host.
//!
//! # Data Flow
//! ```text
//! GET  /form-frame        → form_frame.rs  → upstream GET form page → rewrite → HTML
//! POST /form-proxy?{q}    → submission.rs  → upstream POST {FORM_BASE_URL}?{q} → passthrough
//! GET  /proxy/{*path}     → assets.rs      → upstream GET {origin}/{base}/…   → passthrough
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream call per inbound request, no retries
//! - No state across requests; cookies are the only session carrier
//! - Configuration errors are reported before any network call

pub mod assets;
pub mod form_frame;
pub mod submission;
pub mod upstream;

use axum::http::HeaderMap;

pub use upstream::{ProxiedResponse, UpstreamClient, UpstreamRequest};

/// Route serving the rewritten form page.
pub const FORM_ROUTE: &str = "/form-frame";

/// Route receiving intercepted form submissions.
pub const SUBMIT_ROUTE: &str = "/form-proxy";

/// Prefix under which upstream assets are relayed.
pub const PROXY_PREFIX: &str = "/proxy";

/// Request ID assigned by the request-id layer, for log correlation.
pub(crate) fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
