//! Response security headers.
//!
//! # Responsibilities
//! - Allow framing only by our own origin (`X-Frame-Options: SAMEORIGIN`)
//! - Allow our pages to frame the form host (`Content-Security-Policy: frame-src`)
//! - Disable MIME sniffing and limit referrer leakage
//!
//! Applied to every response with "if not present" semantics, so a relayed
//! response never has its own values overwritten.

use axum::http::{header, HeaderName, HeaderValue};
use url::{Host, Url};

use crate::config::{SecurityConfig, UpstreamConfig};

/// `frame-src` sources: our origin, the form origin and a wildcard over the
/// form host's parent domain.
pub fn frame_sources(upstream: &UpstreamConfig, extra: &[String]) -> Vec<String> {
    let mut sources = vec!["'self'".to_string(), upstream.origin().to_string()];

    if let Ok(url) = Url::parse(upstream.origin()) {
        if let Some(Host::Domain(domain)) = url.host() {
            let labels: Vec<&str> = domain.split('.').collect();
            if labels.len() >= 3 {
                sources.push(format!("{}://*.{}", url.scheme(), labels[1..].join(".")));
            }
        }
    }

    sources.extend(extra.iter().cloned());
    sources
}

/// Policy letting the shell frame the form host.
pub fn content_security_policy(upstream: &UpstreamConfig, extra: &[String]) -> String {
    format!(
        "frame-src {}; script-src 'self' 'unsafe-inline' 'unsafe-eval'; object-src 'none'; base-uri 'self';",
        frame_sources(upstream, extra).join(" ")
    )
}

/// Headers to set on every response; empty when disabled.
pub fn security_headers(
    security: &SecurityConfig,
    upstream: &UpstreamConfig,
) -> Vec<(HeaderName, HeaderValue)> {
    if !security.enable_headers {
        return Vec::new();
    }

    let mut headers = vec![
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("origin-when-cross-origin"),
        ),
    ];

    let csp = content_security_policy(upstream, &security.extra_frame_sources);
    match HeaderValue::from_str(&csp) {
        Ok(value) => headers.push((header::CONTENT_SECURITY_POLICY, value)),
        Err(_) => tracing::warn!(policy = %csp, "Content-Security-Policy is not a valid header value; omitted"),
    }

    headers
}
