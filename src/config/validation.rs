//! Configuration validation.
//!
//! Serde handles syntax; this checks values. All errors are collected so a
//! broken deployment is fixed in one pass. Missing form values are not an
//! error here: the relays report them per request.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("upstream.origin {0:?} must be an absolute http(s) URL without path")]
    Origin(String),

    #[error("upstream.base_segment {0:?} must be a single non-empty path segment")]
    BaseSegment(String),

    #[error("form.base_url {0:?} is not an absolute http(s) URL")]
    FormBaseUrl(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.upstream_secs ({upstream}) must be below timeouts.request_secs ({request})")]
    UpstreamOutlivesRequest { upstream: u64, request: u64 },

    #[error("debug.max_entries must be greater than zero")]
    ZeroLogCapacity,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    match Url::parse(config.upstream.origin()) {
        Ok(url) if is_http(&url) && url.path() == "/" && url.query().is_none() => {}
        _ => errors.push(ValidationError::Origin(config.upstream.origin.clone())),
    }

    let segment = &config.upstream.base_segment;
    let segment_ok = !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && segment != "."
        && segment != "..";
    if !segment_ok {
        errors.push(ValidationError::BaseSegment(segment.clone()));
    }

    if let Some(base_url) = &config.form.base_url {
        if !Url::parse(base_url).map(|u| is_http(&u)).unwrap_or(false) {
            errors.push(ValidationError::FormBaseUrl(base_url.clone()));
        }
    }

    for (name, value) in [
        ("request_secs", config.timeouts.request_secs),
        ("upstream_connect_secs", config.timeouts.upstream_connect_secs),
        ("upstream_secs", config.timeouts.upstream_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    // the upstream client has to time out inside the request timeout layer
    let timeouts = &config.timeouts;
    if timeouts.upstream_secs > 0
        && timeouts.request_secs > 0
        && timeouts.upstream_secs >= timeouts.request_secs
    {
        errors.push(ValidationError::UpstreamOutlivesRequest {
            upstream: timeouts.upstream_secs,
            request: timeouts.request_secs,
        });
    }

    if config.debug.max_entries == 0 {
        errors.push(ValidationError::ZeroLogCapacity);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
