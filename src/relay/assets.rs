//! Static asset relay.
//!
//! Serves the scripts, stylesheets and images the rewritten form page
//! references under `/proxy/…`. Bytes are streamed through unchanged and may
//! be cached briefly by the browser. Every fetch and its outcome is logged:
//! one missing asset is enough to break the embedded page visibly.

use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{RelayError, RelayResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{request_id, ProxiedResponse, UpstreamRequest};

pub const ASSET_CACHE_CONTROL: &str = "public, max-age=3600";
pub const DEFAULT_ASSET_TYPE: &str = "application/octet-stream";

/// Resolve a relayed asset path against the form host.
///
/// Segments are joined with `/`. Paths emitted by the rewriter already start
/// with the base segment and hang off the origin directly; any other path is
/// placed under `/{base}/`.
pub fn asset_url(upstream: &UpstreamConfig, path: &str, query: Option<&str>) -> RelayResult<Url> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return Err(RelayError::BadRequest("empty asset path".into()));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(RelayError::BadRequest(
            "asset path must not contain dot segments".into(),
        ));
    }

    let mut url = Url::parse(upstream.origin())
        .map_err(|e| RelayError::Configuration(format!("upstream origin is invalid: {}", e)))?;

    {
        let mut resolved = url
            .path_segments_mut()
            .map_err(|_| RelayError::Configuration("upstream origin cannot carry a path".into()))?;
        resolved.clear();
        if segments[0] != upstream.base_segment {
            resolved.push(&upstream.base_segment);
        }
        resolved.extend(&segments);
    }

    url.set_query(query.filter(|q| !q.is_empty()));
    Ok(url)
}

/// `GET /proxy/{*path}`
pub async fn asset(
    State(state): State<AppState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let response = match fetch_asset(&state, &path, query.as_deref(), &headers).await {
        Ok(proxied) => proxied.into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_relay("asset", response.status().as_u16(), start);
    response
}

async fn fetch_asset(
    state: &AppState,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
) -> RelayResult<ProxiedResponse> {
    let request_id = request_id(headers);

    let url = asset_url(&state.config.upstream, path, query).inspect_err(|e| {
        tracing::warn!(request_id = %request_id, path = %path, error = %e, "Rejected asset path");
    })?;

    tracing::debug!(request_id = %request_id, url = %url, "Fetching asset");

    // static assets need no session, so only the user agent is forwarded
    let upstream = UpstreamRequest::get(url.clone()).user_agent_from(headers);

    let response = state.client.send(upstream).await.inspect_err(|e| {
        tracing::error!(request_id = %request_id, url = %url, error = %e, "Asset fetch failed");
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!(
            request_id = %request_id,
            url = %url,
            status = status.as_u16(),
            "Asset not available upstream"
        );
        return Err(RelayError::upstream(status, "upstream asset error"));
    }

    let mut proxied = ProxiedResponse::from_upstream(&response);
    let content_type = proxied
        .content_type
        .take()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ASSET_TYPE));

    tracing::info!(
        request_id = %request_id,
        url = %url,
        status = status.as_u16(),
        content_type = ?content_type,
        "Asset relayed"
    );

    proxied.content_type = Some(content_type);
    proxied.set_cookie.clear();
    proxied.cache_control = Some(HeaderValue::from_static(ASSET_CACHE_CONTROL));

    Ok(proxied.with_body(Body::from_stream(response.bytes_stream())))
}
