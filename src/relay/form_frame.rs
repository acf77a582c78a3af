//! Form fetcher and rewriter.
//!
//! Fetches the form page, moves its resource references under the asset
//! relay, injects the interception script and serves the result uncached.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::FormConfig;
use crate::error::{RelayError, RelayResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{request_id, UpstreamRequest};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Parameter appended to the form parameters so no cache answers for the host.
const CACHE_BUSTER: &str = "gx-no-cache";

/// Build `{base_url}?{params},gx-no-cache={token}`.
///
/// The form host separates its parameters with commas, so the token joins
/// the parameter string the same way.
pub fn form_url(form: &FormConfig, token: u128) -> RelayResult<Url> {
    let base_url = form
        .base_url
        .as_deref()
        .ok_or_else(|| RelayError::Configuration("FORM_BASE_URL is not set".into()))?;
    let params = form
        .params
        .as_deref()
        .ok_or_else(|| RelayError::Configuration("FORM_PARAMS is not set".into()))?;

    Url::parse(&format!("{}?{},{}={}", base_url, params, CACHE_BUSTER, token))
        .map_err(|e| RelayError::Configuration(format!("FORM_BASE_URL is invalid: {}", e)))
}

fn cache_token() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// `GET /form-frame`
pub async fn form_frame(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let start = Instant::now();
    let response = match fetch_and_rewrite(&state, &headers).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    metrics::record_relay("form_frame", response.status().as_u16(), start);
    response
}

async fn fetch_and_rewrite(state: &AppState, headers: &HeaderMap) -> RelayResult<Response> {
    let request_id = request_id(headers);

    let url = form_url(&state.config.form, cache_token()).inspect_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Form relay misconfigured");
    })?;

    tracing::info!(request_id = %request_id, url = %url, "Fetching form page");

    let upstream = UpstreamRequest::get(url.clone())
        .user_agent_from(headers)
        .cookies_from(headers);

    let response = state.client.send(upstream).await.inspect_err(|e| {
        tracing::error!(request_id = %request_id, url = %url, error = %e, "Form fetch failed");
    })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(
            request_id = %request_id,
            url = %url,
            status = status.as_u16(),
            "Form server returned an error"
        );
        return Err(RelayError::upstream(status, "form server error"));
    }

    let set_cookie: Vec<HeaderValue> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .cloned()
        .collect();

    let html = response.text().await.inspect_err(|e| {
        tracing::error!(request_id = %request_id, url = %url, error = %e, "Form body read failed");
    })?;

    let rewritten = state.rewriter.rewrite(&html);
    if !rewritten.injected {
        tracing::warn!(
            request_id = %request_id,
            "Form page has no </head>; interception script not injected"
        );
    }

    tracing::debug!(
        request_id = %request_id,
        upstream_bytes = html.len(),
        rewritten_bytes = rewritten.html.len(),
        "Form page rewritten"
    );

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HTML_CONTENT_TYPE),
            (header::CACHE_CONTROL, NO_CACHE),
        ],
        rewritten.html,
    )
        .into_response();

    for cookie in set_cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }

    Ok(response)
}
