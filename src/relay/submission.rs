//! Form submission relay.
//!
//! Byte-for-byte passthrough of intercepted POSTs: the body and query string
//! go upstream untouched and the upstream status, `content-type`,
//! `set-cookie` and body come back untouched.

use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{RawQuery, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::FormConfig;
use crate::error::{RelayError, RelayResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::relay::{request_id, ProxiedResponse, UpstreamRequest};

pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Build `{base_url}?{query}`; an absent or empty query leaves the base URL as is.
///
/// The form parameters are not part of the URL, but a relay without them has
/// no form to submit to and is reported as misconfigured.
pub fn submission_url(form: &FormConfig, query: Option<&str>) -> RelayResult<Url> {
    let base_url = form
        .base_url
        .as_deref()
        .ok_or_else(|| RelayError::Configuration("FORM_BASE_URL is not set".into()))?;
    if form.params.is_none() {
        return Err(RelayError::Configuration("FORM_PARAMS is not set".into()));
    }

    let raw = match query.filter(|q| !q.is_empty()) {
        Some(query) => format!("{}?{}", base_url, query),
        None => base_url.to_string(),
    };

    Url::parse(&raw)
        .map_err(|e| RelayError::Configuration(format!("FORM_BASE_URL is invalid: {}", e)))
}

/// `POST /form-proxy`
pub async fn form_submit(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let response = match relay_submission(&state, query.as_deref(), &headers, body).await {
        Ok(proxied) => proxied.into_response(),
        Err(e) => e.into_response(),
    };
    metrics::record_relay("form_submit", response.status().as_u16(), start);
    response
}

async fn relay_submission(
    state: &AppState,
    query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> RelayResult<ProxiedResponse> {
    let request_id = request_id(headers);

    let url = submission_url(&state.config.form, query).inspect_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Submission relay misconfigured");
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    tracing::info!(
        request_id = %request_id,
        url = %url,
        content_type = ?content_type,
        body_bytes = body.len(),
        "Relaying form submission"
    );

    let upstream = UpstreamRequest::post(url.clone(), content_type, body)
        .user_agent_from(headers)
        .cookies_from(headers);

    let response = state.client.send(upstream).await.inspect_err(|e| {
        tracing::error!(request_id = %request_id, url = %url, error = %e, "Submission failed");
    })?;

    // redirects are followed; the relayed answer is the final hop's
    if response.url() != &url {
        tracing::debug!(
            request_id = %request_id,
            from = %url,
            to = %response.url(),
            "Submission redirected upstream"
        );
    }

    let proxied = ProxiedResponse::from_upstream(&response);
    let bytes = response.bytes().await.inspect_err(|e| {
        tracing::error!(request_id = %request_id, url = %url, error = %e, "Submission response read failed");
    })?;

    if proxied.status.is_success() {
        tracing::info!(
            request_id = %request_id,
            status = proxied.status.as_u16(),
            cookies = proxied.set_cookie.len(),
            "Submission relayed"
        );
    } else {
        tracing::warn!(
            request_id = %request_id,
            url = %url,
            status = proxied.status.as_u16(),
            status_text = proxied.status_text(),
            "Form server rejected submission"
        );
    }

    Ok(proxied.with_body(Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(base_url: Option<&str>) -> FormConfig {
        FormConfig {
            base_url: base_url.map(String::from),
            params: Some("UUID=abc".into()),
        }
    }

    #[test]
    fn test_query_copied_verbatim() {
        let url = submission_url(&form(Some("https://forms.example/app/form")), Some("x=1&gxajaxEvt=1")).unwrap();
        assert_eq!(url.as_str(), "https://forms.example/app/form?x=1&gxajaxEvt=1");
    }

    #[test]
    fn test_empty_query_leaves_base_url() {
        let base = "https://forms.example/app/form";
        assert_eq!(submission_url(&form(Some(base)), None).unwrap().as_str(), base);
        assert_eq!(submission_url(&form(Some(base)), Some("")).unwrap().as_str(), base);
    }

    #[test]
    fn test_both_form_values_required() {
        assert!(matches!(
            submission_url(&form(None), Some("a=b")),
            Err(RelayError::Configuration(_))
        ));

        let mut no_params = form(Some("https://forms.example/f"));
        no_params.params = None;
        assert!(matches!(
            submission_url(&no_params, Some("a=b")),
            Err(RelayError::Configuration(m)) if m.contains("FORM_PARAMS")
        ));
    }
}
