//! Outbound calls to the form host.
//!
//! One `UpstreamRequest` is built per inbound request and consumed by a
//! single round trip; nothing is retried or cached.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::config::TimeoutConfig;

/// The subset of an inbound request forwarded upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: Url,
    pub method: Method,
    pub user_agent: Option<HeaderValue>,
    pub content_type: Option<HeaderValue>,
    pub cookie: Option<HeaderValue>,
    pub body: Option<Bytes>,
}

impl UpstreamRequest {
    pub fn get(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            user_agent: None,
            content_type: None,
            cookie: None,
            body: None,
        }
    }

    pub fn post(url: Url, content_type: HeaderValue, body: Bytes) -> Self {
        Self {
            url,
            method: Method::POST,
            user_agent: None,
            content_type: Some(content_type),
            cookie: None,
            body: Some(body),
        }
    }

    /// Forward the caller's `User-Agent`.
    pub fn user_agent_from(mut self, headers: &HeaderMap) -> Self {
        self.user_agent = headers.get(header::USER_AGENT).cloned();
        self
    }

    /// Forward the caller's `Cookie` header unmodified.
    pub fn cookies_from(mut self, headers: &HeaderMap) -> Self {
        self.cookie = headers.get(header::COOKIE).cloned();
        self
    }
}

/// Shared HTTP client for the form host.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.upstream_connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .build()?;
        Ok(Self { http })
    }

    /// Perform the single upstream round trip.
    pub async fn send(&self, request: UpstreamRequest) -> Result<reqwest::Response, reqwest::Error> {
        let mut builder = self.http.request(request.method, request.url);

        if let Some(user_agent) = request.user_agent {
            builder = builder.header(header::USER_AGENT, user_agent);
        }
        if let Some(content_type) = request.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(cookie) = request.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        builder.send().await
    }
}

/// Upstream response relayed back to the caller.
#[derive(Debug)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub set_cookie: Vec<HeaderValue>,
    pub cache_control: Option<HeaderValue>,
    pub body: Body,
}

impl ProxiedResponse {
    /// Copy status, `content-type` and every `set-cookie` from `response`.
    /// The body is attached by the caller.
    pub fn from_upstream(response: &reqwest::Response) -> Self {
        let headers = response.headers();
        Self {
            status: response.status(),
            content_type: headers.get(header::CONTENT_TYPE).cloned(),
            set_cookie: headers.get_all(header::SET_COOKIE).iter().cloned().collect(),
            cache_control: None,
            body: Body::empty(),
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Reason phrase sent with the status line.
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }
}

impl IntoResponse for ProxiedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, content_type);
        }
        if let Some(cache_control) = self.cache_control {
            headers.insert(header::CACHE_CONTROL, cache_control);
        }
        for cookie in self.set_cookie {
            headers.append(header::SET_COOKIE, cookie);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_header_subset() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("Mozilla/5.0"));
        headers.insert(header::COOKIE, HeaderValue::from_static("JSESSIONID=abc"));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("es-AR"));

        let url = Url::parse("https://forms.example/app").unwrap();
        let request = UpstreamRequest::get(url.clone()).user_agent_from(&headers);
        assert_eq!(request.user_agent.unwrap(), "Mozilla/5.0");
        assert!(request.cookie.is_none());

        let request = UpstreamRequest::post(
            url,
            HeaderValue::from_static("text/plain"),
            Bytes::from_static(b"hi"),
        )
        .user_agent_from(&headers)
        .cookies_from(&headers);
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.cookie.unwrap(), "JSESSIONID=abc");
        assert_eq!(request.body.unwrap(), Bytes::from_static(b"hi"));
    }

    #[test]
    fn test_proxied_response_headers() {
        let proxied = ProxiedResponse {
            status: StatusCode::CREATED,
            content_type: Some(HeaderValue::from_static("application/json")),
            set_cookie: vec![
                HeaderValue::from_static("a=1; Path=/"),
                HeaderValue::from_static("b=2; Path=/"),
            ],
            cache_control: None,
            body: Body::from("{}"),
        };
        assert_eq!(proxied.status_text(), "Created");

        let response = proxied.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }
}
