//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the shell, relay and debug handlers
//! - Wire up middleware (request ID, tracing, timeout, body limit, security headers)
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::{debug, shell};
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::LogSink;
use crate::relay::{assets, form_frame, submission, UpstreamClient, FORM_ROUTE, PROXY_PREFIX, SUBMIT_ROUTE};
use crate::rewrite::Rewriter;
use crate::security::headers::security_headers;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub client: UpstreamClient,
    pub rewriter: Arc<Rewriter>,
    pub log_sink: Option<LogSink>,
}

/// Errors that prevent the server from being built.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid rewrite pattern: {0}")]
    Rewrite(#[from] regex::Error),
}

/// HTTP server for the form relay.
pub struct HttpServer {
    router: Router,
    config: Arc<RelayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, StartupError> {
        Self::with_log_sink(config, None)
    }

    /// Create a server whose debug endpoints read from `log_sink`.
    pub fn with_log_sink(config: RelayConfig, log_sink: Option<LogSink>) -> Result<Self, StartupError> {
        let client = UpstreamClient::new(&config.timeouts)?;
        let rewriter = Arc::new(Rewriter::new(&config.upstream.base_segment)?);
        let config = Arc::new(config);

        if config.form.base_url.is_none() || config.form.params.is_none() {
            tracing::warn!("FORM_BASE_URL or FORM_PARAMS not set; the form relay will answer with configuration errors");
        }

        let state = AppState {
            config: config.clone(),
            client,
            rewriter,
            log_sink,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let mut routes = Router::new()
            .route("/", get(shell::shell_page))
            .route("/health", get(health))
            .route(FORM_ROUTE, get(form_frame::form_frame))
            .route(SUBMIT_ROUTE, post(submission::form_submit))
            .route(&format!("{}/{{*path}}", PROXY_PREFIX), get(assets::asset));

        if state.log_sink.is_some() {
            routes = routes.merge(debug::debug_routes());
        }

        let mut router = routes
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        for (name, value) in security_headers(&config.security, &config.upstream) {
            router = router.layer(SetResponseHeaderLayer::if_not_present(name, value));
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires or Ctrl+C is received.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.origin(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
