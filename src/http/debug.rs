//! Debug endpoints over the in-memory log sink.
//!
//! Mounted only when debug mode is on; otherwise these paths are 404.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::config::DebugLevel;
use crate::http::server::AppState;
use crate::observability::LogEntry;

pub fn debug_routes() -> Router<AppState> {
    Router::new()
        .route("/debug/logs", get(get_logs).delete(clear_logs))
        .route("/debug/environment", get(get_environment))
}

#[derive(Debug, Serialize)]
pub struct LogsView {
    pub capacity: usize,
    pub entries: Vec<LogEntry>,
}

/// Configuration summary; the form parameters are masked.
#[derive(Debug, Serialize)]
pub struct EnvironmentView {
    pub version: &'static str,
    pub form_base_url: Option<String>,
    pub form_params: &'static str,
    pub upstream_origin: String,
    pub base_segment: String,
    pub debug_level: DebugLevel,
}

async fn get_logs(State(state): State<AppState>) -> Response {
    match &state.log_sink {
        Some(sink) => Json(LogsView {
            capacity: sink.capacity(),
            entries: sink.snapshot(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn clear_logs(State(state): State<AppState>) -> StatusCode {
    match &state.log_sink {
        Some(sink) => {
            sink.clear();
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn get_environment(State(state): State<AppState>) -> Json<EnvironmentView> {
    let config = &state.config;
    Json(EnvironmentView {
        version: env!("CARGO_PKG_VERSION"),
        form_base_url: config.form.base_url.clone(),
        form_params: if config.form.params.is_some() {
            "[configured]"
        } else {
            "[not configured]"
        },
        upstream_origin: config.upstream.origin().to_string(),
        base_segment: config.upstream.base_segment.clone(),
        debug_level: config.debug.level,
    })
}
