//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files; the
//! environment overlay in `loader.rs` is applied on top.

use serde::{Deserialize, Serialize};

/// Root configuration for the form relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Fixed upstream form host.
    pub upstream: UpstreamConfig,

    /// Form page location and parameters.
    pub form: FormConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Embedding shell page settings.
    pub shell: ShellConfig,

    /// Debug log sink settings.
    pub debug: DebugConfig,

    /// Response security headers and request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// The single upstream host serving the form and its static assets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme and authority of the form host, without trailing slash.
    pub origin: String,

    /// First path segment of every form resource (also the marker the
    /// interception script looks for in outgoing request URLs).
    pub base_segment: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "https://ticketsplusform.mendoza.gov.ar".to_string(),
            base_segment: "ticketsplusform".to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Origin with any trailing slash removed.
    pub fn origin(&self) -> &str {
        self.origin.trim_end_matches('/')
    }
}

/// Location of the embedded form.
///
/// Both values are optional at load time; the relays report their absence
/// per request so the shell can still render a diagnostic page.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FormConfig {
    /// Full URL of the form page (`FORM_BASE_URL`).
    pub base_url: Option<String>,

    /// Opaque form parameter string (`FORM_PARAMS`).
    pub params: Option<String>,
}

/// Timeout configuration for inbound and upstream requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Overall inbound request timeout in seconds.
    pub request_secs: u64,

    /// Upstream TCP/TLS connect timeout in seconds.
    pub upstream_connect_secs: u64,

    /// Upstream round-trip timeout in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_connect_secs: 10,
            upstream_secs: 25,
        }
    }
}

/// Embedding shell page settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Page heading.
    pub title: String,

    /// Line shown under the heading.
    pub subtitle: String,

    /// iframe `width` attribute.
    pub iframe_width: String,

    /// iframe `height` attribute.
    pub iframe_height: String,

    /// iframe `sandbox` attribute.
    pub iframe_sandbox: String,

    /// Reload attempts after a load failure or timeout.
    pub retry_attempts: u32,

    /// Time allowed for the iframe to load, in milliseconds.
    pub load_timeout_ms: u64,

    /// Pause between reload attempts, in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            title: "Formulario Tickets Plus".to_string(),
            subtitle: "Gobierno de Mendoza".to_string(),
            iframe_width: "100%".to_string(),
            iframe_height: "800px".to_string(),
            iframe_sandbox:
                "allow-same-origin allow-scripts allow-forms allow-popups allow-top-navigation"
                    .to_string(),
            retry_attempts: 3,
            load_timeout_ms: 30_000,
            retry_delay_ms: 2_000,
        }
    }
}

/// Verbosity of the debug log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    /// Errors, warnings and info events.
    #[default]
    Normal,
    /// Additionally captures debug events.
    Verbose,
}

/// Debug log sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Capture log events and expose them under `/debug`.
    pub enabled: bool,

    /// Capture verbosity.
    pub level: DebugLevel,

    /// Entries kept before the oldest is dropped.
    pub max_entries: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: DebugLevel::Normal,
            max_entries: 100,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,

    /// Maximum inbound body size in bytes (form submissions).
    pub max_body_size: usize,

    /// Extra `frame-src` sources beyond the upstream origin.
    pub extra_frame_sources: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024, // 2MB
            extra_frame_sources: Vec::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "form_relay=debug,tower_http=debug".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [upstream]
            origin = "http://127.0.0.1:9000/"

            [debug]
            enabled = true
            level = "verbose"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.origin(), "http://127.0.0.1:9000");
        assert_eq!(config.upstream.base_segment, "ticketsplusform");
        assert!(config.debug.enabled);
        assert_eq!(config.debug.level, DebugLevel::Verbose);
        assert_eq!(config.debug.max_entries, 100);
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert!(config.form.base_url.is_none());
    }
}
