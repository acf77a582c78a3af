//! Form relay
//!
//! Same-origin reverse proxy for an embedded third-party form.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                  FORM RELAY                   │
//!                    │                                               │
//!   Browser          │  GET /             shell page + iframe        │
//!   ─────────────────┼▶ GET /form-frame   fetch + rewrite + inject ──┼──▶ Form host
//!                    │  POST /form-proxy  body passthrough ──────────┼──▶ Form host
//!                    │  GET /proxy/{*p}   streamed asset ────────────┼──▶ Form host
//!                    │                                               │
//!                    │  ┌─────────┐ ┌─────────────┐ ┌─────────────┐  │
//!                    │  │ config  │ │observability│ │  security   │  │
//!                    │  │file+env │ │ logs+metrics│ │   headers   │  │
//!                    │  └─────────┘ └─────────────┘ └─────────────┘  │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use form_relay::config::load_config;
use form_relay::observability::{logging::init_logging, metrics::init_metrics};
use form_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "form-relay")]
#[command(about = "Same-origin relay for an embedded form", long_about = None)]
struct Args {
    /// TOML configuration file; environment variables override it
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logging needs the config, so configuration errors go to stderr.
    let config = load_config(args.config.as_deref())?;
    let log_sink = init_logging(&config.observability, &config.debug);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "form-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.origin(),
        form_configured = config.form.base_url.is_some(),
        debug = config.debug.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server = HttpServer::with_log_sink(config, log_sink)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
