//! Connector Proxy
//!
//! Forwards inbound calls to third-party APIs, injecting per-connector
//! credentials held on the server.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────┐
//!                         │                CONNECTOR PROXY                │
//!                         │                                               │
//!   GET /connectors/      │  ┌─────────┐    ┌──────────┐    ┌──────────┐  │
//!   <id>/<operation>      │  │  http   │───▶│ registry │───▶│connector │  │
//!   ──────────────────────┼─▶│ server  │    │ resolve  │    │ + auth   │──┼──▶ Third-party
//!                         │  └─────────┘    └──────────┘    └────┬─────┘  │    API
//!                         │       ▲                              │        │
//!   JSON (or {})          │  ┌────┴────┐                         │        │
//!   ◀─────────────────────┼──│response │◀────────────────────────┘        │
//!                         │  └─────────┘                                  │
//!                         │                                               │
//!                         │  config · observability · lifecycle           │
//!                         └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use connector_proxy::config::{load_config, ObservabilityConfig};
use connector_proxy::observability::{logging, metrics};
use connector_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "connector-proxy")]
#[command(about = "Forward requests to third-party APIs with server-side credentials", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults and environment are used without it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Configuration rejected");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability);

    tracing::info!("connector-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        surface_upstream_status = config.forwarding.surface_upstream_status,
        custom_connectors = config.connectors.custom.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::from_config(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signal_shutdown.trigger_on_signal().await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
