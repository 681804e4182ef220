//! vt-relay
//!
//! Accepts JSON requests over HTTP and relays each one to the voice
//! transformation backend over its own short-lived TCP connection.
//!
//! # Architecture Overview
//!
//! ```text
//!     Caller (HTTP POST)
//!     ─────────────────▶ http::server ──▶ relay::Relay ──── one JSON line ────▶ Backend
//!                                          │  connect / send / read once / close      (TCP)
//!     ◀───────────────── reply bytes ◀──── │◀──── one JSON reply ─────────────────────
//!                                          └─ cache path → public URL (process replies)
//!
//!     Cross-cutting: config (TOML, load once) · observability (tracing, metrics)
//!                    lifecycle (SIGINT/SIGTERM → graceful shutdown)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use vt_relay::config::{find_config, load_config, RelayConfig};
use vt_relay::observability::{logging, metrics};
use vt_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "vt-relay")]
#[command(about = "HTTP relay in front of the voice transformation server", long_about = None)]
struct Args {
    /// Configuration file. Searched for in the usual places when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let source = args.config.or_else(find_config);
    let config = match &source {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("vt-relay v{} starting", env!("CARGO_PKG_VERSION"));

    match &source {
        Some(path) => tracing::info!(path = %path.display(), "Configuration file loaded"),
        None => tracing::warn!("No configuration file found, running with defaults"),
    }
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.authority(),
        cache_directory = %config.cache.directory_path,
        public_url_prefix = %config.cache.public_url_prefix,
        rewrite_strategy = ?config.cache.rewrite_strategy,
        read_timeout_ms = config.timeouts.read_ms,
        "Configuration ready"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    HttpServer::new(config).run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
