//! Round-robin HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                LOAD BALANCER                 │
//!                        │                                              │
//!     Client Request     │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ───────────────────┼─▶│  http   │───▶│ routing  │───▶│  pool   │  │
//!                        │  │ server  │    │  router  │    │ + rr    │  │
//!                        │  └─────────┘    └────┬─────┘    └────▲────┘  │
//!                        │                      │               │       │
//!     Client Response    │                      ▼               │ alive │
//!     ◀──────────────────┼──────────────── forward ──────▶ Backend      │
//!                        │                                      │       │
//!                        │                              ┌───────┴────┐  │
//!                        │                              │   health   │  │
//!                        │                              │  monitor   │  │
//!                        │                              └────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use http_balancer::config::{load_config, BalancerConfig};
use http_balancer::lifecycle::{signals, Shutdown};
use http_balancer::observability::{logging, metrics};
use http_balancer::HttpServer;

#[derive(Parser)]
#[command(name = "http-balancer")]
#[command(about = "Round-robin HTTP load balancer with active health checks", long_about = None)]
struct Cli {
    /// Path to configuration file (JSON or TOML)
    #[arg(long, default_value = "config/servers.json")]
    config: PathBuf,

    /// Port to listen on, overriding the configuration
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging needs the configured level, so report load problems afterwards.
    let loaded = load_config(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => BalancerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    logging::init_logging(&config.observability.log_level)?;
    tracing::info!("http-balancer v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(e) = &loaded {
        tracing::warn!(
            path = %cli.config.display(),
            error = %e,
            "Failed to load config file, using default configuration"
        );
    }

    tracing::info!(
        port = config.port,
        interval_secs = config.health_check.interval_secs,
        timeout_secs = config.health_check.timeout_secs,
        "Configuration loaded"
    );
    if config.backends.is_empty() {
        tracing::warn!("No backends configured; every request will get 503");
    }
    for backend in &config.backends {
        tracing::info!(url = %backend.url, "Backend configured");
    }

    if config.observability.prometheus_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    let mut server_task = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        _ = signals::shutdown_on_signal(&shutdown) => {
            tracing::info!("Shutting down load balancer");
            server_task.await??;
        }
        result = &mut server_task => {
            result??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
