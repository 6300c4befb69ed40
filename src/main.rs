//! Graceful HTTP service (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                  SERVICE                      │
//!   Client Request   │  ┌──────────┐    ┌──────────┐   ┌──────────┐  │
//!   ─────────────────┼─▶│   net    │───▶│   http   │──▶│  worker  │  │
//!                    │  │ listener │    │  server  │   │ (slow)   │  │
//!                    │  └──────────┘    └──────────┘   └──────────┘  │
//!                    │        ▲               ▲                      │
//!                    │        │ stop / drain  │                      │
//!                    │  ┌─────┴───────────────┴─────┐                │
//!   SIGINT/HUP/TERM ─┼─▶│   lifecycle coordinator   │                │
//!                    │  │ gate → deadline → drain   │                │
//!                    │  └───────────────────────────┘                │
//!                    │  ┌─────────┐ ┌──────────────┐                 │
//!                    │  │ config  │ │observability │                 │
//!                    │  └─────────┘ └──────────────┘                 │
//!                    └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use graceful_server::config::{load_config, validate_config, ConfigError, ServiceConfig};
use graceful_server::observability::{logging, metrics};
use graceful_server::{Coordinator, SlowWorker};

#[derive(Parser)]
#[command(name = "graceful-server")]
#[command(about = "HTTP service that drains in-flight work on shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the shutdown grace period (milliseconds).
    #[arg(long)]
    grace_period_ms: Option<u64>,

    /// Override the simulated processing time (milliseconds).
    #[arg(long)]
    processing_ms: Option<u64>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(grace_period_ms) = self.grace_period_ms {
            config.shutdown.grace_period_ms = grace_period_ms;
        }
        if let Some(processing_ms) = self.processing_ms {
            config.worker.processing_ms = processing_ms;
        }
        if let Some(log_level) = self.log_level {
            config.observability.log_level = log_level;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability)?;

    tracing::info!("graceful-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        grace_period_ms = config.shutdown.grace_period_ms,
        processing_ms = config.worker.processing_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        let addr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    let worker = SlowWorker::from_config(&config.worker);
    Coordinator::new(config, worker).run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
