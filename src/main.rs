//! Caching Reverse Proxy
//!
//! Forwards every request to one destination and caches response heads.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request        ┌──────────────────────────────────────────────┐
//!     ──────────────────────┼─▶ listener ─▶ handler ─▶ cache lookup ──hit──┼─▶ replay head
//!                           │                              │ miss          │
//!                           │                              ▼               │
//!                           │                        rewrite request       │
//!                           │                              │               │
//!                           │                              ▼               │
//!     Client Response       │   relay body ◀── upstream client ◀───────────┼──── Destination
//!     ◀─────────────────────┼── (10ms flush)       │                       │
//!                           │                      └─▶ cache store         │
//!                           └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use caching_proxy::config::{read_config, validate_config, ConfigError, ProxyConfig};
use caching_proxy::lifecycle::{self, signals, Shutdown};
use caching_proxy::observability::{logging, metrics};

/// Name of the config file looked up in the home directory.
const DEFAULT_CONFIG_FILE: &str = ".caching-proxy.toml";

#[derive(Parser, Debug)]
#[command(name = "caching-proxy", version)]
#[command(about = "A reverse proxy that forwards requests to a destination and caches response heads", long_about = None)]
struct Cli {
    /// Config file (default is $HOME/.caching-proxy.toml)
    #[arg(long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PROXY_PORT")]
    port: Option<u16>,

    /// Destination to proxy to
    #[arg(short, long, env = "PROXY_DESTINATION")]
    destination: Option<String>,

    /// Terminate TLS / HTTPS on the listener
    #[arg(short, long, env = "PROXY_TLS")]
    tls: bool,

    /// TLS certificate chain (PEM)
    #[arg(long, env = "PROXY_TLS_CERT")]
    cert: Option<PathBuf>,

    /// TLS private key (PEM)
    #[arg(long, env = "PROXY_TLS_KEY")]
    key: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, fatal, panic)
    #[arg(short, long, env = "PROXY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Verify the destination's TLS certificate
    #[arg(long, env = "PROXY_VERIFY_UPSTREAM_TLS")]
    verify_upstream_tls: bool,

    /// Expose Prometheus metrics
    #[arg(long, env = "PROXY_METRICS")]
    metrics: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags and environment.
    fn resolve(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match self.config_path() {
            Some(path) => read_config(&path)?,
            None => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(destination) = self.destination {
            config.destination = destination;
        }
        if self.tls {
            config.listener.tls.enabled = true;
        }
        if let Some(cert) = self.cert {
            config.listener.tls.cert_path = cert;
        }
        if let Some(key) = self.key {
            config.listener.tls.key_path = key;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if self.verify_upstream_tls {
            config.upstream.skip_tls_verify = false;
        }
        if self.metrics {
            config.observability.metrics_enabled = true;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Explicit path, or the home-directory file when it exists.
    fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(path.clone());
        }
        let home = std::env::var_os("HOME")?;
        let path = PathBuf::from(home).join(DEFAULT_CONFIG_FILE);
        path.is_file().then_some(path)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().resolve()?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        destination = %config.destination,
        port = config.listener.port,
        tls = config.listener.tls.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    if let Err(e) = lifecycle::start(config, server_shutdown).await {
        tracing::error!(error = %e, "Proxy failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
