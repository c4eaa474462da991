//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the forwarding engine from a validated configuration
//! - Load inbound TLS material when enabled
//! - Bind the listen port and serve until shutdown

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::HttpServer;
use crate::lifecycle::ShutdownSignal;
use crate::net::{listener, tls};

/// Start the proxy and serve until the listener closes or `shutdown` fires.
///
/// Returns early with an error if the configuration is invalid, the
/// certificate files cannot be loaded, or the port cannot be bound.
pub async fn start(config: ProxyConfig, shutdown: ShutdownSignal) -> Result<(), ProxyError> {
    let server = HttpServer::new(config)?;

    let listener_config = server.config().listener.clone();
    let tls_config = if listener_config.tls.enabled {
        Some(tls::load_tls_config(
            &listener_config.tls.cert_path,
            &listener_config.tls.key_path,
        )?)
    } else {
        None
    };

    let listener = listener::bind(listener_config.port).await?;

    match tls_config {
        Some(tls_config) => server.run_tls(listener, tls_config, shutdown).await,
        None => server.run(listener, shutdown).await,
    }
}
