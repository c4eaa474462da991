//! Crate-level error types.
//!
//! Startup failures are fatal and surface as [`ProxyError`]. Failures while
//! handling a single request never leave the handler; see
//! [`crate::upstream::UpstreamError`].

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::net::tls::TlsError;

/// Errors that prevent the proxy from starting or keep it from serving.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The listen socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Inbound TLS material could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// The upstream client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    UpstreamClient(String),

    /// Fatal I/O error while serving.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
