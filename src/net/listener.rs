//! TCP listener binding.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

use crate::error::ProxyError;

/// Address the proxy listens on for a given port: all IPv4 interfaces.
pub fn listen_addr(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Bind the listen socket for the configured port.
pub async fn bind(port: u16) -> Result<TcpListener, ProxyError> {
    let addr = listen_addr(port);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ProxyError::Bind { addr, source })?;

    tracing::info!(address = %addr, "Listener bound");
    Ok(listener)
}
