//! HTTP server setup and the forwarding handler.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Serve plaintext or TLS connections, HTTP/1.1 and HTTP/2
//! - Answer from the cache when the request fingerprint is known
//! - Otherwise rewrite, dispatch, stream the response, and cache its head

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::cache::{CacheKey, CacheStore, CachedResponse};
use crate::config::{validate_config, ConfigError, Destination, ProxyConfig};
use crate::error::ProxyError;
use crate::http::{relay, request, response};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics::{self, CacheOutcome};
use crate::upstream::{UpstreamClient, UpstreamError};

/// How long in-flight TLS connections may drain after shutdown is signalled.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub destination: Destination,
    pub client: UpstreamClient,
    pub cache: CacheStore,
}

/// HTTP server for the caching proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    destination: Destination,
    cache: CacheStore,
}

impl HttpServer {
    /// Validate the configuration and build the engine.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let destination = Destination::parse(&config.destination)
            .map_err(|e| ConfigError::Validation(vec![e]))?;

        let client = UpstreamClient::new(&config.upstream)?;
        let cache = CacheStore::new();

        let state = AppState {
            destination: destination.clone(),
            client,
            cache: cache.clone(),
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
            destination,
            cache,
        })
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve plaintext HTTP until the listener fails or shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ProxyError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            destination = %self.destination,
            "Starting http proxy"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.triggered().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP proxy stopped");
        Ok(())
    }

    /// Serve HTTPS, terminating TLS with `tls`, until the listener fails or
    /// shutdown is signalled.
    pub async fn run_tls(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        shutdown: ShutdownSignal,
    ) -> Result<(), ProxyError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            destination = %self.destination,
            "Starting https proxy"
        );

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown.triggered().await;
            tracing::info!("Shutdown signal received");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum_server::from_tcp_rustls(listener.into_std()?, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTPS proxy stopped");
        Ok(())
    }
}

/// Catch-all handler: cache lookup, then a full proxy round trip on a miss.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let remote_addr = remote.to_string();
    let method = request.method().clone();
    let key = CacheKey::new(&method, request.uri(), &remote_addr);

    tracing::info!(method = %method, uri = %request.uri(), "Handling request");
    tracing::debug!(cache_key = %key, "Cache key");

    if let Some(cached) = state.cache.get(&key) {
        tracing::debug!(cache_key = %key, status = %cached.status(), "Cache hit");
        metrics::record_request(method.as_str(), cached.status().as_u16(), CacheOutcome::Hit, start_time);
        return response::replay(&cached);
    }

    let (parts, body) = request.into_parts();
    let upstream_request = match request::upstream_request(&parts, &state.destination, &remote_addr) {
        Ok(head) => head.map(|()| body),
        Err(e) => return fail(UpstreamError::Build(e), method.as_str(), start_time),
    };

    let upstream_response = match state.client.dispatch(upstream_request).await {
        Ok(r) => r,
        Err(e) => return fail(e, method.as_str(), start_time),
    };

    let (upstream_parts, upstream_body) = upstream_response.into_parts();
    let status = upstream_parts.status;
    let snapshot = CachedResponse::capture(&upstream_parts);
    let cache = state.cache.clone();
    // stored however the copy ends, including HEAD bodies dropped unread
    let body = relay::relay(upstream_body, move || {
        tracing::debug!(cache_key = %key, dump = ?snapshot.dump(), "Caching response head");
        cache.put(key, snapshot);
    });

    metrics::record_request(method.as_str(), status.as_u16(), CacheOutcome::Miss, start_time);
    response::forward(&upstream_parts, body)
}

fn fail(err: UpstreamError, method: &str, start_time: Instant) -> Response {
    let message = err.describe();
    tracing::error!(error = %message, "Upstream dispatch failed");
    metrics::record_upstream_error();

    let response = response::upstream_failure(&err);
    metrics::record_request(method, response.status().as_u16(), CacheOutcome::Error, start_time);
    response
}
