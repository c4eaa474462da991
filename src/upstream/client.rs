//! HTTP client creation and request dispatch.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::upstream::verifier::AcceptAnyServerCert;

/// Type alias for the pooled client used to reach the upstream.
pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Errors from a single upstream round trip.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The rewritten request could not be assembled.
    #[error("failed to build upstream request")]
    Build(#[source] axum::http::Error),

    /// Connect, TLS handshake, or response head failure.
    #[error("upstream request failed")]
    Dispatch(#[source] hyper_util::client::legacy::Error),
}

impl UpstreamError {
    /// Message including every underlying cause, `outer: inner: root`.
    pub fn describe(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

/// Shared, pooled client for the upstream. Cheap to clone.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: HttpsClient,
}

impl UpstreamClient {
    /// Build the client according to the upstream TLS and protocol policy.
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);

        let builder = if config.skip_tls_verify {
            tracing::warn!(
                "Upstream TLS certificate verification DISABLED; any certificate presented by the destination is accepted"
            );
            let tls = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
                .with_safe_default_protocol_versions()
                .map_err(|e| ProxyError::UpstreamClient(e.to_string()))?
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
                .with_no_client_auth();
            HttpsConnectorBuilder::new().with_tls_config(tls)
        } else {
            match HttpsConnectorBuilder::new().with_provider_and_native_roots(Arc::clone(&provider)) {
                Ok(builder) => builder,
                Err(e) => {
                    // nothing is trusted, so every HTTPS destination fails per request
                    tracing::warn!(error = %e, "No native root certificates available for upstream verification");
                    let tls = rustls::ClientConfig::builder_with_provider(provider)
                        .with_safe_default_protocol_versions()
                        .map_err(|e| ProxyError::UpstreamClient(e.to_string()))?
                        .with_root_certificates(rustls::RootCertStore::empty())
                        .with_no_client_auth();
                    HttpsConnectorBuilder::new().with_tls_config(tls)
                }
            }
        };

        let builder = builder.https_or_http().enable_http1();
        let https_connector = if config.http2 {
            builder.enable_http2().wrap_connector(http_connector)
        } else {
            builder.wrap_connector(http_connector)
        };

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build(https_connector);

        tracing::debug!(
            http2 = config.http2,
            verify_tls = !config.skip_tls_verify,
            pool_idle_timeout_secs = config.pool_idle_timeout_secs,
            "Upstream client configured"
        );

        Ok(Self { inner })
    }

    /// Send a request and wait for the response head.
    pub async fn dispatch(&self, request: Request<Body>) -> Result<Response<Incoming>, UpstreamError> {
        self.inner.request(request).await.map_err(UpstreamError::Dispatch)
    }
}
