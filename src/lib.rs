//! Caching Reverse Proxy Library
//!
//! Accepts HTTP(S) requests, rewrites them to a single fixed destination,
//! streams the upstream response back, and remembers response heads keyed by
//! request fingerprint so that identical requests can be answered without
//! contacting the upstream.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod upstream;

pub use cache::{CacheKey, CacheStore, CachedResponse};
pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::{start, Shutdown, ShutdownSignal};
