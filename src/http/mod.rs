//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, catch-all handler, cache lookup)
//!     → request.rs (derive the upstream request from the inbound head)
//!     → [upstream client dispatches]
//!     → response.rs (status + joined headers for the caller)
//!     → relay.rs (stream body with periodic flush, then store snapshot)
//!     → Send to client
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use request::{forwarded_for, upstream_request, X_FORWARDED_FOR};
pub use server::HttpServer;
