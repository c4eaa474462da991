//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind on all interfaces, fail fast)
//!     → tls.rs (optional TLS termination with a provisioned cert/key)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bind and certificate errors are fatal at startup, never retried
//! - TLS is optional and handled transparently by the serving runtime

pub mod listener;
pub mod tls;
