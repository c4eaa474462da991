//! Upstream dispatch subsystem.
//!
//! # Responsibilities
//! - Own the single pooled HTTP client used for every proxied request
//! - Negotiate HTTP/2 with the upstream when offered via ALPN
//! - Apply the upstream certificate verification policy
//!
//! # Design Decisions
//! - One explicit client per server instance, no process-global transport
//! - Skipping certificate verification is a config field, logged loudly
//! - No retries, no deadlines: a failed dispatch is reported once

pub mod client;
pub mod verifier;

pub use client::{UpstreamClient, UpstreamError};
