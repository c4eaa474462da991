//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the destination URL and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::destination::Destination;
use crate::config::schema::ProxyConfig;

/// Log levels accepted in configuration.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "fatal", "panic"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid destination URL {value:?}: {reason}")]
    InvalidDestination { value: String, reason: String },

    #[error("unsupported destination scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("destination URL {0:?} has no host")]
    MissingHost(String),

    #[error("listen port must be between 1 and 65535")]
    InvalidPort,

    #[error("TLS is enabled but {0} is empty")]
    MissingTlsPath(&'static str),

    #[error("unknown log level {0:?}")]
    UnknownLogLevel(String),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = Destination::parse(&config.destination) {
        errors.push(e);
    }

    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }

    let tls = &config.listener.tls;
    if tls.enabled {
        if is_empty_path(&tls.cert_path) {
            errors.push(ValidationError::MissingTlsPath("cert_path"));
        }
        if is_empty_path(&tls.key_path) {
            errors.push(ValidationError::MissingTlsPath("key_path"));
        }
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_empty_path(path: &Path) -> bool {
    path.as_os_str().is_empty()
}
