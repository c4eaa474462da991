//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Translate configured level names into a filter directive
//!
//! # Design Decisions
//! - `RUST_LOG` takes precedence over the configured level
//! - `fatal` and `panic` are accepted for compatibility and map to `error`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map a configured level name to a tracing level directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" | "fatal" | "panic" => "error",
        _ => "info",
    }
}

/// Build the filter used when `RUST_LOG` is not set.
pub fn default_filter(level: &str) -> String {
    let level = level_directive(level);
    format!("caching_proxy={level},tower_http={level}")
}

/// Install the global subscriber. Call once, before starting the server.
pub fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
