//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file)
//!     → command-line / environment overrides (binary only)
//!     → validation.rs (semantic checks, destination parsing)
//!     → ProxyConfig (validated, immutable)
//!     → owned by the HTTP server for its whole lifetime
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod destination;
pub mod loader;
pub mod schema;
pub mod validation;

pub use destination::Destination;
pub use loader::{read_config, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, ProxyConfig, TlsConfig, UpstreamConfig};
pub use validation::{validate_config, ValidationError};
