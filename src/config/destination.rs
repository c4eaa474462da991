//! Upstream destination parsing.

use std::fmt;
use std::str::FromStr;

use axum::http::uri::{Authority, Scheme};
use url::Url;

use crate::config::validation::ValidationError;

/// Scheme and authority every proxied request is rewritten to.
///
/// Only scheme and host[:port] of the configured URL are kept; a path or
/// query on the destination is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    scheme: Scheme,
    authority: Authority,
}

impl Destination {
    /// Parse and validate a destination base URL.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(raw).map_err(|e| ValidationError::InvalidDestination {
            value: raw.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(ValidationError::UnsupportedScheme(other.to_string())),
        };

        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => return Err(ValidationError::MissingHost(raw.to_string())),
        };

        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority =
            Authority::from_str(&authority).map_err(|e| ValidationError::InvalidDestination {
                value: raw.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { scheme, authority })
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}
