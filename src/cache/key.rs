//! Request fingerprints.

use std::fmt;

use axum::http::{Method, Uri};

/// Identity of a request for caching purposes.
///
/// Formed from the method, the request URL exactly as received and the
/// caller's address including its port. The URL is not normalized, so
/// `?a=1&b=2` and `?b=2&a=1` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(method: &Method, uri: &Uri, remote_addr: &str) -> Self {
        Self(format!("{method} {uri} {remote_addr}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
