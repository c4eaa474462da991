//! Captured upstream response heads.

use axum::body::Bytes;
use axum::http::{response, HeaderMap, StatusCode, Version};

/// Immutable capture of an upstream response's status line and headers.
///
/// The body is deliberately not captured.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
}

impl CachedResponse {
    /// Snapshot the head of an upstream response.
    pub fn capture(parts: &response::Parts) -> Self {
        Self {
            status: parts.status,
            version: parts.version,
            headers: parts.headers.clone(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Upstream headers exactly as received, repeated headers kept apart.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Render the head in HTTP/1 wire form: status line, one line per header
    /// value sorted by name, blank line.
    pub fn dump(&self) -> Bytes {
        let mut out = Vec::with_capacity(64 + self.headers.len() * 32);
        out.extend_from_slice(
            format!(
                "{:?} {} {}\r\n",
                self.version,
                self.status.as_u16(),
                self.status.canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );

        let mut names: Vec<_> = self.headers.keys().collect();
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for name in names {
            let canonical = canonical_name(name.as_str());
            for value in self.headers.get_all(name) {
                out.extend_from_slice(canonical.as_bytes());
                out.extend_from_slice(b": ");
                out.extend_from_slice(value.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
        }
        out.extend_from_slice(b"\r\n");
        Bytes::from(out)
    }
}

/// `content-type` → `Content-Type`
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
