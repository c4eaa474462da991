//! Request rewriting for the upstream.
//!
//! # Responsibilities
//! - Point the request at the destination's scheme and authority
//! - Reduce the request target to path + query
//! - Record the caller's address in `X-Forwarded-For`
//!
//! # Design Decisions
//! - The upstream request is a new value built from the inbound head; the
//!   inbound request is never mutated
//! - All other headers are forwarded unchanged, repeated headers included
//! - An unparseable peer address yields an empty `X-Forwarded-For`

use std::net::SocketAddr;

use axum::http::header::{HeaderName, HeaderValue, HOST};
use axum::http::{request, Request, Uri};

use crate::config::Destination;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Host portion of a `host:port` peer address, or an empty string.
pub fn forwarded_for(remote_addr: &str) -> String {
    if let Ok(addr) = remote_addr.parse::<SocketAddr>() {
        return addr.ip().to_string();
    }
    split_host(remote_addr).unwrap_or_default().to_string()
}

fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        tail.strip_prefix(':')?;
        return Some(host);
    }
    let (host, _port) = addr.rsplit_once(':')?;
    // bare IPv6 without brackets is ambiguous
    if host.contains(':') {
        return None;
    }
    Some(host)
}

/// Build the head of the request sent upstream.
///
/// Attach the inbound body with [`Request::map`].
pub fn upstream_request(
    inbound: &request::Parts,
    destination: &Destination,
    remote_addr: &str,
) -> Result<Request<()>, axum::http::Error> {
    let path_and_query = inbound
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let uri = Uri::builder()
        .scheme(destination.scheme().clone())
        .authority(destination.authority().clone())
        .path_and_query(path_and_query)
        .build()?;

    let mut builder = Request::builder().method(inbound.method.clone()).uri(uri);

    if let Some(headers) = builder.headers_mut() {
        for (name, value) in inbound.headers.iter() {
            if name != HOST {
                headers.append(name.clone(), value.clone());
            }
        }
        headers.insert(HOST, HeaderValue::from_str(destination.authority().as_str())?);
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&forwarded_for(remote_addr))?);
    }

    builder.body(())
}
