//! Response shaping for the caller.
//!
//! # Responsibilities
//! - Copy upstream status and headers onto the caller's response
//! - Replay cached response heads
//! - Map upstream failures to a plain-text 500
//!
//! # Design Decisions
//! - Repeated upstream headers are joined with `, ` into a single line, so
//!   the caller cannot tell repeats from comma-separated values
//! - Replays carry no body and therefore no framing headers

use axum::body::Body;
use axum::http::header::{HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use axum::http::{response, HeaderMap, Response, StatusCode};
use axum::response::IntoResponse;

use crate::cache::CachedResponse;
use crate::upstream::UpstreamError;

/// Collapse every header to one value, joining repeats with `, `.
pub fn join_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut joined = HeaderMap::with_capacity(upstream.keys_len());
    for name in upstream.keys() {
        let mut values = upstream.get_all(name).iter();
        let Some(first) = values.next() else { continue };

        let mut buf = first.as_bytes().to_vec();
        for value in values {
            buf.extend_from_slice(b", ");
            buf.extend_from_slice(value.as_bytes());
        }

        let value = HeaderValue::from_bytes(&buf).unwrap_or_else(|_| first.clone());
        joined.insert(name.clone(), value);
    }
    joined
}

/// Caller response for a fresh upstream response: status, joined headers,
/// and the relayed body.
pub fn forward(upstream: &response::Parts, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = upstream.status;
    *response.headers_mut() = join_headers(&upstream.headers);
    response
}

/// Caller response for a cache hit.
pub fn replay(cached: &CachedResponse) -> Response<Body> {
    let mut headers = join_headers(cached.headers());
    headers.remove(CONTENT_LENGTH);
    headers.remove(TRANSFER_ENCODING);

    let mut response = Response::new(Body::empty());
    *response.status_mut() = cached.status();
    *response.headers_mut() = headers;
    response
}

/// Plain-text 500 carrying the full error description.
pub fn upstream_failure(err: &UpstreamError) -> Response<Body> {
    (StatusCode::INTERNAL_SERVER_ERROR, err.describe()).into_response()
}
