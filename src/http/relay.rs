//! Streaming relay of upstream bodies to the caller.
//!
//! A relay task is spawned per proxied response. It reads upstream frames,
//! buffers their data and pushes the buffer to the caller every
//! [`FLUSH_INTERVAL`] (or as soon as [`FLUSH_THRESHOLD`] bytes are pending).
//! The ticker lives inside the task, so it stops on every exit path: upstream
//! end, upstream error, or the caller going away. The end callback runs once
//! on each of those paths.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::BoxError;
use bytes::BytesMut;
use http_body_util::BodyExt;
use hyper::body::Body as HttpBody;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// How often buffered bytes are pushed to the caller.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Pending bytes that trigger an immediate push.
pub const FLUSH_THRESHOLD: usize = 32 * 1024;

const CHANNEL_CAPACITY: usize = 16;

type Chunk = Result<Bytes, BoxError>;

/// How a relay finished.
#[derive(Debug)]
pub enum RelayEnd {
    /// Upstream body fully delivered to the caller.
    Complete { bytes: u64 },
    /// Upstream body failed mid-stream; the caller's stream was aborted.
    UpstreamFailed(String),
    /// The caller stopped reading.
    CallerGone,
}

/// Relay `upstream` to the returned body.
///
/// `on_end` runs exactly once when the copy stops, however it stops. After a
/// full relay it runs before the caller's stream ends. A caller that drops the
/// body without reading it (HEAD, bodiless statuses) still triggers it.
pub fn relay<B, F>(upstream: B, on_end: F) -> Body
where
    B: HttpBody<Data = Bytes> + Send + Unpin + 'static,
    B::Error: Into<BoxError> + Send,
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<Chunk>(CHANNEL_CAPACITY);

    tokio::spawn(async move {
        match copy_with_flush(upstream, &tx).await {
            RelayEnd::Complete { bytes } => {
                tracing::trace!(bytes, "Relay complete");
            }
            RelayEnd::UpstreamFailed(error) => {
                tracing::error!(error = %error, "Upstream body failed mid-stream");
            }
            RelayEnd::CallerGone => {
                tracing::debug!("Caller went away before the body was relayed");
            }
        }
        on_end();
    });

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (chunk, rx))
    });
    Body::from_stream(stream)
}

async fn copy_with_flush<B>(mut upstream: B, tx: &mpsc::Sender<Chunk>) -> RelayEnd
where
    B: HttpBody<Data = Bytes> + Unpin,
    B::Error: Into<BoxError>,
{
    let mut pending = BytesMut::new();
    let mut relayed: u64 = 0;
    let mut ticker = tokio::time::interval(FLUSH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = upstream.frame() => match frame {
                Some(Ok(frame)) => {
                    // trailers are dropped
                    if let Ok(data) = frame.into_data() {
                        relayed += data.len() as u64;
                        pending.extend_from_slice(&data);
                        if pending.len() >= FLUSH_THRESHOLD && flush(&mut pending, tx).await.is_err() {
                            return RelayEnd::CallerGone;
                        }
                    }
                }
                Some(Err(e)) => {
                    let error: BoxError = e.into();
                    let message = error.to_string();
                    if flush(&mut pending, tx).await.is_ok() {
                        let _ = tx.send(Err(error)).await;
                    }
                    return RelayEnd::UpstreamFailed(message);
                }
                None => {
                    return match flush(&mut pending, tx).await {
                        Ok(()) => RelayEnd::Complete { bytes: relayed },
                        Err(_) => RelayEnd::CallerGone,
                    };
                }
            },
            _ = ticker.tick() => {
                if flush(&mut pending, tx).await.is_err() {
                    return RelayEnd::CallerGone;
                }
            }
            _ = tx.closed() => return RelayEnd::CallerGone,
        }
    }
}

async fn flush(pending: &mut BytesMut, tx: &mpsc::Sender<Chunk>) -> Result<(), mpsc::error::SendError<Chunk>> {
    if pending.is_empty() {
        return Ok(());
    }
    tx.send(Ok(pending.split().freeze())).await
}
