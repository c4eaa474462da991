//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use caching_proxy::config::ProxyConfig;
use caching_proxy::net::tls::load_tls_config;
use caching_proxy::{CacheStore, HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Requests seen by a mock backend, as raw text (head + body).
#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<String>>>,
    count: Arc<AtomicUsize>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Value of `name` in the n-th recorded request, case-insensitive.
    pub fn header(&self, n: usize, name: &str) -> Option<String> {
        let requests = self.requests();
        let prefix = format!("{}:", name.to_ascii_lowercase());
        requests.get(n)?.split("\r\n").find_map(|line| {
            line.to_ascii_lowercase()
                .starts_with(&prefix)
                .then(|| line[prefix.len()..].trim().to_string())
        })
    }

    fn record(&self, raw: String) {
        self.requests.lock().unwrap().push(raw);
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Read one request (head plus Content-Length body) from the socket.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .split("\r\n")
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + length {
                let n = socket.read(&mut chunk).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Start a backend answering every request with `200`, `Content-Type:
/// text/plain` and a fixed body. Returns its address and a recorder.
pub async fn start_mock_backend(body: &'static str) -> (SocketAddr, Recorder) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Recorder::default();
    let rec = recorder.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let rec = rec.clone();
            tokio::spawn(async move {
                let raw = read_request(&mut socket).await;
                rec.record(raw);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorder)
}

/// Start a backend that sends `first` as a chunk, waits `pause`, then sends
/// `rest` and ends the chunked body.
pub async fn start_streaming_backend(first: &'static str, rest: &'static str, pause: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request(&mut socket).await;
                let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket
                    .write_all(format!("{:x}\r\n{}\r\n", first.len(), first).as_bytes())
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(pause).await;
                let _ = socket
                    .write_all(format!("{:x}\r\n{}\r\n0\r\n\r\n", rest.len(), rest).as_bytes())
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn proxy_config(destination: &str) -> ProxyConfig {
    ProxyConfig {
        destination: destination.to_string(),
        ..ProxyConfig::default()
    }
}

/// A proxy serving on an ephemeral local port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub cache: CacheStore,
    pub shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn spawn_proxy(destination: &str) -> RunningProxy {
    spawn_proxy_with(proxy_config(destination)).await
}

pub async fn spawn_proxy_with(config: ProxyConfig) -> RunningProxy {
    let server = HttpServer::new(config).unwrap();
    let cache = server.cache().clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningProxy { addr, cache, shutdown }
}

/// A proxy terminating TLS with the given certificate and key.
pub async fn spawn_tls_proxy(destination: &str, cert: &Path, key: &Path) -> RunningProxy {
    let server = HttpServer::new(proxy_config(destination)).unwrap();
    let cache = server.cache().clone();
    let tls = load_tls_config(cert, key).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run_tls(listener, tls, server_shutdown).await;
    });

    RunningProxy { addr, cache, shutdown }
}

/// Self-signed certificate for `127.0.0.1` and `localhost`, written as PEM
/// files under the temp directory.
pub fn self_signed_pair(label: &str) -> (PathBuf, PathBuf) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_string(), "localhost".to_string()]).unwrap();
    let dir = std::env::temp_dir();
    let cert_path = dir.join(format!("caching-proxy-{}-{label}.pem", std::process::id()));
    let key_path = dir.join(format!("caching-proxy-{}-{label}.key", std::process::id()));
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}

/// HTTPS backend answering every request with `200 text/plain` and `body`.
pub async fn start_tls_backend(body: &'static str, cert: &Path, key: &Path) -> (SocketAddr, Arc<AtomicUsize>) {
    let tls = load_tls_config(cert, key).unwrap();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = axum::Router::new().fallback(move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            ([(axum::http::header::CONTENT_TYPE, "text/plain")], body)
        }
    });

    tokio::spawn(async move {
        let _ = axum_server::from_tcp_rustls(listener, tls)
            .serve(app.into_make_service())
            .await;
    });

    (addr, hits)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

/// Poll `condition` until it holds or a second passes.
pub async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
