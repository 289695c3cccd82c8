//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    Router,
};
use preview_router::config::RouterConfig;
use preview_router::http::HttpServer;
use preview_router::lifecycle::Shutdown;
use preview_router::net::Listener;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const PREVIEW_HOST: &str = "abc1234.preview.preview.testifysec-demo.xyz";
pub const FALLBACK: &str = "https://judge.testifysec-demo.xyz/";

/// Echoes what the backend saw, one `key=value` per line.
///
/// `/missing` answers 404 and `/slow` sleeps before answering.
async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
    if uri.path() == "/slow" {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string()
    };
    let report = [
        format!("method={method}"),
        format!("path={}", uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/")),
        format!("host={}", header("host")),
        format!("x-original-host={}", header("x-original-host")),
        format!("x-forwarded-proto={}", header("x-forwarded-proto")),
        format!("x-forwarded-host={}", header("x-forwarded-host")),
        format!("x-forwarded-for={}", header("x-forwarded-for")),
        format!("x-request-id={}", header("x-request-id")),
        format!("body={}", String::from_utf8_lossy(&body)),
    ]
    .join("\n");

    let status = if uri.path() == "/missing" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    (status, report)
}

/// Start the echo backend on an ephemeral port.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// What a sink backend observed on its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    Data,
    Closed,
}

/// A backend that reads forever and never answers.
///
/// Reports the first bytes received and when the router closes the
/// connection.
pub async fn start_sink_backend() -> (SocketAddr, mpsc::UnboundedReceiver<SinkEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (events, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let events = events.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let mut seen = false;
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => {
                            let _ = events.send(SinkEvent::Closed);
                            break;
                        }
                        Ok(_) if !seen => {
                            seen = true;
                            let _ = events.send(SinkEvent::Data);
                        }
                        Ok(_) => {}
                    }
                }
            });
        }
    });
    (addr, rx)
}

/// Open a raw connection and send a POST head for `path` to a preview host.
///
/// The body is left for the caller to write.
pub async fn post_head(router: SocketAddr, path: &str, content_length: usize) -> TcpStream {
    let mut stream = TcpStream::connect(router).await.unwrap();
    let head = format!(
        "POST {path} HTTP/1.1\r\nHost: {PREVIEW_HOST}\r\nContent-Length: {content_length}\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(head.as_bytes()).await.unwrap();
    stream
}

/// Read until the peer closes, returning whatever arrived.
pub async fn read_until_close(stream: &mut TcpStream) -> String {
    let mut received = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => received.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&received).into_owned()
}

/// A local port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Router config pointing every preview SHA at `127.0.0.1:<port>`.
pub fn local_config(backend_port: u16) -> RouterConfig {
    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.routing.service_port = backend_port.to_string();
    config.upstream.resolve_to = Some("127.0.0.1".parse().unwrap());
    config.upstream.response_header_timeout_secs = 1;
    config.server.drain_secs = 1;
    config
}

pub struct RunningRouter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
}

/// Start the router on an ephemeral port.
pub async fn start_router(config: RouterConfig) -> RunningRouter {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        HttpServer::new(config)
            .run(listener, server_shutdown)
            .await
            .unwrap();
    });

    RunningRouter {
        addr,
        shutdown,
        handle,
    }
}

/// A client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// Parse an echo report into its value for `key`.
pub fn echoed<'a>(report: &'a str, key: &str) -> &'a str {
    report
        .lines()
        .find_map(|line| line.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')))
        .unwrap_or_else(|| panic!("no {key} in report:\n{report}"))
}
