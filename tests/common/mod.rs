//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use nse_proxy::config::{ProxyConfig, RetryConfig, SessionConfig};
use nse_proxy::{HttpServer, Shutdown};

/// What the mock upstream answers with.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub cookies: Vec<String>,
    pub body: String,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            cookies: Vec::new(),
            body: body.to_string(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            cookies: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_cookie(mut self, cookie: &str) -> Self {
        self.cookies.push(cookie.to_string());
        self
    }
}

/// One request as the mock upstream saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl Seen {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Log of requests received by a mock upstream.
#[derive(Debug, Clone, Default)]
pub struct RequestLog(Arc<Mutex<Vec<Seen>>>);

impl RequestLog {
    pub fn all(&self) -> Vec<Seen> {
        self.0.lock().unwrap().clone()
    }

    /// Requests whose target starts with `prefix`.
    pub fn matching(&self, prefix: &str) -> Vec<Seen> {
        self.all()
            .into_iter()
            .filter(|s| s.target.starts_with(prefix))
            .collect()
    }
}

/// Start a programmable mock upstream on an ephemeral port.
///
/// `f` receives each request (target and headers) and picks the reply.
pub async fn start_mock_upstream<F>(f: F) -> (SocketAddr, RequestLog)
where
    F: Fn(&Seen) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = RequestLog::default();
    let f = Arc::new(f);

    let task_log = log.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let f = f.clone();
            let log = task_log.clone();
            tokio::spawn(async move {
                let _ = serve_one(socket, f.as_ref(), &log).await;
            });
        }
    });

    (addr, log)
}

async fn serve_one<F>(mut socket: TcpStream, f: &F, log: &RequestLog) -> std::io::Result<()>
where
    F: Fn(&Seen) -> Reply,
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.split("\r\n");
    let target = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let seen = Seen { target, headers };
    let reply = f(&seen);
    log.0.lock().unwrap().push(seen);

    let mut response = format!("HTTP/1.1 {} {}\r\n", reply.status, reason(reply.status));
    for cookie in &reply.cookies {
        response.push_str(&format!("Set-Cookie: {cookie}\r\n"));
    }
    response.push_str(&format!(
        "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.body.len(),
        reply.body
    ));
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        302 => "Found",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Config pointing at a mock upstream, with short delays.
pub fn test_config(upstream: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.upstream.base_url = format!("http://{upstream}");
    config.upstream.timeout_secs = 5;
    config.session = SessionConfig {
        pacing_ms: 10,
        base_delay_ms: 10,
        max_delay_ms: 50,
        ..SessionConfig::default()
    };
    config.retries = RetryConfig {
        base_delay_ms: 20,
        max_delay_ms: 100,
        linear_step_ms: 20,
        ..RetryConfig::default()
    };
    config
}

/// A proxy running on an ephemeral port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver: broadcast::Receiver<()> = shutdown.subscribe();
    let server = HttpServer::new(config).unwrap();

    let handle = tokio::spawn(async move { server.run(listener, receiver).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    RunningProxy {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
