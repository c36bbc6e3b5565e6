//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use dashboard_gateway::cache::{CacheStore, MemoryCacheStore};
use dashboard_gateway::config::GatewayConfig;
use dashboard_gateway::lifecycle::{AppContext, Shutdown};
use dashboard_gateway::net::Listener;
use dashboard_gateway::upstream::HttpTransport;
use dashboard_gateway::HttpServer;

/// Read and discard one request head so the client never sees a reset.
async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Start a mock upstream that answers every request with `f()`.
///
/// Binds an ephemeral port on loopback and returns its address.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let (status, body) = f().await;
                        let response = format!(
                            "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Mock upstream with a fixed answer.
pub async fn start_mock_backend(status: u16, body: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (status, body.to_string()) }).await
}

/// Mock upstream that counts calls and answers `statuses[n]` on call `n`
/// (the last entry repeats), with `body` for 2xx answers.
pub async fn start_counting_backend(statuses: Vec<u16>, body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let statuses = Arc::new(statuses);

    let addr = start_programmable_backend(move || {
        let counter = counter.clone();
        let statuses = statuses.clone();
        async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
            let status = statuses[n.min(statuses.len() - 1)];
            let body = if (200..300).contains(&status) {
                body.to_string()
            } else {
                r#"{"error":"unavailable"}"#.to_string()
            };
            (status, body)
        }
    })
    .await;

    (addr, calls)
}

/// Config pointing the three sources at local mocks, with fast retries.
pub fn gateway_config(weather: SocketAddr, fact: SocketAddr, ip: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.server.host = "127.0.0.1".into();
    config.server.port = 0;
    config.server.shutdown_grace_secs = 2;
    config.upstream.weather_url = format!("http://{}/weather", weather);
    config.upstream.fact_url = format!("http://{}/fact", fact);
    config.upstream.ip_url = format!("http://{}/ip", ip);
    config.upstream.connect_timeout_secs = 1;
    config.upstream.request_timeout_secs = 2;
    config.retries.count = 2;
    config.retries.delay_ms = 10;
    config.cache.url = "memory://".into();
    config
}

/// A running gateway on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub cache: Arc<MemoryCacheStore>,
    shutdown: Arc<Shutdown>,
    handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start the full stack: listener, server, real reqwest transport, and
    /// an in-process cache the test can inspect.
    pub async fn start(config: GatewayConfig) -> Self {
        let cache = Arc::new(MemoryCacheStore::new(Some(config.cache.ttl())));
        let transport = Arc::new(HttpTransport::new(&config.upstream).unwrap());
        let context = AppContext::with_components(config, transport, cache.clone() as Arc<dyn CacheStore>);

        let server_config = context.config().server.clone();
        let listener = Listener::bind(&server_config).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Arc::new(Shutdown::new());
        let receiver = shutdown.subscribe();
        let server = HttpServer::new(server_config, context.director());

        let handle = tokio::spawn(async move {
            let _ = server.run(listener, receiver).await;
            context.teardown();
        });

        Self {
            addr,
            cache,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for drain and teardown to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("gateway did not stop in time")
            .unwrap();
    }
}

/// Client that does not reuse connections between requests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
