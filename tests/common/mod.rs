//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use funnel_dispatch::config::{BreakerConfig, ClientConfig, FunnelConfig, PoolsConfig};

/// A running mock funnel node.
#[allow(dead_code)]
pub struct MockNode {
    pub addr: SocketAddr,
    pub calls: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockNode {
    /// Base URL to register in a pool.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Raw request heads and bodies received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a mock funnel node answering every request with `f()`'s body
/// after `f()`'s delay.
#[allow(dead_code)]
pub async fn start_programmable_node<F, Fut>(f: F) -> MockNode
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (Duration, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let node = MockNode {
        addr,
        calls: calls.clone(),
        requests: requests.clone(),
    };

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let calls = calls.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let request = read_request(&mut socket).await;
                        calls.fetch_add(1, Ordering::SeqCst);
                        requests.lock().unwrap().push(request);

                        let (delay, body) = f().await;
                        tokio::time::sleep(delay).await;

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    node
}

/// Start a mock funnel node that always answers with `code` after `delay_ms`.
#[allow(dead_code)]
pub async fn start_funnel_node(code: i64, delay_ms: u64) -> MockNode {
    start_programmable_node(move || async move {
        let body = format!(
            r#"{{"code":{},"message":"code {}","data":{{"code":{}}}}}"#,
            code, code, code
        );
        (Duration::from_millis(delay_ms), body)
    })
    .await
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn dead_node_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Config with the given ZF pool and a breaker that never trips in tests.
#[allow(dead_code)]
pub fn zf_config(zf: Vec<String>) -> FunnelConfig {
    FunnelConfig {
        pools: PoolsConfig {
            oauth: Vec::new(),
            zf,
        },
        breaker: BreakerConfig {
            failure_threshold: 100,
            cooldown_secs: 30,
        },
        client: ClientConfig {
            connect_timeout_secs: 2,
            request_timeout_secs: 5,
        },
        ..FunnelConfig::default()
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}
