#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vidify::services::storage::MemoryStore;
use vidify::{Config, ExtensionContext, MessageRouter};

/// What the fake backend does with one request.
pub enum Reply {
    Respond(u16, String),
    /// Keep the connection open and never answer.
    Hang,
}

pub struct MockBackend {
    pub url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Raw request heads received so far, request line first.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> String {
        self.requests().last().cloned().unwrap_or_default()
    }
}

/// Keep an ambient HTTP proxy from intercepting loopback traffic.
pub fn bypass_proxy() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    std::env::set_var("no_proxy", "127.0.0.1,localhost");
}

/// Serve `handler` on an ephemeral local port. The handler sees the request target.
pub async fn spawn_backend<F>(handler: F) -> MockBackend
where
    F: Fn(&str) -> Reply + Send + Sync + 'static,
{
    bypass_proxy();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let (hits_task, requests_task) = (Arc::clone(&hits), Arc::clone(&requests));
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let handler = Arc::clone(&handler);
            let hits = Arc::clone(&hits_task);
            let requests = Arc::clone(&requests_task);
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&head).to_string();
                let target = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                hits.fetch_add(1, Ordering::SeqCst);
                requests.lock().unwrap().push(head);

                match handler(&target) {
                    Reply::Respond(status, body) => {
                        let response = format!(
                            "HTTP/1.1 {} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                    Reply::Hang => {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                    }
                }
            });
        }
    });

    MockBackend {
        url,
        hits,
        requests,
    }
}

pub fn ok(body: serde_json::Value) -> Reply {
    Reply::Respond(200, body.to_string())
}

pub fn config_for(backend: &MockBackend) -> Config {
    Config {
        backend_url: backend.url.clone(),
        ..Config::default()
    }
}

pub fn router_with(config: Config) -> MessageRouter {
    let ctx = ExtensionContext::start(config, Arc::new(MemoryStore::new())).unwrap();
    MessageRouter::new(Arc::new(ctx))
}
