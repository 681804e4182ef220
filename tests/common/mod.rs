//! Shared utilities for integration tests: mock line-JSON backends.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use vt_relay::RelayConfig;

/// Handle on a running mock backend.
pub struct MockBackend {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Request lines received so far, newline included.
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

enum Behaviour {
    Reply(Arc<dyn Fn(&Value) -> Vec<u8> + Send + Sync>),
    Silent,
}

async fn start(behaviour: Behaviour) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let received = Arc::new(Mutex::new(Vec::new()));
    let behaviour = Arc::new(behaviour);

    let (acc, rec) = (accepted.clone(), received.clone());
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else { break };
            acc.fetch_add(1, Ordering::SeqCst);
            let rec = rec.clone();
            let behaviour = behaviour.clone();

            tokio::spawn(async move {
                let mut socket = BufReader::new(socket);
                let mut line = String::new();
                if socket.read_line(&mut line).await.is_err() {
                    return;
                }
                rec.lock().unwrap().push(line.clone());

                match behaviour.as_ref() {
                    Behaviour::Reply(reply) => {
                        let request = serde_json::from_str(&line).unwrap_or(Value::Null);
                        let _ = socket.get_mut().write_all(&reply(&request)).await;
                        let _ = socket.get_mut().shutdown().await;
                    }
                    Behaviour::Silent => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            });
        }
    });

    MockBackend {
        addr,
        accepted,
        received,
    }
}

/// Backend answering every request line with `reply(request)`.
pub async fn start_line_backend<F>(reply: F) -> MockBackend
where
    F: Fn(&Value) -> String + Send + Sync + 'static,
{
    start(Behaviour::Reply(Arc::new(move |request: &Value| {
        reply(request).into_bytes()
    })))
    .await
}

/// Backend answering every request with the same bytes.
pub async fn start_fixed_backend(reply: &'static [u8]) -> MockBackend {
    start(Behaviour::Reply(Arc::new(move |_: &Value| reply.to_vec()))).await
}

/// Backend that accepts and reads, but never answers.
pub async fn start_silent_backend() -> MockBackend {
    start(Behaviour::Silent).await
}

/// An address with nothing listening on it.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Relay configuration pointing at `backend`.
pub fn relay_config(backend: SocketAddr) -> RelayConfig {
    let mut config = RelayConfig::default();
    config.backend.host = backend.ip().to_string();
    config.backend.port = backend.port();
    config.timeouts.connect_ms = 1_000;
    config.timeouts.read_ms = 2_000;
    config
}
