//! Per-request backend connection.
//!
//! # Responsibilities
//! - Open one fresh TCP connection per request (no pooling, no reuse)
//! - Bound the handshake and the single read with deadlines
//! - Close the socket on every exit path (the stream is dropped with `self`)

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::time::timeout;

use crate::relay::error::RelayError;

/// Relaxed ordering is enough, ids only need to be unique.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of one backend connection, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "backend-{}", self.0)
    }
}

/// An open connection to the backend, owned by a single request.
#[derive(Debug)]
pub struct BackendConnection {
    stream: TcpStream,
    peer: SocketAddr,
    id: ConnectionId,
}

impl BackendConnection {
    /// Resolve `authority` and connect to the first address that accepts.
    pub async fn open(authority: &str, connect_timeout: Duration) -> Result<Self, RelayError> {
        let addrs: Vec<SocketAddr> = lookup_host(authority)
            .await
            .map_err(RelayError::Connect)?
            .collect();

        let mut last_error = io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no address found for {authority}"),
        );

        for addr in addrs {
            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()
            } else {
                TcpSocket::new_v6()
            }
            .map_err(RelayError::SocketCreate)?;

            match timeout(connect_timeout, socket.connect(addr)).await {
                Ok(Ok(stream)) => {
                    let id = ConnectionId::new();
                    tracing::trace!(connection_id = %id, peer = %addr, "Backend connection opened");
                    return Ok(Self {
                        stream,
                        peer: addr,
                        id,
                    });
                }
                Ok(Err(e)) => last_error = e,
                Err(_) => {
                    last_error = io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("connect timed out after {} ms", connect_timeout.as_millis()),
                    )
                }
            }
            tracing::debug!(peer = %addr, error = %last_error, "Backend address refused connection");
        }

        Err(RelayError::Connect(last_error))
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Write the whole request line.
    pub async fn send(&mut self, line: &[u8]) -> Result<(), RelayError> {
        self.stream.write_all(line).await.map_err(RelayError::Send)?;
        self.stream.flush().await.map_err(RelayError::Send)
    }

    /// Read once into a buffer of `capacity` bytes, then close.
    ///
    /// Whatever arrived in that single read is the reply; anything the
    /// backend sends afterwards is discarded with the connection.
    pub async fn receive_once(
        mut self,
        capacity: usize,
        read_timeout: Duration,
    ) -> Result<Vec<u8>, RelayError> {
        let mut buffer = vec![0u8; capacity];
        let read = timeout(read_timeout, self.stream.read(&mut buffer))
            .await
            .map_err(|_| RelayError::ReceiveTimeout(read_timeout))?
            .map_err(RelayError::Receive)?;

        buffer.truncate(read);
        tracing::trace!(connection_id = %self.id, bytes = read, "Backend reply received");
        Ok(buffer)
    }
}

impl Drop for BackendConnection {
    fn drop(&mut self) {
        tracing::trace!(connection_id = %self.id, "Backend connection closed");
    }
}
