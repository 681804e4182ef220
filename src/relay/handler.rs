//! The relay: one caller request in, one reply out.

use std::time::{Duration, Instant};

use crate::config::RelayConfig;
use crate::observability::metrics;
use crate::relay::connection::BackendConnection;
use crate::relay::error::RelayError;
use crate::relay::request::RelayRequest;
use crate::relay::response::{BackendReply, RelayOutput};
use crate::relay::rewrite::PathRewriter;

/// Forwards requests to the backend over short-lived connections.
///
/// Holds only read-only settings taken from the configuration at
/// construction, so one instance can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct Relay {
    backend: String,
    connect_timeout: Duration,
    read_timeout: Duration,
    response_buffer_bytes: usize,
    rewriter: PathRewriter,
}

impl Relay {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            backend: config.backend.authority(),
            connect_timeout: config.timeouts.connect(),
            read_timeout: config.timeouts.read(),
            response_buffer_bytes: config.limits.response_buffer_bytes,
            rewriter: PathRewriter::new(&config.cache),
        }
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Relay one request and report the outcome to metrics.
    pub async fn handle(&self, request: &RelayRequest) -> RelayOutput {
        let start = Instant::now();
        let action = request.action_label();

        let output = self.exchange(request).await;

        metrics::record_relay(action, output.outcome_label(), start);
        output
    }

    async fn exchange(&self, request: &RelayRequest) -> RelayOutput {
        if !request.has_action() {
            tracing::debug!("Rejecting request without action");
            return RelayOutput::Failed(RelayError::MissingAction);
        }

        let needs_path_rewrite = request.needs_path_rewrite();

        match self.round_trip(request).await {
            Ok(raw) => self.transform(needs_path_rewrite, raw),
            Err(err) => {
                tracing::warn!(
                    backend = %self.backend,
                    action = request.action_label(),
                    kind = err.kind(),
                    error = %err,
                    "Backend exchange failed"
                );
                RelayOutput::Failed(err)
            }
        }
    }

    /// Connect, send, read once. The connection is dropped, and thereby
    /// closed, when this returns on any path.
    async fn round_trip(&self, request: &RelayRequest) -> Result<Vec<u8>, RelayError> {
        let line = request.to_wire_line();

        let mut connection = BackendConnection::open(&self.backend, self.connect_timeout).await?;
        tracing::debug!(
            connection_id = %connection.id(),
            peer = %connection.peer(),
            action = request.action_label(),
            bytes = line.len(),
            "Forwarding request"
        );

        connection.send(&line).await?;
        connection
            .receive_once(self.response_buffer_bytes, self.read_timeout)
            .await
    }

    /// Decide what the caller gets from the bytes the backend sent.
    pub fn transform(&self, needs_path_rewrite: bool, raw: Vec<u8>) -> RelayOutput {
        if !needs_path_rewrite {
            return RelayOutput::Forwarded(raw);
        }

        match BackendReply::parse(raw) {
            BackendReply::Parsed { mut response, raw } => {
                if self.rewriter.apply(&mut response) {
                    RelayOutput::Rewritten(response)
                } else {
                    RelayOutput::Forwarded(raw)
                }
            }
            BackendReply::Raw(raw) => {
                tracing::warn!(
                    backend = %self.backend,
                    bytes = raw.len(),
                    reply = %String::from_utf8_lossy(&raw),
                    "Backend reply is not a relay response, forwarding it unchanged"
                );
                metrics::record_malformed_reply();
                RelayOutput::Forwarded(raw)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn relay() -> Relay {
        Relay::new(&RelayConfig::default())
    }

    fn details(output: RelayOutput) -> Value {
        let value: Value = serde_json::from_slice(&output.into_bytes()).unwrap();
        value["details"].clone()
    }

    #[test]
    fn success_path_is_rewritten() {
        let raw = br#"{"out":"ok","details":"/var/cache/vt_server/x/y.wav"}"#.to_vec();
        let output = relay().transform(true, raw);
        assert!(matches!(output, RelayOutput::Rewritten(_)));
        assert_eq!(details(output), json!("/vt_server_audio/x/y.wav"));
    }

    #[test]
    fn ineligible_replies_pass_through_verbatim() {
        let raw = br#"{"out":"ok","details":"/var/cache/vt_server/x/y.wav"}"#.to_vec();
        match relay().transform(false, raw.clone()) {
            RelayOutput::Forwarded(bytes) => assert_eq!(bytes, raw),
            other => panic!("expected forwarded bytes, got {other:?}"),
        }
    }

    #[test]
    fn backend_errors_are_not_rewritten() {
        let raw = br#"{"out":"error","details":"/var/cache/vt_server/x/y.wav"}"#.to_vec();
        match relay().transform(true, raw.clone()) {
            RelayOutput::Forwarded(bytes) => assert_eq!(bytes, raw),
            other => panic!("expected forwarded bytes, got {other:?}"),
        }
    }

    #[test]
    fn async_wait_reply_is_left_alone() {
        let raw = br#"{"out": "wait", "details": "Job started at 2026-10-17 10:00:00"}"#.to_vec();
        assert!(matches!(
            BackendReply::parse(raw.clone()),
            BackendReply::Parsed { .. }
        ));
        match relay().transform(true, raw.clone()) {
            RelayOutput::Forwarded(bytes) => assert_eq!(bytes, raw),
            other => panic!("expected forwarded bytes, got {other:?}"),
        }
    }

    #[test]
    fn malformed_reply_is_forwarded_raw() {
        let raw = br#"{"out":"ok","details":"/var/cache/vt_ser"#.to_vec();
        match relay().transform(true, raw.clone()) {
            RelayOutput::Forwarded(bytes) => assert_eq!(bytes, raw),
            other => panic!("expected forwarded bytes, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_action_fails_locally() {
        let mut config = RelayConfig::default();
        // Nothing listens here; a connection attempt would surface as Connect.
        config.backend.port = 9;
        let output = Relay::new(&config)
            .handle(&RelayRequest::from_value(json!({"mode": "hash"})).unwrap())
            .await;
        assert!(matches!(output, RelayOutput::Failed(RelayError::MissingAction)));
    }
}
