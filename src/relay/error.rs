//! Relay failure taxonomy.
//!
//! Every variant is reported to the caller as `{"out":"error","details":...}`
//! where `details` is the `Display` text; none of them stop the relay process.

use std::io;
use std::time::Duration;

use crate::relay::response::RelayResponse;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The request has no `action` key.
    #[error("The request needs to have an 'action' key.")]
    MissingAction,

    /// The front end could not decode the caller's body into a request object.
    #[error("The request is not a valid JSON object: {0}")]
    InvalidRequest(String),

    /// No socket could be allocated for the backend connection.
    #[error("Socket could not be created: {0}")]
    SocketCreate(#[source] io::Error),

    /// Resolution or TCP handshake with the backend failed.
    #[error("Could not connect to server: {0}")]
    Connect(#[source] io::Error),

    /// The serialized request could not be written.
    #[error("Could not send to server: {0}")]
    Send(#[source] io::Error),

    /// The backend sent nothing before the read deadline.
    #[error("No response from server within {} ms", .0.as_millis())]
    ReceiveTimeout(Duration),

    /// The read itself failed.
    #[error("Could not read from server: {0}")]
    Receive(#[source] io::Error),
}

impl RelayError {
    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::MissingAction => "missing_action",
            RelayError::InvalidRequest(_) => "invalid_request",
            RelayError::SocketCreate(_) => "socket_create",
            RelayError::Connect(_) => "connect",
            RelayError::Send(_) => "send",
            RelayError::ReceiveTimeout(_) => "receive_timeout",
            RelayError::Receive(_) => "receive",
        }
    }

    /// True when the failure happened before any backend I/O.
    pub fn is_local(&self) -> bool {
        matches!(self, RelayError::MissingAction | RelayError::InvalidRequest(_))
    }

    /// The structured error the caller receives.
    pub fn to_response(&self) -> RelayResponse {
        RelayResponse::error(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::response::Outcome;

    #[test]
    fn messages_carry_the_io_cause() {
        let err = RelayError::Connect(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        assert_eq!(err.to_string(), "Could not connect to server: refused");
        assert_eq!(err.kind(), "connect");
        assert!(!err.is_local());
    }

    #[test]
    fn timeout_message_names_the_bound() {
        let err = RelayError::ReceiveTimeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "No response from server within 5000 ms");
    }

    #[test]
    fn error_response_shape() {
        let response = RelayError::MissingAction.to_response();
        assert_eq!(response.out, Outcome::Error);
        assert_eq!(
            response.details,
            serde_json::json!("The request needs to have an 'action' key.")
        );
    }
}
