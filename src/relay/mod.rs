//! Relay subsystem.
//!
//! # Data Flow
//! ```text
//! RelayRequest (decoded by the front end)
//!     → request.rs (has action? needs path rewrite?)
//!     → connection.rs (fresh TCP connection, send line, single bounded read, close)
//!     → response.rs (BackendReply: Parsed | Raw)
//!     → rewrite.rs (cache path → public URL, successful process replies only)
//!     → RelayOutput (Failed | Forwarded | Rewritten)
//! ```
//!
//! # Design Decisions
//! - No connection reuse; a request owns its socket from open to close
//! - No retries; every failure short-circuits into an error reply
//! - Unparseable replies degrade to raw passthrough instead of failing

pub mod connection;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod rewrite;

pub use error::RelayError;
pub use handler::Relay;
pub use request::RelayRequest;
pub use response::{BackendReply, Outcome, RelayOutput, RelayResponse};
pub use rewrite::PathRewriter;
