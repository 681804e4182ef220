//! HTTP front end subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → decode JSON body into a RelayRequest
//!     → Relay::handle
//!     → relay output bytes as application/json
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRelayRequestId, X_REQUEST_ID};
pub use server::HttpServer;
