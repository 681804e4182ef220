//! Relay between an HTTP front end and a line-delimited JSON voice
//! transformation backend.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{Relay, RelayOutput, RelayRequest};
