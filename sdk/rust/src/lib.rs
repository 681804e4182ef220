//! Client for the vt-relay HTTP front end.

mod client;

pub use client::{ClientError, ProcessMode, ProcessRequest, RelayClient, RelayReply};
