//! Backend replies and what the relay hands back to its caller.
//!
//! # Design Decisions
//! - A reply that does not decode as `{out, details}` is kept as raw bytes,
//!   never dropped, so whatever the backend produced still reaches the caller
//! - Bytes are only re-encoded when the relay actually changed something

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::relay::error::RelayError;
use crate::relay::request::encode_numeric_strings;

/// The `out` field of a reply.
///
/// Only `ok` makes `details` eligible for path rewriting. Values the relay
/// does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Ok,
    Error,
    /// Async job still running; `details` says since when.
    Wait,
    Other(String),
}

impl Outcome {
    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Error => "error",
            Outcome::Wait => "wait",
            Outcome::Other(out) => out.as_str(),
        }
    }
}

impl From<String> for Outcome {
    fn from(out: String) -> Self {
        match out.as_str() {
            "ok" => Outcome::Ok,
            "error" => Outcome::Error,
            "wait" => Outcome::Wait,
            _ => Outcome::Other(out),
        }
    }
}

impl From<Outcome> for String {
    fn from(out: Outcome) -> Self {
        match out {
            Outcome::Other(out) => out,
            known => known.as_str().to_string(),
        }
    }
}

/// A structured reply, either from the backend or produced by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayResponse {
    pub out: Outcome,

    /// Error text, content hash, or produced file path.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,

    /// Fields the backend sent besides `out` and `details`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RelayResponse {
    pub fn ok(details: impl Into<Value>) -> Self {
        Self {
            out: Outcome::Ok,
            details: details.into(),
            extra: Map::new(),
        }
    }

    pub fn error(details: impl Into<String>) -> Self {
        Self {
            out: Outcome::Error,
            details: Value::String(details.into()),
            extra: Map::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.out == Outcome::Ok
    }

    pub fn to_value(&self) -> Value {
        let mut fields = self.extra.clone();
        fields.insert("out".to_string(), Value::String(self.out.as_str().to_string()));
        if self.details.is_null() {
            fields.remove("details");
        } else {
            fields.insert("details".to_string(), self.details.clone());
        }
        Value::Object(fields)
    }

    /// One JSON line, newline terminated.
    pub fn to_line(&self) -> Vec<u8> {
        into_line(self.to_value())
    }
}

fn into_line(value: Value) -> Vec<u8> {
    let mut line = value.to_string().into_bytes();
    line.push(b'\n');
    line
}

/// Result of decoding the bytes read from the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply {
    /// A well-formed reply, with the bytes it came from.
    Parsed { response: RelayResponse, raw: Vec<u8> },
    /// Not JSON, truncated, or without a string `out`.
    Raw(Vec<u8>),
}

impl BackendReply {
    pub fn parse(raw: Vec<u8>) -> Self {
        match serde_json::from_slice::<RelayResponse>(&raw) {
            Ok(response) => BackendReply::Parsed { response, raw },
            Err(_) => BackendReply::Raw(raw),
        }
    }
}

/// What one relay invocation produced.
#[derive(Debug)]
pub enum RelayOutput {
    /// Stopped before a reply was obtained.
    Failed(RelayError),
    /// Backend bytes, passed through verbatim.
    Forwarded(Vec<u8>),
    /// Backend reply whose artifact path was turned into a public URL.
    Rewritten(RelayResponse),
}

impl RelayOutput {
    pub fn is_failure(&self) -> bool {
        matches!(self, RelayOutput::Failed(_))
    }

    /// Label for metrics.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            RelayOutput::Failed(err) => err.kind(),
            RelayOutput::Forwarded(_) => "forwarded",
            RelayOutput::Rewritten(_) => "rewritten",
        }
    }

    /// Bytes written to the caller.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RelayOutput::Failed(err) => err.to_response().to_line(),
            RelayOutput::Forwarded(raw) => raw,
            RelayOutput::Rewritten(response) => {
                into_line(encode_numeric_strings(&response.to_value()))
            }
        }
    }
}
