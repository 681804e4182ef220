//! Inbound requests and their wire encoding.
//!
//! # Responsibilities
//! - Hold the caller's request object untouched
//! - Decide, before any I/O, whether the reply may carry a cache path
//! - Encode the request as one JSON line with numeric strings as numbers

use serde_json::{Map, Number, Value};

pub const ACTION_KEY: &str = "action";
pub const MODE_KEY: &str = "mode";
pub const PROCESS_ACTION: &str = "process";
pub const STATUS_ACTION: &str = "status";
pub const HASH_MODE: &str = "hash";

/// A decoded caller request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelayRequest {
    fields: Map<String, Value>,
}

impl RelayRequest {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Wrap a JSON value; anything but an object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn has_action(&self) -> bool {
        self.fields.contains_key(ACTION_KEY)
    }

    pub fn action(&self) -> Option<&str> {
        self.fields.get(ACTION_KEY).and_then(Value::as_str)
    }

    /// Low-cardinality action name for metrics.
    pub fn action_label(&self) -> &'static str {
        if !self.has_action() {
            return "missing";
        }
        match self.action() {
            Some(PROCESS_ACTION) => PROCESS_ACTION,
            Some(STATUS_ACTION) => STATUS_ACTION,
            _ => "other",
        }
    }

    /// Whether a successful reply carries a file path: `process` in any
    /// mode other than `hash`. A missing or non-string mode is not `hash`.
    pub fn needs_path_rewrite(&self) -> bool {
        self.action() == Some(PROCESS_ACTION)
            && self.fields.get(MODE_KEY).and_then(Value::as_str) != Some(HASH_MODE)
    }

    /// The request as sent to the backend: one JSON object and a newline.
    pub fn to_wire_line(&self) -> Vec<u8> {
        let encoded = encode_numeric_strings(&Value::Object(self.fields.clone()));
        let mut line = encoded.to_string().into_bytes();
        line.push(b'\n');
        line
    }
}

impl From<Map<String, Value>> for RelayRequest {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// Replace every string value that spells a number with that number.
/// Object keys are left alone.
pub fn encode_numeric_strings(value: &Value) -> Value {
    match value {
        Value::String(s) => numeric_literal(s).map_or_else(|| value.clone(), Value::Number),
        Value::Array(items) => Value::Array(items.iter().map(encode_numeric_strings).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), encode_numeric_strings(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn numeric_literal(s: &str) -> Option<Number> {
    let trimmed = s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    if !is_decimal_literal(trimmed) {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(int.into());
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

/// `[+-]digits[.digits][(e|E)[+-]digits]`, with at least one mantissa digit.
fn is_decimal_literal(s: &str) -> bool {
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let unsigned = s.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(s);

    let (mantissa, exponent) = match unsigned.find(|c: char| c == 'e' || c == 'E') {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };

    let mantissa_ok = all_digits(int_part)
        && all_digits(frac_part)
        && (!int_part.is_empty() || !frac_part.is_empty());
    let exponent_ok = exponent.map_or(true, |e| {
        let digits = e.strip_prefix(|c: char| c == '+' || c == '-').unwrap_or(e);
        !digits.is_empty() && all_digits(digits)
    });

    mantissa_ok && exponent_ok
}
