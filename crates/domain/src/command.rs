//! Commands decoded from inbound control messages.
//!
//! Expected payload: `{"action": "status"|"scan"|"test", "timeout_ms"?: integer}`.
//! Decoding is permissive: unknown fields are ignored, a missing or unusable
//! `timeout_ms` means "use the configured default". Only a payload that is not
//! a JSON object, or one without a string `action`, is rejected.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::error::DecodeError;

/// Inbound payloads are cut to this many bytes before decoding.
pub const MAX_PAYLOAD_LEN: usize = 1024;

/// What the controller asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Status,
    Scan,
    Test,
    /// Anything else, kept verbatim for logging.
    Unknown(String),
}

impl Action {
    fn parse(raw: &str) -> Self {
        match raw {
            "status" => Self::Status,
            "scan" => Self::Scan,
            "test" => Self::Test,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => f.write_str("status"),
            Self::Scan => f.write_str("scan"),
            Self::Test => f.write_str("test"),
            Self::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

/// One decoded control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub action: Action,
    /// Per-request test timeout; `None` when absent, zero, negative or not a number.
    pub timeout: Option<Duration>,
}

impl CommandRequest {
    /// Decode a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the payload is not UTF-8, not JSON, not
    /// an object, or lacks a string `action`.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let payload = &payload[..payload.len().min(MAX_PAYLOAD_LEN)];
        let text = std::str::from_utf8(payload).map_err(DecodeError::NotUtf8)?;
        let value: Value = serde_json::from_str(text).map_err(DecodeError::Malformed)?;
        let Value::Object(fields) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let action = fields
            .get("action")
            .and_then(Value::as_str)
            .map(Action::parse)
            .ok_or(DecodeError::MissingAction)?;

        let timeout = fields
            .get("timeout_ms")
            .and_then(positive_millis)
            .map(Duration::from_millis);

        Ok(Self { action, timeout })
    }
}

/// Accept `1500` or `"1500"`; reject everything else, including zero.
fn positive_millis(value: &Value) -> Option<u64> {
    let millis = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (millis > 0).then_some(millis)
}
