//! State events — what the tester reports on the state topic.
//!
//! | Event | Payload |
//! |-------|---------|
//! | startup | `{"event":"startup","result":"pass"}` |
//! | status / scan | `{"event":"status","result":"pass","devices":[..]}` or `{"event":"status","result":"fail","error":"w1_read"}` |
//! | test | `{"event":"test","result":"pass","device":"..","elapsed_ms":n}` or `{"event":"test","result":"fail","error":"timeout","elapsed_ms":n}` |
//! | error | `{"event":"error","result":"fail","error":"bad_json"}` |

use std::fmt;

use serde::Serialize;

use crate::device::{DeviceId, DeviceSet};
use crate::outcome::Outcome;

/// Which listing command produced a device listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Status,
    Scan,
}

impl ListingKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Scan => "scan",
        }
    }
}

/// Why a command was refused before doing any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Payload was not a JSON object with a string `action`.
    BadJson,
    /// `action` named nothing the tester knows.
    UnknownAction,
    /// A presence test is already running.
    Busy,
}

impl Rejection {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::BadJson => "bad_json",
            Self::UnknownAction => "unknown_action",
            Self::Busy => "busy",
        }
    }
}

/// One outbound state event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// The tester connected and is ready for commands.
    Startup,
    /// Current bus contents.
    Devices { kind: ListingKind, devices: DeviceSet },
    /// The bus could not be read while answering a listing command.
    DevicesUnreadable { kind: ListingKind },
    /// Result of a presence test.
    Test(Outcome),
    /// A command was refused.
    Rejected(Rejection),
}

impl StateEvent {
    /// Value of the `event` field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Devices { kind, .. } | Self::DevicesUnreadable { kind } => kind.as_str(),
            Self::Test(_) => "test",
            Self::Rejected(_) => "error",
        }
    }

    /// Serialize into the compact wire payload.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; only possible if a device identifier
    /// cannot be represented as JSON.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.wire())
    }

    fn wire(&self) -> Wire<'_> {
        let base = Wire {
            event: self.name(),
            result: "fail",
            device: None,
            devices: None,
            error: None,
            elapsed_ms: None,
        };
        match self {
            Self::Startup => Wire {
                result: "pass",
                ..base
            },
            Self::Devices { devices, .. } => Wire {
                result: "pass",
                devices: Some(devices),
                ..base
            },
            Self::DevicesUnreadable { .. } => Wire {
                error: Some("w1_read"),
                ..base
            },
            Self::Test(Outcome::Pass { device, elapsed }) => Wire {
                result: "pass",
                device: Some(device),
                elapsed_ms: Some(millis(*elapsed)),
                ..base
            },
            Self::Test(Outcome::Fail { reason, elapsed }) => Wire {
                error: Some(reason.code()),
                elapsed_ms: Some(millis(*elapsed)),
                ..base
            },
            Self::Rejected(rejection) => Wire {
                error: Some(rejection.code()),
                ..base
            },
        }
    }
}

impl fmt::Display for StateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wire = self.wire();
        write!(f, "{}/{}", wire.event, wire.result)?;
        if let Some(error) = wire.error {
            write!(f, "/{error}")?;
        }
        Ok(())
    }
}

fn millis(elapsed: std::time::Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Field order here is the field order on the wire.
#[derive(Serialize)]
struct Wire<'a> {
    event: &'static str,
    result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    devices: Option<&'a DeviceSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
}
