//! Outcome — the single terminal result of one presence test.

use std::fmt;
use std::time::Duration;

use crate::device::DeviceId;

/// Why a presence test failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailReason {
    /// The device source could not be listed at some point during the test.
    W1ReadError,
    /// No new device was confirmed within the time budget.
    Timeout,
}

impl FailReason {
    /// Wire code used in the `error` field of state events.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::W1ReadError => "w1_read",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Terminal result of a presence test. Exactly one is produced per test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass { device: DeviceId, elapsed: Duration },
    Fail { reason: FailReason, elapsed: Duration },
}
