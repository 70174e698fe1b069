//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`TesterError`]
//! at port boundaries via `From`.

use std::path::PathBuf;

/// Top-level error for the tester.
#[derive(Debug, thiserror::Error)]
pub enum TesterError {
    /// The device source could not be listed.
    #[error("device enumeration failed")]
    Enumeration(#[from] EnumerationError),

    /// The messaging transport rejected an operation.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The underlying device source could not be listed (not mounted,
/// permission denied, …).
#[derive(Debug, thiserror::Error)]
#[error("failed to list devices in {}", path.display())]
pub struct EnumerationError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl EnumerationError {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Reasons an inbound command payload is rejected as `bad_json`.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8")]
    NotUtf8(#[source] std::str::Utf8Error),

    #[error("payload is not valid JSON")]
    Malformed(#[source] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no string `action` field")]
    MissingAction,
}
