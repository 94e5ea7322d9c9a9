//! Failure taxonomy attached to failed items and to observer alerts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why an item ended up `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, DNS, TLS, timeout.
    Transport,
    /// Non-2xx HTTP response.
    Server,
    /// Could not write or rename the local file.
    StorageWrite,
    /// Transfer reported success but produced no data.
    ZeroByteResult,
    /// The item store rejected a write.
    Persistence,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Server => "server",
            FailureKind::StorageWrite => "storage_write",
            FailureKind::ZeroByteResult => "zero_byte_result",
            FailureKind::Persistence => "persistence",
        }
    }

    /// Environmental failures are reported to the observer as alerts on top of failing the item.
    pub fn is_environmental(self) -> bool {
        matches!(self, FailureKind::StorageWrite | FailureKind::Persistence)
    }
}

impl FromStr for FailureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transport" => Ok(FailureKind::Transport),
            "server" => Ok(FailureKind::Server),
            "storage_write" => Ok(FailureKind::StorageWrite),
            "zero_byte_result" => Ok(FailureKind::ZeroByteResult),
            "persistence" => Ok(FailureKind::Persistence),
            other => Err(format!("unknown failure kind {other:?}")),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error recorded on a failed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: FailureKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
