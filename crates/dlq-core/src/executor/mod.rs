//! Transfer executors: perform one transfer and report back to the scheduler.
//!
//! The scheduler hands every activation a [`TransferReporter`] and keeps the
//! matching [`TransferHandle`]. Stopping the handle closes the reporter, so no
//! report from that activation reaches the scheduler afterwards.

mod classify;
mod http;
mod manual;
mod reporter;

pub use classify::{classify_curl_error, is_success_status, TransportReason};
pub use http::CurlExecutor;
pub use manual::{ManualExecutor, StartedTransfer};
pub use reporter::{TransferHandle, TransferReporter};

use std::io;
use std::path::PathBuf;

use crate::item::{ErrorInfo, FailureKind, ItemId};

/// One activation's work order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub item_id: ItemId,
    pub url: String,
    /// The `.part` file to write. Created (or truncated) by the executor.
    pub destination: PathBuf,
}

/// Successful result of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub bytes_written: u64,
}

/// Why a transfer ended without success.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("{reason}: {detail}")]
    Transport {
        reason: TransportReason,
        detail: String,
    },
    #[error("server returned HTTP {0}")]
    Server(u32),
    #[error("writing local file: {0}")]
    StorageWrite(#[from] io::Error),
    #[error("transfer stopped")]
    Stopped,
}

impl TransferError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            TransferError::Transport { .. } | TransferError::Stopped => FailureKind::Transport,
            TransferError::Server(_) => FailureKind::Server,
            TransferError::StorageWrite(_) => FailureKind::StorageWrite,
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.failure_kind(), self.to_string())
    }
}

/// Report carried from an executor to the scheduler inbox.
#[derive(Debug)]
pub(crate) enum TransferEvent {
    Progress { written: u64, total: Option<u64> },
    Finished(Result<TransferOutcome, TransferError>),
}

/// Starts transfers. Implementations must not block the caller.
pub trait TransferExecutor: Send + Sync {
    fn start(&self, request: TransferRequest, reporter: TransferReporter) -> TransferHandle;
}
