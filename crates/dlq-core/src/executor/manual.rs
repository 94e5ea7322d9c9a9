//! Executor driven by the caller: records every start and lets the caller
//! report progress and results on the transfer's behalf.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{
    TransferError, TransferExecutor, TransferHandle, TransferOutcome, TransferReporter,
    TransferRequest,
};
use crate::item::ItemId;

/// A transfer started by [`ManualExecutor`] and not yet taken by the caller.
pub struct StartedTransfer {
    pub request: TransferRequest,
    pub reporter: TransferReporter,
    pub handle: TransferHandle,
}

impl StartedTransfer {
    pub fn item_id(&self) -> ItemId {
        self.request.item_id
    }

    pub fn is_stopped(&self) -> bool {
        self.handle.is_stopped()
    }

    pub fn progress(&self, written: u64, total: Option<u64>) -> bool {
        self.reporter.progress(written, total)
    }

    /// Write `body` to the part file, report it as progress, then report success.
    pub fn complete_with(self, body: &[u8]) -> bool {
        if let Err(e) = fs::write(&self.request.destination, body) {
            return self.reporter.finish(Err(TransferError::StorageWrite(e)));
        }
        let len = body.len() as u64;
        if !body.is_empty() {
            self.reporter.progress(len, Some(len));
        }
        self.reporter.finish(Ok(TransferOutcome { bytes_written: len }))
    }

    pub fn fail(self, error: TransferError) -> bool {
        self.reporter.finish(Err(error))
    }
}

/// Deterministic executor: nothing happens until the caller acts on a [`StartedTransfer`].
#[derive(Default)]
pub struct ManualExecutor {
    started: Mutex<Vec<StartedTransfer>>,
    total_started: AtomicUsize,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the transfers started since the last call, oldest first.
    pub fn take_started(&self) -> Vec<StartedTransfer> {
        std::mem::take(&mut *self.started.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Number of transfers started over the executor's lifetime.
    pub fn total_started(&self) -> usize {
        self.total_started.load(Ordering::SeqCst)
    }
}

impl TransferExecutor for ManualExecutor {
    fn start(&self, request: TransferRequest, reporter: TransferReporter) -> TransferHandle {
        let handle = reporter.handle();
        tracing::debug!("manual transfer started for item {}", request.item_id);
        self.total_started.fetch_add(1, Ordering::SeqCst);
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(StartedTransfer {
                request,
                reporter,
                handle: handle.clone(),
            });
        handle
    }
}
