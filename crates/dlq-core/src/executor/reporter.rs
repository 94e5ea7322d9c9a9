use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::UnboundedSender;

use super::{TransferError, TransferEvent, TransferOutcome};
use crate::item::ItemId;
use crate::scheduler::{Inbox, TransferUpdate};

/// Shared between a reporter and its handles; `true` once stopped.
#[derive(Clone, Default)]
struct StopFlag(Arc<Mutex<bool>>);

impl StopFlag {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Executor side of an activation: sends progress and the final result.
///
/// Every send happens under the stop flag's lock, so once
/// [`TransferHandle::stop`] returns nothing more from this activation can be queued.
pub struct TransferReporter {
    item_id: ItemId,
    activation: u64,
    inbox: UnboundedSender<Inbox>,
    stop: StopFlag,
}

impl TransferReporter {
    pub(crate) fn new(item_id: ItemId, activation: u64, inbox: UnboundedSender<Inbox>) -> Self {
        Self {
            item_id,
            activation,
            inbox,
            stop: StopFlag::default(),
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    /// A handle that stops this activation.
    pub fn handle(&self) -> TransferHandle {
        TransferHandle {
            stop: self.stop.clone(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.lock()
    }

    /// Run `f` unless the activation is stopped, holding the stop lock throughout.
    /// A [`TransferHandle::stop`] that returned before this call means `f` never runs.
    pub fn unless_stopped<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        let stopped = self.stop.lock();
        if *stopped {
            return None;
        }
        Some(f())
    }

    /// Report bytes written so far. Returns `false` when the transfer should abort
    /// (stopped, or the scheduler is gone).
    pub fn progress(&self, written: u64, total: Option<u64>) -> bool {
        self.send(TransferEvent::Progress { written, total })
    }

    /// Report the terminal result. Consumes the reporter: nothing follows it.
    pub fn finish(self, result: Result<TransferOutcome, TransferError>) -> bool {
        self.send(TransferEvent::Finished(result))
    }

    fn send(&self, event: TransferEvent) -> bool {
        let stopped = self.stop.lock();
        if *stopped {
            return false;
        }
        self.inbox
            .send(Inbox::Transfer(TransferUpdate {
                item_id: self.item_id,
                activation: self.activation,
                event,
            }))
            .is_ok()
    }
}

/// Scheduler side of an activation: the cooperative stop signal.
#[derive(Clone)]
pub struct TransferHandle {
    stop: StopFlag,
}

impl TransferHandle {
    /// Stop the activation. Idempotent.
    pub fn stop(&self) {
        *self.stop.lock() = true;
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn reports_reach_inbox_until_stopped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = TransferReporter::new(3, 9, tx);
        let handle = reporter.handle();

        assert!(reporter.progress(10, Some(100)));
        match rx.try_recv().unwrap() {
            Inbox::Transfer(update) => {
                assert_eq!(update.item_id, 3);
                assert_eq!(update.activation, 9);
                assert!(matches!(
                    update.event,
                    TransferEvent::Progress { written: 10, total: Some(100) }
                ));
            }
            Inbox::Command(_) => panic!("expected a transfer update"),
        }

        handle.stop();
        assert!(reporter.is_stopped());
        assert!(!reporter.progress(20, Some(100)));
        assert!(!reporter.finish(Ok(TransferOutcome { bytes_written: 20 })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unless_stopped_skips_work_after_stop() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let reporter = TransferReporter::new(1, 1, tx);
        assert_eq!(reporter.unless_stopped(|| 7), Some(7));

        reporter.handle().stop();
        let mut ran = false;
        assert_eq!(reporter.unless_stopped(|| ran = true), None);
        assert!(!ran);
    }

    #[test]
    fn closed_inbox_aborts() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let reporter = TransferReporter::new(1, 1, tx);
        assert!(!reporter.progress(1, None));
        assert!(!reporter.is_stopped());
    }
}
