//! Notification port. The scheduler task is the only caller, so
//! implementations see events in the order the scheduler committed them.

mod channel;

pub use channel::{ChannelObserver, ObserverEvent};

use serde::Serialize;
use std::fmt;

use crate::item::{DownloadItem, FailureKind, ItemId};

/// Environmental problem that needs attention beyond a failed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub item_id: Option<ItemId>,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.item_id {
            Some(id) => write!(f, "item {id}: {}: {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

pub trait Observer: Send + Sync {
    /// Called after every committed change, including progress.
    fn item_changed(&self, item: &DownloadItem);

    /// Called after an item is deleted by cancel, remove or clear-completed.
    fn item_removed(&self, _id: ItemId) {}

    /// Called when the (total, active) pair changes.
    fn counts_changed(&self, total: usize, active: usize);

    fn alert(&self, _alert: &Alert) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn item_changed(&self, _item: &DownloadItem) {}

    fn counts_changed(&self, _total: usize, _active: usize) {}
}
