//! Queue tallies published to callers and observers.

use serde::{Deserialize, Serialize};

use super::actor::SchedulerActor;
use crate::item::{DownloadItem, ItemStatus};

/// Number of items per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub total: usize,
    pub pending: usize,
    pub active: usize,
    pub paused: usize,
    pub completed: usize,
    pub failed: usize,
}

impl QueueCounts {
    pub fn tally<'a>(items: impl IntoIterator<Item = &'a DownloadItem>) -> Self {
        let mut counts = Self::default();
        for item in items {
            counts.total += 1;
            match item.status {
                ItemStatus::Pending => counts.pending += 1,
                ItemStatus::Active => counts.active += 1,
                ItemStatus::Paused => counts.paused += 1,
                ItemStatus::Completed => counts.completed += 1,
                ItemStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Nothing running and nothing waiting to run.
    pub fn is_idle(&self) -> bool {
        self.active == 0 && self.pending == 0
    }
}

/// Disk usage summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    /// Bytes held by completed items.
    pub completed_bytes: u64,
    /// Known sizes of pending, active and paused items.
    pub queued_bytes: u64,
    pub completed_files: usize,
    pub item_count: usize,
}

impl StorageInfo {
    pub fn tally<'a>(items: impl IntoIterator<Item = &'a DownloadItem>) -> Self {
        let mut info = Self::default();
        for item in items {
            info.item_count += 1;
            match item.status {
                ItemStatus::Completed => {
                    info.completed_bytes += item.total_bytes;
                    info.completed_files += 1;
                }
                ItemStatus::Pending | ItemStatus::Active | ItemStatus::Paused => {
                    info.queued_bytes += item.total_bytes;
                }
                ItemStatus::Failed => {}
            }
        }
        info
    }

    pub fn total_bytes(&self) -> u64 {
        self.completed_bytes + self.queued_bytes
    }
}

impl SchedulerActor {
    pub(super) fn counts(&self) -> QueueCounts {
        QueueCounts::tally(self.entries.values().map(|e| &e.item))
    }

    pub(super) fn storage_info(&self) -> StorageInfo {
        StorageInfo::tally(self.entries.values().map(|e| &e.item))
    }

    /// Push counts to `wait_idle` watchers, and to the observer when (total, active) moved.
    pub(super) fn publish_counts(&mut self) {
        let counts = self.counts();
        self.counts_tx.send_if_modified(|current| {
            if *current == counts {
                return false;
            }
            *current = counts;
            true
        });
        let pair = (counts.total, counts.active);
        if self.last_reported != Some(pair) {
            self.last_reported = Some(pair);
            self.observer.counts_changed(pair.0, pair.1);
        }
    }
}
