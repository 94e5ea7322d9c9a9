//! Cold start: load the store and reset interrupted items.

use super::actor::{Entry, SchedulerActor};
use super::SchedulerError;
use crate::item::{DownloadItem, ItemStatus};

/// Which interrupted states a start resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Recovery {
    /// `active` and `paused` go back to `pending`.
    Full,
    /// Only `active` goes back to `pending`.
    KeepPaused,
}

impl Recovery {
    fn resets(self, item: &DownloadItem) -> bool {
        match self {
            Recovery::Full => matches!(item.status, ItemStatus::Active | ItemStatus::Paused),
            Recovery::KeepPaused => item.status == ItemStatus::Active,
        }
    }
}

impl SchedulerActor {
    /// Load every stored item. Items left interrupted by a previous process (per
    /// `recovery`) go back to `pending` with counters reset and their part files removed.
    pub(super) async fn recover(&mut self, recovery: Recovery) -> Result<usize, SchedulerError> {
        let items = self.store.list_all().await?;
        let mut recovered = 0;

        for mut item in items {
            self.last_created_at = self.last_created_at.max(item.created_at);
            if recovery.resets(&item) {
                self.remove_file(&self.part_path(&item));
                item.status = ItemStatus::Pending;
                item.transferred_bytes = 0;
                item.started_at = None;
                self.store.update(&item).await?;
                recovered += 1;
            }
            self.by_source.insert(item.source_ref.clone(), item.id);
            self.entries.insert(item.id, Entry::new(item));
        }

        if recovered > 0 {
            tracing::info!("recovered {} interrupted items as pending", recovered);
        }
        tracing::debug!("loaded {} items from store", self.entries.len());
        Ok(recovered)
    }
}
