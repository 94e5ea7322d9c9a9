//! Start pending items while there is room.

use std::time::Instant;

use super::actor::SchedulerActor;
use super::choose::next_pending;
use super::SchedulerError;
use crate::executor::{TransferReporter, TransferRequest};
use crate::item::{now_millis, ItemId, ItemStatus};

impl SchedulerActor {
    pub(super) fn active_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.item.status == ItemStatus::Active)
            .count()
    }

    /// Admit pending items until the bound is reached or nothing is pending.
    /// A failed admission ends this round; the item stays pending.
    pub(super) async fn admit(&mut self) {
        while self.active_count() < self.config.max_concurrency {
            let Some(id) = next_pending(self.entries.values().map(|e| &e.item)) else {
                break;
            };
            if let Err(e) = self.activate(id).await {
                tracing::warn!("admission stopped at item {}: {}", id, e);
                break;
            }
        }
    }

    async fn activate(&mut self, id: ItemId) -> Result<(), SchedulerError> {
        let Some(inbox) = self.inbox.upgrade() else {
            return Err(SchedulerError::Stopped);
        };
        let Some(entry) = self.entries.get(&id) else {
            return Ok(());
        };

        // Every activation starts from byte 0.
        let mut next = entry.item.clone();
        next.status = ItemStatus::Active;
        next.transferred_bytes = 0;
        next.started_at = Some(now_millis());
        next.completed_at = None;
        next.error = None;
        let url = next.url.clone();
        let part = self.part_path(&next);
        self.commit(next).await?;

        // A stopped transfer may still hold the old part file open; start on a fresh inode.
        self.remove_file(&part);

        self.next_activation += 1;
        let activation = self.next_activation;
        let request = TransferRequest {
            item_id: id,
            url,
            destination: part,
        };
        let handle = self
            .executor
            .start(request, TransferReporter::new(id, activation, inbox));

        if let Some(entry) = self.entries.get_mut(&id) {
            entry.activation = activation;
            entry.handle = Some(handle);
            entry.last_persist = Some(Instant::now());
        }
        tracing::info!("item {} active (activation {})", id, activation);
        Ok(())
    }
}
