//! Apply executor reports: progress and terminal results.

use std::path::Path;
use std::time::Instant;

use super::actor::SchedulerActor;
use super::command::TransferUpdate;
use crate::executor::{TransferError, TransferEvent, TransferOutcome};
use crate::item::{now_millis, DownloadItem, ErrorInfo, FailureKind, ItemId, ItemStatus};
use crate::storage;

impl SchedulerActor {
    pub(super) async fn on_transfer(&mut self, update: TransferUpdate) {
        let id = update.item_id;
        let current = match self.entries.get(&id) {
            Some(entry) => entry.activation == update.activation && entry.item.status == ItemStatus::Active,
            None => false,
        };
        if !current {
            tracing::debug!(
                "dropping stale report for item {} (activation {})",
                id,
                update.activation
            );
            return;
        }

        match update.event {
            TransferEvent::Progress { written, total } => self.on_progress(id, written, total).await,
            TransferEvent::Finished(result) => {
                self.on_finished(id, result).await;
                self.admit().await;
                self.publish_counts();
            }
        }
    }

    async fn on_progress(&mut self, id: ItemId, written: u64, total: Option<u64>) {
        let interval = self.config.progress_persist_interval;
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        if written < entry.item.transferred_bytes {
            return;
        }

        let item = &mut entry.item;
        item.transferred_bytes = written;
        if let Some(total) = total {
            item.total_bytes = total;
        }
        if item.total_bytes > 0 && item.transferred_bytes > item.total_bytes {
            item.total_bytes = item.transferred_bytes;
        }

        let due = entry.last_persist.map_or(true, |t| t.elapsed() >= interval);
        let snapshot = entry.item.clone();
        if due {
            entry.last_persist = Some(Instant::now());
            // Progress is advisory; a failed write is retried at the next interval.
            if let Err(e) = self.store.update(&snapshot).await {
                tracing::warn!("item {}: progress not persisted: {}", id, e);
            }
        }
        self.observer.item_changed(&snapshot);
    }

    async fn on_finished(&mut self, id: ItemId, result: Result<TransferOutcome, TransferError>) {
        let Some(entry) = self.entries.get_mut(&id) else {
            return;
        };
        entry.handle = None;
        let current = entry.item.clone();

        let final_path = self.final_path(&current);
        let part = storage::part_path(&final_path);
        let settled = result
            .map_err(|e| e.to_error_info())
            .and_then(|outcome| finalize_file(&part, &final_path, outcome));

        let mut next = current.clone();
        match settled {
            Ok(len) => {
                next.status = ItemStatus::Completed;
                next.total_bytes = len;
                next.transferred_bytes = len;
                next.local_path = Some(final_path);
                next.completed_at = Some(now_millis());
                next.error = None;
            }
            Err(info) => {
                self.remove_file(&part);
                next.status = ItemStatus::Failed;
                next.local_path = None;
                next.completed_at = None;
                next.error = Some(info);
            }
        }
        self.commit_terminal(current, next).await;
    }

    /// Persist a terminal state. If the store refuses, fall back to `failed(persistence)`,
    /// committed in memory even when that write fails too.
    async fn commit_terminal(&mut self, current: DownloadItem, mut next: DownloadItem) {
        let id = next.id;
        if let Err(e) = self.store.update(&next).await {
            self.persistence_alert(Some(id), &e);
            next = current;
            next.status = ItemStatus::Failed;
            next.local_path = None;
            next.completed_at = None;
            next.error = Some(ErrorInfo::new(
                FailureKind::Persistence,
                format!("recording transfer result: {e}"),
            ));
            if let Err(e) = self.store.update(&next).await {
                tracing::error!("item {} failed state kept in memory only: {}", id, e);
            }
        } else if let Some(err) = &next.error {
            if err.kind.is_environmental() {
                self.alert(Some(id), err.kind, err.message.clone());
            }
        }

        match (&next.status, &next.error) {
            (ItemStatus::Completed, _) => tracing::info!(
                "item {} completed: {} bytes -> {}",
                id,
                next.total_bytes,
                next.local_path.as_deref().map(|p| p.display().to_string()).unwrap_or_default()
            ),
            (_, Some(err)) => tracing::warn!("item {} failed: {}", id, err),
            _ => {}
        }
        self.apply(next);
    }
}

/// Zero-byte guard and atomic rename. Returns the final size.
fn finalize_file(part: &Path, final_path: &Path, outcome: TransferOutcome) -> Result<u64, ErrorInfo> {
    let len = match storage::non_empty_len(part) {
        Ok(Some(len)) if outcome.bytes_written > 0 => len,
        Ok(_) => {
            return Err(ErrorInfo::new(
                FailureKind::ZeroByteResult,
                "transfer finished without writing any data",
            ))
        }
        Err(e) => {
            return Err(ErrorInfo::new(
                FailureKind::StorageWrite,
                format!("inspecting {}: {e}", part.display()),
            ))
        }
    };
    storage::finalize(part, final_path).map_err(|e| {
        ErrorInfo::new(
            FailureKind::StorageWrite,
            format!("renaming to {}: {e}", final_path.display()),
        )
    })?;
    Ok(len)
}
