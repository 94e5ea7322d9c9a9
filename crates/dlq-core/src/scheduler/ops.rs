//! Caller commands: enqueue and the per-item and bulk controls.

use super::actor::{Entry, SchedulerActor};
use super::choose::in_admission_order;
use super::{EnqueueRequest, ItemFilter, SchedulerError};
use crate::item::{DownloadItem, ItemDraft, ItemId, ItemStatus};
use crate::store::StoreError;
use crate::url_model::{derive_file_name, unique_file_name_among};

impl SchedulerActor {
    pub(super) async fn enqueue(&mut self, request: EnqueueRequest) -> Result<ItemId, SchedulerError> {
        let source_ref = request.source_ref.trim().to_string();
        if source_ref.is_empty() {
            return Err(SchedulerError::InvalidRequest("source_ref is empty".to_string()));
        }
        if url::Url::parse(&request.url).is_err() {
            return Err(SchedulerError::InvalidRequest(format!(
                "invalid url {:?}",
                request.url
            )));
        }
        if self.by_source.contains_key(&source_ref) {
            return Err(SchedulerError::DuplicateResource(source_ref));
        }

        let file_name = self.unique_file_name(&derive_file_name(
            &source_ref,
            &request.url,
            request.kind,
            request.file_name.as_deref(),
        ));
        let title = request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| file_name.clone());
        let draft = ItemDraft {
            source_ref,
            url: request.url,
            title,
            kind: request.kind,
            file_name,
            priority: request.priority,
            created_at: self.next_created_at(),
        };

        let item = match self.store.insert(&draft).await {
            Ok(item) => item,
            Err(StoreError::DuplicateSourceRef(source_ref)) => {
                return Err(SchedulerError::DuplicateResource(source_ref))
            }
            Err(e) => {
                self.persistence_alert(None, &e);
                return Err(e.into());
            }
        };

        let id = item.id;
        tracing::info!("queued item {} ({}) from {}", id, item.file_name, item.url);
        self.by_source.insert(item.source_ref.clone(), id);
        self.observer.item_changed(&item);
        self.entries.insert(id, Entry::new(item));
        self.admit().await;
        Ok(id)
    }

    /// Unique among live items and files already in the download directory.
    fn unique_file_name(&self, candidate: &str) -> String {
        let mut taken: Vec<String> = self
            .entries
            .values()
            .map(|e| e.item.file_name.clone())
            .collect();
        loop {
            let name = unique_file_name_among(candidate, taken.iter().map(String::as_str));
            let on_disk = self.config.download_dir.join(&name);
            if !on_disk.exists() && !crate::storage::part_path(&on_disk).exists() {
                return name;
            }
            taken.push(name);
        }
    }

    pub(super) async fn pause(&mut self, id: ItemId) -> Result<bool, SchedulerError> {
        let paused = self.pause_item(id).await?;
        if paused {
            self.admit().await;
        }
        Ok(paused)
    }

    async fn pause_item(&mut self, id: ItemId) -> Result<bool, SchedulerError> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(false);
        };
        if !matches!(entry.item.status, ItemStatus::Active | ItemStatus::Pending) {
            return Ok(false);
        }
        let mut next = entry.item.clone();
        next.status = ItemStatus::Paused;
        self.commit(next).await?;

        if let Some(handle) = self.entries.get_mut(&id).and_then(|e| e.handle.take()) {
            handle.stop();
        }
        tracing::info!("paused item {}", id);
        Ok(true)
    }

    pub(super) async fn resume(&mut self, id: ItemId) -> Result<bool, SchedulerError> {
        let resumed = self.resume_item(id).await?;
        if resumed {
            self.admit().await;
        }
        Ok(resumed)
    }

    async fn resume_item(&mut self, id: ItemId) -> Result<bool, SchedulerError> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(false);
        };
        if entry.item.status != ItemStatus::Paused {
            return Ok(false);
        }
        let mut next = entry.item.clone();
        next.status = ItemStatus::Pending;
        self.commit(next).await?;
        tracing::info!("resumed item {}", id);
        Ok(true)
    }

    pub(super) async fn retry(&mut self, id: ItemId) -> Result<bool, SchedulerError> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(false);
        };
        if entry.item.status != ItemStatus::Failed {
            return Ok(false);
        }
        let mut next = entry.item.clone();
        next.status = ItemStatus::Pending;
        next.error = None;
        next.total_bytes = 0;
        next.transferred_bytes = 0;
        next.started_at = None;
        next.completed_at = None;
        self.commit(next).await?;
        tracing::info!("retrying item {}", id);
        self.admit().await;
        Ok(true)
    }

    pub(super) async fn cancel(&mut self, id: ItemId) -> Result<bool, SchedulerError> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(false);
        };
        if entry.item.status.is_terminal() {
            return Ok(false);
        }
        let was_active = entry.item.status == ItemStatus::Active;
        self.delete_item(id, false).await?;
        tracing::info!("cancelled item {}", id);
        if was_active {
            self.admit().await;
        }
        Ok(true)
    }

    pub(super) async fn remove(&mut self, id: ItemId, delete_file: bool) -> Result<bool, SchedulerError> {
        let Some(entry) = self.entries.get(&id) else {
            return Ok(false);
        };
        let was_active = entry.item.status == ItemStatus::Active;
        self.delete_item(id, delete_file).await?;
        tracing::info!("removed item {}", id);
        if was_active {
            self.admit().await;
        }
        Ok(true)
    }

    /// Delete the record, then drop the entry, stop its transfer and remove its part file
    /// (and the finished file with `delete_file`).
    async fn delete_item(&mut self, id: ItemId, delete_file: bool) -> Result<(), SchedulerError> {
        if let Err(e) = self.store.delete(id).await {
            self.persistence_alert(Some(id), &e);
            return Err(e.into());
        }
        let Some(entry) = self.entries.remove(&id) else {
            return Ok(());
        };
        self.by_source.remove(&entry.item.source_ref);
        if let Some(handle) = entry.handle {
            handle.stop();
        }
        self.remove_file(&self.part_path(&entry.item));
        if delete_file {
            if let Some(path) = &entry.item.local_path {
                self.remove_file(path);
            }
        }
        self.observer.item_removed(id);
        Ok(())
    }

    fn ids_with_status(&self, statuses: &[ItemStatus]) -> Vec<ItemId> {
        in_admission_order(self.entries.values().map(|e| &e.item))
            .into_iter()
            .filter(|item| statuses.contains(&item.status))
            .map(|item| item.id)
            .collect()
    }

    pub(super) async fn pause_all(&mut self) -> Result<usize, SchedulerError> {
        let ids = self.ids_with_status(&[ItemStatus::Active, ItemStatus::Pending]);
        let mut changed = 0;
        let mut outcome = Ok(());
        for id in ids {
            match self.pause_item(id).await {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        self.admit().await;
        outcome.map(|()| changed)
    }

    pub(super) async fn resume_all(&mut self) -> Result<usize, SchedulerError> {
        let ids = self.ids_with_status(&[ItemStatus::Paused]);
        let mut changed = 0;
        let mut outcome = Ok(());
        for id in ids {
            match self.resume_item(id).await {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        self.admit().await;
        outcome.map(|()| changed)
    }

    pub(super) async fn clear_completed(&mut self, delete_files: bool) -> Result<usize, SchedulerError> {
        let ids = self.ids_with_status(&[ItemStatus::Completed]);
        let mut cleared = 0;
        for id in ids {
            self.delete_item(id, delete_files).await?;
            cleared += 1;
        }
        if cleared > 0 {
            tracing::info!("cleared {} completed items", cleared);
        }
        Ok(cleared)
    }

    pub(super) fn list(&self, filter: ItemFilter) -> Vec<DownloadItem> {
        in_admission_order(self.entries.values().map(|e| &e.item))
            .into_iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect()
    }

    pub(super) async fn set_max_concurrency(&mut self, max_concurrency: usize) {
        tracing::info!(
            "max_concurrency {} -> {}",
            self.config.max_concurrency,
            max_concurrency
        );
        self.config.max_concurrency = max_concurrency;
        self.admit().await;
    }
}
