use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{admission_order, ItemStore, StoreError, StoreResult};
use crate::item::{DownloadItem, ItemDraft, ItemId};

#[derive(Default)]
struct MemoryState {
    next_id: ItemId,
    items: BTreeMap<ItemId, DownloadItem>,
}

/// Process-local item store.
///
/// Writes can be switched to fail with `set_fail_writes`, which lets tests
/// exercise the scheduler's persistence-failure paths.
#[derive(Default)]
pub struct MemoryItemStore {
    state: Mutex<MemoryState>,
    fail_writes: AtomicBool,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert/update/delete return `StoreError::Backend`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("memory store is read-only".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn insert(&self, draft: &ItemDraft) -> StoreResult<DownloadItem> {
        self.check_writable()?;
        let mut state = self.lock();
        if state.items.values().any(|i| i.source_ref == draft.source_ref) {
            return Err(StoreError::DuplicateSourceRef(draft.source_ref.clone()));
        }
        state.next_id += 1;
        let item = DownloadItem::from_draft(state.next_id, draft);
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update(&self, item: &DownloadItem) -> StoreResult<()> {
        self.check_writable()?;
        let mut state = self.lock();
        match state.items.get_mut(&item.id) {
            Some(slot) => {
                *slot = item.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(item.id)),
        }
    }

    async fn delete(&self, id: ItemId) -> StoreResult<()> {
        self.check_writable()?;
        self.lock().items.remove(&id);
        Ok(())
    }

    async fn get(&self, id: ItemId) -> StoreResult<Option<DownloadItem>> {
        Ok(self.lock().items.get(&id).cloned())
    }

    async fn list_all(&self) -> StoreResult<Vec<DownloadItem>> {
        let mut items: Vec<DownloadItem> = self.lock().items.values().cloned().collect();
        items.sort_by(admission_order);
        Ok(items)
    }
}
