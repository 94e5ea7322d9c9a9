//! Durable record of every queued, running, or finished item.
//!
//! The scheduler is the only writer; other callers (CLI `status`, `info`) may
//! read concurrently. `SqliteItemStore` is the production backend,
//! `MemoryItemStore` serves tests and embedding.

mod memory;
mod sqlite;


pub use memory::MemoryItemStore;
pub use sqlite::{default_db_path, SqliteItemStore};

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::item::{DownloadItem, ItemDraft, ItemId};

/// Errors raised by item store backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an item for source {0:?} already exists")]
    DuplicateSourceRef(String),
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("item store backend: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence port used by the scheduler.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a new pending item and return it with its assigned id.
    async fn insert(&self, draft: &ItemDraft) -> StoreResult<DownloadItem>;

    /// Overwrite the mutable fields of an existing item.
    async fn update(&self, item: &DownloadItem) -> StoreResult<()>;

    /// Delete an item. Deleting a missing id is not an error.
    async fn delete(&self, id: ItemId) -> StoreResult<()>;

    async fn get(&self, id: ItemId) -> StoreResult<Option<DownloadItem>>;

    /// All items in admission order.
    async fn list_all(&self) -> StoreResult<Vec<DownloadItem>>;
}

/// Admission order: priority DESC, then created_at ASC, then id ASC.
pub fn admission_order(a: &DownloadItem, b: &DownloadItem) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.id.cmp(&b.id))
}
