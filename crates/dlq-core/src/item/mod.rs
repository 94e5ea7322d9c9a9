//! Download item model: the record the scheduler owns and the store persists.

mod failure;
mod types;

pub use failure::{ErrorInfo, FailureKind};
pub use types::{ContentKind, ItemId, ItemStatus};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// One queued, running, or finished transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: ItemId,
    /// Logical resource identifier; unique across live items.
    pub source_ref: String,
    pub url: String,
    pub title: String,
    pub kind: ContentKind,
    /// Final file name inside the download directory.
    pub file_name: String,
    pub status: ItemStatus,
    /// 0 while unknown.
    pub total_bytes: u64,
    pub transferred_bytes: u64,
    /// Set iff `status == Completed`.
    pub local_path: Option<PathBuf>,
    /// Set iff `status == Failed`.
    pub error: Option<ErrorInfo>,
    /// Unix milliseconds; strictly increasing per scheduler.
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    /// Higher runs first.
    pub priority: i32,
}

impl DownloadItem {
    /// Fraction in `[0, 1]`; 0 while the total is unknown.
    pub fn progress(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.transferred_bytes as f64 / self.total_bytes as f64).min(1.0)
    }

    /// Build the record the store returns for a fresh insert.
    pub fn from_draft(id: ItemId, draft: &ItemDraft) -> Self {
        Self {
            id,
            source_ref: draft.source_ref.clone(),
            url: draft.url.clone(),
            title: draft.title.clone(),
            kind: draft.kind,
            file_name: draft.file_name.clone(),
            status: ItemStatus::Pending,
            total_bytes: 0,
            transferred_bytes: 0,
            local_path: None,
            error: None,
            created_at: draft.created_at,
            started_at: None,
            completed_at: None,
            priority: draft.priority,
        }
    }
}

/// Fields the scheduler fixes before asking the store for an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub source_ref: String,
    pub url: String,
    pub title: String,
    pub kind: ContentKind,
    pub file_name: String,
    pub priority: i32,
    pub created_at: i64,
}

/// Current unix time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ItemDraft {
        ItemDraft {
            source_ref: "lesson-1".to_string(),
            url: "https://cdn.example.com/lesson-1.mp4".to_string(),
            title: "Lesson 1".to_string(),
            kind: ContentKind::Video,
            file_name: "lesson-1.mp4".to_string(),
            priority: 0,
            created_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn fresh_item_is_pending_with_zero_counters() {
        let item = DownloadItem::from_draft(7, &draft());
        assert_eq!(item.id, 7);
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.transferred_bytes, 0);
        assert!(item.local_path.is_none());
        assert!(item.error.is_none());
    }

    #[test]
    fn progress_fraction() {
        let mut item = DownloadItem::from_draft(1, &draft());
        assert_eq!(item.progress(), 0.0);
        item.total_bytes = 200;
        item.transferred_bytes = 50;
        assert!((item.progress() - 0.25).abs() < 1e-9);
        item.transferred_bytes = 200;
        assert!((item.progress() - 1.0).abs() < 1e-9);
    }
}
