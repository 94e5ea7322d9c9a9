//! Item read operations: get and list.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::PathBuf;

use super::SqliteItemStore;
use crate::item::{ContentKind, DownloadItem, ErrorInfo, FailureKind, ItemId, ItemStatus};
use crate::store::{StoreError, StoreResult};

const ITEM_COLUMNS: &str = r#"
    id, source_ref, url, title, kind, file_name, status, priority,
    total_bytes, transferred_bytes, local_path, error_kind, error_message,
    created_at, started_at, completed_at
"#;

fn corrupt(id: ItemId, detail: String) -> StoreError {
    StoreError::Backend(format!("item {id}: {detail}"))
}

fn row_to_item(row: &SqliteRow) -> StoreResult<DownloadItem> {
    let id: i64 = row.get("id");
    let status_str: String = row.get("status");
    let kind_str: String = row.get("kind");
    let error_kind: Option<String> = row.get("error_kind");
    let error_message: Option<String> = row.get("error_message");
    let local_path: Option<String> = row.get("local_path");
    let total_bytes: i64 = row.get("total_bytes");
    let transferred_bytes: i64 = row.get("transferred_bytes");

    let status: ItemStatus = status_str.parse().map_err(|e| corrupt(id, e))?;
    let kind: ContentKind = kind_str.parse().map_err(|e| corrupt(id, e))?;
    let error = match error_kind {
        Some(k) => {
            let kind: FailureKind = k.parse().map_err(|e| corrupt(id, e))?;
            Some(ErrorInfo::new(kind, error_message.unwrap_or_default()))
        }
        None => None,
    };

    Ok(DownloadItem {
        id,
        source_ref: row.get("source_ref"),
        url: row.get("url"),
        title: row.get("title"),
        kind,
        file_name: row.get("file_name"),
        status,
        total_bytes: total_bytes.max(0) as u64,
        transferred_bytes: transferred_bytes.max(0) as u64,
        local_path: local_path.map(PathBuf::from),
        error,
        created_at: row.get("created_at"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        priority: row.get("priority"),
    })
}

impl SqliteItemStore {
    /// Load one item by id.
    pub async fn get_item(&self, id: ItemId) -> StoreResult<Option<DownloadItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_item).transpose()
    }

    /// List every item in admission order.
    pub async fn list_items(&self) -> StoreResult<Vec<DownloadItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items ORDER BY priority DESC, created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_item).collect()
    }
}
