//! Item write operations: insert, update, delete.

use super::SqliteItemStore;
use crate::item::{now_millis, DownloadItem, ItemDraft, ItemId, ItemStatus};
use crate::store::{StoreError, StoreResult};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl SqliteItemStore {
    /// Insert a new pending item. Fails with `DuplicateSourceRef` when the source is already stored.
    pub async fn insert_item(&self, draft: &ItemDraft) -> StoreResult<DownloadItem> {
        let result = sqlx::query(
            r#"
            INSERT INTO items (
                source_ref, url, title, kind, file_name, status, priority,
                total_bytes, transferred_bytes, local_path, error_kind, error_message,
                created_at, started_at, completed_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                      0, 0, NULL, NULL, NULL,
                      ?8, NULL, NULL, ?9)
            "#,
        )
        .bind(&draft.source_ref)
        .bind(&draft.url)
        .bind(&draft.title)
        .bind(draft.kind.as_str())
        .bind(&draft.file_name)
        .bind(ItemStatus::Pending.as_str())
        .bind(draft.priority)
        .bind(draft.created_at)
        .bind(now_millis())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(DownloadItem::from_draft(done.last_insert_rowid(), draft)),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::DuplicateSourceRef(draft.source_ref.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite every mutable column of an item.
    pub async fn update_item(&self, item: &DownloadItem) -> StoreResult<()> {
        let local_path = item
            .local_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        let (error_kind, error_message) = match &item.error {
            Some(err) => (Some(err.kind.as_str()), Some(err.message.as_str())),
            None => (None, None),
        };

        let done = sqlx::query(
            r#"
            UPDATE items
            SET title = ?1,
                file_name = ?2,
                status = ?3,
                priority = ?4,
                total_bytes = ?5,
                transferred_bytes = ?6,
                local_path = ?7,
                error_kind = ?8,
                error_message = ?9,
                started_at = ?10,
                completed_at = ?11,
                updated_at = ?12
            WHERE id = ?13
            "#,
        )
        .bind(&item.title)
        .bind(&item.file_name)
        .bind(item.status.as_str())
        .bind(item.priority)
        .bind(item.total_bytes as i64)
        .bind(item.transferred_bytes as i64)
        .bind(local_path)
        .bind(error_kind)
        .bind(error_message)
        .bind(item.started_at)
        .bind(item.completed_at)
        .bind(now_millis())
        .bind(item.id)
        .execute(&self.pool)
        .await?;

        if done.rows_affected() == 0 {
            return Err(StoreError::NotFound(item.id));
        }
        Ok(())
    }

    /// Remove an item. Missing ids are ignored.
    pub async fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM items WHERE id = ?1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
